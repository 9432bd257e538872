// Archivo: engine.rs
// Propósito: implementar `ProcessExecutor`, el motor que conduce una
// instancia de proceso hasta completarse (o suspenderse esperando entrada
// externa) emitiendo una señal de checkpoint tras cada cambio de estado.
use crate::domain::{ProcessStepStatus, StepTypeId};
use crate::errors::{ProcessError, Result};
use crate::executor::{ExecutorRegistry, ProcessTypeExecutor, StepExecutionResult};
use crate::store::ProcessStore;
use log::{info, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Token de cancelación cooperativa. Se enhebra en cada llamada de paso;
/// el motor lo comprueba al inicio de cada iteración y los ejecutores deben
/// honrarlo durante I/O largo. No hay preempción forzada.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Resumen de una corrida completa del motor, útil para diagnóstico y para
/// verificar la ley de checkpoints en tests.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Número de señales de checkpoint emitidas (= iteraciones con cambio).
    pub checkpoints: usize,
    /// Estados resueltos durante la corrida, en orden de resolución.
    pub resolved: Vec<(StepTypeId, ProcessStepStatus)>,
}

/// Motor de ejecución de procesos por pasos.
///
/// Single-threaded por instancia de proceso y cooperativo: un bucle
/// síncrono sin paralelismo interno. La concurrencia surge sólo de múltiples
/// instancias de proceso o múltiples workers; la exclusión mutua sobre
/// recursos compartidos la gestiona el caller con `OptimisticLock` según
/// `is_lock_requested` del ejecutor.
pub struct ProcessExecutor<S>
    where S: ProcessStore
{
    store: Arc<S>,
    registry: Arc<ExecutorRegistry>,
}

impl<S> ProcessExecutor<S> where S: ProcessStore
{
    pub fn new(store: Arc<S>, registry: Arc<ExecutorRegistry>) -> Self {
        Self { store, registry }
    }

    /// Corre el proceso persistiendo en cada checkpoint vía `save_changes`.
    pub fn run(&self, process_id: &Uuid, token: &CancellationToken) -> Result<RunSummary> {
        let store = self.store.clone();
        self.run_with(process_id, token, &mut || store.save_changes())
    }

    /// Corre el proceso invocando `checkpoint` tras cada cambio de estado.
    /// El contrato esencial es "persistir antes de continuar": el caller
    /// decide cómo (normalmente delegando en `ProcessStore::save_changes`).
    ///
    /// Algoritmo (ver también los tests de `engine_loop.rs`):
    /// 1. Cargar los pasos pendientes; `NotFound` si el proceso no existe.
    /// 2. Resolver el ejecutor para el tipo del proceso.
    /// 3. Sembrar la cola con los tipos existentes que el ejecutor declara
    ///    ejecutables, en el orden en que el ejecutor los declara.
    /// 4. Inicializar; fusionar los tipos adicionales pedidos (filas `Todo`
    ///    frescas) en el mapa vivo y en la cola.
    /// 5. Checkpoint si (3)+(4) cambió algo.
    /// 6. Bucle FIFO: ejecutar un paso, absorber fallos de negocio, aplicar
    ///    estado con regla primero-real/hermanos-`Duplicate`, marcar skips,
    ///    crear y encolar los tipos nuevos, checkpoint si hubo cambio.
    /// 7. Termina cuando la cola se vacía sin tipos nuevos.
    pub fn run_with(&self,
                    process_id: &Uuid,
                    token: &CancellationToken,
                    checkpoint: &mut dyn FnMut() -> Result<()>)
                    -> Result<RunSummary> {
        let data = self.store.load_step_data(process_id)?;
        let executor = self.registry.resolve(data.process_type)?;

        let mut live: HashMap<StepTypeId, Vec<Uuid>> = data.steps_by_type;
        let mut queue: VecDeque<StepTypeId> = VecDeque::new();
        for t in executor.executable_step_types() {
            if live.contains_key(t) {
                queue.push_back(*t);
            }
        }

        let mut summary = RunSummary::default();
        let mut changed = false;

        // Los fallos de inicialización no se absorben: el proceso no puede
        // razonarse con seguridad y la corrida entera aborta.
        let existing: Vec<StepTypeId> = live.keys().copied().collect();
        let init = executor.initialize(process_id, &existing)?;
        let context = init.context;
        if init.modified {
            changed = true;
        }
        for t in init.schedule {
            if self.schedule_step(process_id, executor.as_ref(), t, &mut live, &mut queue)? {
                changed = true;
            }
        }
        if changed {
            checkpoint()?;
            summary.checkpoints += 1;
        }

        while let Some(step_type) = queue.pop_front() {
            if token.is_cancelled() {
                return Err(ProcessError::Cancelled);
            }
            let mut iter_changed = false;
            let known: Vec<StepTypeId> = live.keys().copied().collect();

            let result = match executor.execute_step(&context, step_type, &known, token) {
                Ok(r) => r,
                // Fatal: la resiliencia de negocio no debe enmascarar
                // catástrofes de infraestructura.
                Err(e @ ProcessError::Storage(_)) => return Err(e),
                Err(ProcessError::Cancelled) => return Err(ProcessError::Cancelled),
                Err(e) if e.is_recoverable() => {
                    warn!("paso {:?} del proceso {} re-encolado por fallo transitorio: {}",
                          step_type, process_id, e);
                    StepExecutionResult { modified: false,
                                          status: ProcessStepStatus::Todo,
                                          schedule: Vec::new(),
                                          skip: Vec::new(),
                                          message: Some(e.to_string()) }
                }
                Err(e) => {
                    warn!("paso {:?} del proceso {} falló: {}", step_type, process_id, e);
                    StepExecutionResult { modified: false,
                                          status: ProcessStepStatus::Failed,
                                          schedule: Vec::new(),
                                          skip: Vec::new(),
                                          message: Some(e.to_string()) }
                }
            };

            if result.modified {
                iter_changed = true;
            }

            if !result.status.is_final() {
                // No-op guard: un ejecutor no puede "resolver" un paso a su
                // propio estado inicial; el tipo sigue vivo. Sólo se anota
                // el mensaje de diagnóstico si lo hay.
                if let Some(msg) = &result.message {
                    if let Some(ids) = live.get(&step_type) {
                        if let Some(first) = ids.first() {
                            self.store.update_step(first, ProcessStepStatus::Todo, Some(msg.clone()))?;
                            iter_changed = true;
                        }
                    }
                }
            } else if self.resolve_step_type(&mut live, step_type, result.status, result.message.clone())? {
                summary.resolved.push((step_type, result.status));
                iter_changed = true;
            }

            for t in &result.skip {
                if *t != step_type
                   && self.resolve_step_type(&mut live, *t, ProcessStepStatus::Skipped, None)?
                {
                    summary.resolved.push((*t, ProcessStepStatus::Skipped));
                    iter_changed = true;
                }
            }

            for t in result.schedule {
                if self.schedule_step(process_id, executor.as_ref(), t, &mut live, &mut queue)? {
                    iter_changed = true;
                }
            }

            if iter_changed {
                checkpoint()?;
                summary.checkpoints += 1;
            }
        }

        info!("proceso {} completado: {} checkpoints, {} pasos resueltos",
              process_id,
              summary.checkpoints,
              summary.resolved.len());
        Ok(summary)
    }

    /// Planifica un tipo de paso si no está ya vivo: crea la fila `Todo` y
    /// lo encola si es ejecutable. Idempotente a nivel de tipo dentro de una
    /// corrida. Devuelve si algo cambió.
    fn schedule_step(&self,
                     process_id: &Uuid,
                     executor: &dyn ProcessTypeExecutor,
                     step_type: StepTypeId,
                     live: &mut HashMap<StepTypeId, Vec<Uuid>>,
                     queue: &mut VecDeque<StepTypeId>)
                     -> Result<bool> {
        if live.contains_key(&step_type) {
            return Ok(false);
        }
        let created = self.store.create_steps(process_id, &[step_type])?;
        live.insert(step_type, created.iter().map(|s| s.id).collect());
        if executor.is_executable_step_type(step_type)? {
            queue.push_back(step_type);
        }
        Ok(true)
    }

    /// Aplica un estado resuelto a un tipo de paso vivo: la primera fila
    /// recibe el estado real y las hermanas quedan `Duplicate`; el tipo sale
    /// del mapa vivo. Devuelve `false` si el tipo no estaba vivo.
    fn resolve_step_type(&self,
                         live: &mut HashMap<StepTypeId, Vec<Uuid>>,
                         step_type: StepTypeId,
                         status: ProcessStepStatus,
                         message: Option<String>)
                         -> Result<bool> {
        let ids = match live.remove(&step_type) {
            Some(ids) => ids,
            None => return Ok(false),
        };
        let mut iter = ids.iter();
        if let Some(first) = iter.next() {
            self.store.update_step(first, status, message)?;
        }
        for dup in iter {
            self.store.update_step(dup, ProcessStepStatus::Duplicate, None)?;
        }
        Ok(true)
    }
}
