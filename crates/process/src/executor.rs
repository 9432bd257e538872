// Archivo: executor.rs
// Propósito: definir el contrato `ProcessTypeExecutor` (estrategia por tipo
// de proceso), los tipos de resultado de inicialización/ejecución y el
// registro que resuelve tipo de proceso -> ejecutor.
use crate::domain::{ProcessStepStatus, ProcessTypeId, StepTypeId};
use crate::engine::CancellationToken;
use crate::errors::{ProcessError, Result};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Resultado del hook de inicialización de un ejecutor.
///
/// `context` es el estado por-proceso que el ejecutor necesita durante la
/// corrida (id del conector, BPN cacheado, etc.), como valor inmutable que
/// el motor pasa a cada llamada de paso — sin estado oculto entre llamadas.
#[derive(Debug, Clone)]
pub struct InitializationResult {
    pub modified: bool,
    /// Tipos de paso adicionales a planificar como filas `Todo` frescas.
    pub schedule: Vec<StepTypeId>,
    pub context: JsonValue,
}

impl InitializationResult {
    /// Inicialización sin cambios ni planificación adicional.
    pub fn unmodified(context: JsonValue) -> Self {
        Self { modified: false,
               schedule: Vec::new(),
               context }
    }
}

/// Resultado de ejecutar exactamente un paso.
#[derive(Debug, Clone)]
pub struct StepExecutionResult {
    /// Si el cuerpo del paso mutó estado observable (aunque el estado del
    /// paso no cambie, fuerza un checkpoint).
    pub modified: bool,
    /// Estado resuelto del paso. `Todo` se trata como no-op: el tipo sigue
    /// vivo y volverá a ejecutarse en una corrida posterior.
    pub status: ProcessStepStatus,
    /// Tipos de paso a planificar a continuación.
    pub schedule: Vec<StepTypeId>,
    /// Tipos de paso a marcar `Skipped`.
    pub skip: Vec<StepTypeId>,
    /// Mensaje de diagnóstico a registrar en la fila del paso.
    pub message: Option<String>,
}

impl StepExecutionResult {
    /// Resultado habitual: estado resuelto, sin skip ni mensaje.
    pub fn resolved(status: ProcessStepStatus, schedule: Vec<StepTypeId>) -> Self {
        Self { modified: false,
               status,
               schedule,
               skip: Vec::new(),
               message: None }
    }
}

/// Estrategia que sabe inicializar un proceso de su tipo, decidir qué tipos
/// de paso puede ejecutar y ejecutar un paso devolviendo estado + pasos
/// siguientes.
///
/// Contrato de idempotencia: `execute_step` puede volver a invocarse para el
/// mismo tipo de paso si un intento anterior murió antes de persistir su
/// resultado (semántica at-least-once). Los cuerpos deben ser idempotentes o
/// comprobar internamente si su efecto ya ocurrió.
pub trait ProcessTypeExecutor: Send + Sync {
    /// Tipo de proceso que maneja este ejecutor.
    fn process_type(&self) -> ProcessTypeId;

    /// Conjunto cerrado completo de tipos de paso que pertenecen a este
    /// tipo de proceso (ejecutables o no).
    fn step_types(&self) -> &[StepTypeId];

    /// Subconjunto de tipos de paso que este ejecutor puede correr.
    fn executable_step_types(&self) -> &[StepTypeId];

    /// Predicado defensivo: `Conflict` si se pregunta por un tipo de paso
    /// que nunca puede pertenecer a este tipo de proceso.
    fn is_executable_step_type(&self, step_type: StepTypeId) -> Result<bool> {
        if !self.step_types().contains(&step_type) {
            return Err(ProcessError::Conflict(format!("el tipo de paso {:?} no pertenece al proceso {}",
                                                      step_type,
                                                      self.process_type())));
        }
        Ok(self.executable_step_types().contains(&step_type))
    }

    /// Indica si ejecutar este tipo de paso requiere que el caller adquiera
    /// el lock optimista del recurso asociado antes de invocarlo. El motor
    /// no adquiere locks por sí mismo.
    fn is_lock_requested(&self, step_type: StepTypeId) -> Result<bool>;

    /// Carga el estado por-proceso, valida integridad referencial (el
    /// proceso existe, está ligado a la entidad de negocio correcta, los
    /// campos requeridos no están vacíos) y devuelve el contexto más los
    /// tipos de paso adicionales a planificar. Un error aquí aborta toda la
    /// corrida.
    fn initialize(&self, process_id: &Uuid, existing_step_types: &[StepTypeId]) -> Result<InitializationResult>;

    /// Ejecuta exactamente un paso. `known_step_types` son todos los tipos
    /// vivos del proceso en el momento de la llamada.
    fn execute_step(&self,
                    context: &JsonValue,
                    step_type: StepTypeId,
                    known_step_types: &[StepTypeId],
                    token: &CancellationToken)
                    -> Result<StepExecutionResult>;
}

/// Registro tipo de proceso -> ejecutor. Lookup simple por clave, sin
/// reflexión abierta.
pub struct ExecutorRegistry {
    executors: HashMap<ProcessTypeId, Arc<dyn ProcessTypeExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self { executors: HashMap::new() }
    }

    /// Registra un ejecutor bajo su propio `process_type()`.
    pub fn register(&mut self, executor: Arc<dyn ProcessTypeExecutor>) {
        self.executors.insert(executor.process_type(), executor);
    }

    /// Resuelve el ejecutor para un tipo de proceso. `NotFound` si ningún
    /// ejecutor fue registrado para ese tipo.
    pub fn resolve(&self, process_type: ProcessTypeId) -> Result<Arc<dyn ProcessTypeExecutor>> {
        self.executors
            .get(&process_type)
            .cloned()
            .ok_or_else(|| ProcessError::NotFound(format!("ejecutor para {}", process_type)))
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
