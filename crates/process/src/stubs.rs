// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// Incluye `InMemoryProcessStore` (con búfer de escrituras y contador de
// saves, útil para verificar la ley de checkpoints) y
// `InMemoryChecklistStore`. No son durables; se usan en demos y tests.
use crate::domain::{ChecklistEntry, ChecklistEntryStatus, ChecklistEntryTypeId, Process, ProcessStep,
                    ProcessStepStatus, ProcessTypeId, StepData, StepTypeId};
use crate::errors::{ProcessError, Result};
use crate::store::{ChecklistStore, ChecklistView, ProcessStore};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Escritura pendiente en el búfer del store.
#[derive(Debug, Clone)]
enum PendingWrite {
    Create(ProcessStep),
    Update {
        step_id: Uuid,
        status: ProcessStepStatus,
        message: Option<String>,
    },
}

/// Almacenamiento de procesos en memoria.
///
/// Las escrituras de pasos quedan en `pending` hasta `save_changes`, que
/// las aplica como unidad y aumenta `save_count`. Las lecturas sólo ven el
/// estado confirmado.
pub struct InMemoryProcessStore {
    processes: Mutex<HashMap<Uuid, Process>>,
    /// Pasos confirmados, en orden de inserción.
    steps: Mutex<Vec<ProcessStep>>,
    pending: Mutex<Vec<PendingWrite>>,
    saves: Mutex<usize>,
}

impl InMemoryProcessStore {
    pub fn new() -> Self {
        Self { processes: Mutex::new(HashMap::new()),
               steps: Mutex::new(Vec::new()),
               pending: Mutex::new(Vec::new()),
               saves: Mutex::new(0) }
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `ProcessError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, ProcessError> {
        m.lock().map_err(|e| ProcessError::Storage(format!("mutex poisoned: {:?}", e)))
    }

    /// Número de `save_changes` efectuados (para tests de checkpoints).
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pasos confirmados de un proceso, en orden de inserción.
    pub fn steps_of(&self, process_id: &Uuid) -> Result<Vec<ProcessStep>> {
        let steps = self.lock(&self.steps)?;
        Ok(steps.iter().filter(|s| &s.process_id == process_id).cloned().collect())
    }

    pub fn process_exists(&self, process_id: &Uuid) -> Result<bool> {
        Ok(self.lock(&self.processes)?.contains_key(process_id))
    }
}

impl Default for InMemoryProcessStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessStore for InMemoryProcessStore {
    /// Crea el proceso de inmediato (la creación no pasa por el búfer).
    fn create_process(&self, process_type: ProcessTypeId) -> Result<Process> {
        let process = Process { id: Uuid::new_v4(),
                                process_type,
                                created_at: Utc::now() };
        self.lock(&self.processes)?.insert(process.id, process.clone());
        Ok(process)
    }

    /// Agrupa por tipo las filas `Todo` confirmadas del proceso.
    fn load_step_data(&self, process_id: &Uuid) -> Result<StepData> {
        let process_type = {
            let processes = self.lock(&self.processes)?;
            processes.get(process_id)
                     .map(|p| p.process_type)
                     .ok_or_else(|| ProcessError::NotFound(format!("proceso {}", process_id)))?
        };
        let steps = self.lock(&self.steps)?;
        let mut steps_by_type: HashMap<StepTypeId, Vec<Uuid>> = HashMap::new();
        for s in steps.iter() {
            if &s.process_id == process_id && s.status == ProcessStepStatus::Todo {
                steps_by_type.entry(s.step_type).or_default().push(s.id);
            }
        }
        Ok(StepData { process_type, steps_by_type })
    }

    /// Encola la creación de filas `Todo` y devuelve las filas tal como
    /// quedarán al aplicarse el búfer.
    fn create_steps(&self, process_id: &Uuid, step_types: &[StepTypeId]) -> Result<Vec<ProcessStep>> {
        if !self.lock(&self.processes)?.contains_key(process_id) {
            return Err(ProcessError::NotFound(format!("proceso {}", process_id)));
        }
        let mut created = Vec::with_capacity(step_types.len());
        let mut pending = self.lock(&self.pending)?;
        for t in step_types {
            let step = ProcessStep { id: Uuid::new_v4(),
                                     process_id: *process_id,
                                     step_type: *t,
                                     status: ProcessStepStatus::Todo,
                                     message: None,
                                     date_last_changed: Utc::now() };
            pending.push(PendingWrite::Create(step.clone()));
            created.push(step);
        }
        Ok(created)
    }

    /// Encola la actualización de un paso. `NotFound` si el id no existe ni
    /// confirmado ni como creación pendiente.
    fn update_step(&self, step_id: &Uuid, status: ProcessStepStatus, message: Option<String>) -> Result<()> {
        let in_committed = self.lock(&self.steps)?.iter().any(|s| &s.id == step_id);
        let in_pending = self.lock(&self.pending)?
                             .iter()
                             .any(|w| matches!(w, PendingWrite::Create(s) if &s.id == step_id));
        if !in_committed && !in_pending {
            return Err(ProcessError::NotFound(format!("paso {}", step_id)));
        }
        self.lock(&self.pending)?.push(PendingWrite::Update { step_id: *step_id,
                                                              status,
                                                              message });
        Ok(())
    }

    /// Aplica el búfer en orden como una unidad y aumenta el contador.
    fn save_changes(&self) -> Result<()> {
        let writes: Vec<PendingWrite> = {
            let mut pending = self.lock(&self.pending)?;
            pending.drain(..).collect()
        };
        let mut steps = self.lock(&self.steps)?;
        for w in writes {
            match w {
                PendingWrite::Create(step) => steps.push(step),
                PendingWrite::Update { step_id, status, message } => {
                    let step = steps.iter_mut()
                                    .find(|s| s.id == step_id)
                                    .ok_or_else(|| ProcessError::Storage(format!("paso pendiente {} desapareció",
                                                                                 step_id)))?;
                    step.status = status;
                    if message.is_some() {
                        step.message = message;
                    }
                    step.date_last_changed = Utc::now();
                }
            }
        }
        drop(steps);
        *self.lock(&self.saves)? += 1;
        Ok(())
    }
}

/// Almacenamiento de checklist en memoria, ligado a un
/// `InMemoryProcessStore` para resolver subject -> proceso -> pasos.
pub struct InMemoryChecklistStore {
    entries: Mutex<HashMap<(Uuid, ChecklistEntryTypeId), ChecklistEntry>>,
    subject_process: Mutex<HashMap<Uuid, Uuid>>,
    process_store: Arc<InMemoryProcessStore>,
}

impl InMemoryChecklistStore {
    pub fn new(process_store: Arc<InMemoryProcessStore>) -> Self {
        Self { entries: Mutex::new(HashMap::new()),
               subject_process: Mutex::new(HashMap::new()),
               process_store }
    }

    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, ProcessError> {
        m.lock().map_err(|e| ProcessError::Storage(format!("mutex poisoned: {:?}", e)))
    }

    /// Liga un subject al proceso que conduce su checklist.
    pub fn link_subject(&self, subject_id: Uuid, process_id: Uuid) -> Result<()> {
        self.lock(&self.subject_process)?.insert(subject_id, process_id);
        Ok(())
    }

    /// Crea una entrada de checklist con estado inicial.
    pub fn create_entry(&self,
                        subject_id: Uuid,
                        entry_type: ChecklistEntryTypeId,
                        status: ChecklistEntryStatus)
                        -> Result<ChecklistEntry> {
        let entry = ChecklistEntry { subject_id,
                                     entry_type,
                                     status,
                                     comment: None,
                                     date_last_changed: Utc::now(),
                                     version: Uuid::new_v4() };
        self.lock(&self.entries)?.insert((subject_id, entry_type), entry.clone());
        Ok(entry)
    }

    pub fn entry(&self, subject_id: &Uuid, entry_type: ChecklistEntryTypeId) -> Result<Option<ChecklistEntry>> {
        Ok(self.lock(&self.entries)?.get(&(*subject_id, entry_type)).cloned())
    }
}

impl ChecklistStore for InMemoryChecklistStore {
    fn load_checklist_and_steps(&self,
                                subject_id: &Uuid,
                                entry_types: &[ChecklistEntryTypeId],
                                step_types: &[StepTypeId])
                                -> Result<ChecklistView> {
        let process_id = {
            let map = self.lock(&self.subject_process)?;
            map.get(subject_id)
               .copied()
               .ok_or_else(|| ProcessError::NotFound(format!("subject {} sin proceso ligado", subject_id)))?
        };
        let entries = {
            let map = self.lock(&self.entries)?;
            entry_types.iter()
                       .filter_map(|t| map.get(&(*subject_id, *t)).map(|e| (*t, e.status)))
                       .collect()
        };
        let steps = self.process_store
                        .steps_of(&process_id)?
                        .into_iter()
                        .filter(|s| step_types.contains(&s.step_type))
                        .collect();
        Ok(ChecklistView { process_id, entries, steps })
    }

    /// Aplica el mutator, sella `date_last_changed` y regenera el token de
    /// versión. La actualización es inmediata (no pasa por el búfer de
    /// pasos).
    fn update_entry(&self,
                    subject_id: &Uuid,
                    entry_type: ChecklistEntryTypeId,
                    mutator: &dyn Fn(&mut ChecklistEntry))
                    -> Result<ChecklistEntry> {
        let mut entries = self.lock(&self.entries)?;
        let entry = entries.get_mut(&(*subject_id, entry_type))
                           .ok_or_else(|| ProcessError::NotFound(format!("entrada {:?} del subject {}",
                                                                         entry_type, subject_id)))?;
        mutator(entry);
        entry.date_last_changed = Utc::now();
        entry.version = Uuid::new_v4();
        Ok(entry.clone())
    }
}
