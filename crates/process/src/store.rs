// Archivo: store.rs
// Propósito: definir los traits `ProcessStore` y `ChecklistStore`. Describen
// el contrato que deben implementar las persistencias (Postgres, in-memory,
// etc.); las escrituras quedan en búfer hasta `save_changes`.
use crate::domain::{ChecklistEntry, ChecklistEntryStatus, ChecklistEntryTypeId, Process, ProcessStep,
                    ProcessStepStatus, ProcessTypeId, StepData, StepTypeId};
use crate::errors::Result;
use std::collections::HashMap;
use uuid::Uuid;

/// Contrato mínimo del almacenamiento de procesos y pasos.
///
/// Semántica de escrituras: `create_steps` y `update_step` se acumulan en un
/// búfer y sólo se vuelven visibles tras `save_changes`. El motor emite una
/// señal de checkpoint cada vez que su estado cambió; el caller decide el
/// momento de persistir (típicamente inmediatamente tras cada señal).
pub trait ProcessStore: Send + Sync {
    /// Crea un nuevo proceso del tipo dado. El repositorio genera el id.
    /// La creación del proceso es inmediata (no pasa por el búfer).
    fn create_process(&self, process_type: ProcessTypeId) -> Result<Process>;

    /// Carga el tipo del proceso y sus pasos pendientes (`Todo`) agrupados
    /// por tipo de paso. Retorna `NotFound` si el proceso no existe.
    fn load_step_data(&self, process_id: &Uuid) -> Result<StepData>;

    /// Crea filas de paso en estado `Todo` para los tipos dados. Devuelve
    /// las filas creadas para que el caller las rastree.
    fn create_steps(&self, process_id: &Uuid, step_types: &[StepTypeId]) -> Result<Vec<ProcessStep>>;

    /// Actualiza el estado y el mensaje de diagnóstico de un paso.
    fn update_step(&self, step_id: &Uuid, status: ProcessStepStatus, message: Option<String>) -> Result<()>;

    /// Aplica todas las escrituras en búfer como una unidad persistida.
    fn save_changes(&self) -> Result<()>;
}

/// Vista combinada que `ChecklistStore` devuelve en una sola lectura: los
/// estados de las entradas pedidas, el proceso ligado al subject y sus
/// pasos de los tipos pedidos.
#[derive(Debug, Clone)]
pub struct ChecklistView {
    pub process_id: Uuid,
    pub entries: HashMap<ChecklistEntryTypeId, ChecklistEntryStatus>,
    pub steps: Vec<ProcessStep>,
}

/// Contrato del almacenamiento de entradas de checklist.
pub trait ChecklistStore: Send + Sync {
    /// Carga en una lectura los estados de las entradas y los pasos del
    /// proceso ligado al subject. Retorna `NotFound` si el subject no puede
    /// resolverse a un proceso.
    fn load_checklist_and_steps(&self,
                                subject_id: &Uuid,
                                entry_types: &[ChecklistEntryTypeId],
                                step_types: &[StepTypeId])
                                -> Result<ChecklistView>;

    /// Aplica `mutator` sobre la entrada y regenera su token de versión.
    /// Devuelve la entrada resultante. `NotFound` si la entrada no existe.
    fn update_entry(&self,
                    subject_id: &Uuid,
                    entry_type: ChecklistEntryTypeId,
                    mutator: &dyn Fn(&mut ChecklistEntry))
                    -> Result<ChecklistEntry>;
}
