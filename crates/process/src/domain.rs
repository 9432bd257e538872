// Archivo: domain.rs
// Propósito: tipos de dominio del motor de procesos: `Process`,
// `ProcessStep`, los enums de estado y los identificadores de tipo de
// proceso/paso/entrada de checklist.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identificador del tipo de proceso. Selecciona qué `ProcessTypeExecutor`
/// es responsable de los pasos del proceso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessTypeId {
    /// Registro de un conector: autenticación DAPS + self-description.
    ConnectorRegistration,
    /// Checklist de activación de una solicitud de empresa.
    ApplicationChecklist,
    /// Drenaje de la worklist del clearinghouse, un item por paso.
    ClearinghouseWorklist,
}

impl fmt::Display for ProcessTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessTypeId::ConnectorRegistration => "connector_registration",
            ProcessTypeId::ApplicationChecklist => "application_checklist",
            ProcessTypeId::ClearinghouseWorklist => "clearinghouse_worklist",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ProcessTypeId {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "connector_registration" => Ok(ProcessTypeId::ConnectorRegistration),
            "application_checklist" => Ok(ProcessTypeId::ApplicationChecklist),
            "clearinghouse_worklist" => Ok(ProcessTypeId::ClearinghouseWorklist),
            _ => Err(()),
        }
    }
}

/// Identificador del tipo de paso. El significado concreto depende del tipo
/// de proceso; el conjunto es cerrado y global para que el almacenamiento
/// pueda indexar por tipo sin conocer el ejecutor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTypeId {
    /// Solicitar credenciales de autenticación (DAPS) para un conector.
    CallAuth,
    /// Registrar la self-description del conector (SD-Factory).
    StartRegister,
    /// Procesar un item pendiente de la worklist del clearinghouse.
    ProcessWorklistItem,
    /// Verificar los datos de registro de la solicitud.
    VerifyRegistration,
    /// Disparar la comprobación en el clearinghouse.
    StartClearinghouse,
    /// Esperar el resultado asíncrono del clearinghouse.
    AwaitClearinghouseResult,
    /// Crear la identity wallet de la empresa.
    CreateIdentityWallet,
    /// Activar la solicitud una vez completado el checklist.
    ActivateApplication,
}

/// Estado de un `ProcessStep`.
///
/// `Todo` es el único estado ejecutable; `Duplicate` marca filas hermanas
/// redundantes del mismo tipo cuando la primera se resuelve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStepStatus {
    Todo,
    Done,
    Failed,
    Skipped,
    Duplicate,
}

impl ProcessStepStatus {
    /// Un estado es final cuando el paso ya no volverá a ejecutarse.
    pub fn is_final(&self) -> bool {
        !matches!(self, ProcessStepStatus::Todo)
    }
}

/// Un proceso: instancia de una operación de negocio multi-paso.
/// Inmutable tras su creación; sólo sus pasos cambian.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: Uuid,
    pub process_type: ProcessTypeId,
    pub created_at: DateTime<Utc>,
}

/// Una unidad de trabajo dentro de un proceso. Las filas nunca se borran:
/// el historial se conserva marcando estados terminales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStep {
    pub id: Uuid,
    pub process_id: Uuid,
    pub step_type: StepTypeId,
    pub status: ProcessStepStatus,
    /// Mensaje libre de diagnóstico/fallo.
    pub message: Option<String>,
    pub date_last_changed: DateTime<Utc>,
}

/// Vista que el almacenamiento devuelve al motor: el tipo del proceso y los
/// ids de sus pasos pendientes (`Todo`) agrupados por tipo de paso.
#[derive(Debug, Clone)]
pub struct StepData {
    pub process_type: ProcessTypeId,
    pub steps_by_type: HashMap<StepTypeId, Vec<Uuid>>,
}

/// Tipo de una entrada del checklist de onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistEntryTypeId {
    Registration,
    BusinessPartnerNumber,
    Clearinghouse,
    IdentityWallet,
    SelfDescription,
}

/// Estado de una entrada del checklist. `Done` y `Failed` son terminales;
/// una entrada `Failed` sólo vuelve a `ToDo` vía retrigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistEntryStatus {
    ToDo,
    InProgress,
    Done,
    Failed,
}

/// Una entrada del checklist, emparejada 1:1 con el proceso que conduce su
/// compleción. Identidad compuesta: (subject_id, entry_type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub subject_id: Uuid,
    pub entry_type: ChecklistEntryTypeId,
    pub status: ChecklistEntryStatus,
    pub comment: Option<String>,
    pub date_last_changed: DateTime<Utc>,
    /// Token de concurrencia optimista; regenerado en cada actualización.
    pub version: Uuid,
}
