// worklist.rs
//! Ejecutor de referencia #2: drenaje de la worklist del clearinghouse.
//! Un solo tipo de paso que procesa un item pendiente por invocación y se
//! re-planifica a sí mismo; termina sin planificar nada cuando la worklist
//! queda vacía.

use crate::clients::ClearinghouseWorklist;
use process::domain::{ProcessStepStatus, ProcessTypeId, StepTypeId};
use process::engine::CancellationToken;
use process::errors::{ProcessError, Result};
use process::executor::{InitializationResult, ProcessTypeExecutor, StepExecutionResult};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

const STEP_TYPES: &[StepTypeId] = &[StepTypeId::ProcessWorklistItem];

pub struct ClearinghouseWorklistExecutor {
  worklist: Arc<dyn ClearinghouseWorklist>,
}

impl ClearinghouseWorklistExecutor {
  pub fn new(worklist: Arc<dyn ClearinghouseWorklist>) -> Self {
    Self { worklist }
  }
}

impl ProcessTypeExecutor for ClearinghouseWorklistExecutor {
  fn process_type(&self) -> ProcessTypeId {
    ProcessTypeId::ClearinghouseWorklist
  }

  fn step_types(&self) -> &[StepTypeId] {
    STEP_TYPES
  }

  fn executable_step_types(&self) -> &[StepTypeId] {
    STEP_TYPES
  }

  /// El drenaje no muta ningún recurso compartido con otros workers.
  fn is_lock_requested(&self, step_type: StepTypeId) -> Result<bool> {
    self.is_executable_step_type(step_type)?;
    Ok(false)
  }

  /// No hay estado por-proceso que cargar; si el proceso aún no tiene el
  /// paso de drenaje, lo planifica.
  fn initialize(&self, _process_id: &Uuid, existing_step_types: &[StepTypeId]) -> Result<InitializationResult> {
    let mut init = InitializationResult::unmodified(json!({}));
    if !existing_step_types.contains(&StepTypeId::ProcessWorklistItem) {
      init.schedule = vec![StepTypeId::ProcessWorklistItem];
    }
    Ok(init)
  }

  /// Procesa exactamente un item. Resolver un item ya resuelto es un no-op
  /// del gateway, así que la reejecución tras una caída es segura.
  fn execute_step(&self,
                  _context: &JsonValue,
                  step_type: StepTypeId,
                  _known_step_types: &[StepTypeId],
                  _token: &CancellationToken)
                  -> Result<StepExecutionResult> {
    if step_type != StepTypeId::ProcessWorklistItem {
      return Err(ProcessError::Conflict(format!("el tipo de paso {:?} no pertenece a la worklist", step_type)));
    }
    match self.worklist.next_pending()? {
      Some(item) => {
        self.worklist.resolve(&item)?;
        Ok(StepExecutionResult { modified: true,
                                 status: ProcessStepStatus::Done,
                                 schedule: vec![StepTypeId::ProcessWorklistItem],
                                 skip: Vec::new(),
                                 message: Some(format!("item {} resuelto", item.id)) })
      }
      None => Ok(StepExecutionResult { modified: false,
                                       status: ProcessStepStatus::Done,
                                       schedule: Vec::new(),
                                       skip: Vec::new(),
                                       message: Some("worklist vacía".into()) }),
    }
  }
}
