// connector.rs
//! Ejecutor de referencia #1: registro de un conector.
//! Dos tipos de paso secuenciales, ambos con lock solicitado sobre el
//! conector: `CallAuth` pide credenciales al DAPS y, si tienen éxito,
//! planifica `StartRegister`, que registra la self-description.

use crate::clients::{AuthRequest, ConnectorDirectory, DapsGateway, SdFactoryGateway, SdRegistration};
use process::domain::{ProcessStepStatus, ProcessTypeId, StepTypeId};
use process::engine::CancellationToken;
use process::errors::{ProcessError, Result};
use process::executor::{InitializationResult, ProcessTypeExecutor, StepExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

const STEP_TYPES: &[StepTypeId] = &[StepTypeId::CallAuth, StepTypeId::StartRegister];

/// Contexto por-proceso cargado en `initialize` y enhebrado a cada paso.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorContext {
  pub connector_id: Uuid,
  pub client_id: String,
  pub business_partner_number: String,
}

pub struct ConnectorRegistrationExecutor {
  directory: Arc<dyn ConnectorDirectory>,
  daps: Arc<dyn DapsGateway>,
  sd_factory: Arc<dyn SdFactoryGateway>,
}

impl ConnectorRegistrationExecutor {
  pub fn new(directory: Arc<dyn ConnectorDirectory>,
             daps: Arc<dyn DapsGateway>,
             sd_factory: Arc<dyn SdFactoryGateway>)
             -> Self {
    Self { directory, daps, sd_factory }
  }

  fn context_from(&self, value: &JsonValue) -> Result<ConnectorContext> {
    serde_json::from_value(value.clone())
      .map_err(|e| ProcessError::Execution(format!("contexto de conector inválido: {}", e)))
  }
}

impl ProcessTypeExecutor for ConnectorRegistrationExecutor {
  fn process_type(&self) -> ProcessTypeId {
    ProcessTypeId::ConnectorRegistration
  }

  fn step_types(&self) -> &[StepTypeId] {
    STEP_TYPES
  }

  fn executable_step_types(&self) -> &[StepTypeId] {
    STEP_TYPES
  }

  /// Ambos pasos mutan el registro del conector: el caller debe sostener el
  /// lock optimista del conector mientras los ejecuta.
  fn is_lock_requested(&self, step_type: StepTypeId) -> Result<bool> {
    self.is_executable_step_type(step_type)?;
    Ok(true)
  }

  /// Carga el conector ligado al proceso y valida integridad referencial:
  /// el proceso debe resolver a un conector con BPN no vacío.
  fn initialize(&self, process_id: &Uuid, _existing_step_types: &[StepTypeId]) -> Result<InitializationResult> {
    let info = self.directory.connector_for_process(process_id)?;
    if info.business_partner_number.trim().is_empty() {
      return Err(ProcessError::Conflict(format!("el conector {} no tiene BPN asignado", info.connector_id)));
    }
    if info.client_id.trim().is_empty() {
      return Err(ProcessError::Conflict(format!("el conector {} no tiene client_id asignado", info.connector_id)));
    }
    let context = serde_json::to_value(ConnectorContext { connector_id: info.connector_id,
                                                          client_id: info.client_id,
                                                          business_partner_number:
                                                            info.business_partner_number })
      .map_err(|e| ProcessError::Execution(format!("no se pudo serializar el contexto: {}", e)))?;
    Ok(InitializationResult::unmodified(context))
  }

  fn execute_step(&self,
                  context: &JsonValue,
                  step_type: StepTypeId,
                  _known_step_types: &[StepTypeId],
                  _token: &CancellationToken)
                  -> Result<StepExecutionResult> {
    let ctx = self.context_from(context)?;
    match step_type {
      StepTypeId::CallAuth => {
        let granted = self.daps.request_auth(&AuthRequest { client_id: ctx.client_id.clone(),
                                                            business_partner_number:
                                                              ctx.business_partner_number.clone() })?;
        if granted {
          Ok(StepExecutionResult { modified: true,
                                   status: ProcessStepStatus::Done,
                                   schedule: vec![StepTypeId::StartRegister],
                                   skip: Vec::new(),
                                   message: None })
        } else {
          Ok(StepExecutionResult { modified: false,
                                   status: ProcessStepStatus::Failed,
                                   schedule: Vec::new(),
                                   skip: Vec::new(),
                                   message: Some(format!("el DAPS rechazó las credenciales de {}",
                                                         ctx.client_id)) })
        }
      }
      StepTypeId::StartRegister => {
        self.sd_factory
            .register_self_description(&SdRegistration { connector_id: ctx.connector_id,
                                                         business_partner_number:
                                                           ctx.business_partner_number.clone() })?;
        Ok(StepExecutionResult { modified: true,
                                 status: ProcessStepStatus::Done,
                                 schedule: Vec::new(),
                                 skip: Vec::new(),
                                 message: None })
      }
      other => Err(ProcessError::Conflict(format!("el tipo de paso {:?} no pertenece al registro de conectores",
                                                  other))),
    }
  }
}
