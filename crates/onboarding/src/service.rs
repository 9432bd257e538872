// Archivo: service.rs
// Propósito: implementar `OnboardingService`, una capa orquestadora que
// expone operaciones de alto nivel sobre procesos del portal (aprovisionar
// un proceso con sus pasos iniciales, correrlo hasta su punto de
// suspensión). Esta capa debe ser invocada desde handlers HTTP o desde
// workers.
use crate::errors::OnboardingError;
use log::info;
use process::domain::{Process, ProcessTypeId, StepTypeId};
use process::engine::{CancellationToken, ProcessExecutor, RunSummary};
use process::executor::ExecutorRegistry;
use process::store::ProcessStore;
use std::sync::Arc;
use uuid::Uuid;

/// Servicio de alto nivel sobre el motor y el almacenamiento de procesos.
pub struct OnboardingService<S>
  where S: ProcessStore
{
  store: Arc<S>,
  engine: ProcessExecutor<S>,
}

impl<S> OnboardingService<S> where S: ProcessStore
{
  /// Crea el servicio inyectando el `ProcessStore` y el registro de
  /// ejecutores. El `ProcessExecutor` se construye internamente y se reusa.
  pub fn new(store: Arc<S>, registry: Arc<ExecutorRegistry>) -> Self {
    let engine = ProcessExecutor::new(store.clone(), registry);
    Self { store, engine }
  }

  /// Aprovisiona un proceso nuevo con sus filas de paso iniciales en `Todo`
  /// y las persiste de inmediato.
  pub fn provision_process(&self,
                           process_type: ProcessTypeId,
                           initial_step_types: &[StepTypeId])
                           -> Result<Process, OnboardingError> {
    if initial_step_types.is_empty() {
      return Err(OnboardingError::Validation("un proceso necesita al menos un paso inicial".into()));
    }
    let process = self.store.create_process(process_type)?;
    self.store.create_steps(&process.id, initial_step_types)?;
    self.store.save_changes()?;
    info!("proceso {} de tipo {} aprovisionado con {} pasos",
          process.id,
          process_type,
          initial_step_types.len());
    Ok(process)
  }

  /// Corre el proceso hasta que su cola se vacía, persistiendo en cada
  /// checkpoint.
  pub fn run(&self, process_id: &Uuid, token: &CancellationToken) -> Result<RunSummary, OnboardingError> {
    Ok(self.engine.run(process_id, token)?)
  }
}
