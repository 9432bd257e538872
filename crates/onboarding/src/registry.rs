// Archivo: registry.rs
// Propósito: wiring del `ExecutorRegistry` con los ejecutores del portal.
use crate::clients::{ClearinghouseWorklist, ConnectorDirectory, DapsGateway, SdFactoryGateway};
use crate::executors::{ClearinghouseWorklistExecutor, ConnectorRegistrationExecutor};
use process::executor::ExecutorRegistry;
use std::sync::Arc;

/// Construye el registro con los dos ejecutores de referencia. Los gateways
/// se inyectan para que demos y tests usen fakes en memoria y producción
/// use clientes HTTP reales.
pub fn build_registry(directory: Arc<dyn ConnectorDirectory>,
                      daps: Arc<dyn DapsGateway>,
                      sd_factory: Arc<dyn SdFactoryGateway>,
                      worklist: Arc<dyn ClearinghouseWorklist>)
                      -> ExecutorRegistry {
  let mut registry = ExecutorRegistry::new();
  registry.register(Arc::new(ConnectorRegistrationExecutor::new(directory, daps, sd_factory)));
  registry.register(Arc::new(ClearinghouseWorklistExecutor::new(worklist)));
  registry
}
