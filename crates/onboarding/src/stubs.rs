// Archivo: stubs.rs
// Propósito: fakes en memoria de los gateways externos, para demos y tests.
// No son durables ni hablan HTTP; respetan los contratos de idempotencia de
// `clients.rs`.
use crate::clients::{AuthRequest, ClearinghouseWorklist, ConnectorDirectory, ConnectorInfo, DapsGateway,
                     SdFactoryGateway, SdRegistration, WorklistItem};
use process::errors::{ProcessError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

/// Directorio de conectores en memoria: proceso -> conector.
pub struct InMemoryConnectorDirectory {
  connectors: Mutex<HashMap<Uuid, ConnectorInfo>>,
}

impl InMemoryConnectorDirectory {
  pub fn new() -> Self {
    Self { connectors: Mutex::new(HashMap::new()) }
  }

  /// Liga un proceso de registro a su conector.
  pub fn register(&self, process_id: Uuid, info: ConnectorInfo) {
    self.connectors.lock().unwrap_or_else(|e| e.into_inner()).insert(process_id, info);
  }
}

impl Default for InMemoryConnectorDirectory {
  fn default() -> Self {
    Self::new()
  }
}

impl ConnectorDirectory for InMemoryConnectorDirectory {
  fn connector_for_process(&self, process_id: &Uuid) -> Result<ConnectorInfo> {
    self.connectors
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(process_id)
        .cloned()
        .ok_or_else(|| ProcessError::NotFound(format!("conector para el proceso {}", process_id)))
  }
}

/// Respuesta programada de un gateway fake.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
  /// La operación tiene éxito (credenciales concedidas / registro ok).
  Grant,
  /// El servicio responde negativamente (fallo de negocio, no excepción).
  Deny,
  /// Fallo transitorio: se mapea a `ProcessError::Service`.
  Transient(String),
  /// Fallo terminal: se mapea a `ProcessError::Execution`.
  Fault(String),
}

/// DAPS fake con respuesta programable y contador de llamadas.
pub struct FakeDapsGateway {
  response: Mutex<ScriptedResponse>,
  calls: Mutex<usize>,
}

impl FakeDapsGateway {
  pub fn new(response: ScriptedResponse) -> Self {
    Self { response: Mutex::new(response),
           calls: Mutex::new(0) }
  }

  pub fn set_response(&self, response: ScriptedResponse) {
    *self.response.lock().unwrap_or_else(|e| e.into_inner()) = response;
  }

  pub fn call_count(&self) -> usize {
    *self.calls.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl DapsGateway for FakeDapsGateway {
  fn request_auth(&self, _request: &AuthRequest) -> Result<bool> {
    *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    match self.response.lock().unwrap_or_else(|e| e.into_inner()).clone() {
      ScriptedResponse::Grant => Ok(true),
      ScriptedResponse::Deny => Ok(false),
      ScriptedResponse::Transient(msg) => Err(ProcessError::Service(msg)),
      ScriptedResponse::Fault(msg) => Err(ProcessError::Execution(msg)),
    }
  }
}

/// SD-Factory fake: registra en memoria y es idempotente por connector_id.
pub struct FakeSdFactory {
  response: Mutex<ScriptedResponse>,
  registered: Mutex<HashSet<Uuid>>,
}

impl FakeSdFactory {
  pub fn new(response: ScriptedResponse) -> Self {
    Self { response: Mutex::new(response),
           registered: Mutex::new(HashSet::new()) }
  }

  pub fn is_registered(&self, connector_id: &Uuid) -> bool {
    self.registered.lock().unwrap_or_else(|e| e.into_inner()).contains(connector_id)
  }
}

impl SdFactoryGateway for FakeSdFactory {
  fn register_self_description(&self, request: &SdRegistration) -> Result<()> {
    match self.response.lock().unwrap_or_else(|e| e.into_inner()).clone() {
      ScriptedResponse::Grant | ScriptedResponse::Deny => {
        // Insert en HashSet: registrar dos veces es un no-op.
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request.connector_id);
        Ok(())
      }
      ScriptedResponse::Transient(msg) => Err(ProcessError::Service(msg)),
      ScriptedResponse::Fault(msg) => Err(ProcessError::Execution(msg)),
    }
  }
}

/// Worklist fake: cola de items pendientes y lista de resueltos.
pub struct InMemoryWorklist {
  pending: Mutex<VecDeque<WorklistItem>>,
  resolved: Mutex<Vec<WorklistItem>>,
}

impl InMemoryWorklist {
  pub fn new() -> Self {
    Self { pending: Mutex::new(VecDeque::new()),
           resolved: Mutex::new(Vec::new()) }
  }

  pub fn push(&self, item: WorklistItem) {
    self.pending.lock().unwrap_or_else(|e| e.into_inner()).push_back(item);
  }

  pub fn resolved_count(&self) -> usize {
    self.resolved.lock().unwrap_or_else(|e| e.into_inner()).len()
  }
}

impl Default for InMemoryWorklist {
  fn default() -> Self {
    Self::new()
  }
}

impl ClearinghouseWorklist for InMemoryWorklist {
  fn next_pending(&self) -> Result<Option<WorklistItem>> {
    Ok(self.pending.lock().unwrap_or_else(|e| e.into_inner()).front().cloned())
  }

  fn resolve(&self, item: &WorklistItem) -> Result<()> {
    let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
    let before = pending.len();
    pending.retain(|i| i.id != item.id);
    if pending.len() < before {
      self.resolved.lock().unwrap_or_else(|e| e.into_inner()).push(item.clone());
    }
    // Si el item ya no estaba pendiente, resolverlo de nuevo es un no-op.
    Ok(())
  }
}
