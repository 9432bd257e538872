// Archivo: clients.rs
// Propósito: contratos estrechos hacia los sistemas externos que invocan
// los ejecutores de referencia (emisión de credenciales estilo DAPS,
// registro de self-description, worklist del clearinghouse). Las
// implementaciones HTTP concretas viven fuera de este core; los fallos
// deben aflorar como `ProcessError::Service` (transitorio) o
// `ProcessError::Execution` (terminal).
use process::errors::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Datos del conector que un proceso de registro necesita.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorInfo {
  pub connector_id: Uuid,
  pub client_id: String,
  pub business_partner_number: String,
}

/// Petición de emisión de credenciales para un conector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
  pub client_id: String,
  pub business_partner_number: String,
}

/// Petición de registro de la self-description de un conector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdRegistration {
  pub connector_id: Uuid,
  pub business_partner_number: String,
}

/// Un item pendiente de la worklist del clearinghouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistItem {
  pub id: Uuid,
  pub business_partner_number: String,
}

/// Resolución del conector ligado a un proceso de registro.
pub trait ConnectorDirectory: Send + Sync {
  /// `NotFound` si el proceso no está ligado a ningún conector.
  fn connector_for_process(&self, process_id: &Uuid) -> Result<ConnectorInfo>;
}

/// Emisión de credenciales de autenticación (DAPS).
///
/// Contrato de idempotencia: volver a pedir credenciales para un conector
/// que ya las tiene debe devolver `true` sin efecto adicional.
pub trait DapsGateway: Send + Sync {
  fn request_auth(&self, request: &AuthRequest) -> Result<bool>;
}

/// Registro de la self-description (SD-Factory). Idempotente: registrar dos
/// veces la misma self-description no duplica nada.
pub trait SdFactoryGateway: Send + Sync {
  fn register_self_description(&self, request: &SdRegistration) -> Result<()>;
}

/// Worklist del clearinghouse: entrega un item pendiente a la vez.
pub trait ClearinghouseWorklist: Send + Sync {
  /// Siguiente item pendiente, `None` si la worklist está vacía.
  fn next_pending(&self) -> Result<Option<WorklistItem>>;

  /// Resuelve un item. Resolver dos veces el mismo item es un no-op.
  fn resolve(&self, item: &WorklistItem) -> Result<()>;
}
