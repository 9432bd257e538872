// Archivo: errors.rs
// Propósito: definir los errores del dominio de procesos y el alias Result<T>
// usado por las APIs del crate.
use thiserror::Error;

/// Errores comunes del dominio de procesos.
///
/// La taxonomía distingue fallos recuperables (transitorios, el paso vuelve a
/// `Todo`) de fallos terminales (el paso queda `Failed`). Los errores de
/// almacenamiento se consideran fatales y nunca son absorbidos por el guard
/// por-paso del motor.
#[derive(Error, Debug)]
pub enum ProcessError {
  /// Entidad no encontrada (proceso, entrada de checklist o entidad ligada).
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Precondición violada (estado incorrecto, invariante de un-solo-TODO
  /// roto, campo requerido vacío).
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Fallo transitorio de un servicio externo; el paso debe re-encolarse.
  #[error("Servicio no disponible: {0}")]
  Service(String),
  /// Fallo terminal durante la ejecución de un paso.
  #[error("Error de ejecución: {0}")]
  Execution(String),
  /// Error de almacenamiento (BD, mutex envenenado). Fatal: se propaga.
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  /// La ejecución fue cancelada cooperativamente vía token.
  #[error("Cancelado")]
  Cancelled,
}

impl ProcessError {
  /// Indica si el error se clasifica como recuperable: el guard del motor y
  /// el mapeo de errores del checklist re-encolan el paso a `Todo` en vez de
  /// marcarlo `Failed`.
  pub fn is_recoverable(&self) -> bool {
    matches!(self, ProcessError::Service(_))
  }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, ProcessError>;
