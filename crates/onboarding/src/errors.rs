// Archivo: errors.rs
// Propósito: definir los errores de la capa de onboarding del portal:
// errores del motor de procesos envueltos vía `#[from]` y validaciones
// locales del servicio.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OnboardingError {
  /// Errores originados por el motor/almacenamiento de procesos.
  #[error("Error de proceso: {0}")]
  Process(#[from] process::errors::ProcessError),

  /// Errores de validación local (por ejemplo wiring incompleto).
  #[error("Error de validación: {0}")]
  Validation(String),
}
