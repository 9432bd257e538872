// Archivo: lock.rs
// Propósito: lock optimista `{version, locked_until}` para serializar
// workers sobre un mismo recurso sin lock exclusivo de base de datos.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lock optimista adjuntable por composición a cualquier agregado.
///
/// Un recurso está bloqueado sii `locked_until` está presente y en el
/// futuro. La adquisición falla cerrada (devuelve `false`, sin mutación) si
/// ya está bloqueado; liberar sin lock es un no-op exitoso. El token
/// `version` se regenera en cada transición exitosa, de modo que una
/// escritura condicionada a la versión detecta cualquier lock/unlock
/// intermedio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimisticLock {
    pub version: Uuid,
    pub locked_until: Option<DateTime<Utc>>,
}

impl OptimisticLock {
    /// Crea un lock libre con un token de versión inicial.
    pub fn new() -> Self {
        Self { version: Uuid::new_v4(),
               locked_until: None }
    }

    /// Indica si el recurso está bloqueado en el instante `now`.
    /// Un lock con expiración pasada cuenta como libre: la expiración acota
    /// cuánto tiempo puede retener el lock un worker colgado.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    /// Intenta adquirir el lock hasta `until`.
    ///
    /// Devuelve `false` sin mutar nada si el recurso ya está bloqueado y no
    /// expirado. En caso de éxito fija la expiración y regenera la versión.
    pub fn try_lock(&mut self, until: DateTime<Utc>) -> bool {
        if self.is_locked(Utc::now()) {
            return false;
        }
        self.locked_until = Some(until);
        self.version = Uuid::new_v4();
        true
    }

    /// Libera el lock. Si no estaba bloqueado es un no-op exitoso y la
    /// versión no cambia; si lo estaba, limpia la expiración y regenera la
    /// versión. Devuelve si hubo liberación efectiva.
    pub fn release(&mut self) -> bool {
        if self.locked_until.is_none() {
            return false;
        }
        self.locked_until = None;
        self.version = Uuid::new_v4();
        true
    }
}

impl Default for OptimisticLock {
    fn default() -> Self {
        Self::new()
    }
}
