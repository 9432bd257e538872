//! Crate `process` — motor genérico de ejecución de procesos por pasos
//!
//! Este crate define los tipos de dominio (`Process`, `ProcessStep`,
//! `ChecklistEntry`), los contratos de persistencia `ProcessStore` y
//! `ChecklistStore`, el contrato de estrategia `ProcessTypeExecutor` con su
//! registro, el motor `ProcessExecutor` y el `ChecklistCoordinator`.
//! Incluye implementaciones en memoria útiles para pruebas (`stubs`).
//!
//! Diseño resumido:
//! - Avance incremental: el motor ejecuta un paso a la vez y emite una señal
//!   de checkpoint tras cada cambio de estado; el caller persiste antes de
//!   continuar, de modo que una caída deja el proceso reanudable.
//! - Idempotencia: un paso puede reejecutarse tras una caída entre su efecto
//!   y el persist del checkpoint; los cuerpos deben tolerarlo.
//! - Exclusión mutua: los recursos compartidos se serializan con un
//!   `OptimisticLock` de versión + expiración adquirido por el caller según
//!   `is_lock_requested`, nunca por el motor.
//!
//! Ejemplo rápido:
//! ```rust
//! use process::stubs::InMemoryProcessStore;
//! use process::{ExecutorRegistry, ProcessExecutor};
//! use std::sync::Arc;
//! let store = Arc::new(InMemoryProcessStore::new());
//! let registry = Arc::new(ExecutorRegistry::new());
//! let engine = ProcessExecutor::new(store, registry);
//! ```
pub mod checklist;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod lock;
pub mod store;
pub mod stubs;

pub use checklist::*;
pub use domain::*;
pub use engine::*;
pub use errors::*;
pub use executor::*;
pub use lock::*;
pub use store::*;
