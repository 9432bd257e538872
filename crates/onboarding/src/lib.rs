//! Crate `onboarding` — capa del portal sobre el motor de procesos
//!
//! Define los contratos hacia los sistemas externos (`clients`), los dos
//! ejecutores de referencia (registro de conector y drenaje de la worklist
//! del clearinghouse), el wiring del registro de ejecutores y un servicio
//! orquestador de alto nivel. Los fakes en memoria de `stubs` permiten
//! correr demos y tests sin ningún sistema externo.
pub mod clients;
pub mod errors;
pub mod executors;
pub mod registry;
pub mod service;
pub mod stubs;

pub use errors::OnboardingError;
pub use registry::build_registry;
pub use service::OnboardingService;
