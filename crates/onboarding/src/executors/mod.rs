// Ejecutores de referencia del portal: uno por tipo de proceso.
pub mod connector;
pub mod worklist;

pub use connector::{ConnectorContext, ConnectorRegistrationExecutor};
pub use worklist::ClearinghouseWorklistExecutor;
