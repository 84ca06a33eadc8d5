pub mod catalog;
pub mod health_check;
pub mod log_event;
pub mod run_handle;
pub mod service_spec;
pub mod service_state;

pub use catalog::{BasePaths, Catalog};
pub use health_check::{HealthCheck, HealthStatus, Liveness};
pub use log_event::{LogChunk, LogStreamEvent};
pub use run_handle::RunHandle;
pub use service_spec::ServiceSpec;
pub use service_state::ServiceState;
