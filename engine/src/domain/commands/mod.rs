pub mod restart_service;
pub mod start_service;
pub mod stop_service;

pub use restart_service::{RestartServiceCommand, RestartServiceResponse};
pub use start_service::{StartServiceCommand, StartServiceResponse};
pub use stop_service::{StopServiceCommand, StopServiceResponse};
