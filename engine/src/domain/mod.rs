pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;
pub mod use_cases;
pub mod value_objects;

pub use commands::{
    RestartServiceCommand, RestartServiceResponse, StartServiceCommand, StartServiceResponse,
    StopServiceCommand, StopServiceResponse,
};
pub use error::{DomainError, Result};
pub use queries::{
    GetServiceStatusQuery, ListServicesResponse, ServiceStatusResponse, ServiceSummary,
};
pub use value_objects::{
    BasePaths, Catalog, HealthCheck, HealthStatus, Liveness, LogChunk, LogStreamEvent,
    RunHandle, ServiceSpec, ServiceState,
};
