//! devsvc engine
//!
//! Local service orchestration: resolves each declared service's environment, supervises its
//! OS process, probes liveness and exposes per-start log files with a live tail stream.
//!
//! The crate follows a ports-and-adapters layout:
//!
//! - `domain`: value objects, commands, ports (traits) and the use cases built on them
//! - `infrastructure`: driven adapters (tokio processes, TCP probe, file logs, JSON catalog)
//! - `application`: the `ServiceManager` composition root
//! - `adapters`: driving adapters (REST/SSE over axum)

pub mod adapters;
pub mod application;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{ManagerSettings, ServiceManager};
pub use domain::{DomainError, Result};
