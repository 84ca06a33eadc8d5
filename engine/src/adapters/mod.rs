//! Driving Adapters Layer
//!
//! This module contains the "driving" or "primary" adapters.
//! These adapters drive the application by accepting external requests and translating
//! them into domain commands/queries.
//!
//! ## Available Adapters
//!
//! - **REST**: HTTP API with JSON bodies and a Server-Sent Events log stream
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devsvc_engine::adapters::rest::build_router;
//! use devsvc_engine::infrastructure::{production_adapters, FileConfigStore};
//! use devsvc_engine::{ManagerSettings, ServiceManager};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = Arc::new(FileConfigStore::new("./config/services.json"));
//! let manager = Arc::new(ServiceManager::new(
//!     production_adapters(store, "./logs"),
//!     ManagerSettings::default(),
//! ));
//!
//! let rest_router = build_router(manager);
//! # }
//! ```

pub mod rest;
