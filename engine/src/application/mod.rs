pub mod service_manager;

pub use service_manager::{Adapters, ManagerSettings, ServiceManager};
