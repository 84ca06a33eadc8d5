pub mod get_service_status;
pub mod list_services;

pub use get_service_status::{GetServiceStatusQuery, ServiceStatusResponse};
pub use list_services::{ListServicesResponse, ServiceSummary};
