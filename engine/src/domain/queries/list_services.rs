//! ListServices Query

use serde::Serialize;

/// Catalog entry summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub port: Option<u16>,
    pub description: Option<String>,
}

/// Response from listing services, sorted by name
#[derive(Debug, Clone, Serialize)]
pub struct ListServicesResponse {
    pub services: Vec<ServiceSummary>,
}
