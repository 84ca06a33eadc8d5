//! Catalog value objects
//! The snapshot of base paths and service declarations a ConfigStore hands out

use super::ServiceSpec;
use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named root directories referenced by `${basePaths.KEY}` templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasePaths(BTreeMap<String, String>);

impl BasePaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<String>) {
        self.0.insert(key.into(), path.into());
    }

    pub fn with(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.insert(key, path);
        self
    }
}

/// Full catalog: base paths plus services keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub base_paths: BasePaths,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,

    /// Top-level sections other tools keep in the same file
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Catalog {
    pub fn new(base_paths: BasePaths) -> Self {
        Self {
            base_paths,
            ..Self::default()
        }
    }

    pub fn with_service(mut self, name: impl Into<String>, spec: ServiceSpec) -> Self {
        self.services.insert(name.into(), spec);
        self
    }

    /// Look up a service by name
    pub fn service(&self, name: &str) -> Result<&ServiceSpec, DomainError> {
        self.services
            .get(name)
            .ok_or_else(|| DomainError::UnknownService(name.to_string()))
    }

    /// Check that every service name can double as a log directory name
    pub fn validate(&self) -> Result<(), DomainError> {
        for name in self.services.keys() {
            if name.trim().is_empty() {
                return Err(DomainError::InvalidCatalog(
                    "service name cannot be empty".to_string(),
                ));
            }
            if name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(DomainError::InvalidCatalog(format!(
                    "service name '{}' cannot contain path separators",
                    name
                )));
            }
        }
        Ok(())
    }
}
