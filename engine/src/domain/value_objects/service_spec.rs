//! ServiceSpec value object
//! One entry of the service catalog, exactly as declared in the JSON config

use crate::constants::service::{DEFAULT_GIT_AUTO_PULL, LISTENER_TYPE};
use serde::{Deserialize, Serialize};

/// Declaration of a single service
///
/// The service name is the catalog key and is not repeated inside the object.
/// Path-like fields may contain `~` and `${basePaths.KEY}` templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_command: Option<String>,

    /// Absent means "pull"; an explicit `false` disables the pull
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_auto_pull: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Fields the orchestrator does not interpret, written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServiceSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Launch line, ignoring blank values
    pub fn launch_command(&self) -> Option<&str> {
        non_blank(self.command.as_deref())
    }

    pub fn stop_command(&self) -> Option<&str> {
        non_blank(self.stop_command.as_deref())
    }

    pub fn build_command(&self) -> Option<&str> {
        non_blank(self.build.as_deref())
    }

    pub fn health_command(&self) -> Option<&str> {
        non_blank(self.health_command.as_deref())
    }

    pub fn git_auto_pull(&self) -> bool {
        self.git_auto_pull.unwrap_or(DEFAULT_GIT_AUTO_PULL)
    }

    /// Bare background listener: no port, no health signal
    pub fn is_listener(&self) -> bool {
        self.service_type.as_deref() == Some(LISTENER_TYPE)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    pub fn with_stop_command(mut self, stop_command: impl Into<String>) -> Self {
        self.stop_command = Some(stop_command.into());
        self
    }

    pub fn with_health_command(mut self, health_command: impl Into<String>) -> Self {
        self.health_command = Some(health_command.into());
        self
    }

    pub fn with_git_auto_pull(mut self, enabled: bool) -> Self {
        self.git_auto_pull = Some(enabled);
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_fields() {
        let json = r#"{
            "type": "database",
            "port": 6379,
            "path": "~/redis",
            "command": "redis-server",
            "stopCommand": "redis-cli shutdown",
            "healthCommand": "redis-cli ping",
            "gitAutoPull": false,
            "description": "cache"
        }"#;

        let spec: ServiceSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.service_type.as_deref(), Some("database"));
        assert_eq!(spec.port, Some(6379));
        assert_eq!(spec.stop_command(), Some("redis-cli shutdown"));
        assert_eq!(spec.health_command(), Some("redis-cli ping"));
        assert!(!spec.git_auto_pull());
    }

    #[test]
    fn test_git_auto_pull_defaults_to_true_only_when_absent() {
        let spec: ServiceSpec = serde_json::from_str(r#"{"command": "run"}"#).unwrap();
        assert_eq!(spec.git_auto_pull, None);
        assert!(spec.git_auto_pull());

        let explicit = ServiceSpec::new("run").with_git_auto_pull(false);
        assert!(!explicit.git_auto_pull());
    }

    #[test]
    fn test_blank_command_is_missing() {
        let spec = ServiceSpec::new("   ");
        assert_eq!(spec.launch_command(), None);
        assert_eq!(ServiceSpec::default().launch_command(), None);
    }

    #[test]
    fn test_listener_type() {
        assert!(ServiceSpec::new("nc -l 9000").with_type("listener").is_listener());
        assert!(!ServiceSpec::new("run").with_type("worker").is_listener());
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let json = serde_json::json!({
            "command": "run",
            "env": {"RUST_LOG": "debug"},
            "owner": "platform"
        });

        let spec: ServiceSpec = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(spec.launch_command(), Some("run"));
        assert_eq!(spec.extra["owner"], "platform");
        assert_eq!(serde_json::to_value(&spec).unwrap(), json);
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let spec = ServiceSpec::new("run").with_port(8080);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, serde_json::json!({"port": 8080, "command": "run"}));
    }
}
