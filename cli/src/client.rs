//! Blocking HTTP client for the daemon's REST API

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot reach daemon at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Error reported by the daemon
    #[error("{}", .body.error)]
    Api { status: u16, body: ErrorBody },

    #[error("unexpected response from daemon: {0}")]
    Decode(String),
}

impl ClientError {
    /// Tail of the log file the daemon attached to the failure
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => body.log.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub kind: String,
    pub log_file: Option<String>,
    pub log: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonHealth {
    pub status: String,
    pub active_log_streams: usize,
}

#[derive(Debug, Deserialize)]
pub struct ServiceList {
    pub services: Vec<ServiceSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub port: Option<u16>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub service: String,
    pub running: bool,
    pub checkable: bool,
    pub liveness: String,
    pub state: String,
    pub port: Option<u16>,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub path: Option<String>,
    pub pid: Option<u32>,
    pub log_file: Option<String>,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Started {
    pub service: String,
    pub pid: u32,
    pub log_file: String,
    pub coalesced: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopped {
    pub service: String,
    pub ran_stop_command: bool,
    pub freed_port: Option<u16>,
    pub previous_pid: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Restarted {
    pub stopped: Stopped,
    pub started: Started,
}

#[derive(Debug, Deserialize)]
pub struct LogFiles {
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogContent {
    pub content: String,
}

/// One event of a log stream
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogEvent {
    Initial { content: String },
    Append { content: String },
    Replace { content: String },
    Heartbeat,
}

/// Parse one SSE line; `None` for anything that is not a `data:` line
pub fn parse_sse_line(line: &str) -> Option<Result<LogEvent, ClientError>> {
    let data = line.strip_prefix("data:")?.trim_start();
    Some(serde_json::from_str(data).map_err(|e| ClientError::Decode(e.to_string())))
}

pub struct DaemonClient {
    base_url: String,
    agent: ureq::Agent,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Self {
        // No read timeout: starts wait on builds and readiness, streams never end
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn call(&self, request: ureq::Request) -> Result<ureq::Response, ClientError> {
        match request.call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                let body = serde_json::from_str(&text).unwrap_or_else(|_| ErrorBody {
                    error: format!("daemon returned HTTP {}: {}", status, text.trim()),
                    kind: String::new(),
                    log_file: None,
                    log: None,
                });
                Err(ClientError::Api { status, body })
            }
            Err(e) => Err(ClientError::Unreachable {
                url: self.base_url.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ClientError> {
        let text = response
            .into_string()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::decode(self.call(self.agent.get(&self.url(path)))?)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, build: bool) -> Result<T, ClientError> {
        let mut request = self.agent.post(&self.url(path));
        if build {
            request = request.query("build", "true");
        }
        Self::decode(self.call(request)?)
    }

    pub fn health(&self) -> Result<DaemonHealth, ClientError> {
        self.get("/health")
    }

    pub fn list(&self) -> Result<ServiceList, ClientError> {
        self.get("/services")
    }

    pub fn status(&self, service: &str) -> Result<ServiceStatus, ClientError> {
        self.get(&format!("/service/{}/status", service))
    }

    pub fn start(&self, service: &str, build: bool) -> Result<Started, ClientError> {
        self.post(&format!("/service/{}/start", service), build)
    }

    pub fn stop(&self, service: &str) -> Result<Stopped, ClientError> {
        self.post(&format!("/service/{}/stop", service), false)
    }

    pub fn restart(&self, service: &str, build: bool) -> Result<Restarted, ClientError> {
        self.post(&format!("/service/{}/restart", service), build)
    }

    pub fn log_files(&self, service: &str) -> Result<LogFiles, ClientError> {
        self.get(&format!("/logs/{}", service))
    }

    pub fn read_log(&self, service: &str, file: &str) -> Result<LogContent, ClientError> {
        self.get(&format!("/logs/{}/{}", service, file))
    }

    pub fn clear_log(&self, service: &str, file: &str) -> Result<(), ClientError> {
        self.call(self.agent.delete(&self.url(&format!("/logs/{}/{}", service, file))))?;
        Ok(())
    }

    /// Follow a log file, calling `on_event` for every event until the stream ends
    pub fn follow_log(
        &self,
        service: &str,
        file: &str,
        mut on_event: impl FnMut(LogEvent),
    ) -> Result<(), ClientError> {
        let request = self
            .agent
            .get(&self.url(&format!("/logs/{}/{}/stream", service, file)))
            .set("Accept", "text/event-stream");
        let reader = BufReader::new(self.call(request)?.into_reader());
        read_events(reader, &mut on_event)
    }
}

fn read_events<R: Read>(
    reader: BufReader<R>,
    on_event: &mut impl FnMut(LogEvent),
) -> Result<(), ClientError> {
    for line in reader.lines() {
        let line = line.map_err(|e| ClientError::Decode(e.to_string()))?;
        if let Some(event) = parse_sse_line(&line) {
            on_event(event?);
        }
    }
    Ok(())
}
