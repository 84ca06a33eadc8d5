//! Shared test utilities for E2E tests
//!
//! ## Binary Selection
//!
//! Tests drive the real daemon (`devsvcd`) and CLI (`devsvc`) from `../target/debug`.
//! Build them first (`cargo build`); override with `DEVSVC_DAEMON_BINARY` / `DEVSVC_CLI_BINARY`.
//!
//! ## Test Isolation
//!
//! Each test owns a `TestEnv`: a scratch directory holding the catalog, the log root and
//! any service working directories, plus a daemon on its own free port. Dropping the env
//! kills the daemon and every service process group it launched, even on panic.
//!
//! ## Usage Pattern
//!
//! ```rust,ignore
//! #[test]
//! fn my_test() {
//!     let env = TestEnv::start(|root| json!({ "services": { "worker": { "command": "sleep 30" } } }));
//!     let started = env.post("/service/worker/start");
//!     assert!(started.is_ok());
//! }
//! ```
//!
//! When a test panics, the tail of the daemon's stderr is printed (panic hook installed via
//! `#[ctor]`), which is usually enough to see why a start failed in CI.

use serde_json::Value;
use std::cell::RefCell;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::{Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

const DAEMON_READY_TIMEOUT: Duration = Duration::from_secs(10);

// Install panic hook when the test binary loads the common library
#[ctor::ctor]
fn init_panic_hook() {
    install_panic_hook();
}

static PANIC_HOOK_INIT: Once = Once::new();

thread_local! {
    static DAEMON_LOG_FILE: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

fn install_panic_hook() {
    PANIC_HOOK_INIT.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            DAEMON_LOG_FILE.with(|log| {
                if let Some(path) = log.borrow().as_ref() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        let lines: Vec<&str> = content.lines().collect();
                        let start = lines.len().saturating_sub(50);
                        eprintln!("\n========== DAEMON LOGS (Test Failed) ==========");
                        eprintln!("Daemon log: {}", path.display());
                        for line in &lines[start..] {
                            eprintln!("{}", line);
                        }
                        eprintln!("===============================================\n");
                    }
                }
            });
            default_hook(panic_info);
        }));
    });
}

pub fn get_daemon_binary() -> PathBuf {
    std::env::var("DEVSVC_DAEMON_BINARY")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("../target/debug/devsvcd"))
}

pub fn get_cli_binary() -> PathBuf {
    std::env::var("DEVSVC_CLI_BINARY")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("../target/debug/devsvc"))
}

/// A port nothing listens on right now
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    listener.local_addr().unwrap().port()
}

/// Shell command that keeps a TCP listener open on `port`
///
/// Reuses the daemon binary, which is guaranteed to exist, as a generic listener.
pub fn listener_command(port: u16, scratch: &Path) -> String {
    let binary = std::fs::canonicalize(get_daemon_binary()).expect("Daemon binary not built");
    format!(
        "DEVSVC_PORT={port} DEVSVC_CONFIG_FILE={dir}/none.json DEVSVC_LOG_DIR={dir}/inner-logs exec {bin}",
        port = port,
        dir = scratch.display(),
        bin = binary.display(),
    )
}

/// Result of an API call: the decoded body and whether the status was 2xx
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn kind(&self) -> &str {
        self.body["kind"].as_str().unwrap_or_default()
    }
}

/// Daemon + scratch directory for one test; cleaned up on drop
#[must_use = "TestEnv must be held for the duration of the test"]
pub struct TestEnv {
    root: tempfile::TempDir,
    port: u16,
    daemon: Child,
    agent: ureq::Agent,
    launched: Mutex<Vec<u32>>,
}

impl TestEnv {
    /// Write the catalog built by `catalog(root)` and start a daemon on it
    pub fn start(catalog: impl FnOnce(&Path) -> Value) -> Self {
        Self::start_with_env(catalog, &[])
    }

    pub fn start_with_env(catalog: impl FnOnce(&Path) -> Value, env: &[(&str, &str)]) -> Self {
        let root = tempfile::tempdir().expect("Failed to create scratch dir");
        let config_file = root.path().join("config").join("services.json");
        std::fs::create_dir_all(config_file.parent().unwrap()).unwrap();
        std::fs::write(&config_file, catalog(root.path()).to_string()).unwrap();

        let port = free_port();
        let daemon_log = root.path().join("daemon.log");
        let log_file = std::fs::File::create(&daemon_log).expect("Failed to create daemon log");

        let mut cmd = Command::new(get_daemon_binary());
        cmd.env("DEVSVC_PORT", port.to_string())
            .env("DEVSVC_CONFIG_FILE", &config_file)
            .env("DEVSVC_LOG_DIR", root.path().join("logs"))
            .env("DEVSVC_LOG_LEVEL", "debug")
            .stdout(Stdio::from(log_file.try_clone().unwrap()))
            .stderr(Stdio::from(log_file));
        for (key, value) in env {
            cmd.env(key, value);
        }
        let daemon = cmd.spawn().expect("Failed to start daemon");
        DAEMON_LOG_FILE.with(|log| *log.borrow_mut() = Some(daemon_log));

        let env = Self {
            root,
            port,
            daemon,
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(2))
                .build(),
            launched: Mutex::new(Vec::new()),
        };
        env.wait_until_healthy();
        env
    }

    fn wait_until_healthy(&self) {
        let start = Instant::now();
        while start.elapsed() < DAEMON_READY_TIMEOUT {
            if self.get("/health").is_ok() {
                return;
            }
            thread::sleep(Duration::from_millis(100));
        }
        panic!("Daemon did not become healthy on port {}", self.port);
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    fn call(&self, request: ureq::Request) -> ApiResponse {
        let (status, text) = match request.call() {
            Ok(response) => (response.status(), response.into_string().unwrap_or_default()),
            Err(ureq::Error::Status(status, response)) => {
                (status, response.into_string().unwrap_or_default())
            }
            Err(e) => (0, format!("{{\"error\": {:?}}}", e.to_string())),
        };
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        ApiResponse { status, body }
    }

    pub fn get(&self, path: &str) -> ApiResponse {
        self.call(self.agent.get(&format!("{}{}", self.url(), path)))
    }

    pub fn delete(&self, path: &str) -> ApiResponse {
        self.call(self.agent.delete(&format!("{}{}", self.url(), path)))
    }

    /// POST, remembering any launched pid so the drop can kill it
    pub fn post(&self, path: &str) -> ApiResponse {
        let response = self.call(self.agent.post(&format!("{}{}", self.url(), path)));
        self.track_pids(&response.body);
        response
    }

    fn track_pids(&self, body: &Value) {
        let pid = body["pid"]
            .as_u64()
            .or_else(|| body["started"]["pid"].as_u64());
        if let Some(pid) = pid {
            let mut launched = self.launched.lock().unwrap();
            if !launched.contains(&(pid as u32)) {
                launched.push(pid as u32);
            }
        }
    }

    pub fn status(&self, service: &str) -> Value {
        let response = self.get(&format!("/service/{}/status", service));
        assert!(response.is_ok(), "status failed: {:?}", response);
        self.track_pids(&response.body);
        response.body
    }

    /// Newest log file name of a service
    pub fn newest_log(&self, service: &str) -> String {
        let response = self.get(&format!("/logs/{}", service));
        response.body["files"][0]
            .as_str()
            .unwrap_or_else(|| panic!("no log files for {}: {:?}", service, response))
            .to_string()
    }

    pub fn read_log(&self, service: &str, file: &str) -> String {
        self.get(&format!("/logs/{}/{}", service, file)).body["content"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }

    /// Follow a log stream until `done` accepts an event or `max_events` were read
    pub fn follow_log(
        &self,
        service: &str,
        file: &str,
        max_events: usize,
        mut done: impl FnMut(&Value) -> bool,
    ) -> Vec<Value> {
        let response = self
            .agent
            .get(&format!("{}/logs/{}/{}/stream", self.url(), service, file))
            .call()
            .expect("stream request failed");

        let mut events = Vec::new();
        for line in BufReader::new(response.into_reader()).lines() {
            let line = line.expect("stream read failed");
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let event: Value = serde_json::from_str(data.trim_start()).unwrap();
            let finished = done(&event);
            events.push(event);
            if finished || events.len() >= max_events {
                break;
            }
        }
        events
    }

    /// Run the CLI against this daemon
    pub fn cli(&self, args: &[&str]) -> Output {
        Command::new(get_cli_binary())
            .args(args)
            .env("DEVSVC_URL", self.url())
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to run CLI")
    }

    /// Run the CLI, assert success and return stdout
    pub fn run_cli(&self, args: &[&str]) -> String {
        let output = self.cli(args);
        assert!(
            output.status.success(),
            "devsvc {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Poll `check` until it holds or `timeout` passes
    pub fn eventually(&self, timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(100));
        }
        false
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        let _ = self.daemon.kill();
        let _ = self.daemon.wait();

        // Services run in their own process groups and outlive the daemon
        for pid in self.launched.lock().unwrap().iter() {
            let _ = Command::new("kill")
                .args(["-9", "--", &format!("-{}", pid)])
                .stderr(Stdio::null())
                .status();
        }
        DAEMON_LOG_FILE.with(|log| *log.borrow_mut() = None);
    }
}
