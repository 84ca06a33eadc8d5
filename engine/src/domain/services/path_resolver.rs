//! Path resolution
//!
//! Expands `~` and `${basePaths.KEY}` templates in service paths and commands.
//! Resolution is total: it never fails and never leaves a known token half-expanded.

use crate::constants::service::BASE_PATHS_TOKEN;
use crate::domain::{BasePaths, ServiceSpec};
use std::path::{Path, PathBuf};

/// Replace every `${basePaths.KEY}` with the home-expanded base path
///
/// `KEY` is made of ASCII letters, digits and `_`. A missing key expands to the empty
/// string; an unterminated token is copied literally.
pub fn resolve(template: &str, base_paths: &BasePaths) -> String {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(BASE_PATHS_TOKEN) {
        resolved.push_str(&rest[..start]);
        let after = &rest[start + BASE_PATHS_TOKEN.len()..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if key_len > 0 && after[key_len..].starts_with('}') {
            if let Some(base) = base_paths.get(&after[..key_len]) {
                resolved.push_str(&expand_home(base));
            }
            rest = &after[key_len + 1..];
        } else {
            resolved.push_str(BASE_PATHS_TOKEN);
            rest = after;
        }
    }

    resolved.push_str(rest);
    resolved
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> String {
    match home_dir() {
        Some(home) => expand_home_with(path, &home),
        None => path.to_string(),
    }
}

/// Resolve a working directory template
pub fn resolve_dir(path: &str, base_paths: &BasePaths) -> PathBuf {
    PathBuf::from(expand_home(&resolve(path, base_paths)))
}

fn expand_home_with(path: &str, home: &Path) -> String {
    if path == "~" {
        return home.to_string_lossy().into_owned();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest).to_string_lossy().into_owned(),
        None => path.to_string(),
    }
}

fn home_dir() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// The execution environment of a service with every template expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub name: String,
    pub working_dir: Option<PathBuf>,
    pub command: Option<String>,
    pub build: Option<String>,
    pub stop_command: Option<String>,
    pub health_command: Option<String>,
}

impl ResolvedService {
    pub fn resolve(name: &str, spec: &ServiceSpec, base_paths: &BasePaths) -> Self {
        let expand = |value: Option<&str>| value.map(|v| expand_home(&resolve(v, base_paths)));

        Self {
            name: name.to_string(),
            working_dir: spec.path.as_deref().map(|p| resolve_dir(p, base_paths)),
            command: expand(spec.launch_command()),
            build: expand(spec.build_command()),
            stop_command: expand(spec.stop_command()),
            health_command: expand(spec.health_command()),
        }
    }
}
