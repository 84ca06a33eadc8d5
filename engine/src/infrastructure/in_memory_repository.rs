//! In-Memory RunHandle Repository
//! Thread-safe implementation of RunHandleRepository port

use crate::domain::ports::RunHandleRepository;
use crate::domain::{DomainError, RunHandle};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Thread-safe in-memory run handle table
///
/// Handles live only as long as the daemon; a restart forgets every launched process.
#[derive(Clone)]
pub struct InMemoryRunHandleRepository {
    handles: Arc<RwLock<HashMap<String, RunHandle>>>,
}

impl InMemoryRunHandleRepository {
    pub fn new() -> Self {
        Self {
            handles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryRunHandleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunHandleRepository for InMemoryRunHandleRepository {
    async fn save(&self, handle: RunHandle) -> Result<(), DomainError> {
        let service = handle.service_name.clone();
        let pid = handle.pid;

        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        handles.insert(service.clone(), handle);

        info!(
            service = %service,
            pid = pid,
            total_handles = handles.len(),
            "Run handle saved"
        );
        Ok(())
    }

    async fn find_by_name(&self, service: &str) -> Result<Option<RunHandle>, DomainError> {
        let handles = self.handles.read().unwrap_or_else(PoisonError::into_inner);
        Ok(handles.get(service).cloned())
    }

    async fn find_all(&self) -> Result<Vec<RunHandle>, DomainError> {
        let handles = self.handles.read().unwrap_or_else(PoisonError::into_inner);
        Ok(handles.values().cloned().collect())
    }

    async fn remove(&self, service: &str) -> Result<Option<RunHandle>, DomainError> {
        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        let removed = handles.remove(service);
        debug!(service = %service, removed = removed.is_some(), "Run handle removed");
        Ok(removed)
    }

    async fn record_exit(&self, service: &str, pid: u32, code: i32) -> Result<bool, DomainError> {
        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        match handles.get_mut(service) {
            Some(handle) if handle.pid == pid => {
                handle.exit_code = Some(code);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
