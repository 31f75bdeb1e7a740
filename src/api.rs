use crate::storage::{FileRegistry, SnippetRegistry};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// What the control API shares with the running engine.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub registry: Arc<FileRegistry>,
    pub started_at: DateTime<Local>,
    pub pid: u32,
}

impl ControlState {
    pub fn new(registry: Arc<FileRegistry>) -> Self {
        Self {
            registry,
            started_at: Local::now(),
            pid: std::process::id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonStatus {
    pub enabled: bool,
    pub buffer_length: usize,
    /// Number of snippets currently loaded.
    pub snippets: usize,
    /// RFC 3339 local time the engine started.
    pub started_at: String,
    pub pid: u32,
    pub snippets_path: String,
}

// Get daemon status
pub fn api_status(state: &ControlState) -> ApiResponse<DaemonStatus> {
    let registry = &state.registry;
    ApiResponse::success(DaemonStatus {
        enabled: registry.is_enabled(),
        buffer_length: registry.buffer_length(),
        snippets: registry.snippets().len(),
        started_at: state.started_at.to_rfc3339(),
        pid: state.pid,
        snippets_path: registry.path().to_string_lossy().to_string(),
    })
}

// Turn matching on or off
pub fn api_set_enabled(state: &ControlState, enabled: bool) -> ApiResponse<bool> {
    state.registry.set_enabled(enabled);
    ApiResponse::success(state.registry.is_enabled())
}
