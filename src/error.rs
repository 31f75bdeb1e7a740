use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickwriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Keyboard controller error: {0}")]
    Keyboard(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("Keyboard listener error: {0}")]
    Listener(String),
    #[error("Daemon already running with PID {0}")]
    DaemonAlreadyRunning(u32),
    #[error("Daemon is not running")]
    DaemonNotRunning,
    #[error("Invalid PID in daemon file")]
    InvalidPid,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuickwriteError>;

/// Failure of a single snippet script evaluation.
///
/// These never escape the expansion worker; they are rendered into a
/// notification or into the injected text instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("{0}")]
    Load(String),
    #[error("{0}")]
    Runtime(String),
    #[error("{0}")]
    Type(String),
    #[error("Function timed out after {0} ms of inactivity")]
    Timeout(u64),
    #[error("{0}")]
    InvalidSnippet(String),
}

impl ScriptError {
    pub fn tag(&self) -> &'static str {
        match self {
            ScriptError::Load(_) => "ScriptLoadError",
            ScriptError::Runtime(_) => "ScriptRuntimeError",
            ScriptError::Type(_) => "ScriptTypeError",
            ScriptError::Timeout(_) => "ScriptTimeoutError",
            ScriptError::InvalidSnippet(_) => "InvalidSnippetError",
        }
    }

    /// Text injected at the cursor when no notification sink is available.
    pub fn display_text(&self) -> String {
        format!("{} {}", self.tag(), self)
    }
}
