use crate::error::{QuickwriteError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PID_FILENAME: &str = "quickwrite-daemon.pid";
pub const SNIPPETS_FILENAME: &str = "snippets.json";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const LOG_FILENAME: &str = "daemon.log";

pub const DEFAULT_BUFFER_LENGTH: usize = 30;
pub const DEFAULT_SCRIPT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_PASTE_DELAY_MS: u64 = 50;
pub const DEFAULT_RESTORE_DELAY_MS: u64 = 500;
pub const DEFAULT_CONTROL_PORT: u16 = 3917;

/// Runtime settings read from `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub buffer_length: usize,
    pub enabled: bool,
    pub script_timeout_ms: u64,
    pub paste_delay_ms: u64,
    pub restore_delay_ms: u64,
    pub keystroke_delay_ms: u64,
    pub control_port: u16,
    pub layout_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            buffer_length: DEFAULT_BUFFER_LENGTH,
            enabled: true,
            script_timeout_ms: DEFAULT_SCRIPT_TIMEOUT_MS,
            paste_delay_ms: DEFAULT_PASTE_DELAY_MS,
            restore_delay_ms: DEFAULT_RESTORE_DELAY_MS,
            keystroke_delay_ms: 0,
            control_port: DEFAULT_CONTROL_PORT,
            layout_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is missing or empty.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&get_settings_file_path())
    }

    fn validate(&self) -> Result<()> {
        if self.restore_delay_ms <= self.paste_delay_ms {
            return Err(QuickwriteError::InvalidConfig(format!(
                "restoreDelayMs ({}) must be greater than pasteDelayMs ({})",
                self.restore_delay_ms, self.paste_delay_ms
            )));
        }
        if self.script_timeout_ms == 0 {
            return Err(QuickwriteError::InvalidConfig(
                "scriptTimeoutMs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }
}

/// Get the quickwrite configuration directory
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".quickwrite"))
        .unwrap_or_else(|_| PathBuf::from(".quickwrite"))
}

/// Ensure the configuration directory and snippets file exist
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    let snippets_path = get_snippets_file_path();
    if !snippets_path.exists() {
        tracing::info!(path = %snippets_path.display(), "creating empty snippets file");
        fs::write(&snippets_path, "[]")?;
    }

    Ok(config_dir)
}

pub fn get_pid_file_path() -> PathBuf {
    get_config_dir().join(PID_FILENAME)
}

pub fn get_snippets_file_path() -> PathBuf {
    get_config_dir().join(SNIPPETS_FILENAME)
}

pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILENAME)
}

pub fn get_log_file_path() -> PathBuf {
    get_config_dir().join(LOG_FILENAME)
}

/// Check if daemon is running
pub fn is_daemon_running() -> Result<Option<u32>> {
    daemon_pid_at(&get_pid_file_path())
}

/// PID recorded in `pid_file` if that process is still alive. A stale file
/// is removed.
pub fn daemon_pid_at(pid_file: &Path) -> Result<Option<u32>> {
    if !pid_file.exists() {
        return Ok(None);
    }

    let pid = fs::read_to_string(pid_file)?
        .trim()
        .parse::<u32>()
        .map_err(|_| QuickwriteError::InvalidPid)?;

    #[cfg(unix)]
    {
        let alive = std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);

        if alive {
            Ok(Some(pid))
        } else {
            // Stale PID file left by a crashed worker
            let _ = fs::remove_file(pid_file);
            Ok(None)
        }
    }

    // For non-Unix systems, assume it's running if PID file exists
    #[cfg(not(unix))]
    {
        Ok(Some(pid))
    }
}
