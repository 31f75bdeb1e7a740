use crate::error::{QuickwriteError, Result};
use std::env;
use std::path::Path;
use std::process::Command;

/// Desktop notification sink used to surface snippet errors.
pub trait Notifier: Send + Sync {
    fn is_supported(&self) -> bool;
    fn show(&self, title: &str, body: &str) -> Result<()>;
}

/// No notification support; errors end up at the cursor instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotifier;

impl Notifier for NoNotifier {
    fn is_supported(&self) -> bool {
        false
    }

    fn show(&self, _title: &str, _body: &str) -> Result<()> {
        Err(QuickwriteError::Other(
            "notifications are not supported".to_string(),
        ))
    }
}

fn on_path(program: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

fn applescript_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Notifications via `osascript` on macOS or `notify-send` elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopNotifier {
    supported: bool,
}

impl DesktopNotifier {
    pub fn detect() -> Self {
        let supported = if cfg!(target_os = "macos") {
            Path::new("/usr/bin/osascript").exists()
        } else if cfg!(unix) {
            on_path("notify-send")
        } else {
            false
        };
        Self { supported }
    }
}

impl Notifier for DesktopNotifier {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        if !self.supported {
            return NoNotifier.show(title, body);
        }

        let status = if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_string(body),
                applescript_string(title)
            );
            Command::new("/usr/bin/osascript").args(["-e", &script]).status()?
        } else {
            Command::new("notify-send").args([title, body]).status()?
        };

        if status.success() {
            Ok(())
        } else {
            Err(QuickwriteError::Other(format!(
                "notification command exited with {:?}",
                status.code()
            )))
        }
    }
}
