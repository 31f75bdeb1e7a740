//! Clipboard access and the paste-based injection sequence.
//!
//! An expansion is typed by putting it on the clipboard, sending the paste
//! chord and putting the previous clipboard text back afterwards:
//!
//! ```text
//! t0                write expansion
//! t0 + paste_delay  paste chord
//! t0 + restore      restore snapshot
//! ```
//!
//! Both delays are measured from the write. They are guesses at how long the
//! target application needs to read the clipboard, not acknowledgements.

use crate::config::Settings;
use crate::error::{QuickwriteError, Result};
use crate::keyboard::{paste_chord, KeyInjector};
use arboard::Clipboard;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Reads and writes the system clipboard as text.
pub trait ClipboardAccess: Send + Sync {
    fn read_text(&self) -> Result<String>;
    fn write_text(&self, text: &str) -> Result<()>;
}

/// `ClipboardAccess` through arboard, opening the clipboard per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArboardClipboard;

impl ClipboardAccess for ArboardClipboard {
    fn read_text(&self) -> Result<String> {
        let mut clipboard =
            Clipboard::new().map_err(|e| QuickwriteError::Clipboard(e.to_string()))?;
        clipboard
            .get_text()
            .map_err(|e| QuickwriteError::Clipboard(e.to_string()))
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            Clipboard::new().map_err(|e| QuickwriteError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| QuickwriteError::Clipboard(e.to_string()))
    }
}

/// Clipboard text captured before an expansion overwrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot(String);

impl ClipboardSnapshot {
    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionTiming {
    pub paste_delay: Duration,
    pub restore_delay: Duration,
}

impl Default for InjectionTiming {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl InjectionTiming {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            paste_delay: Duration::from_millis(settings.paste_delay_ms),
            restore_delay: Duration::from_millis(settings.restore_delay_ms),
        }
    }
}

/// Types text into the focused application through the clipboard.
#[derive(Clone)]
pub struct PasteInjector {
    clipboard: Arc<dyn ClipboardAccess>,
    keys: Arc<dyn KeyInjector>,
    timing: InjectionTiming,
}

impl PasteInjector {
    pub fn new(
        clipboard: Arc<dyn ClipboardAccess>,
        keys: Arc<dyn KeyInjector>,
        timing: InjectionTiming,
    ) -> Self {
        Self {
            clipboard,
            keys,
            timing,
        }
    }

    /// Capture the current clipboard text. Non-text or unreadable contents
    /// snapshot as the empty string.
    pub fn snapshot(&self) -> ClipboardSnapshot {
        match self.clipboard.read_text() {
            Ok(text) => ClipboardSnapshot(text),
            Err(err) => {
                tracing::debug!(error = %err, "clipboard has no text, snapshotting empty");
                ClipboardSnapshot(String::new())
            }
        }
    }

    /// Paste `text` and put `snapshot` back once the restore delay has passed.
    /// The restore happens whether or not the write or the paste succeeded.
    pub async fn paste_and_restore(&self, snapshot: ClipboardSnapshot, text: &str) {
        let written_at = Instant::now();

        match self.clipboard.write_text(text) {
            Ok(()) => {
                sleep_until(written_at + self.timing.paste_delay).await;
                let (key, modifier) = paste_chord();
                if let Err(err) = self.keys.key_tap(key, &[modifier]) {
                    tracing::warn!(error = %err, "failed to send paste chord");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to write expansion to clipboard"),
        }

        sleep_until(written_at + self.timing.restore_delay).await;
        if let Err(err) = self.clipboard.write_text(snapshot.text()) {
            tracing::error!(error = %err, "failed to restore clipboard");
        }
    }
}
