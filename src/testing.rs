//! In-memory stand-ins for the OS capabilities, shared by unit tests.

use crate::clipboard::ClipboardAccess;
use crate::error::{QuickwriteError, Result};
use crate::keyboard::{KeyInjector, Modifier, TapKey};
use crate::models::Snippet;
use crate::notify::Notifier;
use crate::storage::SnippetRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct FakeClipboard {
    text: Mutex<String>,
    readable: AtomicBool,
    fail_next_write: AtomicBool,
    writes: Mutex<Vec<String>>,
}

impl FakeClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Mutex::new(text.to_string()),
            readable: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Holds something that is not text.
    pub fn unreadable() -> Self {
        Self::default()
    }

    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    pub fn current(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ClipboardAccess for FakeClipboard {
    fn read_text(&self) -> Result<String> {
        if self.readable.load(Ordering::SeqCst) {
            Ok(self.current())
        } else {
            Err(QuickwriteError::Clipboard("no text on clipboard".to_string()))
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(QuickwriteError::Clipboard("clipboard busy".to_string()));
        }
        *self.text.lock().unwrap() = text.to_string();
        self.readable.store(true, Ordering::SeqCst);
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingKeys {
    taps: Mutex<Vec<(TapKey, Vec<Modifier>, Instant)>>,
}

impl RecordingKeys {
    pub fn taps(&self) -> Vec<(TapKey, Vec<Modifier>)> {
        self.taps
            .lock()
            .unwrap()
            .iter()
            .map(|(key, modifiers, _)| (*key, modifiers.clone()))
            .collect()
    }

    pub fn tap_times(&self) -> Vec<Instant> {
        self.taps.lock().unwrap().iter().map(|(_, _, at)| *at).collect()
    }

    pub fn backspaces(&self) -> usize {
        self.taps()
            .iter()
            .filter(|(key, modifiers)| *key == TapKey::Backspace && modifiers.is_empty())
            .count()
    }

    pub fn pastes(&self) -> usize {
        self.taps()
            .iter()
            .filter(|(key, _)| *key == TapKey::Char('v'))
            .count()
    }
}

impl KeyInjector for RecordingKeys {
    fn key_tap(&self, key: TapKey, modifiers: &[Modifier]) -> Result<()> {
        self.taps
            .lock()
            .unwrap()
            .push((key, modifiers.to_vec(), Instant::now()));
        Ok(())
    }
}

#[derive(Debug)]
pub struct StaticRegistry {
    snippets: Arc<Vec<Snippet>>,
    buffer_length: usize,
    enabled: AtomicBool,
}

impl StaticRegistry {
    pub fn new(snippets: Vec<Snippet>, buffer_length: usize) -> Self {
        Self {
            snippets: Arc::new(snippets),
            buffer_length,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl SnippetRegistry for StaticRegistry {
    fn snippets(&self) -> Arc<Vec<Snippet>> {
        Arc::clone(&self.snippets)
    }

    fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
