//! Translation of physical key presses into the characters the active
//! keyboard layout would type.

use crate::keyboard::key_name;
use crate::models::KeyEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;

/// What one key produces under each modifier combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub with_shift: Option<String>,
    #[serde(default)]
    pub with_alt_gr: Option<String>,
    #[serde(default)]
    pub with_shift_alt_gr: Option<String>,
}

pub type LayoutMap = HashMap<String, LayoutEntry>;

/// Source of the currently active layout table. Implementations must reflect
/// layout switches; callers fetch on every key press.
pub trait LayoutProvider: Send + Sync {
    fn current_layout(&self) -> Arc<LayoutMap>;
}

/// Decode a key press into a character, or `None` when the key is not
/// printable under the held modifiers.
pub fn decode(event: &KeyEvent, provider: &dyn LayoutProvider) -> Option<char> {
    let name = key_name(&event.keycode)?;
    let layout = provider.current_layout();
    let entry = layout.get(name)?;

    let chord = event.ctrl || event.meta;
    let selected = if event.shift && event.alt && !chord {
        &entry.with_shift_alt_gr
    } else if event.shift && !chord {
        &entry.with_shift
    } else if event.alt && !chord {
        &entry.with_alt_gr
    } else if !chord {
        &entry.value
    } else {
        return None;
    };

    selected.as_deref().and_then(|value| value.chars().next())
}

fn entry(value: &str, with_shift: &str) -> LayoutEntry {
    LayoutEntry {
        value: Some(value.to_string()),
        with_shift: Some(with_shift.to_string()),
        with_alt_gr: None,
        with_shift_alt_gr: None,
    }
}

/// The US ANSI layout, used when no layout file is configured.
pub fn us_layout() -> &'static Arc<LayoutMap> {
    static US: OnceLock<Arc<LayoutMap>> = OnceLock::new();
    US.get_or_init(|| {
        let mut map = LayoutMap::new();
        for c in 'a'..='z' {
            let name = format!("Key{}", c.to_ascii_uppercase());
            map.insert(name, entry(&c.to_string(), &c.to_ascii_uppercase().to_string()));
        }

        let digits = [
            ("Digit1", "1", "!"),
            ("Digit2", "2", "@"),
            ("Digit3", "3", "#"),
            ("Digit4", "4", "$"),
            ("Digit5", "5", "%"),
            ("Digit6", "6", "^"),
            ("Digit7", "7", "&"),
            ("Digit8", "8", "*"),
            ("Digit9", "9", "("),
            ("Digit0", "0", ")"),
        ];
        let punctuation = [
            ("Backquote", "`", "~"),
            ("Minus", "-", "_"),
            ("Equal", "=", "+"),
            ("BracketLeft", "[", "{"),
            ("BracketRight", "]", "}"),
            ("Backslash", "\\", "|"),
            ("IntlBackslash", "\\", "|"),
            ("Semicolon", ";", ":"),
            ("Quote", "'", "\""),
            ("Comma", ",", "<"),
            ("Period", ".", ">"),
            ("Slash", "/", "?"),
            ("Space", " ", " "),
        ];
        for (name, value, shifted) in digits.iter().chain(punctuation.iter()) {
            map.insert(name.to_string(), entry(value, shifted));
        }

        for d in 0..=9 {
            let value = d.to_string();
            map.insert(
                format!("Numpad{}", d),
                LayoutEntry {
                    value: Some(value),
                    ..LayoutEntry::default()
                },
            );
        }
        for (name, value) in [
            ("NumpadSubtract", "-"),
            ("NumpadAdd", "+"),
            ("NumpadMultiply", "*"),
            ("NumpadDivide", "/"),
            ("NumpadDecimal", "."),
        ] {
            map.insert(
                name.to_string(),
                LayoutEntry {
                    value: Some(value.to_string()),
                    ..LayoutEntry::default()
                },
            );
        }

        Arc::new(map)
    })
}

/// Always serves the built-in US layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsLayout;

impl LayoutProvider for UsLayout {
    fn current_layout(&self) -> Arc<LayoutMap> {
        Arc::clone(us_layout())
    }
}

/// Layout table read from a native-keymap style JSON file. The file is
/// re-read whenever its modification time changes, so an external tool can
/// rewrite it on layout switches.
#[derive(Debug)]
pub struct FileLayoutProvider {
    path: PathBuf,
    cached: Mutex<Option<(SystemTime, Arc<LayoutMap>)>>,
}

impl FileLayoutProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    fn read(&self) -> Option<(SystemTime, Arc<LayoutMap>)> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;

        if let Ok(cached) = self.cached.lock() {
            if let Some((stamp, layout)) = cached.as_ref() {
                if *stamp == modified {
                    return Some((*stamp, Arc::clone(layout)));
                }
            }
        }

        let parsed = fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<LayoutMap>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(map) => {
                tracing::info!(
                    path = %self.path.display(),
                    keys = map.len(),
                    "loaded keyboard layout"
                );
                Some((modified, Arc::new(map)))
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable layout file, using US layout"
                );
                None
            }
        }
    }
}

impl LayoutProvider for FileLayoutProvider {
    fn current_layout(&self) -> Arc<LayoutMap> {
        match self.read() {
            Some((stamp, layout)) => {
                if let Ok(mut cached) = self.cached.lock() {
                    *cached = Some((stamp, Arc::clone(&layout)));
                }
                layout
            }
            None => Arc::clone(us_layout()),
        }
    }
}
