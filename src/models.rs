use rdev::Key;
use serde::{Deserialize, Serialize};

/// How a snippet's `value` turns into the text that replaces its trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetKind {
    /// `value` is pasted as-is.
    #[default]
    Plain,
    /// `value` is Lua source defining `qw(trigger)`.
    Lua,
    /// `value` is a JavaScript expression evaluating to a function.
    Js,
}

/// A registered trigger and its expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub key: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(rename = "type", default)]
    pub kind: SnippetKind,
    pub value: String,
}

impl Snippet {
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            regex: false,
            kind: SnippetKind::Plain,
            value: value.into(),
        }
    }

    pub fn new(
        key: impl Into<String>,
        regex: bool,
        kind: SnippetKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            regex,
            kind,
            value: value.into(),
        }
    }
}

/// A key press as delivered by the event source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub keycode: Key,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(keycode: Key) -> Self {
        Self {
            keycode,
            shift: false,
            alt: false,
            ctrl: false,
            meta: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyEvent),
    MouseClick,
}
