use crate::error::{QuickwriteError, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use rdev::Key as RdevKey;
use std::thread;
use std::time::Duration;

pub const KEY_BACKSPACE: &str = "Backspace";
pub const KEY_TAB: &str = "Tab";
pub const KEY_ARROWS: [&str; 4] = ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"];

/// Symbolic (DOM `code` style) name of a physical key.
pub fn key_name(key: &RdevKey) -> Option<&'static str> {
    let name = match key {
        RdevKey::KeyA => "KeyA",
        RdevKey::KeyB => "KeyB",
        RdevKey::KeyC => "KeyC",
        RdevKey::KeyD => "KeyD",
        RdevKey::KeyE => "KeyE",
        RdevKey::KeyF => "KeyF",
        RdevKey::KeyG => "KeyG",
        RdevKey::KeyH => "KeyH",
        RdevKey::KeyI => "KeyI",
        RdevKey::KeyJ => "KeyJ",
        RdevKey::KeyK => "KeyK",
        RdevKey::KeyL => "KeyL",
        RdevKey::KeyM => "KeyM",
        RdevKey::KeyN => "KeyN",
        RdevKey::KeyO => "KeyO",
        RdevKey::KeyP => "KeyP",
        RdevKey::KeyQ => "KeyQ",
        RdevKey::KeyR => "KeyR",
        RdevKey::KeyS => "KeyS",
        RdevKey::KeyT => "KeyT",
        RdevKey::KeyU => "KeyU",
        RdevKey::KeyV => "KeyV",
        RdevKey::KeyW => "KeyW",
        RdevKey::KeyX => "KeyX",
        RdevKey::KeyY => "KeyY",
        RdevKey::KeyZ => "KeyZ",
        RdevKey::Num1 => "Digit1",
        RdevKey::Num2 => "Digit2",
        RdevKey::Num3 => "Digit3",
        RdevKey::Num4 => "Digit4",
        RdevKey::Num5 => "Digit5",
        RdevKey::Num6 => "Digit6",
        RdevKey::Num7 => "Digit7",
        RdevKey::Num8 => "Digit8",
        RdevKey::Num9 => "Digit9",
        RdevKey::Num0 => "Digit0",
        RdevKey::BackQuote => "Backquote",
        RdevKey::Minus => "Minus",
        RdevKey::Equal => "Equal",
        RdevKey::LeftBracket => "BracketLeft",
        RdevKey::RightBracket => "BracketRight",
        RdevKey::BackSlash => "Backslash",
        RdevKey::IntlBackslash => "IntlBackslash",
        RdevKey::SemiColon => "Semicolon",
        RdevKey::Quote => "Quote",
        RdevKey::Comma => "Comma",
        RdevKey::Dot => "Period",
        RdevKey::Slash => "Slash",
        RdevKey::Space => "Space",
        RdevKey::Tab => KEY_TAB,
        RdevKey::Backspace => KEY_BACKSPACE,
        RdevKey::Return => "Enter",
        RdevKey::UpArrow => "ArrowUp",
        RdevKey::DownArrow => "ArrowDown",
        RdevKey::LeftArrow => "ArrowLeft",
        RdevKey::RightArrow => "ArrowRight",
        RdevKey::Kp0 => "Numpad0",
        RdevKey::Kp1 => "Numpad1",
        RdevKey::Kp2 => "Numpad2",
        RdevKey::Kp3 => "Numpad3",
        RdevKey::Kp4 => "Numpad4",
        RdevKey::Kp5 => "Numpad5",
        RdevKey::Kp6 => "Numpad6",
        RdevKey::Kp7 => "Numpad7",
        RdevKey::Kp8 => "Numpad8",
        RdevKey::Kp9 => "Numpad9",
        RdevKey::KpMinus => "NumpadSubtract",
        RdevKey::KpPlus => "NumpadAdd",
        RdevKey::KpMultiply => "NumpadMultiply",
        RdevKey::KpDivide => "NumpadDivide",
        RdevKey::KpDelete => "NumpadDecimal",
        RdevKey::KpReturn => "NumpadEnter",
        _ => return None,
    };
    Some(name)
}

pub fn is_backspace(key: &RdevKey) -> bool {
    key_name(key) == Some(KEY_BACKSPACE)
}

pub fn is_tab(key: &RdevKey) -> bool {
    key_name(key) == Some(KEY_TAB)
}

pub fn is_arrow(key: &RdevKey) -> bool {
    key_name(key).is_some_and(|name| KEY_ARROWS.contains(&name))
}

/// Keys the engine ever needs to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapKey {
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

/// The platform paste chord: Cmd+V on macOS, Ctrl+V elsewhere.
pub fn paste_chord() -> (TapKey, Modifier) {
    if cfg!(target_os = "macos") {
        (TapKey::Char('v'), Modifier::Meta)
    } else {
        (TapKey::Char('v'), Modifier::Control)
    }
}

/// Synthesizes key taps into the focused application.
pub trait KeyInjector: Send + Sync {
    fn key_tap(&self, key: TapKey, modifiers: &[Modifier]) -> Result<()>;

    fn send_backspace(&self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.key_tap(TapKey::Backspace, &[])?;
        }
        Ok(())
    }
}

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(|err| {
        QuickwriteError::Keyboard(format!("Failed to create keyboard controller: {}", err))
    })
}

fn to_enigo_key(key: TapKey) -> Key {
    match key {
        TapKey::Backspace => Key::Backspace,
        TapKey::Char(c) => Key::Unicode(c),
    }
}

fn to_enigo_modifier(modifier: Modifier) -> Key {
    match modifier {
        Modifier::Shift => Key::Shift,
        Modifier::Control => Key::Control,
        Modifier::Alt => Key::Alt,
        Modifier::Meta => Key::Meta,
    }
}

fn press(keyboard: &mut Enigo, key: Key, direction: Direction) -> Result<()> {
    keyboard
        .key(key, direction)
        .map_err(|err| QuickwriteError::Keyboard(format!("Failed to send {:?}: {}", key, err)))
}

fn tap_with(keyboard: &mut Enigo, key: TapKey, modifiers: &[Modifier]) -> Result<()> {
    for modifier in modifiers {
        press(keyboard, to_enigo_modifier(*modifier), Direction::Press)?;
    }
    let result = press(keyboard, to_enigo_key(key), Direction::Click);
    // Release in reverse order even if the click failed so no modifier stays stuck
    for modifier in modifiers.iter().rev() {
        press(keyboard, to_enigo_modifier(*modifier), Direction::Release)?;
    }
    result
}

/// `KeyInjector` backed by enigo. A controller is created per call, so the
/// injector itself is freely shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct EnigoInjector {
    delay: Duration,
}

impl EnigoInjector {
    /// `delay` is slept before every tap; zero disables it.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

impl KeyInjector for EnigoInjector {
    fn key_tap(&self, key: TapKey, modifiers: &[Modifier]) -> Result<()> {
        let mut keyboard = create_keyboard_controller()?;
        self.pause();
        tap_with(&mut keyboard, key, modifiers)
    }

    fn send_backspace(&self, count: usize) -> Result<()> {
        let mut keyboard = create_keyboard_controller()?;
        for _ in 0..count {
            self.pause();
            tap_with(&mut keyboard, TapKey::Backspace, &[])?;
        }
        Ok(())
    }
}

/// Tracks held modifiers from raw press/release events, since rdev reports
/// keys without modifier flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifierState {
    shift_left: bool,
    shift_right: bool,
    alt: bool,
    alt_gr: bool,
    ctrl_left: bool,
    ctrl_right: bool,
    meta_left: bool,
    meta_right: bool,
}

impl ModifierState {
    /// Record a press or release. Returns true when `key` is a modifier.
    pub fn update(&mut self, key: &RdevKey, pressed: bool) -> bool {
        let slot = match key {
            RdevKey::ShiftLeft => &mut self.shift_left,
            RdevKey::ShiftRight => &mut self.shift_right,
            RdevKey::Alt => &mut self.alt,
            RdevKey::AltGr => &mut self.alt_gr,
            RdevKey::ControlLeft => &mut self.ctrl_left,
            RdevKey::ControlRight => &mut self.ctrl_right,
            RdevKey::MetaLeft => &mut self.meta_left,
            RdevKey::MetaRight => &mut self.meta_right,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn shift(&self) -> bool {
        self.shift_left || self.shift_right
    }

    pub fn alt(&self) -> bool {
        self.alt || self.alt_gr
    }

    pub fn ctrl(&self) -> bool {
        self.ctrl_left || self.ctrl_right
    }

    pub fn meta(&self) -> bool {
        self.meta_left || self.meta_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_are_classified() {
        assert!(is_backspace(&RdevKey::Backspace));
        assert!(is_tab(&RdevKey::Tab));
        for key in [
            RdevKey::UpArrow,
            RdevKey::DownArrow,
            RdevKey::LeftArrow,
            RdevKey::RightArrow,
        ] {
            assert!(is_arrow(&key));
        }
        assert!(!is_arrow(&RdevKey::KeyA));
        assert_eq!(key_name(&RdevKey::F5), None);
        assert_eq!(key_name(&RdevKey::Unknown(999)), None);
    }

    #[test]
    fn modifier_state_tracks_both_sides() {
        let mut state = ModifierState::default();
        assert!(state.update(&RdevKey::ShiftLeft, true));
        assert!(state.update(&RdevKey::ShiftRight, true));
        state.update(&RdevKey::ShiftLeft, false);
        assert!(state.shift());
        state.update(&RdevKey::ShiftRight, false);
        assert!(!state.shift());

        assert!(!state.update(&RdevKey::KeyA, true));
        state.update(&RdevKey::AltGr, true);
        assert!(state.alt());
        assert!(!state.ctrl());
        assert!(!state.meta());
    }
}
