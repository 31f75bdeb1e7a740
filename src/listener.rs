use crate::keyboard::ModifierState;
use crate::models::{InputEvent, KeyEvent};
use crate::session::Session;
use rdev::{self, EventType};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MAX_RETRIES: u32 = 5;

/// Turn a raw rdev event into an engine event, tracking held modifiers.
/// Modifier presses, key releases and mouse movement produce nothing.
pub fn translate(event: &rdev::Event, modifiers: &mut ModifierState) -> Option<InputEvent> {
    match event.event_type {
        EventType::KeyPress(key) => {
            if modifiers.update(&key, true) {
                return None;
            }
            Some(InputEvent::KeyDown(KeyEvent {
                keycode: key,
                shift: modifiers.shift(),
                alt: modifiers.alt(),
                ctrl: modifiers.ctrl(),
                meta: modifiers.meta(),
            }))
        }
        EventType::KeyRelease(key) => {
            modifiers.update(&key, false);
            None
        }
        EventType::ButtonPress(_) => Some(InputEvent::MouseClick),
        _ => None,
    }
}

/// Starts listening for keyboard and mouse events and feeds them to `session`
pub fn start_keyboard_listener(session: Arc<Mutex<Session>>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut modifiers = ModifierState::default();
        let callback = move |event: rdev::Event| {
            let Some(input) = translate(&event, &mut modifiers) else {
                return;
            };
            session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle_event(input);
        };

        // Start a retry loop for the keyboard listener
        let mut retry_count = 0;

        while retry_count < MAX_RETRIES {
            match rdev::listen(callback.clone()) {
                Ok(()) => break,
                Err(e) => {
                    retry_count += 1;
                    tracing::error!(
                        error = ?e,
                        attempt = retry_count,
                        max = MAX_RETRIES,
                        "keyboard listener failed, retrying"
                    );
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }

        if retry_count >= MAX_RETRIES {
            tracing::error!("failed to start keyboard listener after {} attempts", MAX_RETRIES);
        }
    })
}
