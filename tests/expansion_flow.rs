use quickwrite::{
    ClipboardAccess, ExpansionWorker, InjectionTiming, InputEvent, JsSandbox, KeyEvent,
    KeyInjector, LuaSandbox, Modifier, NoNotifier, PasteInjector, Session, Snippet, SnippetKind,
    SnippetRegistry, TapKey, UsLayout,
};
use rdev::Key;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct Clipboard {
    text: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl ClipboardAccess for Clipboard {
    fn read_text(&self) -> quickwrite::Result<String> {
        Ok(self.text.lock().unwrap().clone())
    }

    fn write_text(&self, text: &str) -> quickwrite::Result<()> {
        *self.text.lock().unwrap() = text.to_string();
        self.history.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Keys {
    log: Mutex<Vec<String>>,
}

impl KeyInjector for Keys {
    fn key_tap(&self, key: TapKey, modifiers: &[Modifier]) -> quickwrite::Result<()> {
        let entry = match key {
            TapKey::Backspace => "BS".to_string(),
            TapKey::Char(c) if !modifiers.is_empty() => format!("paste:{}", c),
            TapKey::Char(c) => c.to_string(),
        };
        self.log.lock().unwrap().push(entry);
        Ok(())
    }
}

struct Registry(Arc<Vec<Snippet>>);

impl SnippetRegistry for Registry {
    fn snippets(&self) -> Arc<Vec<Snippet>> {
        Arc::clone(&self.0)
    }

    fn buffer_length(&self) -> usize {
        30
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

fn keys_for(text: &str) -> Vec<KeyEvent> {
    text.chars()
        .map(|c| match c {
            'b' => KeyEvent::plain(Key::KeyB),
            't' => KeyEvent::plain(Key::KeyT),
            'w' => KeyEvent::plain(Key::KeyW),
            'd' => KeyEvent::plain(Key::KeyD),
            ';' => KeyEvent::plain(Key::SemiColon),
            ' ' => KeyEvent::plain(Key::Space),
            '!' => KeyEvent::plain(Key::Num1).with_shift(),
            other => panic!("unmapped {:?}", other),
        })
        .collect()
}

#[tokio::test]
async fn typed_triggers_are_replaced_and_clipboard_survives() {
    let snippets = vec![
        Snippet::plain("btw", "by the way"),
        Snippet::new(
            "d;",
            false,
            SnippetKind::Lua,
            r#"function qw(t) qprint("<" .. t .. ">") end"#,
        ),
        Snippet::new("!!", false, SnippetKind::Js, "async (t) => t.length * 21"),
    ];

    let clipboard = Arc::new(Clipboard::default());
    clipboard.write_text("user data").unwrap();
    clipboard.history.lock().unwrap().clear();
    let keys = Arc::new(Keys::default());

    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = Session::new(
        Arc::new(Registry(Arc::new(snippets))),
        Arc::new(UsLayout),
        keys.clone(),
        tx,
    );

    let worker = ExpansionWorker::new(
        PasteInjector::new(
            clipboard.clone(),
            keys.clone(),
            InjectionTiming {
                paste_delay: Duration::from_millis(5),
                restore_delay: Duration::from_millis(25),
            },
        ),
        Arc::new(LuaSandbox),
        Arc::new(JsSandbox),
        Arc::new(NoNotifier),
        Duration::from_secs(3),
    );

    for event in keys_for("btw d; !!") {
        session.handle_event(InputEvent::KeyDown(event));
    }
    drop(session);
    worker.run(rx).await;

    assert_eq!(
        *clipboard.history.lock().unwrap(),
        vec!["by the way", "user data", "<d;>", "user data", "42", "user data"]
    );
    assert_eq!(*clipboard.text.lock().unwrap(), "user data");

    let log = keys.log.lock().unwrap();
    let backspaces = log.iter().filter(|k| *k == "BS").count();
    assert_eq!(backspaces, 3 + 2 + 2);
    assert_eq!(log.iter().filter(|k| k.starts_with("paste:")).count(), 3);
}
