//! Per-event dispatch: buffer bookkeeping, matching and trigger erasure.

use crate::buffer::MatchBuffer;
use crate::expansion::SnippetMatcher;
use crate::keyboard::{is_arrow, is_backspace, is_tab, KeyInjector};
use crate::layout::{decode, LayoutProvider};
use crate::models::{InputEvent, KeyEvent};
use crate::storage::SnippetRegistry;
use crate::worker::ExpansionJob;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// State of one running expansion session. Created when the engine starts
/// and dropped when it stops.
pub struct Session {
    registry: Arc<dyn SnippetRegistry>,
    layout: Arc<dyn LayoutProvider>,
    keys: Arc<dyn KeyInjector>,
    jobs: UnboundedSender<ExpansionJob>,
    buffer: MatchBuffer,
    matcher: SnippetMatcher,
}

impl Session {
    pub fn new(
        registry: Arc<dyn SnippetRegistry>,
        layout: Arc<dyn LayoutProvider>,
        keys: Arc<dyn KeyInjector>,
        jobs: UnboundedSender<ExpansionJob>,
    ) -> Self {
        let buffer = MatchBuffer::new(registry.buffer_length());
        Self {
            registry,
            layout,
            keys,
            jobs,
            buffer,
            matcher: SnippetMatcher::new(),
        }
    }

    pub fn buffer(&self) -> &MatchBuffer {
        &self.buffer
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        if !self.registry.is_enabled() {
            return;
        }

        match event {
            InputEvent::MouseClick => {
                // The caret may have moved anywhere
                self.buffer.clear();
            }
            InputEvent::KeyDown(key) => self.handle_key(key),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let backspace = is_backspace(&key.keycode);

        if (backspace && key.alt) || is_tab(&key.keycode) || is_arrow(&key.keycode) {
            self.buffer.clear();
            return;
        }

        if backspace {
            self.buffer.truncate_end(1);
            return;
        }

        let Some(c) = decode(&key, self.layout.as_ref()) else {
            return;
        };

        self.buffer.set_max_len(self.registry.buffer_length());
        self.buffer.push(c);
        self.try_expand();
    }

    fn try_expand(&mut self) {
        let snippets = self.registry.snippets();
        let text = self.buffer.as_string();
        let Some(found) = self.matcher.find_match(&text, &snippets) else {
            return;
        };

        tracing::debug!(key = %found.snippet.key, matched = %found.matched, "trigger matched");

        if let Err(err) = self.keys.send_backspace(found.erase_count()) {
            tracing::warn!(error = %err, "failed to erase trigger");
        }

        let job = ExpansionJob {
            snippet: found.snippet,
            trigger: found.matched,
        };
        if self.jobs.send(job).is_err() {
            tracing::error!("expansion worker is gone, dropping expansion");
        }

        self.buffer.clear();
    }
}
