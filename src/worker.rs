use crate::clipboard::PasteInjector;
use crate::error::ScriptError;
use crate::models::{Snippet, SnippetKind};
use crate::notify::Notifier;
use crate::sandbox::ScriptSandbox;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// A matched snippet waiting to be expanded. The trigger has already been
/// erased from the focused application when the job is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionJob {
    pub snippet: Snippet,
    /// Text the trigger matched in the buffer.
    pub trigger: String,
}

/// Consumes expansion jobs one at a time.
///
/// Each job runs to the end of its clipboard restore before the next one
/// starts, so two expansions never share the clipboard.
pub struct ExpansionWorker {
    injector: PasteInjector,
    lua: Arc<dyn ScriptSandbox>,
    js: Arc<dyn ScriptSandbox>,
    notifier: Arc<dyn Notifier>,
    script_timeout: Duration,
}

impl ExpansionWorker {
    pub fn new(
        injector: PasteInjector,
        lua: Arc<dyn ScriptSandbox>,
        js: Arc<dyn ScriptSandbox>,
        notifier: Arc<dyn Notifier>,
        script_timeout: Duration,
    ) -> Self {
        Self {
            injector,
            lua,
            js,
            notifier,
            script_timeout,
        }
    }

    /// Process jobs until every sender is dropped.
    pub async fn run(self, mut jobs: UnboundedReceiver<ExpansionJob>) {
        tracing::info!("expansion worker started");
        while let Some(job) = jobs.recv().await {
            self.expand(job).await;
        }
        tracing::info!("expansion worker stopped");
    }

    pub async fn expand(&self, job: ExpansionJob) {
        tracing::debug!(key = %job.snippet.key, kind = ?job.snippet.kind, "expanding snippet");

        // Scripts may take a while; take the snapshot before they run
        let snapshot = self.injector.snapshot();

        let result = match job.snippet.kind {
            SnippetKind::Plain => Ok(job.snippet.value.clone()),
            SnippetKind::Lua => {
                self.lua
                    .evaluate(&job.trigger, &job.snippet.value, self.script_timeout)
                    .await
            }
            SnippetKind::Js => {
                self.js
                    .evaluate(&job.trigger, &job.snippet.value, self.script_timeout)
                    .await
            }
        };

        let text = match result {
            Ok(text) => text,
            Err(err) => self.report(&job.snippet, &err),
        };

        self.injector.paste_and_restore(snapshot, &text).await;
    }

    /// Surface a script failure and return the text to inject in its place.
    fn report(&self, snippet: &Snippet, err: &ScriptError) -> String {
        tracing::warn!(key = %snippet.key, error = %err, tag = err.tag(), "snippet script failed");

        if self.notifier.is_supported() {
            match self.notifier.show(err.tag(), &err.to_string()) {
                Ok(()) => return String::new(),
                Err(notify_err) => {
                    tracing::warn!(error = %notify_err, "notification failed, typing error instead")
                }
            }
        }
        err.display_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::InjectionTiming;
    use crate::notify::NoNotifier;
    use crate::sandbox::{JsSandbox, LuaSandbox};
    use crate::testing::{FakeClipboard, RecordingKeys, RecordingNotifier};
    use tokio::sync::mpsc;

    struct Harness {
        clipboard: Arc<FakeClipboard>,
        keys: Arc<RecordingKeys>,
        worker: ExpansionWorker,
    }

    fn harness(notifier: Arc<dyn Notifier>, script_timeout: Duration) -> Harness {
        let clipboard = Arc::new(FakeClipboard::with_text("saved"));
        let keys = Arc::new(RecordingKeys::default());
        let injector = PasteInjector::new(
            clipboard.clone(),
            keys.clone(),
            InjectionTiming {
                paste_delay: Duration::from_millis(5),
                restore_delay: Duration::from_millis(30),
            },
        );
        let worker = ExpansionWorker::new(
            injector,
            Arc::new(LuaSandbox),
            Arc::new(JsSandbox),
            notifier,
            script_timeout,
        );
        Harness {
            clipboard,
            keys,
            worker,
        }
    }

    fn job(kind: SnippetKind, key: &str, value: &str) -> ExpansionJob {
        ExpansionJob {
            snippet: Snippet::new(key, false, kind, value),
            trigger: key.to_string(),
        }
    }

    #[tokio::test]
    async fn plain_snippet_is_pasted_verbatim() {
        let h = harness(Arc::new(NoNotifier), Duration::from_secs(2));
        h.worker.expand(job(SnippetKind::Plain, "btw", "by the way")).await;

        assert_eq!(h.clipboard.writes(), vec!["by the way", "saved"]);
        assert_eq!(h.keys.pastes(), 1);
    }

    #[tokio::test]
    async fn lua_output_is_pasted() {
        let h = harness(Arc::new(NoNotifier), Duration::from_secs(2));
        let source = r#"function qw(t) qprint("a") qprint("b") end"#;
        h.worker.expand(job(SnippetKind::Lua, "ab;", source)).await;

        assert_eq!(h.clipboard.writes(), vec!["ab", "saved"]);
    }

    #[tokio::test]
    async fn js_number_is_stringified() {
        let h = harness(Arc::new(NoNotifier), Duration::from_secs(2));
        h.worker.expand(job(SnippetKind::Js, "seven", "() => 7")).await;

        assert_eq!(h.clipboard.writes(), vec!["7", "saved"]);
    }

    #[tokio::test]
    async fn timeout_is_typed_inline_and_clipboard_restored() {
        let h = harness(Arc::new(NoNotifier), Duration::from_millis(100));
        let source = "() => new Promise(() => {})";
        h.worker.expand(job(SnippetKind::Js, "hang", source)).await;

        let writes = h.clipboard.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[0].starts_with("ScriptTimeoutError "));
        assert_eq!(h.clipboard.current(), "saved");
    }

    #[tokio::test]
    async fn errors_go_to_notifier_when_supported() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness(notifier.clone(), Duration::from_secs(2));
        h.worker.expand(job(SnippetKind::Js, "bad", "42")).await;

        let shown = notifier.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "InvalidSnippetError");
        assert_eq!(h.clipboard.writes(), vec!["", "saved"]);
    }

    #[tokio::test]
    async fn jobs_run_one_after_another() {
        let h = harness(Arc::new(NoNotifier), Duration::from_secs(2));
        let clipboard = h.clipboard.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(job(SnippetKind::Plain, "one", "first")).unwrap();
        tx.send(job(SnippetKind::Plain, "two", "second")).unwrap();
        drop(tx);
        h.worker.run(rx).await;

        assert_eq!(clipboard.writes(), vec!["first", "saved", "second", "saved"]);
    }
}
