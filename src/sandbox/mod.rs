//! Time-bounded evaluation of snippet scripts.
//!
//! Each evaluation runs on its own thread. The caller waits at most the
//! deadline and then reports a timeout; the thread is abandoned rather than
//! killed, and whatever it produces afterwards is dropped.
//!
//! JavaScript snippets get `fetch` and `exec`, i.e. network and shell access
//! with the user's privileges. Lua snippets get neither.

mod host;
mod js;
mod lua;

pub use host::{fetch, run_shell, FetchRequest, FetchResponse, ShellOutput};
pub use js::{evaluate_js, JsSandbox};
pub use lua::{evaluate_lua, LuaSandbox, ENTRY_FUNCTION, OUTPUT_FUNCTION};

use crate::error::ScriptError;
use async_trait::async_trait;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

/// One scripting dialect.
#[async_trait]
pub trait ScriptSandbox: Send + Sync {
    /// Run `source` against the matched `trigger`, giving up after `deadline`.
    async fn evaluate(
        &self,
        trigger: &str,
        source: &str,
        deadline: Duration,
    ) -> Result<String, ScriptError>;
}

/// Run `job` on a dedicated thread and wait for it until `deadline` elapses.
pub(crate) async fn run_with_deadline<F>(
    dialect: &str,
    deadline: Duration,
    job: F,
) -> Result<String, ScriptError>
where
    F: FnOnce() -> Result<String, ScriptError> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    thread::Builder::new()
        .name(format!("{}-snippet", dialect))
        .spawn(move || {
            // Fails only when the caller already gave up
            let _ = tx.send(job());
        })
        .map_err(|err| ScriptError::Runtime(format!("failed to start script thread: {}", err)))?;

    match tokio::time::timeout(deadline, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ScriptError::Runtime(
            "script thread exited without a result".to_string(),
        )),
        Err(_) => {
            tracing::warn!(
                dialect,
                deadline_ms = deadline.as_millis() as u64,
                "snippet script timed out"
            );
            Err(ScriptError::Timeout(deadline.as_millis() as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn fast_job_returns_its_result() {
        let result =
            run_with_deadline("test", Duration::from_secs(2), || Ok("done".to_string())).await;
        assert_eq!(result, Ok("done".to_string()));
    }

    #[tokio::test]
    async fn slow_job_times_out_without_blocking_caller() {
        let started = Instant::now();
        let result = run_with_deadline("test", Duration::from_millis(100), || {
            thread::sleep(Duration::from_millis(600));
            Ok("too late".to_string())
        })
        .await;

        assert_eq!(result, Err(ScriptError::Timeout(100)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn panicking_job_is_a_runtime_error() {
        let result =
            run_with_deadline("test", Duration::from_secs(2), || -> Result<String, ScriptError> {
                panic!("boom")
            })
            .await;
        assert!(matches!(result, Err(ScriptError::Runtime(_))));
    }
}
