//! Quickwrite - a background text expander.
//!
//! Quickwrite watches what you type, and when the recent input ends with a
//! registered trigger it erases the trigger and pastes the expansion in its
//! place. Expansions are plain text or the output of a small Lua or
//! JavaScript snippet.

pub mod api;
pub mod buffer;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod daemon;
pub mod error;
pub mod expansion;
pub mod keyboard;
pub mod layout;
pub mod listener;
pub mod logging;
pub mod models;
pub mod notify;
pub mod sandbox;
pub mod server;
pub mod session;
pub mod storage;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export
pub use api::{ApiResponse, ControlState, DaemonStatus};
pub use cli::{eval_snippet, Commands, Quickwrite, ScriptKind};
pub use clipboard::{
    ArboardClipboard, ClipboardAccess, ClipboardSnapshot, InjectionTiming, PasteInjector,
};
pub use config::{get_config_dir, is_daemon_running, Settings};
pub use daemon::{
    daemon_status, run_daemon_worker, run_session, set_remote_enabled, start_daemon, stop_daemon,
};
pub use error::{QuickwriteError, Result, ScriptError};
pub use expansion::{SnippetMatch, SnippetMatcher};
pub use keyboard::{EnigoInjector, KeyInjector, Modifier, TapKey};
pub use layout::{decode, FileLayoutProvider, LayoutEntry, LayoutMap, LayoutProvider, UsLayout};
pub use models::{InputEvent, KeyEvent, Snippet, SnippetKind};
pub use notify::{DesktopNotifier, NoNotifier, Notifier};
pub use sandbox::{JsSandbox, LuaSandbox, ScriptSandbox};
pub use server::bind_control_server;
pub use session::Session;
pub use storage::{FileRegistry, SnippetRegistry};
pub use worker::{ExpansionJob, ExpansionWorker};
