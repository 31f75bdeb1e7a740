use crate::config::Settings;
use crate::error::{Result, ScriptError};
use crate::sandbox::{JsSandbox, LuaSandbox, ScriptSandbox};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "Background text expander with scriptable snippets",
)]
pub struct Quickwrite {
    #[clap(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the expansion daemon in the background
    Start,
    /// Stop the running daemon
    Stop,
    /// Show whether the daemon is running and what it has loaded
    Status,
    /// Run the expansion engine in the foreground, logging to stderr
    Run,
    /// Resume snippet matching in the running daemon
    Enable,
    /// Pause snippet matching in the running daemon
    Disable,
    /// Evaluate a script snippet once and print its expansion
    Eval {
        #[clap(long = "type", short = 't', value_enum, help = "Script dialect")]
        kind: ScriptKind,

        #[clap(long, short = 'g', default_value = "", help = "Trigger text passed to the script")]
        trigger: String,

        #[clap(help = "File containing the snippet source")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptKind {
    Lua,
    Js,
}

/// Evaluate the snippet in `file` with the configured script timeout.
/// The outer error covers reading the file; the inner one is the script's.
pub fn eval_snippet(
    kind: ScriptKind,
    trigger: &str,
    file: &Path,
) -> Result<std::result::Result<String, ScriptError>> {
    let source = fs::read_to_string(file)?;
    let timeout = Settings::load()?.script_timeout();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let sandbox: Box<dyn ScriptSandbox> = match kind {
        ScriptKind::Lua => Box::new(LuaSandbox),
        ScriptKind::Js => Box::new(JsSandbox),
    };
    Ok(runtime.block_on(sandbox.evaluate(trigger, &source, timeout)))
}
