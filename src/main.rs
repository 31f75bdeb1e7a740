use clap::Parser;
use quickwrite::logging::init_stderr_logging;
use quickwrite::{
    daemon_status, eval_snippet, run_daemon_worker, set_remote_enabled, start_daemon, stop_daemon,
    Commands, Quickwrite, Settings,
};
use std::process;

fn exit_on_error<T>(context: &str, result: quickwrite::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}: {}", context, e);
            process::exit(1);
        }
    }
}

fn toggle(enabled: bool) {
    let port = exit_on_error("Failed to read settings", Settings::load()).control_port;
    let now = exit_on_error(
        "Failed to reach daemon",
        set_remote_enabled(port, enabled),
    );
    println!(
        "Snippet matching {}",
        if now { "enabled" } else { "disabled" }
    );
}

fn main() {
    let quickwrite = Quickwrite::parse();

    match quickwrite.commands {
        Commands::Start => exit_on_error("Failed to start daemon", start_daemon()),
        Commands::Stop => exit_on_error("Failed to stop daemon", stop_daemon()),
        Commands::Status => exit_on_error("Failed to check daemon status", daemon_status()),
        Commands::Run => {
            init_stderr_logging();
            exit_on_error("Error", run_daemon_worker());
        }
        Commands::Enable => toggle(true),
        Commands::Disable => toggle(false),
        Commands::Eval {
            kind,
            trigger,
            file,
        } => {
            init_stderr_logging();
            match exit_on_error("Error", eval_snippet(kind, &trigger, &file)) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("{}", e.display_text());
                    process::exit(1);
                }
            }
        }
    }
}
