use crate::api::{ApiResponse, ControlState, DaemonStatus};
use crate::clipboard::{ArboardClipboard, InjectionTiming, PasteInjector};
use crate::config::{
    daemon_pid_at, ensure_config_dir, get_log_file_path, get_pid_file_path,
    get_snippets_file_path, is_daemon_running, Settings,
};
use crate::error::{QuickwriteError, Result};
use crate::keyboard::EnigoInjector;
use crate::layout::{FileLayoutProvider, LayoutProvider, UsLayout};
use crate::listener::start_keyboard_listener;
use crate::logging::init_file_logging;
use crate::notify::{DesktopNotifier, Notifier};
use crate::sandbox::{JsSandbox, LuaSandbox};
use crate::server::{bind_control_server, port_is_available};
use crate::session::Session;
use crate::storage::FileRegistry;
use crate::worker::ExpansionWorker;

use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Start the daemon process
pub fn start_daemon() -> Result<()> {
    // Check if daemon is already running
    if let Some(pid) = is_daemon_running()? {
        return Err(QuickwriteError::DaemonAlreadyRunning(pid));
    }

    // Ensure config directory exists
    ensure_config_dir()?;

    // Fail in the foreground on bad settings rather than inside the daemon
    let settings = Settings::load()?;
    if !port_is_available(settings.control_port) {
        return Err(QuickwriteError::InvalidConfig(format!(
            "control port {} is already in use",
            settings.control_port
        )));
    }

    // Fork to background on Unix systems
    #[cfg(unix)]
    {
        use daemonize::Daemonize;
        println!("Starting quickwrite daemon in the background");
        println!("Logging to {}", get_log_file_path().display());

        let daemonize = Daemonize::new()
            .working_directory("/tmp")
            .stdout(File::create("/dev/null")?)
            .stderr(File::create("/dev/null")?);

        match daemonize.start() {
            Ok(_) => {
                // We're now in the daemon process
                let _guard = init_file_logging()?;
                run_daemon_worker()
            }
            Err(e) => {
                let msg = format!("Error starting daemon: {}", e);
                Err(QuickwriteError::Other(msg))
            }
        }
    }

    // For non-Unix systems, just continue execution
    #[cfg(not(unix))]
    {
        println!(
            "Starting quickwrite daemon in the foreground (background not supported on this OS)"
        );
        println!("Logging to {}", get_log_file_path().display());
        let _guard = init_file_logging()?;
        run_daemon_worker()
    }
}

/// Record this process in `pid_file`, refusing when another live process
/// already owns it.
fn claim_pid_file(pid_file: &Path) -> Result<()> {
    if let Some(pid) = daemon_pid_at(pid_file)? {
        return Err(QuickwriteError::DaemonAlreadyRunning(pid));
    }

    let mut file = File::create(pid_file)?;
    write!(file, "{}", process::id())?;
    Ok(())
}

/// The actual daemon worker process
pub fn run_daemon_worker() -> Result<()> {
    ensure_config_dir()?;

    // Create PID file
    let pid_file = get_pid_file_path();
    claim_pid_file(&pid_file)?;

    let result = Settings::load().and_then(run_session);
    if let Err(e) = &result {
        tracing::error!(error = %e, "expansion session ended with an error");
    }

    // Cleanup
    if let Err(e) = fs::remove_file(&pid_file) {
        tracing::warn!(error = %e, "failed to remove PID file");
    }

    result
}

/// Wire up the capabilities and run one expansion session until the keyboard
/// listener gives up.
pub fn run_session(settings: Settings) -> Result<()> {
    tracing::info!(pid = process::id(), ?settings, "starting expansion session");

    let registry = Arc::new(FileRegistry::new(get_snippets_file_path(), &settings));
    let layout: Arc<dyn LayoutProvider> = match &settings.layout_file {
        Some(path) => Arc::new(FileLayoutProvider::new(path)),
        None => Arc::new(UsLayout),
    };
    let keys = Arc::new(EnigoInjector::new(Duration::from_millis(settings.keystroke_delay_ms)));

    let injector = PasteInjector::new(
        Arc::new(ArboardClipboard),
        keys.clone(),
        InjectionTiming::from_settings(&settings),
    );
    let notifier = DesktopNotifier::detect();
    if !notifier.is_supported() {
        tracing::info!("desktop notifications unavailable, script errors will be typed inline");
    }
    let worker = ExpansionWorker::new(
        injector,
        Arc::new(LuaSandbox),
        Arc::new(JsSandbox),
        Arc::new(notifier),
        settings.script_timeout(),
    );

    let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
    let session = Arc::new(Mutex::new(Session::new(
        registry.clone(),
        layout,
        keys,
        jobs_tx,
    )));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // A second engine would expand every trigger twice; the port doubles as a lock
    let control = {
        let _entered = runtime.enter();
        bind_control_server(settings.control_port, ControlState::new(registry))?
    };
    runtime.spawn(control);
    runtime.spawn(worker.run(jobs_rx));

    let listener = start_keyboard_listener(session);
    if listener.join().is_err() {
        return Err(QuickwriteError::Listener(
            "keyboard listener thread panicked".to_string(),
        ));
    }

    Err(QuickwriteError::Listener(
        "keyboard listener stopped".to_string(),
    ))
}

/// Stop the daemon if it's running
pub fn stop_daemon() -> Result<()> {
    let pid_file = get_pid_file_path();

    if !pid_file.exists() {
        return Err(QuickwriteError::DaemonNotRunning);
    }

    let pid_str = fs::read_to_string(&pid_file)?;
    let pid = pid_str
        .trim()
        .parse::<u32>()
        .map_err(|_| QuickwriteError::InvalidPid)?;

    #[cfg(unix)]
    let status = process::Command::new("kill").arg(pid.to_string()).status();

    #[cfg(windows)]
    let status = process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .status();

    #[cfg(not(any(unix, windows)))]
    let status: std::io::Result<process::ExitStatus> = Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "stopping the daemon is not supported on this platform",
    ));

    match status {
        Ok(status) if status.success() => {
            println!("Stopped quickwrite daemon with PID {}", pid);
            fs::remove_file(&pid_file)?;
            Ok(())
        }
        _ => Err(QuickwriteError::Other(format!(
            "Failed to stop daemon with PID {}",
            pid
        ))),
    }
}

fn control_url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{}{}", port, path)
}

fn decode_response<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let body = response
        .text()
        .map_err(|e| QuickwriteError::Other(format!("control API read failed: {}", e)))?;
    let parsed: ApiResponse<T> = serde_json::from_str(&body)?;
    match (parsed.success, parsed.data) {
        (true, Some(data)) => Ok(data),
        (_, _) => Err(QuickwriteError::Other(
            parsed
                .error
                .unwrap_or_else(|| "control API returned no data".to_string()),
        )),
    }
}

fn control_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .map_err(|e| QuickwriteError::Other(format!("failed to build HTTP client: {}", e)))
}

/// Ask the running daemon for its state.
pub fn query_status(port: u16) -> Result<DaemonStatus> {
    let response = control_client()?
        .get(control_url(port, "/api/status"))
        .send()
        .map_err(|e| QuickwriteError::Other(format!("control API unreachable: {}", e)))?;
    decode_response(response)
}

/// Turn matching on or off in the running daemon. Returns the new state.
pub fn set_remote_enabled(port: u16, enabled: bool) -> Result<bool> {
    if is_daemon_running()?.is_none() {
        return Err(QuickwriteError::DaemonNotRunning);
    }

    let path = if enabled { "/api/enable" } else { "/api/disable" };
    let response = control_client()?
        .post(control_url(port, path))
        .send()
        .map_err(|e| QuickwriteError::Other(format!("control API unreachable: {}", e)))?;
    decode_response(response)
}

/// Check daemon status
pub fn daemon_status() -> Result<()> {
    match is_daemon_running()? {
        Some(pid) => {
            println!("quickwrite daemon is running with PID {}", pid);
            let port = Settings::load()?.control_port;
            match query_status(port) {
                Ok(status) => {
                    println!(
                        "  matching: {}",
                        if status.enabled { "enabled" } else { "disabled" }
                    );
                    println!("  snippets: {} ({})", status.snippets, status.snippets_path);
                    println!("  buffer length: {}", status.buffer_length);
                    println!("  started: {}", status.started_at);
                }
                Err(e) => println!("  control API: {}", e),
            }
            Ok(())
        }
        None => {
            println!("quickwrite daemon is not running");
            Ok(())
        }
    }
}
