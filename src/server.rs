use crate::api::{api_set_enabled, api_status, ControlState};
use crate::error::{QuickwriteError, Result};
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use warp::Filter;

fn control_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Whether nothing is listening on the control port yet.
pub fn port_is_available(port: u16) -> bool {
    TcpListener::bind(control_addr(port)).is_ok()
}

fn with_state(
    state: ControlState,
) -> impl Filter<Extract = (ControlState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// The control API routes
pub fn routes(
    state: ControlState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let status = warp::path!("api" / "status")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: ControlState| warp::reply::json(&api_status(&state)));

    let enable = warp::path!("api" / "enable")
        .and(warp::post())
        .and(with_state(state.clone()))
        .map(|state: ControlState| warp::reply::json(&api_set_enabled(&state, true)));

    let disable = warp::path!("api" / "disable")
        .and(warp::post())
        .and(with_state(state))
        .map(|state: ControlState| warp::reply::json(&api_set_enabled(&state, false)));

    // Health check endpoint
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| "quickwrite is running");

    status.or(enable).or(disable).or(health)
}

/// Bind the control API on 127.0.0.1 and return the server future. Must be
/// called inside a tokio runtime; fails when the port is taken.
pub fn bind_control_server(
    port: u16,
    state: ControlState,
) -> Result<impl Future<Output = ()> + Send + 'static> {
    let addr = control_addr(port);
    let (bound, server) = warp::serve(routes(state))
        .try_bind_ephemeral(addr)
        .map_err(|e| {
            QuickwriteError::Other(format!("failed to bind control API on {}: {}", addr, e))
        })?;

    tracing::info!(addr = %bound, "control API listening");
    Ok(server)
}
