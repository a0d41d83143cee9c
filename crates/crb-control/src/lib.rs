//! Operator control surface: status, start and stop of the polling loop.
//!
//! Internal-only; there is no authentication.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{extract::State, response::Json, routing::get, Router};

use crb_core::poller::{Poller, PollerStatus};

#[derive(Clone)]
pub struct ControlState {
    pub poller: Arc<Poller>,
}

pub fn control_router(state: ControlState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/start", get(start).post(start))
        .route("/stop", get(stop).post(stop))
        .with_state(state)
}

async fn status(State(state): State<ControlState>) -> Json<PollerStatus> {
    Json(state.poller.status())
}

async fn start(State(state): State<ControlState>) -> &'static str {
    if state.poller.start() {
        tracing::info!("polling loop started via control surface");
        "Bot started"
    } else {
        "Bot already running"
    }
}

async fn stop(State(state): State<ControlState>) -> &'static str {
    state.poller.stop();
    "Bot stopped"
}

/// Serve the control routes until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: ControlState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "control server listening");
    axum::serve(listener, control_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
