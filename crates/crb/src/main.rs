use std::{future::Future, sync::Arc};

use tokio_util::sync::CancellationToken;

use crb_control::ControlState;
use crb_core::{
    config::Config,
    handlers::HandlerDeps,
    messaging::port::TransportClient,
    poller::Poller,
    ports::BackendClient,
    router::Router,
};
use crb_firebase::{FirebaseBackend, FirebaseConfig};
use crb_telegram::TelegramTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crb_core::logging::init("crb")?;

    let cfg = Config::load()?;
    tracing::info!(
        control_addr = %cfg.control_addr,
        project = %cfg.firebase_project_id,
        "configuration loaded"
    );

    let transport: Arc<dyn TransportClient> = Arc::new(TelegramTransport::new(
        &cfg.telegram_api_base,
        &cfg.telegram_bot_token,
        cfg.http_timeout,
    )?);
    let backend: Arc<dyn BackendClient> =
        Arc::new(FirebaseBackend::new(FirebaseConfig::from_config(&cfg))?);

    let router = Router::new(HandlerDeps {
        transport: transport.clone(),
        backend,
        settings: cfg.handler_settings(),
    });
    let poller = Arc::new(Poller::new(transport, router, cfg.poll_config()));

    if cfg.autostart {
        poller.start();
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        });
    }

    let served = crb_control::serve(
        cfg.control_addr,
        ControlState {
            poller: poller.clone(),
        },
        shutdown.clone().cancelled_owned(),
    )
    .await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "control server failed");
    }

    // Finish the current cycle, then drop the last references to the clients.
    poller.shutdown().await;
    drop(poller);
    tracing::info!("bridge stopped");

    served
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = signal_or_pending("ctrl-c", tokio::signal::ctrl_c()) => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C only");
                signal_or_pending("ctrl-c", tokio::signal::ctrl_c()).await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal_or_pending("ctrl-c", tokio::signal::ctrl_c()).await;
    }
}

/// Resolve when the signal arrives. A handler that cannot be installed never
/// resolves, so the process keeps running instead of shutting down at once.
async fn signal_or_pending(name: &str, signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::error!(signal = name, error = %e, "signal handler unavailable");
        std::future::pending::<()>().await;
    }
}
