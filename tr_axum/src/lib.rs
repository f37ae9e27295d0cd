pub mod signature;

use axum::Router;
use std::{future::Future, net::SocketAddr};
use tokio::net::TcpListener;

/// Serves an Axum router on `addr` until Ctrl+C or SIGTERM is received.
///
/// `on_shutdown` runs as soon as the signal arrives, before the server
/// waits for in-flight requests. Use it to end long-lived streaming
/// responses, which otherwise keep the server alive.
///
/// # Errors
///
/// Returns an error if the listener fails to bind to `addr` or the server
/// fails while running.
pub async fn run_app<F>(
    app: Router,
    addr: SocketAddr,
    on_shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce() + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");

    serve(listener, app, shutdown_signal(), on_shutdown).await?;

    Ok(())
}

/// Serves `app` on an already bound listener until `signal` resolves, then
/// runs `on_shutdown` and waits for in-flight requests to finish.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve<S, F>(
    listener: TcpListener,
    app: Router,
    signal: S,
    on_shutdown: F,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            signal.await;
            on_shutdown();
        })
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::warn!("signal received, starting graceful shutdown");
}
