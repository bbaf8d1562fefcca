//! HTTP surface for the docenrich job orchestrator.
//!
//! Uploads become jobs on a [`docenrich::JobSupervisor`]; clients poll for
//! status and results by job id.

mod logging;
mod routes;
mod state;

pub use logging::{init_logging, LoggingConfig};
pub use routes::{build_router, ApiError};
pub use state::AppState;

/// Serves the API until `shutdown` resolves.
pub async fn start_server<F>(
    addr: &str,
    state: AppState,
    max_upload_bytes: usize,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
