use docenrich::config::{config_path_from_env, load_config_or_default};
use docenrich::JobSupervisor;
use docenrich_server::{init_logging, start_server, AppState, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path_from_env();
    let config = load_config_or_default(config_path.as_deref())?;

    init_logging(&LoggingConfig {
        json_format: config.server.log_json,
        default_filter: None,
    });

    match &config_path {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::info!("No configuration file set, using defaults"),
    }

    let supervisor = JobSupervisor::from_config(&config)?;
    let state = AppState::new(supervisor);

    start_server(
        &config.server.bind,
        state,
        config.server.max_upload_bytes,
        shutdown_signal(),
    )
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
