use bookstore_service::config::BookstoreConfig;
use bookstore_service::services::init_metrics;
use bookstore_service::startup::Application;
use service_core::error::AppError;
use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = BookstoreConfig::load()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        store = ?config.store,
        database = %config.mongodb.database,
        collection = %config.mongodb.collection,
        "Starting bookstore service"
    );

    let app = Application::build(config).await?;

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}
