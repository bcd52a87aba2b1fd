use flowermatch::{
    create_router, init, AppState, Config, ResNetEmbedder, ResNetFlowerClassifier, Result,
};

use std::sync::Arc;

use tch::Device;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the application
    init()?;

    let config = Config::from_env()?;
    log::info!("Catalog service at {}", config.catalog.base_url);

    // Both networks share one device for the whole process lifetime
    let device = Device::cuda_if_available();
    log::info!("Running inference on {:?}", device);

    let classifier = ResNetFlowerClassifier::load(&config.models.classifier_weights, device)?;
    let embedder = ResNetEmbedder::load(&config.models.embedder_weights, device)?;

    let addr = config.bind_addr;
    let state = AppState::new(config, Arc::new(classifier), Arc::new(embedder))?;
    let app = create_router(state)?;

    let listener = TcpListener::bind(addr).await?;
    log::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
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
                log::error!("Failed to install SIGTERM handler: {}", e);
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

    log::info!("Shutdown signal received");
}
