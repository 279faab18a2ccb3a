//! # TaskDeck server
//!
//! axum front end for the [`taskdeck`] services.
//!
//! - [`config`]: clap flags with environment fallbacks
//! - [`routes`]: the route table and CORS policy
//! - [`extract`]: bearer-token authentication as an extractor
//! - [`error`]: service errors mapped onto HTTP statuses
//!
//! Run it with:
//!
//! ```sh
//! JWT_SECRET=change-me RUST_LOG=info cargo run -p taskdeck_server
//! ```

use log::info;
use tokio::{net::TcpListener, signal::ctrl_c};

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError};
pub use routes::router;
pub use state::AppState;

pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    info!("Opening database...");
    let store = config.store_builder().build().await?;
    store.migrate().await?;

    let state = AppState::new(&store, config.auth_settings());
    let app = router(state);

    info!("Binding to {}", config.bind);
    let listener = TcpListener::bind(config.bind).await?;
    info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    store.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                log::error!("Failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
