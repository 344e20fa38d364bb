pub mod api;
pub mod error;
pub mod logging;
pub mod routes;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::notify::BroadcastPublisher;
use crate::variants::{InMemoryStore, JsonFileStore, MatchStore, StoreError, VariantService};

pub use routes::{router, AppState};

const LOG_TARGET: &str = "calciotto::server";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("unable to open store: {0}")]
    Store(#[from] StoreError),
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the variant service the configuration describes: a JSON-file store when a path is
/// set, memory otherwise, publishing on an in-process broadcast channel.
pub fn build_service(
    config: &AppConfig,
    publisher: Arc<BroadcastPublisher>,
) -> Result<VariantService, StoreError> {
    let store: Arc<dyn MatchStore> = match &config.store_path {
        Some(path) => {
            info!(target: LOG_TARGET, path = %path.display(), "using json file store");
            Arc::new(JsonFileStore::open(path)?)
        }
        None => {
            info!(target: LOG_TARGET, "using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };
    Ok(VariantService::new(
        store,
        publisher,
        config.generation.clone(),
    ))
}

pub async fn run_server(config: &AppConfig) -> Result<(), ServerError> {
    let service = build_service(config, Arc::new(BroadcastPublisher::default()))?;
    let app = router(AppState::new(Arc::new(service)));

    let listener = TcpListener::bind(&config.bind).await?;
    info!(target: LOG_TARGET, bind = %config.bind, "calciotto server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
