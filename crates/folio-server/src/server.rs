use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use folio_catalog::{CatalogError, CatalogEvent, CatalogStore};
use folio_gate::AdminGate;
use folio_store::{open_backend, BackendConfig};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::contact::{ContactRelay, FormRelay};
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Folio gallery server.
pub struct FolioServer {
    config: ServerConfig,
    state: AppState,
}

impl FolioServer {
    /// Open the backend, load the catalog and configure the admin gate.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let gate = AdminGate::from_config(&config.admin)?;
        let backend = open_backend(&config.backend)
            .await
            .map_err(CatalogError::from)?;
        let catalog = Arc::new(CatalogStore::open(backend).await);
        let mut state = AppState::new(catalog, Arc::new(gate));
        if let Some(contact) = &config.contact {
            let relay: Arc<dyn ContactRelay> = Arc::new(FormRelay::new(contact)?);
            state = state.with_contact(relay);
        }
        Ok(Self::with_state(config, state))
    }

    /// Serve already-built state, e.g. an in-memory catalog.
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the full application: routes, image files and middleware.
    pub fn router(&self) -> Router {
        let mut app = build_router(self.state.clone());
        if let BackendConfig::Local(local) = &self.config.backend {
            if local.public_base.starts_with('/') {
                let files = ServeDir::new(&local.images_dir);
                // axum refuses to nest at the root
                app = match local.public_base.trim_end_matches('/') {
                    "" => app.fallback_service(files),
                    base => app.nest_service(base, files),
                };
            }
        }
        app.layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        spawn_event_log(&self.state.catalog);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Folio server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

fn spawn_event_log(catalog: &CatalogStore) {
    let mut events = catalog.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CatalogEvent::Refreshed { revision, count } => {
                    debug!(revision, count, "catalog refreshed")
                }
                CatalogEvent::RefreshFailed { message } => {
                    warn!(%message, "catalog refresh failed; serving previous snapshot")
                }
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
