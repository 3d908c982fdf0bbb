//! Essaylab Server - HTTP/JSON API
//!
//! Exposes demographics capture, session start and essay submission over the
//! core services. The database is the only shared state between requests.

pub mod backup;
pub mod config;
pub mod error;
pub mod http;
#[cfg(feature = "s3")]
pub mod s3;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use essaylab_core::db::open_db;
use essaylab_core::{Clock, EssayBackup};
use log::{info, warn};
use rusqlite::Connection;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::error::ApiError;

/// Shared application state.
pub struct AppState {
    pub db_path: PathBuf,
    pub clock: Arc<dyn Clock>,
    pub backup: EssayBackup,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>, clock: Arc<dyn Clock>, backup: EssayBackup) -> Self {
        Self {
            db_path: db_path.into(),
            clock,
            backup,
        }
    }

    /// Opens a connection on the blocking pool and runs `op` with it.
    pub(crate) async fn with_connection<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = open_db(&db_path)?;
            op(&mut conn)
        })
        .await?
    }
}

/// Builds the CORS policy. A `*` entry allows any origin without
/// credentials; otherwise only the listed origins may send credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("event=cors_config module=server status=skipped origin={origin}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>, origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(http::health))
        .route("/api/demographics", post(http::save_demographics))
        .route("/api/writing-session/start", post(http::start_session))
        .route("/api/essay/submit", post(http::submit_essay))
        .layer(cors_layer(origins))
        .with_state(state)
}

/// Serves `app` on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("event=server_listen module=server status=ok addr={}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("event=server_listen module=server status=stopped");
    Ok(())
}
