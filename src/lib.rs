pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpResponse;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, Clock, SystemClock};
pub use db::{MemoryUserStore, PgUserStore, PublicUser, User, UserStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Connects the Postgres-backed store and wires the credential service.
    pub async fn new(config: Settings) -> Result<Self> {
        let store = PgUserStore::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(5),
        )
        .await?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Wires the service onto any store implementation; tests pass the
    /// in-memory one.
    pub fn with_store(config: Settings, store: Arc<dyn UserStore>) -> Self {
        let auth_service = AuthService::new(
            store,
            Arc::new(SystemClock),
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_days,
            config.auth.bcrypt_cost,
        );

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        }
    }
}
