//! User Directory API
//!
//! A validated, de-duplicated registry of user identities:
//! - Field validation with structured per-field failures
//! - Configurable uniqueness policies over name, email and phone
//! - Salted one-way password hashing; hashes never leave the service
//! - Pluggable record storage (in-memory or PostgreSQL)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::{AppState, UserDirectory};
use config::StorageBackend;
use infrastructure::user::{
    Argon2Hasher, InMemoryUserRepository, PostgresUserRepository, UserService,
};

/// Create the application state for the configured storage backend
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let hasher = Arc::new(Argon2Hasher::new());
    let directory = config.directory.clone();

    let user_service: Arc<dyn UserDirectory> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory record store");
            let repository = Arc::new(InMemoryUserRepository::with_policy(
                directory.unique_name,
                directory.unique_phone,
            ));
            Arc::new(UserService::new(repository, hasher, directory.clone()))
        }
        StorageBackend::Postgres => {
            let database_url = std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

            info!("Connecting to PostgreSQL...");
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
            info!("PostgreSQL connection established");

            let repository = Arc::new(PostgresUserRepository::new(pool));
            Arc::new(UserService::new(repository, hasher, directory.clone()))
        }
    };

    Ok(AppState::new(
        user_service,
        directory.empty_search_is_not_found,
    ))
}
