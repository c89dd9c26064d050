use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::memory::MemoryStorage;
use super::postgres::PgStorage;
use super::storage::{SessionStore, Storage, StorageError};
use crate::config::{DatabaseConfig, StorageBackend};

/// Gateway and session store handed to the route layer at start-up
#[derive(Clone)]
pub struct Backends {
    pub storage: Arc<dyn Storage>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Backends {
    pub fn memory() -> Self {
        let store = MemoryStorage::new();
        Self {
            storage: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }

    pub fn postgres(store: PgStorage) -> Self {
        Self {
            storage: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }
}

/// Builds the configured storage backend once, at process start
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Backends, StorageError> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage backend");
                Ok(Backends::memory())
            }
            StorageBackend::Postgres => {
                let pool = Self::pool(config).await?;
                if config.run_migrations {
                    Self::migrate(&pool).await?;
                }
                Ok(Backends::postgres(PgStorage::new(pool)))
            }
        }
    }

    pub async fn pool(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StorageError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(pool)
    }

    /// Apply the embedded migrations under `migrations/`
    pub async fn migrate(pool: &PgPool) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}
