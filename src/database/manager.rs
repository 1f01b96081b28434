use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::store::{HelpdeskStore, StoreResult};
use crate::config::DatabaseConfig;

/// Owns the connection pool for the lifetime of the process
///
/// Built once at startup and handed to whatever needs it; closing it on
/// shutdown releases every connection.
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn store(&self) -> Arc<dyn HelpdeskStore> {
        Arc::new(PgStore::new(self.pool.clone()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// The store selected by configuration, plus the pool handle when there is one
pub struct StoreHandle {
    pub store: Arc<dyn HelpdeskStore>,
    pub manager: Option<DatabaseManager>,
}

impl StoreHandle {
    /// Postgres when a URL is configured, otherwise the in-memory store
    pub async fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        match config.url.as_deref() {
            Some(url) => {
                let manager = DatabaseManager::connect(url, config).await?;
                if config.run_migrations {
                    manager.migrate().await?;
                }
                Ok(Self {
                    store: manager.store(),
                    manager: Some(manager),
                })
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using the in-memory store, data is lost on exit");
                Ok(Self {
                    store: Arc::new(MemoryStore::new()),
                    manager: None,
                })
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.manager.is_some()
    }

    pub async fn close(&self) {
        if let Some(manager) = &self.manager {
            manager.close().await;
        }
    }
}
