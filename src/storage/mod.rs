//! Storage implementations.
//!
//! The progress store owns the durable `lesson_progress` table. Lesson and
//! user existence checks go through [`LessonCatalog`] and [`UserDirectory`],
//! which the SQL backends answer from catalog tables in the same database.

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};

pub mod catalog;
pub mod mock;
pub mod progress_store;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod schema;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use catalog::{LessonCatalog, UserDirectory};
pub use mock::{MockCatalog, MockProgressStore};
pub use progress_store::{MergeOutcome, ProgressStore};

#[cfg(feature = "postgres")]
pub use sql::postgres::{PostgresCatalog, PostgresProgressStore};
#[cfg(feature = "sqlite")]
pub use sql::sqlite::{SqliteCatalog, SqliteProgressStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing store could not be reached or rejected the statement.
    /// Merges are idempotent, so callers may retry.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl StorageError {
    /// Whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                StorageError::InvalidRecord(err.to_string())
            }
            other => StorageError::Unavailable(other.to_string()),
        }
    }
}

impl From<uuid::Error> for StorageError {
    fn from(err: uuid::Error) -> Self {
        StorageError::InvalidRecord(format!("uuid: {}", err))
    }
}

impl From<chrono::ParseError> for StorageError {
    fn from(err: chrono::ParseError) -> Self {
        StorageError::InvalidRecord(format!("timestamp: {}", err))
    }
}

/// Storage handles shared by the progress service.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressStore>,
    pub lessons: Arc<dyn LessonCatalog>,
    pub users: Arc<dyn UserDirectory>,
}

impl Storage {
    /// In-memory storage, for tests and local experiments.
    pub fn in_memory() -> (Self, Arc<MockCatalog>) {
        let catalog = Arc::new(MockCatalog::new());
        let progress = Arc::new(MockProgressStore::with_catalog(catalog.clone()));
        let storage = Self {
            progress,
            lessons: catalog.clone(),
            users: catalog.clone(),
        };
        (storage, catalog)
    }
}

/// Initialize storage based on configuration.
///
/// Connects to the configured backend and creates the schema if missing.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<Storage, Box<dyn std::error::Error>> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory");
            Ok(Storage::in_memory().0)
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            use sqlx::sqlite::SqlitePoolOptions;

            let path = &config.sqlite.path;
            info!("Storage: sqlite at {}", path);

            let pool = if path == ":memory:" {
                // Every connection to :memory: is a separate database.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect("sqlite::memory:")
                    .await?
            } else {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                SqlitePoolOptions::new()
                    .max_connections(config.sqlite.max_connections)
                    .connect(&format!("sqlite:{}?mode=rwc", path))
                    .await?
            };

            let progress = Arc::new(SqliteProgressStore::new(pool.clone()));
            progress.init().await?;

            let catalog = Arc::new(SqliteCatalog::new(pool));
            Ok(Storage {
                progress,
                lessons: catalog.clone(),
                users: catalog,
            })
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            use sqlx::postgres::PgPoolOptions;

            info!("Storage: postgres");
            let pool = PgPoolOptions::new()
                .max_connections(config.postgres.max_connections)
                .connect(&config.postgres.uri)
                .await?;

            let progress = Arc::new(PostgresProgressStore::new(pool.clone()));
            progress.init().await?;

            let catalog = Arc::new(PostgresCatalog::new(pool));
            Ok(Storage {
                progress,
                lessons: catalog.clone(),
                users: catalog,
            })
        }
        #[cfg(not(feature = "postgres"))]
        StorageType::Postgres => {
            tracing::error!("PostgreSQL storage requested but 'postgres' feature is not enabled");
            Err("PostgreSQL feature not enabled".into())
        }
    }
}
