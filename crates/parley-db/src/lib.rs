//! # parley-db
//!
//! PostgreSQL database layer for parley.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for attachments and conversations
//! - Filesystem blob storage with BLAKE3 content hashing
//!
//! ## Example
//!
//! ```rust,ignore
//! use parley_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/parley")
//!         .await?
//!         .with_filesystem_storage("/var/lib/parley/files");
//!     db.migrate().await?;
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod conversations;
pub mod pool;
pub mod storage;

use std::sync::Arc;

// Re-export core types
pub use parley_core::*;

pub use attachments::PgAttachmentRepository;
pub use conversations::PgConversationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use storage::{
    compute_content_hash, generate_storage_path, FilesystemBackend, StorageBackend,
};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Attachment repository.
    pub attachments: PgAttachmentRepository,
    /// Conversation repository.
    pub conversations: PgConversationRepository,
    /// Blob storage backend. Use `with_filesystem_storage` to configure.
    pub storage: Option<Arc<dyn StorageBackend>>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            attachments: PgAttachmentRepository::new(pool.clone()),
            conversations: PgConversationRepository::new(pool.clone()),
            storage: None,
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Configure blob storage with a filesystem backend path.
    pub fn with_filesystem_storage(mut self, path: &str) -> Self {
        self.storage = Some(Arc::new(FilesystemBackend::new(path)));
        self
    }

    /// Blob storage backend, or a configuration error when unset.
    pub fn storage(&self) -> Result<&Arc<dyn StorageBackend>> {
        self.storage
            .as_ref()
            .ok_or_else(|| Error::Config("Blob storage not configured".into()))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            attachments: self.attachments.clone(),
            conversations: self.conversations.clone(),
            storage: self.storage.clone(),
        }
    }
}
