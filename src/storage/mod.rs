//! Storage backends for the service registry, notification log and alert settings
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` trait allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio actors
//! - **Atomic**: every mutating call is one storage operation
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database
//! - **In-Memory**: No persistence, for testing or throwaway deployments
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use netdash::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend: Arc<dyn StorageBackend> = Arc::new(SqliteBackend::new("./netdash.db").await?);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use schema::{
    AlertChannelConfig, MonitoredTarget, Notification, ProbeKind, Severity, TargetStatus,
};

use crate::config::StorageConfig;

/// Open the backend described by the configuration
pub async fn open(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::None => Ok(Arc::new(memory::MemoryBackend::new())),
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path, .. } => Ok(Arc::new(sqlite::SqliteBackend::new(path).await?)),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            tracing::warn!("built without SQLite support, falling back to in-memory storage");
            Ok(Arc::new(memory::MemoryBackend::new()))
        }
    }
}
