//! Kincare Database Layer
//!
//! Persistence for the family-care companion behind one async [`Storage`]
//! trait, with two backends:
//!
//! - **MemoryStore**: process-local tables, the default and the test backend
//! - **SqliteStore**: SQLite through `sqlx`, schema managed by `migrations/`
//!
//! [`seed_demo_data`] fills an empty store with the demo household.

pub mod config;
pub mod error;
pub mod memory;
pub mod seed;
pub mod sqlite;
pub mod store;

use std::sync::Arc;

use tracing::info;

pub use config::{DatabaseConfig, StorageBackend};
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use seed::{seed_demo_data, SeededHousehold};
pub use sqlite::SqliteStore;
pub use store::*;

/// Open the configured backend, seeding it when asked to
pub async fn open_store(config: &DatabaseConfig) -> DbResult<Arc<dyn Storage>> {
    let store: Arc<dyn Storage> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => Arc::new(SqliteStore::connect(config).await?),
    };
    info!(backend = store.backend(), "Storage ready");

    if config.seed_demo_data {
        seed_demo_data(store.as_ref()).await?;
    }
    Ok(store)
}
