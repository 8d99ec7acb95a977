//! Application state.

use std::sync::Arc;

use rewards_store::{MemoryStore, Store};

use crate::config::{ServiceConfig, StorageBackend};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Open the store selected by `config.storage_backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `RocksDB` store cannot be opened, or if
    /// `rocksdb` is selected in a build without the `rocksdb-backend` feature.
    pub fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, rewards_store::StoreError> {
        match config.storage_backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Arc::new(MemoryStore::new()))
            }
            #[cfg(feature = "rocksdb-backend")]
            StorageBackend::Rocksdb => {
                tracing::info!(path = %config.data_dir, "Opening RocksDB store");
                Ok(Arc::new(rewards_store::RocksStore::open(&config.data_dir)?))
            }
            #[cfg(not(feature = "rocksdb-backend"))]
            StorageBackend::Rocksdb => Err(rewards_store::StoreError::Database(
                "rocksdb backend not compiled in; rebuild with --features rocksdb-backend".into(),
            )),
        }
    }
}
