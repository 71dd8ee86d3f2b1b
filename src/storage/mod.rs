//! Storage Layer Module
//!
//! Provides persistence for vendor accounts and student records.
//!
//! This module contains:
//! - Storage trait definitions for abstraction
//! - SQLite implementation for production
//! - In-memory implementation for testing

pub mod memory;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

use crate::common::config::DatabaseTarget;

// Re-exports for convenience
pub use memory::{MemoryStudentStore, MemoryVendorStore};
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, StudentStore, VendorStore};

/// Vendor and student stores backing one running service
#[derive(Clone)]
pub struct Stores {
    pub vendors: Arc<dyn VendorStore>,
    pub students: Arc<dyn StudentStore>,
}

impl Stores {
    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self {
            vendors: Arc::new(MemoryVendorStore::new()),
            students: Arc::new(MemoryStudentStore::new()),
        }
    }

    /// Open the stores described by the configured database target
    pub fn open(target: &DatabaseTarget) -> StorageResult<Self> {
        match target {
            DatabaseTarget::Memory => Ok(Self::in_memory()),
            DatabaseTarget::Sqlite(path) => {
                let store = SqliteStore::new(path)?;
                Ok(Self {
                    vendors: Arc::new(store.clone()),
                    students: Arc::new(store),
                })
            }
        }
    }
}
