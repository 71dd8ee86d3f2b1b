//! Storage Trait Definitions
//!
//! Defines abstract storage interfaces for vendors and students.
//! Implementations can use SQLite (production) or in-memory (testing).

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Student, Vendor};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Vendor storage interface
///
/// Implementations:
/// - `SqliteStore` - Production storage with SQLite
/// - `MemoryVendorStore` - In-memory storage for testing
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VendorStore: Send + Sync {
    /// Insert a new vendor. `Duplicate` if the email is taken.
    async fn insert(&self, vendor: &Vendor) -> StorageResult<()>;

    /// Replace an existing vendor. `NotFound` if the ID is unknown,
    /// `Duplicate` if the new email belongs to another vendor.
    async fn update(&self, vendor: &Vendor) -> StorageResult<()>;

    /// Get a vendor by ID
    async fn get_by_id(&self, id: &str) -> StorageResult<Option<Vendor>>;

    /// Get a vendor by exact email
    async fn get_by_email(&self, email: &str) -> StorageResult<Option<Vendor>>;
}

/// Student storage interface
///
/// Every lookup and mutation is scoped by the owning vendor; a record
/// owned by someone else behaves exactly like a missing one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Insert a new student record
    async fn insert(&self, student: &Student) -> StorageResult<()>;

    /// Replace a student record matching both `student.id` and `student.vendor_id`
    async fn update(&self, student: &Student) -> StorageResult<()>;

    /// Get a student by ID if owned by `vendor_id`
    async fn get_owned(&self, vendor_id: &str, id: &str) -> StorageResult<Option<Student>>;

    /// All students owned by `vendor_id`, oldest first
    async fn list_by_vendor(&self, vendor_id: &str) -> StorageResult<Vec<Student>>;

    /// Delete a student if owned by `vendor_id`. Returns whether a record was removed.
    async fn delete_owned(&self, vendor_id: &str, id: &str) -> StorageResult<bool>;
}
