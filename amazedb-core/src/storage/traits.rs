// src/storage/traits.rs
//! Persistence adapter interface
//!
//! The core only ever reads a whole group blob or atomically replaces it.
//!
//! ```text
//! Storage trait (unified interface)
//!   ├── FileStorage   (production, one file per group)
//!   └── MemoryStorage (testing, in-memory maps)
//! ```

use std::collections::BTreeSet;

use crate::error::Result;

/// Blob store keyed by (database, group)
///
/// # Contract
///
/// - `load` returns the last successfully saved bytes, `GroupNotFound` if the
///   group has no blob, or `DatabaseNotFound` if the database is missing.
/// - `save` is all-or-nothing for any observer: after an error the previous
///   blob (or its absence) is still what `load` sees.
/// - Implementations do no locking across load/save pairs; callers serialize
///   read-modify-write cycles themselves.
pub trait Storage: Send + Sync {
    // ========================================================================
    // GROUP BLOBS
    // ========================================================================

    fn load(&self, database: &str, group: &str) -> Result<Vec<u8>>;

    fn save(&self, database: &str, group: &str, bytes: &[u8]) -> Result<()>;

    /// Remove a group blob; `GroupNotFound` if it is not there
    fn delete_key(&self, database: &str, group: &str) -> Result<()>;

    fn exists(&self, database: &str, group: &str) -> Result<bool>;

    fn list_groups(&self, database: &str) -> Result<BTreeSet<String>>;

    // ========================================================================
    // DATABASE NAMESPACES
    // ========================================================================

    /// Create the namespace; `Ok(false)` if it already existed
    fn create_database(&self, database: &str) -> Result<bool>;

    fn database_exists(&self, database: &str) -> Result<bool>;

    /// Remove the namespace and anything still inside it
    fn drop_database(&self, database: &str) -> Result<()>;

    fn list_databases(&self) -> Result<Vec<String>>;
}
