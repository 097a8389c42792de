// src/storage/mod.rs
// Persistence adapters

mod file_storage;
mod memory_storage;
mod traits;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use traits::Storage;

use crate::error::{AmazeError, Result};

/// Database and group names: non-empty ASCII letters, digits, `-` and `_`
///
/// Names become directory and file names on disk, so nothing that could
/// escape the storage root gets through.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AmazeError::InvalidName(name.to_string()))
    }
}
