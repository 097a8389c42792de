//! Store configuration
//!
//! Where the `db` directory lives, how hard saves try to reach the disk, and
//! whether inserting into a missing group creates it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a group save is flushed before the atomic rename
///
/// - **Safe**: `fsync` the temp file, rename, then `fsync` the directory
///   (Unix). A crash leaves either the old or the new file on disk.
/// - **Fast**: rename without `fsync`. Still never exposes a half-written
///   file to readers in this process, but a power loss may lose the most
///   recent save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Durability {
    #[default]
    Safe,
    Fast,
}

impl Durability {
    pub fn syncs(&self) -> bool {
        matches!(self, Durability::Safe)
    }
}

/// Options for opening a [`Store`](crate::Store)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Directory containing the `db` directory
    pub root: PathBuf,

    pub durability: Durability,

    /// `insert`/`insert_many` on a missing group creates it
    pub auto_create_groups: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            root: PathBuf::from("."),
            durability: Durability::default(),
            auto_create_groups: true,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_auto_create_groups(mut self, enabled: bool) -> Self {
        self.auto_create_groups = enabled;
        self
    }

    /// The directory holding one sub-directory per database
    pub fn db_dir(&self) -> PathBuf {
        self.root.join("db")
    }
}
