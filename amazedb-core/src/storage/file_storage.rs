// src/storage/file_storage.rs
//! File-based storage backend
//!
//! ```text
//! <root>/db/
//!   <database>/
//!     metadata.json        {"name": ..., "created_at": ...}
//!     <group>.group        JSON array of documents
//! ```
//!
//! Every write goes to a hidden temp file in the same directory, is flushed,
//! and is then renamed over the target, so readers see the old file or the
//! new one and never a torn write. Leftover temp files from a crash are
//! ignored.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::Builder;

use super::{validate_name, Storage};
use crate::config::Durability;
use crate::error::{AmazeError, Result};
use crate::{log_debug, log_info, log_warn};

const GROUP_EXTENSION: &str = "group";
const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Serialize, Deserialize)]
struct DatabaseMeta {
    name: String,
    created_at: String,
}

/// File-based storage backend (production)
pub struct FileStorage {
    /// The `db` directory
    base: PathBuf,
    durability: Durability,
}

impl FileStorage {
    /// Open (creating if needed) the `db` directory at `base`
    pub fn open<P: AsRef<Path>>(base: P, durability: Durability) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(FileStorage { base, durability })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn db_path(&self, database: &str) -> Result<PathBuf> {
        validate_name(database)?;
        Ok(self.base.join(database))
    }

    fn group_path(&self, database: &str, group: &str) -> Result<PathBuf> {
        validate_name(group)?;
        Ok(self
            .db_path(database)?
            .join(format!("{}.{}", group, GROUP_EXTENSION)))
    }

    /// Map a missing group file to the right not-found error
    fn not_found(&self, database: &str, group: &str) -> AmazeError {
        if self.database_exists(database).unwrap_or(false) {
            AmazeError::group_not_found(database, group)
        } else {
            AmazeError::DatabaseNotFound(database.to_string())
        }
    }

    /// Write `bytes` to a temp file in `dir`, flush, rename over `target`
    fn write_atomic(&self, dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut temp = Builder::new()
            .prefix(".amazedb-")
            .suffix(".tmp")
            .tempfile_in(dir)?;

        // On any error below the temp file is removed when `temp` drops
        temp.write_all(bytes)?;
        temp.flush()?;
        if self.durability.syncs() {
            temp.as_file().sync_all()?;
        }
        temp.persist(target)?;

        if self.durability.syncs() {
            sync_dir(dir)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

impl Storage for FileStorage {
    fn load(&self, database: &str, group: &str) -> Result<Vec<u8>> {
        let path = self.group_path(database, group)?;
        match fs::read(&path) {
            Ok(bytes) => {
                log_debug!("Loaded {}/{} ({} bytes)", database, group, bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(self.not_found(database, group)),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, database: &str, group: &str, bytes: &[u8]) -> Result<()> {
        let path = self.group_path(database, group)?;
        let dir = self.db_path(database)?;
        if !dir.is_dir() {
            return Err(AmazeError::DatabaseNotFound(database.to_string()));
        }

        self.write_atomic(&dir, &path, bytes)?;
        log_debug!("Saved {}/{} ({} bytes)", database, group, bytes.len());
        Ok(())
    }

    fn delete_key(&self, database: &str, group: &str) -> Result<()> {
        let path = self.group_path(database, group)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                if self.durability.syncs() {
                    sync_dir(&self.db_path(database)?)?;
                }
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(self.not_found(database, group)),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, database: &str, group: &str) -> Result<bool> {
        Ok(self.group_path(database, group)?.is_file())
    }

    fn list_groups(&self, database: &str) -> Result<BTreeSet<String>> {
        let dir = self.db_path(database)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(AmazeError::DatabaseNotFound(database.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut groups = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(GROUP_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() && path.is_file() {
                    groups.insert(stem.to_string());
                }
            }
        }
        Ok(groups)
    }

    fn create_database(&self, database: &str) -> Result<bool> {
        let dir = self.db_path(database)?;
        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        let meta = DatabaseMeta {
            name: database.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let bytes = serde_json::to_vec_pretty(&meta)?;
        if let Err(e) = self.write_atomic(&dir, &dir.join(METADATA_FILE), &bytes) {
            // Don't leave a half-made database behind
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        log_info!("Created database '{}' at {}", database, dir.display());
        Ok(true)
    }

    fn database_exists(&self, database: &str) -> Result<bool> {
        Ok(self.db_path(database)?.is_dir())
    }

    fn drop_database(&self, database: &str) -> Result<()> {
        let dir = self.db_path(database)?;
        if !dir.is_dir() {
            return Err(AmazeError::DatabaseNotFound(database.to_string()));
        }

        // Rename away first so the database disappears in one step
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let graveyard = self
            .base
            .join(format!(".{}.dropped-{}-{}", database, std::process::id(), nanos));
        fs::rename(&dir, &graveyard)?;

        if let Err(e) = fs::remove_dir_all(&graveyard) {
            log_warn!(
                "Database '{}' dropped but {} could not be removed: {}",
                database,
                graveyard.display(),
                e
            );
        }
        log_info!("Dropped database '{}'", database);
        Ok(())
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
