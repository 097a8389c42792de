// src/export.rs
//! Whole-database export packages
//!
//! A package is one JSON file holding every group of a database, with a CRC32
//! over the groups payload so a damaged or hand-edited file is refused on
//! import instead of silently replacing good data.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

use crate::database::Database;
use crate::document::Document;
use crate::error::{AmazeError, Result};
use crate::group::Group;
use crate::storage::{validate_name, Storage};
use crate::log_info;

/// File extension of export packages
pub const EXPORT_EXTENSION: &str = "amazedb";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportedGroup {
    pub name: String,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPackage {
    pub format_version: u32,
    pub name: String,
    pub exported_at: String,
    pub checksum: u32,
    pub groups: Vec<ExportedGroup>,
}

fn checksum(groups: &[ExportedGroup]) -> Result<u32> {
    Ok(crc32fast::hash(&serde_json::to_vec(groups)?))
}

impl ExportPackage {
    fn new(name: &str, groups: Vec<ExportedGroup>) -> Result<Self> {
        Ok(ExportPackage {
            format_version: FORMAT_VERSION,
            name: name.to_string(),
            exported_at: Utc::now().to_rfc3339(),
            checksum: checksum(&groups)?,
            groups,
        })
    }

    /// Parse and verify a package
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package: ExportPackage = serde_json::from_slice(bytes)
            .map_err(|e| AmazeError::Corruption(format!("Not an export package: {}", e)))?;

        if package.format_version != FORMAT_VERSION {
            return Err(AmazeError::Corruption(format!(
                "Unsupported export format version {}",
                package.format_version
            )));
        }
        let actual = checksum(&package.groups)?;
        if actual != package.checksum {
            return Err(AmazeError::Corruption(format!(
                "Export checksum mismatch: expected {:08x}, got {:08x}",
                package.checksum, actual
            )));
        }
        for group in &package.groups {
            validate_name(&group.name)?;
        }
        Ok(package)
    }
}

pub(crate) fn export_database<S: Storage>(db: &Database<S>, dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(AmazeError::Io(std::io::Error::new(
            IoErrorKind::NotFound,
            format!("export directory {} does not exist", dir.display()),
        )));
    }
    let target = dir.join(format!("{}.{}", db.name(), EXPORT_EXTENSION));
    if target.exists() {
        return Err(AmazeError::AlreadyExists(target.display().to_string()));
    }

    let mut groups = Vec::new();
    for name in db.list_groups()? {
        let group = db.group(&name)?;
        let documents = group.get(&crate::Query::new(), None)?;
        groups.push(ExportedGroup { name, documents });
    }
    let package = ExportPackage::new(db.name(), groups)?;
    let bytes = serde_json::to_vec(&package)?;

    let mut temp = Builder::new()
        .prefix(".amazedb-export-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(&bytes)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(&target).map_err(|e| {
        if e.error.kind() == IoErrorKind::AlreadyExists {
            AmazeError::AlreadyExists(target.display().to_string())
        } else {
            AmazeError::Io(e.error)
        }
    })?;

    log_info!(
        "Exported database '{}' ({} groups) to {}",
        db.name(),
        package.groups.len(),
        target.display()
    );
    Ok(target)
}

pub(crate) fn import_database<S: Storage>(db: &Database<S>, path: &Path) -> Result<usize> {
    let bytes = fs::read(path)?;
    let package = ExportPackage::from_bytes(&bytes)?;
    if package.name != db.name() {
        log_info!(
            "Importing package of database '{}' into '{}'",
            package.name,
            db.name()
        );
    }

    let existing = db.list_groups()?;
    let imported: Vec<&str> = package.groups.iter().map(|g| g.name.as_str()).collect();

    // Write the new groups first, then clear out the ones the package lacks
    for exported in &package.groups {
        let group: Group<S> = db.group(&exported.name)?;
        group.replace_all(exported.documents.clone())?;
    }
    for name in existing.iter().filter(|n| !imported.contains(&n.as_str())) {
        match db.group(name)?.drop() {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }

    log_info!(
        "Imported {} group(s) into database '{}' from {}",
        package.groups.len(),
        db.name(),
        path.display()
    );
    Ok(package.groups.len())
}
