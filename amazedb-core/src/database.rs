// src/database.rs
// Database: a named namespace of groups

use parking_lot::MutexGuard;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AmazeError, Result};
use crate::export;
use crate::group::Group;
use crate::storage::{validate_name, Storage};
use crate::store::StoreInner;
use crate::{log_error, log_info};

/// Handle to one database inside a [`Store`](crate::Store)
///
/// Cheap to clone; holds no documents.
pub struct Database<S: Storage> {
    inner: Arc<StoreInner<S>>,
    name: String,
}

impl<S: Storage> Clone for Database<S> {
    fn clone(&self) -> Self {
        Database {
            inner: Arc::clone(&self.inner),
            name: self.name.clone(),
        }
    }
}

impl<S: Storage> Database<S> {
    pub(crate) fn new(inner: Arc<StoreInner<S>>, name: String) -> Self {
        Database { inner, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to a group whether or not it exists yet
    ///
    /// The first `insert` creates it (under the store's auto-create policy).
    pub fn group(&self, name: &str) -> Result<Group<S>> {
        validate_name(name)?;
        Ok(Group::new(
            Arc::clone(&self.inner),
            self.name.clone(),
            name.to_string(),
        ))
    }

    /// Create a group; returns the existing one if already there
    pub fn create_group(&self, name: &str) -> Result<Group<S>> {
        let group = self.group(name)?;
        group.create_if_missing()?;
        Ok(group)
    }

    /// Open an existing group; `GroupNotFound` if absent
    pub fn get_group(&self, name: &str) -> Result<Group<S>> {
        let group = self.group(name)?;
        if !group.exists()? {
            if !self.inner.storage.database_exists(&self.name)? {
                return Err(AmazeError::DatabaseNotFound(self.name.clone()));
            }
            return Err(AmazeError::group_not_found(&self.name, name));
        }
        Ok(group)
    }

    /// Group names, sorted
    pub fn list_groups(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .storage
            .list_groups(&self.name)?
            .into_iter()
            .collect())
    }

    /// Remove every group, then the database itself
    ///
    /// All group locks are held for the whole drop, so no operation through
    /// this store sees a half-dropped database. If a group cannot be removed
    /// the drop stops with `PartialDrop`, naming what was and wasn't removed.
    pub fn drop(&self) -> Result<()> {
        let names = self.list_groups()?;
        let outcome = self.drop_locked(&names);
        for group in &names {
            self.inner.release_group_lock(&self.name, group);
        }
        outcome
    }

    fn drop_locked(&self, names: &[String]) -> Result<()> {
        let locks: Vec<_> = names
            .iter()
            .map(|g| self.inner.group_lock(&self.name, g))
            .collect();
        let _guards: Vec<MutexGuard<'_, ()>> = locks.iter().map(|l| l.lock()).collect();

        let mut removed = Vec::with_capacity(names.len());
        for (i, group) in names.iter().enumerate() {
            match self.inner.storage.delete_key(&self.name, group) {
                Ok(()) => removed.push(group.clone()),
                // Already gone is as good as removed
                Err(e) if e.is_not_found() => removed.push(group.clone()),
                Err(e) => {
                    let remaining = names[i..].to_vec();
                    log_error!(
                        "Drop of database '{}' failed at group '{}': {}",
                        self.name,
                        group,
                        e
                    );
                    return Err(AmazeError::PartialDrop {
                        database: self.name.clone(),
                        removed,
                        remaining,
                        source: Box::new(e),
                    });
                }
            }
        }

        if let Err(e) = self.inner.storage.drop_database(&self.name) {
            if removed.is_empty() {
                return Err(e);
            }
            return Err(AmazeError::PartialDrop {
                database: self.name.clone(),
                removed,
                remaining: Vec::new(),
                source: Box::new(e),
            });
        }
        log_info!("Dropped database '{}' ({} groups)", self.name, removed.len());
        Ok(())
    }

    /// Write every group into one package file `<dir>/<name>.amazedb`
    pub fn export<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        export::export_database(self, dir.as_ref())
    }

    /// Replace all groups with the contents of a package written by
    /// [`export`](Self::export); returns the number of groups imported
    ///
    /// The package is fully verified before anything is written, but the
    /// replacement itself is not atomic across groups. Each group is saved in
    /// turn, then groups absent from the package are dropped. If a save or
    /// drop fails partway, the error is returned and the database holds some
    /// groups from the package next to some of its previous contents; import
    /// the same package again to finish.
    pub fn import<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        export::import_database(self, path.as_ref())
    }
}
