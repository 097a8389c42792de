// src/store.rs
//! Store: root handle over one storage backend
//!
//! Owns the per-group lock table. Every `Database` and `Group` handle made
//! from the same `Store` (or its clones) shares it, which is what serializes
//! load-mutate-save cycles on a group inside one process. Separate processes,
//! or separate `Store`s over the same directory, are not coordinated.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::StoreOptions;
use crate::database::Database;
use crate::error::{AmazeError, Result};
use crate::storage::{validate_name, FileStorage, MemoryStorage, Storage};
use crate::{log_debug, log_info};

pub(crate) struct StoreInner<S: Storage> {
    pub(crate) storage: S,
    pub(crate) options: StoreOptions,
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl<S: Storage> StoreInner<S> {
    /// Mutex guarding load-mutate-save on one group
    pub(crate) fn group_lock(&self, database: &str, group: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry((database.to_string(), group.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget a dropped group's lock unless some operation still holds it
    pub(crate) fn release_group_lock(&self, database: &str, group: &str) {
        self.locks
            .remove_if(&(database.to_string(), group.to_string()), |_, lock| {
                Arc::strong_count(lock) == 1
            });
    }
}

/// Entry point: opens, creates, lists and drops databases
///
/// Generic over Storage backend:
/// - `Store<FileStorage>` - files under `<root>/db` (default)
/// - `Store<MemoryStorage>` - in-memory, for tests
pub struct Store<S: Storage = FileStorage> {
    inner: Arc<StoreInner<S>>,
}

impl<S: Storage> Clone for Store<S> {
    fn clone(&self) -> Self {
        Store {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Store<FileStorage> {
    /// Open the `db` directory under `options.root`, creating it if missing
    pub fn open(options: StoreOptions) -> Result<Self> {
        let storage = FileStorage::open(options.db_dir(), options.durability)?;
        log_debug!("Opened store at {}", storage.base().display());
        Ok(Self::with_storage(storage, options))
    }
}

impl Store<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::with_storage(MemoryStorage::new(), StoreOptions::default())
    }
}

impl<S: Storage> Store<S> {
    pub fn with_storage(storage: S, options: StoreOptions) -> Self {
        Store {
            inner: Arc::new(StoreInner {
                storage,
                options,
                locks: DashMap::new(),
            }),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    fn handle(&self, name: &str) -> Database<S> {
        Database::new(Arc::clone(&self.inner), name.to_string())
    }

    /// Open a database, creating it if it does not exist yet
    pub fn db(&self, name: &str) -> Result<Database<S>> {
        validate_name(name)?;
        if self.inner.storage.create_database(name)? {
            log_info!("Database '{}' created on first open", name);
        }
        Ok(self.handle(name))
    }

    /// Create a database; `AlreadyExists` if it is already there
    pub fn create_db(&self, name: &str) -> Result<Database<S>> {
        validate_name(name)?;
        if !self.inner.storage.create_database(name)? {
            return Err(AmazeError::AlreadyExists(format!("database '{}'", name)));
        }
        Ok(self.handle(name))
    }

    /// Open an existing database; `DatabaseNotFound` if absent
    pub fn open_db(&self, name: &str) -> Result<Database<S>> {
        validate_name(name)?;
        if !self.inner.storage.database_exists(name)? {
            return Err(AmazeError::DatabaseNotFound(name.to_string()));
        }
        Ok(self.handle(name))
    }

    pub fn list_dbs(&self) -> Result<Vec<String>> {
        self.inner.storage.list_databases()
    }

    pub fn drop_db(&self, name: &str) -> Result<()> {
        self.open_db(name)?.drop()
    }
}
