// src/storage/memory_storage.rs
//! Pure in-memory storage backend for fast testing
//!
//! ```text
//! MemoryStorage
//!      ↓
//! BTreeMap<database, BTreeMap<group, bytes>>
//! ```
//!
//! A save swaps the whole byte vector under a write lock, which gives the same
//! all-or-nothing behavior as the file backend.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

use super::{validate_name, Storage};
use crate::error::{AmazeError, Result};

/// In-memory storage backend (testing). Data is lost when dropped.
#[derive(Default)]
pub struct MemoryStorage {
    databases: RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, database: &str, group: &str) -> Result<Vec<u8>> {
        let databases = self.databases.read();
        let groups = databases
            .get(database)
            .ok_or_else(|| AmazeError::DatabaseNotFound(database.to_string()))?;
        groups
            .get(group)
            .cloned()
            .ok_or_else(|| AmazeError::group_not_found(database, group))
    }

    fn save(&self, database: &str, group: &str, bytes: &[u8]) -> Result<()> {
        validate_name(group)?;
        let mut databases = self.databases.write();
        let groups = databases
            .get_mut(database)
            .ok_or_else(|| AmazeError::DatabaseNotFound(database.to_string()))?;
        groups.insert(group.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete_key(&self, database: &str, group: &str) -> Result<()> {
        let mut databases = self.databases.write();
        let groups = databases
            .get_mut(database)
            .ok_or_else(|| AmazeError::DatabaseNotFound(database.to_string()))?;
        groups
            .remove(group)
            .map(|_| ())
            .ok_or_else(|| AmazeError::group_not_found(database, group))
    }

    fn exists(&self, database: &str, group: &str) -> Result<bool> {
        Ok(self
            .databases
            .read()
            .get(database)
            .map(|groups| groups.contains_key(group))
            .unwrap_or(false))
    }

    fn list_groups(&self, database: &str) -> Result<BTreeSet<String>> {
        self.databases
            .read()
            .get(database)
            .map(|groups| groups.keys().cloned().collect())
            .ok_or_else(|| AmazeError::DatabaseNotFound(database.to_string()))
    }

    fn create_database(&self, database: &str) -> Result<bool> {
        validate_name(database)?;
        let mut databases = self.databases.write();
        if databases.contains_key(database) {
            return Ok(false);
        }
        databases.insert(database.to_string(), BTreeMap::new());
        Ok(true)
    }

    fn database_exists(&self, database: &str) -> Result<bool> {
        Ok(self.databases.read().contains_key(database))
    }

    fn drop_database(&self, database: &str) -> Result<()> {
        self.databases
            .write()
            .remove(database)
            .map(|_| ())
            .ok_or_else(|| AmazeError::DatabaseNotFound(database.to_string()))
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.databases.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_lifecycle() {
        let storage = MemoryStorage::new();
        assert!(storage.create_database("shop").unwrap());
        storage.save("shop", "users", b"[]").unwrap();
        assert_eq!(storage.load("shop", "users").unwrap(), b"[]");
        assert_eq!(
            storage.list_groups("shop").unwrap().into_iter().collect::<Vec<_>>(),
            vec!["users"]
        );

        storage.delete_key("shop", "users").unwrap();
        assert!(storage.load("shop", "users").unwrap_err().is_not_found());

        storage.drop_database("shop").unwrap();
        assert!(matches!(
            storage.load("shop", "users"),
            Err(AmazeError::DatabaseNotFound(_))
        ));
    }
}
