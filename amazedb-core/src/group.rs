// src/group.rs
//! Group: a named collection of documents inside a database
//!
//! Every operation loads the whole collection, works on that private copy,
//! and (for mutations) saves it back in one atomic write. Nothing is cached
//! between calls. Mutations hold the group's lock from load to save, so two
//! threads updating the same group through one `Store` can't lose each
//! other's writes. If the save fails, the in-memory change is dropped and the
//! previous on-disk state stays as it was.

use parking_lot::MutexGuard;
use std::sync::Arc;

use crate::collection::DocumentCollection;
use crate::document::Document;
use crate::error::{AmazeError, Result};
use crate::query::Query;
use crate::storage::Storage;
use crate::store::StoreInner;
use crate::update::Update;
use crate::{log_debug, log_info};

pub struct Group<S: Storage> {
    inner: Arc<StoreInner<S>>,
    database: String,
    name: String,
}

impl<S: Storage> Clone for Group<S> {
    fn clone(&self) -> Self {
        Group {
            inner: Arc::clone(&self.inner),
            database: self.database.clone(),
            name: self.name.clone(),
        }
    }
}

impl<S: Storage> Group<S> {
    pub(crate) fn new(inner: Arc<StoreInner<S>>, database: String, name: String) -> Self {
        Group {
            inner,
            database,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn exists(&self) -> Result<bool> {
        self.inner.storage.exists(&self.database, &self.name)
    }

    // ========== LOAD / SAVE ==========

    fn load(&self) -> Result<DocumentCollection> {
        let bytes = self.inner.storage.load(&self.database, &self.name)?;
        DocumentCollection::from_bytes(&bytes)
    }

    fn save(&self, collection: &DocumentCollection) -> Result<()> {
        let bytes = collection.to_bytes()?;
        self.inner.storage.save(&self.database, &self.name, &bytes)
    }

    /// Run `f` with this group's lock held
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.inner.group_lock(&self.database, &self.name);
        let _guard: MutexGuard<'_, ()> = lock.lock();
        f()
    }

    pub(crate) fn create_if_missing(&self) -> Result<bool> {
        self.locked(|| {
            if self.exists()? {
                return Ok(false);
            }
            self.save(&DocumentCollection::new())?;
            log_info!("Created group {}/{}", self.database, self.name);
            Ok(true)
        })
    }

    /// Replace the whole collection (used by import)
    pub(crate) fn replace_all(&self, documents: Vec<Document>) -> Result<()> {
        self.locked(|| self.save(&DocumentCollection::from_documents(documents)))
    }

    // ========== INSERT ==========

    /// Append one document; returns the stored copy
    pub fn insert(&self, document: Document) -> Result<Document> {
        let mut inserted = self.insert_many(vec![document])?;
        inserted
            .pop()
            .ok_or_else(|| AmazeError::Serialization("insert produced no document".to_string()))
    }

    /// Append documents in order; returns the stored copies
    ///
    /// A missing group is created when the store allows it
    /// (`StoreOptions::auto_create_groups`), otherwise `GroupNotFound`.
    pub fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        self.locked(|| {
            let mut collection = match self.load() {
                Ok(collection) => collection,
                Err(AmazeError::GroupNotFound { .. }) if self.inner.options.auto_create_groups => {
                    log_info!("Creating group {}/{} on insert", self.database, self.name);
                    DocumentCollection::new()
                }
                Err(e) => return Err(e),
            };

            collection.append(documents.iter().cloned());
            self.save(&collection)?;
            log_debug!(
                "Inserted {} document(s) into {}/{}",
                documents.len(),
                self.database,
                self.name
            );
            Ok(documents)
        })
    }

    // ========== READ ==========

    /// All matching documents, in stored order or sorted ascending by `sort_by`
    ///
    /// Returns copies; nothing handed out aliases the loaded collection.
    pub fn get(&self, query: &Query, sort_by: Option<&str>) -> Result<Vec<Document>> {
        let collection = self.load()?;
        let docs: Vec<Document> = match sort_by {
            Some(key) => collection
                .sorted_scan(query, key)
                .into_iter()
                .cloned()
                .collect(),
            None => collection.scan(query).cloned().collect(),
        };
        Ok(docs)
    }

    /// First match, or `None`
    ///
    /// "First" is in stored order, or in ascending `sort_by` order when given.
    pub fn get_one(&self, query: &Query, sort_by: Option<&str>) -> Result<Option<Document>> {
        let collection = self.load()?;
        let found = match sort_by {
            Some(key) => collection.sorted_scan(query, key).first().copied().cloned(),
            None => collection.scan(query).next().cloned(),
        };
        Ok(found)
    }

    pub fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.load()?.scan(query).count())
    }

    // ========== UPDATE ==========

    /// Merge `update` into every match; returns how many were updated
    pub fn update(&self, query: &Query, update: &Update) -> Result<usize> {
        self.update_matching(query, update, None)
    }

    /// Merge `update` into the first match only; returns 0 or 1
    pub fn update_one(&self, query: &Query, update: &Update) -> Result<usize> {
        self.update_matching(query, update, Some(1))
    }

    fn update_matching(&self, query: &Query, update: &Update, limit: Option<usize>) -> Result<usize> {
        self.locked(|| {
            let mut collection = self.load()?;
            let indices = collection.matching_indices(query, limit);
            if indices.is_empty() {
                return Ok(0);
            }

            let replacements: Vec<Document> = indices
                .iter()
                .map(|&i| update.apply(&collection.documents()[i]))
                .collect();
            collection.splice_replace(&indices, replacements)?;
            self.save(&collection)?;

            log_debug!(
                "Updated {} document(s) in {}/{}",
                indices.len(),
                self.database,
                self.name
            );
            Ok(indices.len())
        })
    }

    // ========== REMOVE ==========

    /// Remove every match; returns how many were removed
    pub fn remove(&self, query: &Query) -> Result<usize> {
        self.remove_matching(query, None)
    }

    /// Remove the first match only; returns 0 or 1
    pub fn remove_one(&self, query: &Query) -> Result<usize> {
        self.remove_matching(query, Some(1))
    }

    fn remove_matching(&self, query: &Query, limit: Option<usize>) -> Result<usize> {
        self.locked(|| {
            let mut collection = self.load()?;
            let indices = collection.matching_indices(query, limit);
            if indices.is_empty() {
                return Ok(0);
            }

            let removed = collection.splice_remove(&indices)?;
            self.save(&collection)?;

            log_debug!(
                "Removed {} document(s) from {}/{}",
                removed,
                self.database,
                self.name
            );
            Ok(removed)
        })
    }

    /// Delete the group's persisted data
    ///
    /// Afterwards reads, updates and removes fail with `GroupNotFound`;
    /// `insert` re-creates the group if the store allows auto-creation.
    pub fn drop(&self) -> Result<()> {
        self.locked(|| {
            self.inner.storage.delete_key(&self.database, &self.name)?;
            log_info!("Dropped group {}/{}", self.database, self.name);
            Ok(())
        })?;
        self.inner.release_group_lock(&self.database, &self.name);
        Ok(())
    }
}
