// src/collection.rs
//! In-memory view of one group's documents
//!
//! Loaded fresh for every group operation and dropped when it finishes. All
//! splices validate their arguments before touching the sequence, so a
//! failed splice leaves the collection exactly as it was.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::document::Document;
use crate::error::{AmazeError, Result};
use crate::query::Query;
use crate::value_utils::sort_compare;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentCollection {
    docs: Vec<Document>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(docs: Vec<Document>) -> Self {
        DocumentCollection { docs }
    }

    /// Decode a persisted blob: a JSON array of objects
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| AmazeError::Corruption(format!("Group data is not valid JSON: {}", e)))?;

        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(AmazeError::Corruption(format!(
                    "Group data must be a JSON array, got {}",
                    crate::value_utils::type_name(&other)
                )))
            }
        };

        let docs = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Document::from_value(item).map_err(|_| {
                    AmazeError::Corruption(format!("Group entry {} is not a JSON object", i))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DocumentCollection { docs })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.docs)?)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.docs
    }

    /// Matching documents in stored order. Lazy; call again to restart.
    pub fn scan<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = &'a Document> + 'a {
        self.docs.iter().filter(move |doc| query.matches(doc))
    }

    /// Matching documents, stably sorted ascending by `sort_key`
    ///
    /// Documents without the key sort first.
    pub fn sorted_scan(&self, query: &Query, sort_key: &str) -> Vec<&Document> {
        let mut matched: Vec<&Document> =
            self.docs.iter().filter(|doc| query.matches(doc)).collect();
        matched.sort_by(|a, b| sort_compare(a.get(sort_key), b.get(sort_key)));
        matched
    }

    /// Positions of matching documents in scan order, at most `limit` of them
    pub fn matching_indices(&self, query: &Query, limit: Option<usize>) -> Vec<usize> {
        let matches = self
            .docs
            .iter()
            .enumerate()
            .filter(|(_, doc)| query.matches(doc))
            .map(|(i, _)| i);

        match limit {
            Some(n) => matches.take(n).collect(),
            None => matches.collect(),
        }
    }

    fn check_bounds(&self, indices: &[usize]) -> Result<()> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.docs.len()) {
            return Err(AmazeError::InvalidSplice(format!(
                "Index {} out of bounds for collection of {}",
                bad,
                self.docs.len()
            )));
        }
        Ok(())
    }

    /// Replace the documents at `indices` with `documents`, pairwise
    pub fn splice_replace(&mut self, indices: &[usize], documents: Vec<Document>) -> Result<()> {
        if indices.len() != documents.len() {
            return Err(AmazeError::InvalidSplice(format!(
                "{} indices but {} replacement documents",
                indices.len(),
                documents.len()
            )));
        }
        self.check_bounds(indices)?;

        for (&i, doc) in indices.iter().zip(documents) {
            self.docs[i] = doc;
        }
        Ok(())
    }

    /// Remove the documents at `indices`; the rest keep their relative order
    ///
    /// Returns how many documents were removed (duplicate indices count once).
    pub fn splice_remove(&mut self, indices: &[usize]) -> Result<usize> {
        self.check_bounds(indices)?;

        let doomed: BTreeSet<usize> = indices.iter().copied().collect();
        let mut position = 0;
        self.docs.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });
        Ok(doomed.len())
    }

    pub fn append<I: IntoIterator<Item = Document>>(&mut self, documents: I) {
        self.docs.extend(documents);
    }
}
