// src/update.rs
// Update specification: field -> new value, merged into matched documents

use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::{AmazeError, Result};

/// Fields to overwrite (or add) on every matched document
///
/// Fields not named here are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    fields: Map<String, Value>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &Value) -> Result<Self> {
        match json {
            Value::Object(fields) => Ok(Update {
                fields: fields.clone(),
            }),
            _ => Err(AmazeError::InvalidUpdateSpec(
                "Update must be a JSON object".to_string(),
            )),
        }
    }

    pub fn set<K: Into<String>, V: Into<Value>>(mut self, field: K, value: V) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Produce the updated copy of `doc`; the original is not touched
    pub fn apply(&self, doc: &Document) -> Document {
        let mut updated = doc.clone();
        for (field, value) in &self.fields {
            updated.set(field.clone(), value.clone());
        }
        updated
    }
}

impl TryFrom<&Value> for Update {
    type Error = AmazeError;

    fn try_from(json: &Value) -> Result<Self> {
        Update::from_json(json)
    }
}
