// src/query.rs
//! Filter evaluation
//!
//! A query is a list of `(field, condition)` clauses, all of which must hold.
//! It is parsed once, either from a JSON query specification or with the
//! builder methods, so unknown operator keys and bad patterns are rejected
//! before any document is looked at.
//!
//! ```
//! use amazedb_core::{Document, Query};
//! use serde_json::json;
//!
//! let q = Query::from_json(&json!({"age": {"__gt": 10}, "name": "EFGH"})).unwrap();
//! let doc = Document::from_value(json!({"name": "EFGH", "age": 20})).unwrap();
//! assert!(q.matches(&doc));
//! ```

pub mod operators;

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::document::Document;
use crate::error::{AmazeError, Result};
use crate::log_warn;

pub use operators::Operator;
use operators::{
    eq_matches, get_or_compile_regex, is_operator_key, ordering_matches, regex_matches,
};

type PredicateFn = dyn Fn(&Value) -> std::result::Result<bool, String> + Send + Sync;

/// Caller-supplied test for `__cf` clauses
///
/// An `Err` or a panic from the closure counts as a non-match for that one
/// document; the scan goes on.
#[derive(Clone)]
pub struct Predicate {
    func: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate {
            func: Arc::new(move |v| Ok(f(v))),
        }
    }

    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        Predicate { func: Arc::new(f) }
    }

    fn call(&self, field: &str, value: &Value) -> Result<bool> {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.func)(value)));
        let message = match outcome {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(message)) => message,
            Err(payload) => {
                if let Some(s) = payload.downcast_ref::<&str>() {
                    format!("panicked: {}", s)
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    format!("panicked: {}", s)
                } else {
                    "panicked".to_string()
                }
            }
        };
        Err(AmazeError::PredicateError {
            field: field.to_string(),
            message,
        })
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// One parsed condition
#[derive(Debug, Clone)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Re(Regex),
    Cf(Predicate),
}

impl Condition {
    pub fn operator(&self) -> Operator {
        match self {
            Condition::Eq(_) => Operator::Eq,
            Condition::Ne(_) => Operator::Ne,
            Condition::Gt(_) => Operator::Gt,
            Condition::Gte(_) => Operator::Gte,
            Condition::Lt(_) => Operator::Lt,
            Condition::Lte(_) => Operator::Lte,
            Condition::Re(_) => Operator::Re,
            Condition::Cf(_) => Operator::Cf,
        }
    }

    /// Parse the value side of one query field
    fn parse(field: &str, spec: &Value) -> Result<Condition> {
        let map = match spec {
            Value::Object(map) if map.keys().any(|k| is_operator_key(k)) => map,
            // Plain literal, including mappings without operator keys
            literal => return Ok(Condition::Eq(literal.clone())),
        };

        if map.len() != 1 {
            return Err(AmazeError::InvalidFilterSpec(format!(
                "Operator mapping for field '{}' must hold exactly one operator, got {}",
                field,
                map.len()
            )));
        }
        let (key, operand) = map.iter().next().ok_or_else(|| {
            AmazeError::InvalidFilterSpec(format!("Empty operator mapping for '{}'", field))
        })?;
        let op = Operator::from_key(key).ok_or_else(|| {
            AmazeError::InvalidFilterSpec(format!(
                "Unknown operator '{}' on field '{}'",
                key, field
            ))
        })?;

        let operand = operand.clone();
        Ok(match op {
            Operator::Eq => Condition::Eq(operand),
            Operator::Ne => Condition::Ne(operand),
            Operator::Gt => Condition::Gt(operand),
            Operator::Gte => Condition::Gte(operand),
            Operator::Lt => Condition::Lt(operand),
            Operator::Lte => Condition::Lte(operand),
            Operator::Re => {
                let pattern = operand.as_str().ok_or_else(|| {
                    AmazeError::InvalidFilterSpec(format!(
                        "__re on field '{}' requires a string pattern",
                        field
                    ))
                })?;
                Condition::Re(get_or_compile_regex(pattern)?)
            }
            Operator::Cf => {
                return Err(AmazeError::InvalidFilterSpec(format!(
                    "__cf on field '{}' needs a predicate; use Query::custom",
                    field
                )))
            }
        })
    }

    fn evaluate(&self, field: &str, stored: &Value) -> Result<bool> {
        match self {
            Condition::Eq(operand) => Ok(eq_matches(stored, operand)),
            Condition::Ne(operand) => Ok(!eq_matches(stored, operand)),
            Condition::Gt(operand)
            | Condition::Gte(operand)
            | Condition::Lt(operand)
            | Condition::Lte(operand) => {
                ordering_matches(self.operator(), field, stored, operand)
            }
            Condition::Re(regex) => Ok(regex_matches(regex, stored)),
            Condition::Cf(predicate) => predicate.call(field, stored),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub field: String,
    pub condition: Condition,
}

/// A parsed query specification. The empty query matches every document.
#[derive(Debug, Clone, Default)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// Empty query (matches all documents)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a JSON query specification
    ///
    /// Fails with `InvalidFilterSpec` if `json` is not an object, names an
    /// unknown `__` operator, mixes operator keys, has a non-string or invalid
    /// `__re` pattern, or uses `__cf`.
    pub fn from_json(json: &Value) -> Result<Self> {
        let map = json.as_object().ok_or_else(|| {
            AmazeError::InvalidFilterSpec("Query must be a JSON object".to_string())
        })?;

        let clauses = map
            .iter()
            .map(|(field, spec)| {
                Ok(Clause {
                    field: field.clone(),
                    condition: Condition::parse(field, spec)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Query { clauses })
    }

    pub fn with_condition<F: Into<String>>(mut self, field: F, condition: Condition) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            condition,
        });
        self
    }

    pub fn eq<F: Into<String>, V: Into<Value>>(self, field: F, value: V) -> Self {
        self.with_condition(field, Condition::Eq(value.into()))
    }

    pub fn ne<F: Into<String>, V: Into<Value>>(self, field: F, value: V) -> Self {
        self.with_condition(field, Condition::Ne(value.into()))
    }

    pub fn gt<F: Into<String>, V: Into<Value>>(self, field: F, value: V) -> Self {
        self.with_condition(field, Condition::Gt(value.into()))
    }

    pub fn gte<F: Into<String>, V: Into<Value>>(self, field: F, value: V) -> Self {
        self.with_condition(field, Condition::Gte(value.into()))
    }

    pub fn lt<F: Into<String>, V: Into<Value>>(self, field: F, value: V) -> Self {
        self.with_condition(field, Condition::Lt(value.into()))
    }

    pub fn lte<F: Into<String>, V: Into<Value>>(self, field: F, value: V) -> Self {
        self.with_condition(field, Condition::Lte(value.into()))
    }

    pub fn regex<F: Into<String>>(self, field: F, pattern: &str) -> Result<Self> {
        let regex = get_or_compile_regex(pattern)?;
        Ok(self.with_condition(field, Condition::Re(regex)))
    }

    pub fn custom<F, P>(self, field: F, predicate: P) -> Self
    where
        F: Into<String>,
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.with_condition(field, Condition::Cf(Predicate::new(predicate)))
    }

    pub fn custom_fallible<F, P>(self, field: F, predicate: P) -> Self
    where
        F: Into<String>,
        P: Fn(&Value) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        self.with_condition(field, Condition::Cf(Predicate::fallible(predicate)))
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against one document, surfacing per-document errors
    ///
    /// `TypeMismatch` and `PredicateError` come back as `Err`; a missing
    /// field is simply `Ok(false)`.
    pub fn evaluate(&self, document: &Document) -> Result<bool> {
        for clause in &self.clauses {
            let stored = match document.get(&clause.field) {
                Some(v) => v,
                None => return Ok(false),
            };
            if !clause.condition.evaluate(&clause.field, stored)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluate for a scan: per-document errors are logged and count as a
    /// non-match
    pub fn matches(&self, document: &Document) -> bool {
        match self.evaluate(document) {
            Ok(result) => result,
            Err(e) => {
                log_warn!("Skipping document: {}", e);
                false
            }
        }
    }
}

impl TryFrom<&Value> for Query {
    type Error = AmazeError;

    fn try_from(json: &Value) -> Result<Self> {
        Query::from_json(json)
    }
}

/// Free-function form of [`Query::matches`]
pub fn matches(document: &Document, query: &Query) -> bool {
    query.matches(document)
}
