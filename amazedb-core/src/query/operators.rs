// src/query/operators.rs
//! Filter operator keys and their matching primitives
//!
//! Operator mappings look like `{"age": {"__gt": 10}}`. The key set is closed;
//! anything else starting with `__` is rejected when the query is parsed.

use lazy_static::lazy_static;
use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::num::NonZeroUsize;

use crate::error::{AmazeError, Result};
use crate::value_utils::{compare_values, type_name, value_to_text, values_equal};

/// Prefix shared by every operator key
pub const OPERATOR_PREFIX: &str = "__";

lazy_static! {
    /// Compiled `__re` patterns, keyed by pattern text
    static ref REGEX_CACHE: Mutex<LruCache<String, Regex>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(128).unwrap()));
}

/// Recognized operator keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Re,
    Cf,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Re,
        Operator::Cf,
    ];

    pub fn from_key(key: &str) -> Option<Operator> {
        Operator::ALL.iter().copied().find(|op| op.key() == key)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Operator::Eq => "__eq",
            Operator::Ne => "__ne",
            Operator::Gt => "__gt",
            Operator::Gte => "__gte",
            Operator::Lt => "__lt",
            Operator::Lte => "__lte",
            Operator::Re => "__re",
            Operator::Cf => "__cf",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }
}

pub fn is_operator_key(key: &str) -> bool {
    key.starts_with(OPERATOR_PREFIX)
}

/// Get or compile a regex pattern with caching
pub fn get_or_compile_regex(pattern: &str) -> Result<Regex> {
    if let Some(regex) = REGEX_CACHE.lock().get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).map_err(|e| {
        AmazeError::InvalidFilterSpec(format!("Invalid regex pattern '{}': {}", pattern, e))
    })?;

    REGEX_CACHE.lock().put(pattern.to_string(), regex.clone());
    Ok(regex)
}

pub fn eq_matches(stored: &Value, operand: &Value) -> bool {
    values_equal(stored, operand)
}

/// `__gt` / `__gte` / `__lt` / `__lte`
///
/// Incomparable pairs are a `TypeMismatch` for this document only.
pub fn ordering_matches(
    op: Operator,
    field: &str,
    stored: &Value,
    operand: &Value,
) -> Result<bool> {
    let ord = compare_values(stored, operand).ok_or_else(|| AmazeError::TypeMismatch {
        field: field.to_string(),
        stored: type_name(stored),
        operand: type_name(operand),
    })?;

    Ok(match op {
        Operator::Gt => ord == Ordering::Greater,
        Operator::Gte => ord != Ordering::Less,
        Operator::Lt => ord == Ordering::Less,
        Operator::Lte => ord != Ordering::Greater,
        _ => false,
    })
}

/// `__re`: partial match against the value's text form
pub fn regex_matches(regex: &Regex, stored: &Value) -> bool {
    match stored {
        Value::String(s) => regex.is_match(s),
        other => regex.is_match(&value_to_text(other)),
    }
}
