// src/error.rs
use thiserror::Error;

/// AmazeDB error type
#[derive(Error, Debug)]
pub enum AmazeError {
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Group not found: {database}/{group}")]
    GroupNotFound { database: String, group: String },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid name '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidName(String),

    #[error("Invalid filter: {0}")]
    InvalidFilterSpec(String),

    #[error("Invalid update: {0}")]
    InvalidUpdateSpec(String),

    /// Ordering operator applied to values that cannot be compared.
    /// Local to one document; scans log it and move on.
    #[error("Type mismatch on field '{field}': cannot compare {stored} with {operand}")]
    TypeMismatch {
        field: String,
        stored: &'static str,
        operand: &'static str,
    },

    /// A custom (`__cf`) predicate failed or panicked. Local to one document.
    #[error("Custom predicate on field '{field}' failed: {message}")]
    PredicateError { field: String, message: String },

    #[error("Invalid splice: {0}")]
    InvalidSplice(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted data: {0}")]
    Corruption(String),

    #[error(
        "Drop of database '{database}' stopped after removing {removed:?}; still present: {remaining:?}: {source}"
    )]
    PartialDrop {
        database: String,
        removed: Vec<String>,
        remaining: Vec<String>,
        #[source]
        source: Box<AmazeError>,
    },
}

/// Coarse classification callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    /// I/O or on-disk format failure; prior persisted state is intact
    Persistence,
    TypeMismatch,
    Predicate,
    /// Caller programming error (bad filter, update, name or splice)
    InvalidInput,
}

impl AmazeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AmazeError::DatabaseNotFound(_) | AmazeError::GroupNotFound { .. } => {
                ErrorKind::NotFound
            }
            AmazeError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            AmazeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            AmazeError::PredicateError { .. } => ErrorKind::Predicate,
            AmazeError::InvalidName(_)
            | AmazeError::InvalidFilterSpec(_)
            | AmazeError::InvalidUpdateSpec(_)
            | AmazeError::InvalidSplice(_) => ErrorKind::InvalidInput,
            AmazeError::Io(_) | AmazeError::Serialization(_) | AmazeError::Corruption(_) => {
                ErrorKind::Persistence
            }
            AmazeError::PartialDrop { .. } => ErrorKind::Persistence,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_persistence(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    pub(crate) fn group_not_found(database: &str, group: &str) -> Self {
        AmazeError::GroupNotFound {
            database: database.to_string(),
            group: group.to_string(),
        }
    }
}

impl From<serde_json::Error> for AmazeError {
    fn from(err: serde_json::Error) -> Self {
        AmazeError::Serialization(err.to_string())
    }
}

impl From<tempfile::PersistError> for AmazeError {
    fn from(err: tempfile::PersistError) -> Self {
        AmazeError::Io(err.error)
    }
}

pub type Result<T> = std::result::Result<T, AmazeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(AmazeError::group_not_found("shop", "users").is_not_found());
        assert!(AmazeError::DatabaseNotFound("shop".into()).is_not_found());
        assert!(AmazeError::Corruption("bad".into()).is_persistence());
        assert_eq!(
            AmazeError::InvalidFilterSpec("__foo".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            AmazeError::PredicateError {
                field: "age".into(),
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Predicate
        );
    }

    #[test]
    fn test_group_not_found_message() {
        let err = AmazeError::group_not_found("shop", "users");
        assert_eq!(err.to_string(), "Group not found: shop/users");
    }
}
