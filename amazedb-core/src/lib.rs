// amazedb-core/src/lib.rs
// Pure Rust core of AmazeDB: file-based, schema-less document store

pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod export;
pub mod group;
pub mod logging;
pub mod query;
pub mod storage;
pub mod store;
pub mod update;
pub mod value_utils;

// Public exports
pub use collection::DocumentCollection;
pub use config::{Durability, StoreOptions};
pub use database::Database;
pub use document::Document;
pub use error::{AmazeError, ErrorKind, Result};
pub use group::Group;
pub use logging::{get_log_level, set_log_level, LogLevel};
pub use query::{Condition, Predicate, Query};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::Store;
pub use update::Update;
