//! Pylon Storage Layer
//!
//! SQLite-based durable key-value store with per-entry expiry.
//! Stands in for browser local storage: values are JSON strings,
//! and there is no transactional guarantee across keys.

mod database;
mod error;
mod kv;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use kv::{DurableKv, KvEntry};

pub type Result<T> = std::result::Result<T, StorageError>;
