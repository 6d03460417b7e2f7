//! Actuator storage: repositories for messages and action results.
//!
//! Two interchangeable backends implement the same async traits: a
//! WAL-mode SQLite store with migrations, and an in-memory store used by
//! tests and single-process deployments.

pub mod db;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod repository;
pub mod sqlite;

pub use db::Database;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use repository::{
    MessageFilter, MessageRepository, ResultRepository, StatusUpdate, DEFAULT_LIST_LIMIT,
};
pub use sqlite::SqliteStore;
