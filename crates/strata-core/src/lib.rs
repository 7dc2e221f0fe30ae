//! # strata-core
//!
//! Foundation crate for the strata row store.
//! Defines the cell/row/mutation data model, schema, timestamps, errors,
//! and configuration. The conflict-resolution engines build on this crate.

pub mod cell;
pub mod config;
pub mod errors;
pub mod mutation;
pub mod schema;
pub mod timestamp;

// Re-export the most commonly used types at the crate root.
pub use cell::AtomicCell;
pub use config::CompactionConfig;
pub use errors::{StrataError, StrataResult};
pub use mutation::{freeze, FrozenMutation, Key, Mutation, Partition, Row, Tombstone};
pub use schema::{ColumnId, ColumnKind, ColumnSpec, ColumnType, Schema};
pub use timestamp::Timestamp;
