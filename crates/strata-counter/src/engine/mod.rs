//! Mutation-level integration: where the row store hands control to the
//! counter engine.

pub mod mutation_merge;
pub mod update_transform;

pub use mutation_merge::{apply_mutation, compact, difference};
pub use update_transform::transform_counter_updates;
