//! # strata-counter
//!
//! Conflict resolution for distributed counters in the strata row store.
//!
//! A counter value is a set of per-writer shards, each independently
//! incrementable. Merging two cells is a merge-join over their sorted
//! shard sequences where, per writer, the copy with the higher logical
//! clock wins — never a numeric sum, since each shard already holds that
//! writer's cumulative contribution. This makes the merge commutative,
//! associative, and idempotent, so replicas converge through any message
//! order.
//!
//! Module map:
//! - [`primitives`] — writer identity and the shard record
//! - [`cell`] — canonical cell encoding: builder, zero-copy view, merge,
//!   reversible apply, difference
//! - [`engine`] — mutation-level integration: counter-aware row merge and
//!   differencing, the coordinator update transform, compaction

pub mod cell;
pub mod engine;
pub mod primitives;

pub use cell::builder::CounterCellBuilder;
pub use cell::merge::{apply_reversibly, difference_cells, merge_cells, ReversibleApply};
pub use cell::view::CounterCellView;
pub use engine::mutation_merge::{apply_mutation, compact, difference};
pub use engine::update_transform::transform_counter_updates;
pub use primitives::{CounterId, CounterShard};
