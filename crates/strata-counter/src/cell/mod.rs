//! Canonical counter cell encoding and the algorithms over it.
//!
//! A live counter cell's payload is the concatenation of fixed-width
//! shard records in strictly increasing id order. Canonical form makes
//! structural equality a byte comparison and lets merge run as a single
//! merge-join pass.

pub mod builder;
pub mod merge;
pub mod view;

pub use builder::CounterCellBuilder;
pub use merge::{apply_reversibly, difference_cells, merge_cells, ReversibleApply};
pub use view::CounterCellView;
