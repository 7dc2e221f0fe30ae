//! Zero-copy read view over an encoded counter cell.
//!
//! The view borrows the cell payload; nothing is decoded until asked for.
//! Construction validates the cell up front (live, shard-based, whole
//! number of records), so every accessor afterwards is infallible.
//!
//! # Examples
//!
//! ```
//! use strata_counter::{CounterCellBuilder, CounterCellView, CounterId, CounterShard};
//! use strata_core::Timestamp;
//!
//! let id = CounterId::generate_random();
//! let mut builder = CounterCellBuilder::new();
//! builder.add_shard(CounterShard::new(id, 42, 1));
//! let cell = builder.build(Timestamp(0)).unwrap();
//!
//! let view = CounterCellView::new(&cell).unwrap();
//! assert_eq!(view.total_value(), 42);
//! assert_eq!(view.get_shard(id).unwrap().logical_clock, 1);
//! ```

use std::cmp::Ordering;

use strata_core::errors::{CellError, StrataResult};
use strata_core::AtomicCell;

use crate::primitives::{CounterId, CounterShard};

/// Read-only view over a live, shard-based counter cell.
///
/// Equality is structural: identical shard sequences element for element.
/// Because valid cells are canonical (sorted, duplicate-free), that is
/// exactly payload byte equality — two cells with equal totals but
/// different shard composition compare unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterCellView<'a> {
    payload: &'a [u8],
}

impl<'a> CounterCellView<'a> {
    /// Bind a view to a cell. Fails on dead cells, not-yet-transformed
    /// update cells, and payloads that are not a whole number of shard
    /// records.
    pub fn new(cell: &'a AtomicCell) -> StrataResult<Self> {
        if cell.is_counter_update() {
            return Err(CellError::CounterUpdateView.into());
        }
        let payload = cell.value().ok_or(CellError::DeadCounterView)?;
        if payload.len() % CounterShard::ENCODED_LEN != 0 {
            return Err(CellError::MalformedCounterPayload { len: payload.len() }.into());
        }
        Ok(Self { payload })
    }

    pub fn shard_count(&self) -> usize {
        self.payload.len() / CounterShard::ENCODED_LEN
    }

    /// Lazy forward pass over the shards in ascending id order. Each call
    /// restarts from the first shard.
    pub fn shards(&self) -> impl Iterator<Item = CounterShard> + 'a {
        self.payload
            .chunks_exact(CounterShard::ENCODED_LEN)
            .map(CounterShard::decode)
    }

    /// Sum of all shard values. O(shard count). 64-bit overflow of the
    /// total is outside the data model; the sum wraps.
    pub fn total_value(&self) -> i64 {
        self.shards().fold(0i64, |acc, s| acc.wrapping_add(s.value))
    }

    /// Binary search for the shard owned by `id`.
    pub fn get_shard(&self, id: CounterId) -> Option<CounterShard> {
        let mut lo = 0usize;
        let mut hi = self.shard_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let shard = self.shard_at(mid);
            match shard.id.cmp(&id) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(shard),
            }
        }
        None
    }

    fn shard_at(&self, index: usize) -> CounterShard {
        let offset = index * CounterShard::ENCODED_LEN;
        CounterShard::decode(&self.payload[offset..offset + CounterShard::ENCODED_LEN])
    }
}
