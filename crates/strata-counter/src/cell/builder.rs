//! Accumulates shards into a canonical encoded counter cell.
//!
//! Two entry points: `add_shard` assumes the caller supplies shards in
//! strictly increasing id order (merge output, transform output), while
//! `add_maybe_unsorted_shard` accepts anything and requires an explicit
//! `sort_and_remove_duplicates` pass before `build`. The sanitizing path
//! exists for recovery and repair of corrupted cells; it never runs on
//! the hot write path.
//!
//! # Examples
//!
//! ```
//! use strata_counter::{CounterCellBuilder, CounterCellView, CounterId, CounterShard};
//! use strata_core::Timestamp;
//!
//! let mut ids = [CounterId::generate_random(), CounterId::generate_random()];
//! ids.sort();
//!
//! let mut builder = CounterCellBuilder::new();
//! builder.add_shard(CounterShard::new(ids[0], 5, 1));
//! builder.add_shard(CounterShard::new(ids[1], -4, 1));
//! let cell = builder.build(Timestamp(0)).unwrap();
//!
//! let view = CounterCellView::new(&cell).unwrap();
//! assert_eq!(view.total_value(), 1);
//! ```

use strata_core::errors::{CellError, StrataResult};
use strata_core::{AtomicCell, Timestamp};

use crate::primitives::CounterShard;

/// Builder for canonical (sorted, duplicate-free) counter cells.
#[derive(Debug, Default)]
pub struct CounterCellBuilder {
    shards: Vec<CounterShard>,
    needs_sanitize: bool,
}

impl CounterCellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shards: Vec::with_capacity(capacity),
            needs_sanitize: false,
        }
    }

    /// Append a shard on the strict fast path.
    ///
    /// The caller guarantees strictly increasing ids with no duplicates;
    /// a violation is a programmer error and trips an assertion in debug
    /// builds.
    pub fn add_shard(&mut self, shard: CounterShard) {
        debug_assert!(
            self.shards.last().map_or(true, |last| last.id < shard.id),
            "shards must be added in strictly increasing id order"
        );
        self.shards.push(shard);
    }

    /// Append a shard with no ordering assumption. `sort_and_remove_duplicates`
    /// must run before `build`.
    pub fn add_maybe_unsorted_shard(&mut self, shard: CounterShard) {
        self.needs_sanitize = true;
        self.shards.push(shard);
    }

    /// Restore canonical form: sort by id and collapse duplicate ids to
    /// the copy with the higher logical clock.
    ///
    /// Equal-clock duplicates never occur in valid data; when corruption
    /// produces them anyway the first-encountered copy is kept, so the
    /// result is deterministic regardless of input order.
    pub fn sort_and_remove_duplicates(&mut self) {
        let was_canonical = self
            .shards
            .windows(2)
            .all(|pair| pair[0].id < pair[1].id);

        // Stable sort by id keeps equal-id shards in arrival order, which
        // is what makes the equal-clock tie-break positional.
        self.shards.sort_by(|a, b| a.id.cmp(&b.id));

        let mut canonical: Vec<CounterShard> = Vec::with_capacity(self.shards.len());
        for shard in self.shards.drain(..) {
            match canonical.last_mut() {
                Some(last) if last.id == shard.id => {
                    if shard.logical_clock > last.logical_clock {
                        *last = shard;
                    }
                }
                _ => canonical.push(shard),
            }
        }

        if !was_canonical {
            tracing::warn!(
                shards = canonical.len(),
                "sanitized corrupted counter cell (out-of-order or duplicate shards)"
            );
        }

        self.shards = canonical;
        self.needs_sanitize = false;
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Encode the accumulated shards into an immutable live cell stamped
    /// with `timestamp`.
    ///
    /// Fails if the unsorted path was used without sanitizing first.
    pub fn build(self, timestamp: Timestamp) -> StrataResult<AtomicCell> {
        if self.needs_sanitize {
            return Err(CellError::UnsortedShards.into());
        }
        let mut payload = Vec::with_capacity(self.shards.len() * CounterShard::ENCODED_LEN);
        for shard in &self.shards {
            shard.encode_into(&mut payload);
        }
        Ok(AtomicCell::make_live(timestamp, payload))
    }
}
