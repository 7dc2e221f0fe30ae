//! Atomic cells: the smallest unit of column data in a row.
//!
//! A cell is either live (payload bytes plus a write timestamp) or dead
//! (a tombstone with a deletion time). Live cells additionally carry an
//! `is_counter_update` flag in the header: a counter-update cell's payload
//! is a single 8-byte big-endian signed delta, while a shard-based counter
//! cell's payload is the canonical shard sequence defined by the counter
//! engine. The flag lives in the header, never in the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::errors::{CellError, StrataResult};
use crate::timestamp::Timestamp;

/// An owned atomic cell.
///
/// # Examples
///
/// ```
/// use strata_core::{AtomicCell, Timestamp};
///
/// let cell = AtomicCell::make_live_counter_update(Timestamp(1), 5);
/// assert!(cell.is_live());
/// assert!(cell.is_counter_update());
/// assert_eq!(cell.counter_update_delta().unwrap(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomicCell {
    /// A live cell with opaque payload bytes.
    Live {
        timestamp: Timestamp,
        value: Vec<u8>,
        is_counter_update: bool,
    },
    /// A deleted cell. Takes precedence over lower-timestamp live data.
    Dead {
        timestamp: Timestamp,
        deleted_at: DateTime<Utc>,
    },
}

impl AtomicCell {
    /// Create a live cell from raw payload bytes.
    pub fn make_live(timestamp: Timestamp, value: Vec<u8>) -> Self {
        AtomicCell::Live {
            timestamp,
            value,
            is_counter_update: false,
        }
    }

    /// Create a live counter-update cell carrying a single signed delta.
    pub fn make_live_counter_update(timestamp: Timestamp, delta: i64) -> Self {
        AtomicCell::Live {
            timestamp,
            value: delta.to_be_bytes().to_vec(),
            is_counter_update: true,
        }
    }

    /// Create a dead cell (tombstone) as of `deleted_at`.
    pub fn make_dead(timestamp: Timestamp, deleted_at: DateTime<Utc>) -> Self {
        AtomicCell::Dead {
            timestamp,
            deleted_at,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, AtomicCell::Live { .. })
    }

    pub fn is_counter_update(&self) -> bool {
        matches!(
            self,
            AtomicCell::Live {
                is_counter_update: true,
                ..
            }
        )
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            AtomicCell::Live { timestamp, .. } | AtomicCell::Dead { timestamp, .. } => *timestamp,
        }
    }

    /// Payload bytes of a live cell, `None` for a dead cell.
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            AtomicCell::Live { value, .. } => Some(value),
            AtomicCell::Dead { .. } => None,
        }
    }

    /// Decode the delta carried by a counter-update cell.
    pub fn counter_update_delta(&self) -> StrataResult<i64> {
        match self {
            AtomicCell::Live {
                value,
                is_counter_update: true,
                ..
            } => {
                let bytes: [u8; 8] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| CellError::MalformedCounterPayload { len: value.len() })?;
                Ok(i64::from_be_bytes(bytes))
            }
            _ => Err(CellError::NotACounterUpdate.into()),
        }
    }

    /// Deterministic merge preference between two cells, used for every
    /// non-counter column: `Greater` means `a` wins.
    ///
    /// Higher timestamp wins. On equal timestamps a dead cell beats a live
    /// one; two dead cells prefer the later deletion time; two live cells
    /// tie-break on payload bytes, then on the counter-update flag. The
    /// relation is a total preference, so reconciliation is commutative.
    pub fn compare_for_merge(a: &AtomicCell, b: &AtomicCell) -> Ordering {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| match (a, b) {
                (AtomicCell::Dead { .. }, AtomicCell::Live { .. }) => Ordering::Greater,
                (AtomicCell::Live { .. }, AtomicCell::Dead { .. }) => Ordering::Less,
                (
                    AtomicCell::Dead { deleted_at: da, .. },
                    AtomicCell::Dead { deleted_at: db, .. },
                ) => da.cmp(db),
                (
                    AtomicCell::Live {
                        value: va,
                        is_counter_update: ua,
                        ..
                    },
                    AtomicCell::Live {
                        value: vb,
                        is_counter_update: ub,
                        ..
                    },
                ) => va.cmp(vb).then(ua.cmp(ub)),
            })
    }
}
