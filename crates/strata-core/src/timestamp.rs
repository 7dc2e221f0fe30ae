//! Logical write timestamps.
//!
//! Every cell and tombstone carries a `Timestamp` — microseconds since the
//! Unix epoch. Timestamps order writes for last-write-wins reconciliation;
//! they are never used to order counter shards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical write timestamp in microseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use strata_core::Timestamp;
///
/// let a = Timestamp(10);
/// let b = Timestamp(20);
/// assert!(a < b);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The lowest possible timestamp, superseded by every write.
    pub const MIN: Timestamp = Timestamp(i64::MIN);

    /// Current wall-clock time as a write timestamp.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_micros())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
