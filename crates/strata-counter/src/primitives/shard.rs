//! The counter shard: one writer's cumulative contribution.
//!
//! A shard is `(writer id, value, logical clock)`. The value is the
//! writer's *total* contribution, not a delta; the clock increments on
//! every local update and is used only to resolve same-writer merge
//! conflicts, never for ordering or display.
//!
//! # Examples
//!
//! ```
//! use strata_counter::{CounterId, CounterShard};
//!
//! let id = CounterId::generate_random();
//! let shard = CounterShard::new(id, 5, 1);
//! let updated = shard.update(2, 1);
//! assert_eq!(updated.value, 7);
//! assert_eq!(updated.logical_clock, 2);
//! ```

use serde::{Deserialize, Serialize};

use super::counter_id::CounterId;

/// One writer's cumulative contribution to a counter, with its clock.
///
/// Shards sort and merge by `id` alone; equality compares all three
/// fields (two cells with equal totals but different shard composition
/// are different cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterShard {
    pub id: CounterId,
    pub value: i64,
    pub logical_clock: i64,
}

impl CounterShard {
    /// Encoded width of one shard record: id ‖ value ‖ clock, big-endian,
    /// no padding.
    pub const ENCODED_LEN: usize = CounterId::ENCODED_LEN + 8 + 8;

    pub fn new(id: CounterId, value: i64, logical_clock: i64) -> Self {
        Self {
            id,
            value,
            logical_clock,
        }
    }

    /// A copy with `delta` folded into the cumulative value and the clock
    /// advanced by `clock_increment`.
    ///
    /// The 64-bit value is not a supported range guarantee; on overflow
    /// the arithmetic wraps rather than aborting.
    pub fn update(self, delta: i64, clock_increment: i64) -> Self {
        Self {
            id: self.id,
            value: self.value.wrapping_add(delta),
            logical_clock: self.logical_clock.wrapping_add(clock_increment),
        }
    }

    /// Append the fixed-width record encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        self.id.encode_into(out);
        out.extend_from_slice(&self.value.to_be_bytes());
        out.extend_from_slice(&self.logical_clock.to_be_bytes());
    }

    /// Decode one fixed-width record. The caller guarantees the slice is
    /// exactly [`Self::ENCODED_LEN`] bytes (the view validates payload
    /// length up front).
    pub fn decode(record: &[u8]) -> Self {
        debug_assert_eq!(record.len(), Self::ENCODED_LEN);
        let mut id = [0u8; CounterId::ENCODED_LEN];
        id.copy_from_slice(&record[..CounterId::ENCODED_LEN]);
        let mut value = [0u8; 8];
        value.copy_from_slice(&record[16..24]);
        let mut clock = [0u8; 8];
        clock.copy_from_slice(&record[24..32]);
        Self {
            id: CounterId::from_bytes(id),
            value: i64::from_be_bytes(value),
            logical_clock: i64::from_be_bytes(clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let shard = CounterShard::new(CounterId::generate_random(), -77, 12);
        let mut bytes = Vec::new();
        shard.encode_into(&mut bytes);
        assert_eq!(bytes.len(), CounterShard::ENCODED_LEN);
        assert_eq!(CounterShard::decode(&bytes), shard);
    }

    #[test]
    fn update_accumulates_value_and_clock() {
        let shard = CounterShard::new(CounterId::generate_random(), 5, 1);
        let updated = shard.update(-9, 1);
        assert_eq!(updated.value, -4);
        assert_eq!(updated.logical_clock, 2);
        assert_eq!(updated.id, shard.id);
    }

    #[test]
    fn encoding_is_big_endian_in_record_order() {
        let id = CounterId::from_bytes([0xAB; 16]);
        let shard = CounterShard::new(id, 1, 2);
        let mut bytes = Vec::new();
        shard.encode_into(&mut bytes);
        assert_eq!(&bytes[..16], &[0xAB; 16]);
        assert_eq!(&bytes[16..24], &1i64.to_be_bytes());
        assert_eq!(&bytes[24..32], &2i64.to_be_bytes());
    }
}
