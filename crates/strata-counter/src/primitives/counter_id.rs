//! Globally unique counter writer identity.
//!
//! Identities are 128-bit random values. Collision probability is
//! negligible by construction, so no registry or coordination exists;
//! generation is a pure draw from OS entropy and is safe from any thread.
//! The total order over identities is the canonical sort key for shards
//! within a cell and the join key for merge.
//!
//! # Examples
//!
//! ```
//! use strata_counter::CounterId;
//!
//! let a = CounterId::generate_random();
//! let b = CounterId::generate_random();
//! assert_ne!(a, b);
//! assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A 128-bit random writer identity with a total order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CounterId(Uuid);

impl CounterId {
    /// Encoded width in the counter cell payload.
    pub const ENCODED_LEN: usize = 16;

    /// Draw a fresh random identity. Pure local randomness, no shared
    /// state; callable concurrently from independent contexts.
    pub fn generate_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; Self::ENCODED_LEN] {
        self.0.as_bytes()
    }

    /// Append the big-endian byte encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
