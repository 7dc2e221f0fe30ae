//! Freeze/unfreeze: serialized mutations for replay and shipping.
//!
//! The outer framing is plain serde; counter payloads inside cells are
//! opaque byte sequences to this layer and round-trip byte-for-byte.

use serde::{Deserialize, Serialize};

use super::Mutation;
use crate::errors::StrataResult;

/// A mutation serialized to bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenMutation(Vec<u8>);

impl FrozenMutation {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Deserialize back into a `Mutation`.
    pub fn unfreeze(&self) -> StrataResult<Mutation> {
        Ok(serde_json::from_slice(&self.0)?)
    }
}

/// Serialize a mutation.
pub fn freeze(m: &Mutation) -> StrataResult<FrozenMutation> {
    Ok(FrozenMutation(serde_json::to_vec(m)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::AtomicCell;
    use crate::mutation::Key;
    use crate::schema::{ColumnKind, ColumnType, Schema};
    use crate::timestamp::Timestamp;

    #[test]
    fn round_trips_opaque_payload_bytes() {
        let schema = Schema::builder()
            .with_column("c1", ColumnKind::Regular, ColumnType::Blob)
            .build();
        let col = schema.column_by_name("c1").unwrap();

        let mut m = Mutation::new(Key::from_single_value(0));
        m.set_clustered_cell(
            Key::from_single_value(1),
            col,
            AtomicCell::make_live(Timestamp(42), vec![0, 1, 255, 128, 7]),
        );

        let frozen = freeze(&m).unwrap();
        assert_eq!(frozen.unfreeze().unwrap(), m);
    }
}
