//! Shared fixtures for strata integration tests and benchmarks.
//!
//! Helper constructors for the counter schema, sorted writer identities,
//! and shard-bearing mutations, so every test builds its data the same
//! way.

use std::sync::Once;

use strata_core::schema::{ColumnKind, ColumnType, Schema};
use strata_core::{AtomicCell, Key, Mutation, Timestamp};
use strata_counter::{CounterCellBuilder, CounterId, CounterShard};

static TRACING: Once = Once::new();

/// Install the test tracing subscriber once per process. Honors
/// `RUST_LOG`; output goes through the libtest capture.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The canonical two-counter-column test schema: one regular column
/// (`c1`) and one static column (`s1`).
pub fn counter_schema() -> Schema {
    Schema::builder()
        .with_column("c1", ColumnKind::Regular, ColumnType::Counter)
        .with_column("s1", ColumnKind::Static, ColumnType::Counter)
        .build()
}

/// `count` fresh random writer identities, sorted.
pub fn generate_ids(count: usize) -> Vec<CounterId> {
    let mut ids: Vec<_> = (0..count).map(|_| CounterId::generate_random()).collect();
    ids.sort();
    ids
}

/// The partition key every fixture mutation targets.
pub fn partition_key() -> Key {
    Key::from_single_value(0)
}

/// The clustering key every fixture row targets.
pub fn clustering_key() -> Key {
    Key::from_single_value(0)
}

/// Build a canonical counter cell from `(id, value, clock)` triples,
/// which must already be sorted by id.
pub fn shard_cell(timestamp: Timestamp, shards: &[(CounterId, i64, i64)]) -> AtomicCell {
    let mut builder = CounterCellBuilder::with_capacity(shards.len());
    for &(id, value, clock) in shards {
        builder.add_shard(CounterShard::new(id, value, clock));
    }
    builder
        .build(timestamp)
        .expect("fixture shards are pre-sorted")
}

/// A mutation with the given shard cells in the regular (`c1`) and
/// static (`s1`) counter columns.
pub fn counter_mutation(
    schema: &Schema,
    clustered: Option<AtomicCell>,
    static_cell: Option<AtomicCell>,
) -> Mutation {
    let mut m = Mutation::new(partition_key());
    if let Some(cell) = clustered {
        let col = schema
            .column_by_name("c1")
            .expect("fixture schema has c1")
            .clone();
        m.set_clustered_cell(clustering_key(), &col, cell);
    }
    if let Some(cell) = static_cell {
        let col = schema
            .column_by_name("s1")
            .expect("fixture schema has s1")
            .clone();
        m.set_static_cell(&col, cell);
    }
    m
}
