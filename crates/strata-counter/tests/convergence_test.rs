//! Property-based convergence checks for the shard merge algebra.
//!
//! Writer identities come from a small fixed pool and shard values are
//! derived deterministically from (writer, clock), matching the real
//! system's invariant that one writer never publishes two different
//! values under the same clock. Under that invariant merge must be
//! commutative, associative, and idempotent, and its output canonical.

use proptest::prelude::*;

use strata_core::{AtomicCell, Timestamp};
use strata_counter::{
    apply_reversibly, difference_cells, merge_cells, CounterCellBuilder, CounterCellView,
    CounterId, CounterShard,
};

const POOL: usize = 8;

fn id_at(index: usize) -> CounterId {
    let mut bytes = [0u8; 16];
    bytes[0] = index as u8 + 1;
    CounterId::from_bytes(bytes)
}

/// A writer's cumulative value is a function of its clock; two replicas
/// holding the same (id, clock) therefore hold the same value.
fn value_for(index: usize, clock: i64) -> i64 {
    (index as i64 + 1) * 1_000_003 + clock * 7
}

fn shards_of(clocks: &[Option<i64>]) -> Vec<CounterShard> {
    clocks
        .iter()
        .enumerate()
        .filter_map(|(i, clock)| {
            clock.map(|c| CounterShard::new(id_at(i), value_for(i, c), c))
        })
        .collect()
}

fn cell_of(clocks: &[Option<i64>]) -> AtomicCell {
    let mut builder = CounterCellBuilder::new();
    for shard in shards_of(clocks) {
        builder.add_shard(shard);
    }
    builder.build(Timestamp(0)).unwrap()
}

fn arb_clocks() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::of(1i64..1_000_000), POOL)
}

fn assert_canonical(cell: &AtomicCell) {
    let view = CounterCellView::new(cell).unwrap();
    let shards: Vec<_> = view.shards().collect();
    assert!(shards.windows(2).all(|w| w[0].id < w[1].id));
}

proptest! {
    #[test]
    fn merge_is_commutative(a in arb_clocks(), b in arb_clocks()) {
        let (a, b) = (cell_of(&a), cell_of(&b));
        prop_assert_eq!(
            merge_cells(&a, &b).unwrap(),
            merge_cells(&b, &a).unwrap()
        );
    }

    #[test]
    fn merge_is_associative(
        a in arb_clocks(),
        b in arb_clocks(),
        c in arb_clocks(),
    ) {
        let (a, b, c) = (cell_of(&a), cell_of(&b), cell_of(&c));
        let left = merge_cells(&merge_cells(&a, &b).unwrap(), &c).unwrap();
        let right = merge_cells(&a, &merge_cells(&b, &c).unwrap()).unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_is_idempotent(a in arb_clocks()) {
        let a = cell_of(&a);
        prop_assert_eq!(merge_cells(&a, &a).unwrap(), a);
    }

    #[test]
    fn merge_output_is_canonical(a in arb_clocks(), b in arb_clocks()) {
        let merged = merge_cells(&cell_of(&a), &cell_of(&b)).unwrap();
        assert_canonical(&merged);
    }

    #[test]
    fn sanitizer_rebuilds_the_canonical_cell(
        (clocks, scrambled) in arb_clocks().prop_flat_map(|clocks| {
            // Duplicate every shard and shuffle: the worst well-formed
            // corruption the sanitizer must recover from.
            let shards = shards_of(&clocks);
            let mut doubled = shards.clone();
            doubled.extend(shards);
            (Just(clocks), Just(doubled).prop_shuffle())
        })
    ) {
        test_fixtures::init_tracing();
        let mut builder = CounterCellBuilder::new();
        for shard in scrambled {
            builder.add_maybe_unsorted_shard(shard);
        }
        builder.sort_and_remove_duplicates();
        let repaired = builder.build(Timestamp(0)).unwrap();
        prop_assert_eq!(repaired, cell_of(&clocks));
    }

    #[test]
    fn diff_then_apply_reconstructs_merge(a in arb_clocks(), b in arb_clocks()) {
        let (a, b) = (cell_of(&a), cell_of(&b));
        let merged = merge_cells(&a, &b).unwrap();

        let mut replica = a.clone();
        if let Some(delta) = difference_cells(&b, &a).unwrap() {
            let _undo = apply_reversibly(&mut replica, &delta).unwrap();
        }
        prop_assert_eq!(replica, merged);
    }

    #[test]
    fn difference_never_reports_superseded_shards(
        a in arb_clocks(),
        b in arb_clocks(),
    ) {
        let (a, b) = (cell_of(&a), cell_of(&b));
        if let Some(delta) = difference_cells(&a, &b).unwrap() {
            let vb = CounterCellView::new(&b).unwrap();
            let vd = CounterCellView::new(&delta).unwrap();
            for shard in vd.shards() {
                let superseded = vb
                    .get_shard(shard.id)
                    .map_or(false, |o| o.logical_clock >= shard.logical_clock);
                prop_assert!(!superseded);
            }
        }
    }
}
