//! Rows, partitions, and mutations.
//!
//! A `Mutation` is one partition's worth of writes: an optional partition
//! tombstone, a static row, and clustered rows keyed by clustering key.
//! This module only stores data; reconciliation between two mutations is
//! the counter engine's job, since it must dispatch counter columns to
//! shard-aware merge.

mod freeze;

pub use freeze::{freeze, FrozenMutation};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cell::AtomicCell;
use crate::schema::{ColumnId, ColumnSpec};
use crate::timestamp::Timestamp;

/// An opaque, ordered key. Partition and clustering key comparators are
/// external collaborators; byte ordering stands in for them here.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Key(pub Vec<u8>);

impl Key {
    pub fn from_single_value(v: i32) -> Self {
        Self(v.to_be_bytes().to_vec())
    }
}

/// A deletion marker covering everything written at or before `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub timestamp: Timestamp,
    pub deleted_at: DateTime<Utc>,
}

impl Tombstone {
    /// Whether data written at `ts` is shadowed by this tombstone.
    pub fn supersedes(&self, ts: Timestamp) -> bool {
        ts <= self.timestamp
    }

    /// The stronger of two tombstones.
    pub fn merge(a: Tombstone, b: Tombstone) -> Tombstone {
        if (b.timestamp, b.deleted_at) > (a.timestamp, a.deleted_at) {
            b
        } else {
            a
        }
    }
}

/// One row: cells indexed by column id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Row {
    cells: BTreeMap<ColumnId, AtomicCell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cell for a column. Reconciliation between versions of
    /// a row goes through the merge engine, not through this setter.
    pub fn set_cell(&mut self, id: ColumnId, cell: AtomicCell) {
        self.cells.insert(id, cell);
    }

    pub fn cell(&self, id: ColumnId) -> Option<&AtomicCell> {
        self.cells.get(&id)
    }

    pub fn cell_mut(&mut self, id: ColumnId) -> Option<&mut AtomicCell> {
        self.cells.get_mut(&id)
    }

    pub fn remove_cell(&mut self, id: ColumnId) -> Option<AtomicCell> {
        self.cells.remove(&id)
    }

    pub fn cells(&self) -> impl Iterator<Item = (ColumnId, &AtomicCell)> {
        self.cells.iter().map(|(id, c)| (*id, c))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (ColumnId, &mut AtomicCell)> {
        self.cells.iter_mut().map(|(id, c)| (*id, c))
    }

    /// Drop cells that do not satisfy the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(ColumnId, &AtomicCell) -> bool) {
        self.cells.retain(|id, cell| keep(*id, cell));
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Partition-level state: tombstone, static row, clustered rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Partition {
    tombstone: Option<Tombstone>,
    static_row: Row,
    rows: BTreeMap<Key, Row>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a partition tombstone, keeping the stronger of the two.
    pub fn apply_tombstone(&mut self, tombstone: Tombstone) {
        self.tombstone = Some(match self.tombstone {
            Some(existing) => Tombstone::merge(existing, tombstone),
            None => tombstone,
        });
    }

    pub fn tombstone(&self) -> Option<Tombstone> {
        self.tombstone
    }

    pub fn static_row(&self) -> &Row {
        &self.static_row
    }

    pub fn static_row_mut(&mut self) -> &mut Row {
        &mut self.static_row
    }

    pub fn row(&self, key: &Key) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn row_mut(&mut self, key: &Key) -> Option<&mut Row> {
        self.rows.get_mut(key)
    }

    /// Remove the partition tombstone, once compaction decides it has been
    /// retained past its grace period.
    pub fn purge_tombstone(&mut self) {
        self.tombstone = None;
    }

    /// The clustered row for `key`, created empty if absent.
    pub fn row_entry(&mut self, key: Key) -> &mut Row {
        self.rows.entry(key).or_default()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Key, &Row)> {
        self.rows.iter()
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = (&Key, &mut Row)> {
        self.rows.iter_mut()
    }

    /// Drop clustered rows that became empty.
    pub fn prune_empty_rows(&mut self) {
        self.rows.retain(|_, row| !row.is_empty());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tombstone.is_none() && self.static_row.is_empty() && self.rows.is_empty()
    }
}

/// One partition's worth of writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    key: Key,
    partition: Partition,
}

impl Mutation {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            partition: Partition::new(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn partition_mut(&mut self) -> &mut Partition {
        &mut self.partition
    }

    /// Set a cell in the clustered row at `ck`.
    pub fn set_clustered_cell(&mut self, ck: Key, column: &ColumnSpec, cell: AtomicCell) {
        self.partition.row_entry(ck).set_cell(column.id, cell);
    }

    /// Set a cell in the static row.
    pub fn set_static_cell(&mut self, column: &ColumnSpec, cell: AtomicCell) {
        self.partition.static_row_mut().set_cell(column.id, cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnKind, ColumnType, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .with_column("c1", ColumnKind::Regular, ColumnType::Blob)
            .build()
    }

    #[test]
    fn tombstone_merge_keeps_stronger() {
        let now = Utc::now();
        let weak = Tombstone {
            timestamp: Timestamp(1),
            deleted_at: now,
        };
        let strong = Tombstone {
            timestamp: Timestamp(2),
            deleted_at: now,
        };
        assert_eq!(Tombstone::merge(weak, strong), strong);
        assert_eq!(Tombstone::merge(strong, weak), strong);
    }

    #[test]
    fn tombstone_shadows_older_writes_only() {
        let t = Tombstone {
            timestamp: Timestamp(10),
            deleted_at: Utc::now(),
        };
        assert!(t.supersedes(Timestamp(10)));
        assert!(t.supersedes(Timestamp(3)));
        assert!(!t.supersedes(Timestamp(11)));
    }

    #[test]
    fn clustered_and_static_cells_land_in_the_right_rows() {
        let s = schema();
        let col = s.column_by_name("c1").unwrap();
        let mut m = Mutation::new(Key::from_single_value(0));
        let ck = Key::from_single_value(1);
        m.set_clustered_cell(
            ck.clone(),
            col,
            AtomicCell::make_live(Timestamp(1), vec![1]),
        );
        assert_eq!(m.partition().row_count(), 1);
        assert!(m.partition().row(&ck).unwrap().cell(col.id).is_some());
        assert!(m.partition().static_row().is_empty());
    }
}
