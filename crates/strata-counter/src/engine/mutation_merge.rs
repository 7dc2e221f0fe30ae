//! Counter-aware merge, difference, and compaction over whole mutations.
//!
//! The generic row merge cannot treat counter columns as
//! replace-by-timestamp: two versions of a counter cell both carry live
//! shards that must combine. This module walks two mutations row by row,
//! dispatching counter columns to the shard merge and everything else to
//! the plain timestamp preference.
//!
//! The apply path is all-or-nothing within one call: every cell merge
//! goes through a reversible-apply token, and a failure at any point
//! rolls back every cell already touched, newest first, before the error
//! propagates.

use chrono::{DateTime, Duration, Utc};

use strata_core::errors::StrataResult;
use strata_core::{
    AtomicCell, ColumnId, CompactionConfig, Key, Mutation, Row, Schema, Tombstone,
};

use crate::cell::merge::{apply_reversibly, difference_cells, ReversibleApply};

/// One entry in the apply undo log. `ck: None` addresses the static row.
enum AppliedCell {
    Merged {
        ck: Option<Key>,
        column: ColumnId,
        undo: ReversibleApply,
    },
    Inserted {
        ck: Option<Key>,
        column: ColumnId,
    },
}

/// Merge `src` into `dst` in place.
///
/// Partition tombstones max-merge; rows merge cell-wise with counter
/// columns dispatched to shard merge. On error, `dst` is restored exactly
/// to its pre-call state.
pub fn apply_mutation(schema: &Schema, dst: &mut Mutation, src: &Mutation) -> StrataResult<()> {
    if dst.key() != src.key() {
        return Err(strata_core::errors::MutationError::PartitionMismatch.into());
    }

    // Snapshot first: the tombstone merge is not covered by the cell
    // undo log and must be unwound separately.
    let prev_tombstone = dst.partition().tombstone();
    if let Some(tombstone) = src.partition().tombstone() {
        dst.partition_mut().apply_tombstone(tombstone);
    }

    let mut log: Vec<AppliedCell> = Vec::new();
    if let Err(e) = apply_rows(schema, dst, src, &mut log) {
        rollback(dst, prev_tombstone, log);
        return Err(e);
    }
    Ok(())
}

fn apply_rows(
    schema: &Schema,
    dst: &mut Mutation,
    src: &Mutation,
    log: &mut Vec<AppliedCell>,
) -> StrataResult<()> {
    apply_row(
        schema,
        None,
        dst.partition_mut().static_row_mut(),
        src.partition().static_row(),
        log,
    )?;
    for (ck, src_row) in src.partition().rows() {
        let dst_row = dst.partition_mut().row_entry(ck.clone());
        apply_row(schema, Some(ck), dst_row, src_row, log)?;
    }
    Ok(())
}

fn apply_row(
    schema: &Schema,
    ck: Option<&Key>,
    dst: &mut Row,
    src: &Row,
    log: &mut Vec<AppliedCell>,
) -> StrataResult<()> {
    for (id, src_cell) in src.cells() {
        let column = schema.column(id)?;
        match dst.cell_mut(id) {
            None => {
                dst.set_cell(id, src_cell.clone());
                log.push(AppliedCell::Inserted {
                    ck: ck.cloned(),
                    column: id,
                });
            }
            Some(dst_cell) => {
                if column.is_counter() {
                    let undo = apply_reversibly(dst_cell, src_cell)?;
                    log.push(AppliedCell::Merged {
                        ck: ck.cloned(),
                        column: id,
                        undo,
                    });
                } else if AtomicCell::compare_for_merge(src_cell, dst_cell)
                    == std::cmp::Ordering::Greater
                {
                    let prev = std::mem::replace(dst_cell, src_cell.clone());
                    log.push(AppliedCell::Merged {
                        ck: ck.cloned(),
                        column: id,
                        undo: ReversibleApply::from_snapshot(prev),
                    });
                }
            }
        }
    }
    Ok(())
}

fn rollback(dst: &mut Mutation, prev_tombstone: Option<Tombstone>, log: Vec<AppliedCell>) {
    tracing::debug!(cells = log.len(), "rolling back partial mutation apply");
    for entry in log.into_iter().rev() {
        let partition = dst.partition_mut();
        match entry {
            AppliedCell::Merged { ck, column, undo } => {
                let row = match &ck {
                    None => Some(partition.static_row_mut()),
                    Some(key) => partition.row_mut(key),
                };
                if let Some(cell) = row.and_then(|r| r.cell_mut(column)) {
                    undo.revert(cell);
                }
            }
            AppliedCell::Inserted { ck, column } => {
                let row = match &ck {
                    None => Some(partition.static_row_mut()),
                    Some(key) => partition.row_mut(key),
                };
                if let Some(row) = row {
                    row.remove_cell(column);
                }
            }
        }
    }
    dst.partition_mut().prune_empty_rows();

    let partition = dst.partition_mut();
    partition.purge_tombstone();
    if let Some(tombstone) = prev_tombstone {
        partition.apply_tombstone(tombstone);
    }
}

/// What `a` carries beyond `b`: per-cell shard-set difference for counter
/// columns, timestamp preference for the rest, whole rows where `b` has
/// none. Cells with nothing to report are omitted, not copied through.
pub fn difference(schema: &Schema, a: &Mutation, b: &Mutation) -> StrataResult<Mutation> {
    let mut out = Mutation::new(a.key().clone());

    if let Some(ta) = a.partition().tombstone() {
        let stronger = match b.partition().tombstone() {
            Some(tb) => (ta.timestamp, ta.deleted_at) > (tb.timestamp, tb.deleted_at),
            None => true,
        };
        if stronger {
            out.partition_mut().apply_tombstone(ta);
        }
    }

    diff_row(
        schema,
        a.partition().static_row(),
        Some(b.partition().static_row()),
        out.partition_mut().static_row_mut(),
    )?;
    for (ck, a_row) in a.partition().rows() {
        let mut row = Row::new();
        diff_row(schema, a_row, b.partition().row(ck), &mut row)?;
        if !row.is_empty() {
            *out.partition_mut().row_entry(ck.clone()) = row;
        }
    }

    Ok(out)
}

fn diff_row(
    schema: &Schema,
    a: &Row,
    b: Option<&Row>,
    out: &mut Row,
) -> StrataResult<()> {
    for (id, a_cell) in a.cells() {
        let column = schema.column(id)?;
        let b_cell = b.and_then(|row| row.cell(id));
        let emitted = match b_cell {
            None => Some(a_cell.clone()),
            Some(b_cell) if column.is_counter() => difference_cells(a_cell, b_cell)?,
            Some(b_cell) => {
                if AtomicCell::compare_for_merge(a_cell, b_cell) == std::cmp::Ordering::Greater {
                    Some(a_cell.clone())
                } else {
                    None
                }
            }
        };
        if let Some(cell) = emitted {
            out.set_cell(id, cell);
        }
    }
    Ok(())
}

/// Row-range compaction: drop data shadowed by the partition tombstone,
/// purge dead cells (and the tombstone itself) past the gc grace period,
/// prune rows that end up empty.
pub fn compact(config: &CompactionConfig, m: &mut Mutation, now: DateTime<Utc>) {
    let grace = Duration::seconds(config.gc_grace_seconds);
    let partition = m.partition_mut();
    let tombstone = partition.tombstone();

    let keep = |cell: &AtomicCell| -> bool {
        if let Some(t) = tombstone {
            if t.supersedes(cell.timestamp()) {
                return false;
            }
        }
        match cell {
            AtomicCell::Dead { deleted_at, .. } => *deleted_at + grace > now,
            AtomicCell::Live { .. } => true,
        }
    };

    partition.static_row_mut().retain(|_, cell| keep(cell));
    for (_, row) in partition.rows_mut() {
        row.retain(|_, cell| keep(cell));
    }
    partition.prune_empty_rows();

    if let Some(Tombstone { deleted_at, .. }) = partition.tombstone() {
        if deleted_at + grace <= now {
            partition.purge_tombstone();
        }
    }
}
