//! Turns coordinator-issued counter updates into concrete shard
//! contributions.
//!
//! An update cell is a bare signed delta with no writer attached. Before
//! it can merge with other counter cells, the local writer must claim it:
//! look up this writer's current cumulative value in the freshest known
//! cell at the same position, fold the delta in, bump the logical clock,
//! and emit a shard-based cell. The update cell is consumed in place.

use strata_core::errors::StrataResult;
use strata_core::{AtomicCell, ColumnSpec, Key, Mutation, Schema};

use crate::cell::builder::CounterCellBuilder;
use crate::cell::merge::merge_cells;
use crate::cell::view::CounterCellView;
use crate::primitives::{CounterId, CounterShard};

/// Replace every live counter-update cell in `m` with its shard-based
/// form, attributed to `local_id`.
///
/// `prior` is the freshest previously-merged state known for this
/// partition, used both to continue the local writer's value/clock chain
/// and to fold other writers' shards into the result. With no prior
/// state the result is exactly the single new shard. Dead cells pass
/// through untouched — a deletion needs no shard.
pub fn transform_counter_updates(
    schema: &Schema,
    m: &mut Mutation,
    prior: Option<&Mutation>,
    local_id: CounterId,
) -> StrataResult<()> {
    let mut transformed = 0usize;

    let partition = m.partition_mut();
    for (id, cell) in partition.static_row_mut().cells_mut() {
        let column = schema.column(id)?;
        transformed += transform_cell(column, None, cell, prior, local_id)? as usize;
    }
    for (ck, row) in partition.rows_mut() {
        for (id, cell) in row.cells_mut() {
            let column = schema.column(id)?;
            transformed += transform_cell(column, Some(ck), cell, prior, local_id)? as usize;
        }
    }

    if transformed > 0 {
        tracing::debug!(cells = transformed, "transformed counter updates to shards");
    }
    Ok(())
}

/// Transform one cell in place. Returns whether a transform happened.
fn transform_cell(
    column: &ColumnSpec,
    ck: Option<&Key>,
    cell: &mut AtomicCell,
    prior: Option<&Mutation>,
    local_id: CounterId,
) -> StrataResult<bool> {
    if !cell.is_counter_update() {
        return Ok(false);
    }
    if !column.is_counter() {
        return Err(strata_core::errors::MutationError::NotACounterColumn {
            name: column.name.clone(),
        }
        .into());
    }

    let delta = cell.counter_update_delta()?;

    let prior_cell = prior
        .and_then(|p| match ck {
            None => p.partition().static_row().cell(column.id),
            Some(key) => p.partition().row(key).and_then(|row| row.cell(column.id)),
        })
        .filter(|c| c.is_live() && !c.is_counter_update());

    let (prev_value, prev_clock) = match prior_cell {
        Some(pc) => CounterCellView::new(pc)?
            .get_shard(local_id)
            .map_or((0, 0), |s| (s.value, s.logical_clock)),
        None => (0, 0),
    };

    let mut builder = CounterCellBuilder::with_capacity(1);
    builder.add_shard(CounterShard::new(
        local_id,
        prev_value.wrapping_add(delta),
        prev_clock + 1,
    ));
    let shard_cell = builder.build(cell.timestamp())?;

    *cell = match prior_cell {
        Some(pc) => merge_cells(pc, &shard_cell)?,
        None => shard_cell,
    };
    Ok(true)
}
