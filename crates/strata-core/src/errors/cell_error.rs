/// Cell-level errors.
///
/// Construction of counter views and cells enforces preconditions at the
/// boundary; violations surface here rather than as silent misreads.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    #[error("cannot view a dead cell as a counter")]
    DeadCounterView,

    #[error("cannot view a counter update cell as a shard-based counter")]
    CounterUpdateView,

    #[error("malformed counter payload: {len} bytes is not a whole number of shard records")]
    MalformedCounterPayload { len: usize },

    #[error("counter cell built from unsorted shards without sanitization")]
    UnsortedShards,

    #[error("cell is not a counter update")]
    NotACounterUpdate,
}
