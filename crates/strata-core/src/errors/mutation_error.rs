/// Mutation-level errors raised while merging, differencing, or
/// transforming whole rows.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("unknown column id {column_id}")]
    UnknownColumn { column_id: u32 },

    #[error("counter operation on non-counter column {name}")]
    NotACounterColumn { name: String },

    #[error("mutations target different partitions")]
    PartitionMismatch,
}
