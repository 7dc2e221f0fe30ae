//! Counter primitives: writer identity and the shard record.

pub mod counter_id;
pub mod shard;

pub use counter_id::CounterId;
pub use shard::CounterShard;
