//! Configuration for the row-store maintenance paths.

use serde::{Deserialize, Serialize};

/// Default values for configuration fields.
pub mod defaults {
    /// Grace period before expired tombstones are purged (ten days).
    pub const DEFAULT_GC_GRACE_SECONDS: i64 = 864_000;
}

/// Compaction subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Seconds a tombstone is retained after its deletion time, so that
    /// lagging replicas still observe it before it is purged.
    pub gc_grace_seconds: i64,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            gc_grace_seconds: defaults::DEFAULT_GC_GRACE_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grace_period_is_ten_days() {
        let config = CompactionConfig::default();
        assert_eq!(config.gc_grace_seconds, 10 * 24 * 60 * 60);
    }
}
