//! Store and query configuration

use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};

/// Compact when deleted slots exceed this fraction of all stored slots.
pub const DEFAULT_COMPACTION_THRESHOLD: f64 = 0.5;

/// Scan in parallel once a snapshot holds at least this many slots.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Minimum number of candidates requested from an auxiliary index.
pub const DEFAULT_INDEX_CANDIDATES: usize = 64;

/// Configuration for a [`VectorStore`](crate::storage::VectorStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Pre-declared dimensionality. When unset, the first successful insert
    /// fixes it.
    pub dimension: Option<usize>,
    /// Fraction in `(0, 1]`. Removal triggers compaction once
    /// `deleted > compaction_threshold * slots`. `1.0` disables automatic
    /// compaction.
    pub compaction_threshold: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dimension: None,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_compaction_threshold(mut self, threshold: f64) -> Self {
        self.compaction_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == Some(0) {
            return Err(VectorStoreError::invalid_argument(
                "dimension must be positive",
            ));
        }
        if !(self.compaction_threshold > 0.0 && self.compaction_threshold <= 1.0) {
            return Err(VectorStoreError::invalid_argument(format!(
                "compaction_threshold must be in (0, 1], got {}",
                self.compaction_threshold
            )));
        }
        Ok(())
    }
}

/// Tuning knobs for the [`QueryEngine`](crate::query::QueryEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub parallel_threshold: usize,
    pub index_candidates: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            index_candidates: DEFAULT_INDEX_CANDIDATES,
        }
    }
}

impl QueryConfig {
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_index_candidates(mut self, candidates: usize) -> Self {
        self.index_candidates = candidates;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.dimension, None);
        assert_eq!(config.compaction_threshold, 0.5);
        assert!(config.validate().is_ok());

        let query = QueryConfig::default();
        assert_eq!(query.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(query.index_candidates, DEFAULT_INDEX_CANDIDATES);
    }

    #[test]
    fn test_invalid_threshold() {
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let config = StoreConfig::new().with_compaction_threshold(bad);
            assert!(matches!(
                config.validate(),
                Err(VectorStoreError::InvalidArgument { .. })
            ));
        }
        assert!(StoreConfig::new()
            .with_compaction_threshold(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(StoreConfig::new().with_dimension(0).validate().is_err());
        assert!(StoreConfig::new().with_dimension(3).validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StoreConfig = serde_json::from_str(r#"{"dimension": 4}"#).unwrap();
        assert_eq!(config.dimension, Some(4));
        assert_eq!(config.compaction_threshold, DEFAULT_COMPACTION_THRESHOLD);
    }
}
