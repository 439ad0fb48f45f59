//! # vecstore
//!
//! An embeddable, in-memory vector similarity store.
//!
//! This library provides:
//! - Record storage: vectors plus typed metadata under never-reused ids
//! - Distance metrics (Euclidean, squared Euclidean, Cosine, Manhattan, custom)
//! - Exact top-k search with deterministic tie-breaking and metadata filters
//! - Snapshot reads that never block on, or observe, concurrent writes
//! - An auxiliary index extension point, with an HNSW implementation
//!
//! ## Example
//!
//! ```rust
//! use vecstore::{DistanceMetric, Metadata, MetadataFilter, VectorStore};
//!
//! let store = VectorStore::new();
//! store.insert([1.0, 2.0, 3.0], Metadata::new().with("name", "vector1")).unwrap();
//! store.insert([4.0, 5.0, 6.0], Metadata::new().with("name", "vector2")).unwrap();
//! store.insert([7.0, 8.0, 9.0], Metadata::new().with("name", "vector3")).unwrap();
//!
//! let results = store.search(&[20.0, 30.0, 40.0], 1).unwrap();
//! assert_eq!(results[0].id.get(), 2);
//!
//! // Filters are applied before ranking
//! let filter = MetadataFilter::new().eq("name", "vector1");
//! let results = store
//!     .search_with(&[20.0, 30.0, 40.0], 1, &DistanceMetric::Cosine, Some(&filter))
//!     .unwrap();
//! assert_eq!(results[0].id.get(), 0);
//! ```

pub mod config;
pub mod distance;
pub mod error;
pub mod hnsw;
pub mod index;
pub mod metadata;
pub mod metrics;
pub mod neighbor;
pub mod query;
pub mod record;
pub mod storage;
pub mod vector;

pub use config::{QueryConfig, StoreConfig};
pub use distance::{CustomMetric, DistanceMetric, Metric};
pub use error::{Result, VectorStoreError};
pub use hnsw::{HnswIndex, HnswParams};
pub use index::{Index, NoIndex};
pub use metadata::{Metadata, MetadataFilter, MetadataPredicate, MetadataValue};
pub use metrics::MetricsCollector;
pub use query::{QueryEngine, SearchResult};
pub use record::{Record, RecordId};
pub use storage::{Snapshot, StoreStats, VectorStore};
pub use vector::Vector;
