//! Stored records and their identifiers

use crate::metadata::Metadata;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned record identifier.
///
/// Assigned in strictly increasing order starting at 0 and never reused,
/// even after the record is removed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(id: u64) -> Self {
        RecordId(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        RecordId(self.0 + 1)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A vector plus its metadata and identifier. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    vector: Vector,
    metadata: Metadata,
}

impl Record {
    pub(crate) fn new(id: RecordId, vector: Vector, metadata: Metadata) -> Self {
        Self {
            id,
            vector,
            metadata,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
