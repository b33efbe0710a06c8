//! Cross-institution class grouping
//!
//! Pipeline: [`tokenizer`] → [`signature`] → [`catalog`] exact lookup →
//! [`similarity`] scan → [`engine`] link or mint.

pub mod catalog;
pub mod engine;
pub mod signature;
pub mod similarity;
pub mod tokenizer;

pub use catalog::{GroupCatalog, MemoryCatalog};
pub use engine::{Assignment, GroupingEngine, MatchKind, Threshold};
pub use signature::signature;
pub use similarity::jaccard;
pub use tokenizer::{Denylists, TokenSet, Tokenizer};

use thiserror::Error;

/// Grouping errors
#[derive(Debug, Error)]
pub enum GroupingError {
    /// Threshold outside [0, 1] or NaN
    #[error("Invalid threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f64),

    /// Catalog read or write failed
    #[error("Catalog storage failed: {0}")]
    Storage(#[from] classmesh_common::Error),
}

impl GroupingError {
    /// Storage failures may succeed on a later attempt; argument errors never do
    pub fn is_transient(&self) -> bool {
        matches!(self, GroupingError::Storage(_))
    }
}

impl From<GroupingError> for classmesh_common::Error {
    fn from(err: GroupingError) -> Self {
        match err {
            GroupingError::InvalidThreshold(value) => classmesh_common::Error::InvalidInput(
                format!("threshold {} outside [0, 1]", value),
            ),
            GroupingError::Storage(inner) => inner,
        }
    }
}
