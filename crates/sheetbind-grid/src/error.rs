use sheetbind_common::{AddressError, Region};
use thiserror::Error;

/// Errors surfaced by grid backends.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("unknown sheet `{0}`")]
    UnknownSheet(String),

    #[error("merged region {region} overlaps an existing region on sheet `{sheet}`")]
    OverlappingMerge { sheet: String, region: Region },

    #[error("invalid grid document: {0}")]
    Document(String),

    #[error("backend error: {0}")]
    Backend(String),
}
