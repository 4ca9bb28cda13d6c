use sheetbind_common::AddressError;
use sheetbind_grid::GridError;
use thiserror::Error;

use crate::report::ConversionFailure;

/// Configuration errors: the mapping document and the record type disagree, or
/// a declared literal cannot be interpreted. These always abort a pass before
/// any cell is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown mapping `{0}`")]
    UnknownMapping(String),

    #[error("mapping `{record}` declares no target sheet")]
    MissingTargetSheet { record: String },

    #[error("field `{field}`: record type declares no such field")]
    UnknownField { field: String },

    #[error("field `{field}`: invalid position: {source}")]
    InvalidPosition {
        field: String,
        #[source]
        source: AddressError,
    },

    #[error("field `{field}`: default literal `{literal}` does not parse as {target}")]
    InvalidDefault {
        field: String,
        literal: String,
        target: String,
    },

    #[error("field `{field}`: invalid timezone `{value}` (expected `local`, `utc`, or `+HH:MM`)")]
    InvalidTimezone { field: String, value: String },

    #[error("field `{field}`: invalid text pattern `{pattern}`")]
    InvalidPattern { field: String, pattern: String },

    #[error("field `{field}`: no converter for type `{target}`")]
    NoConverter { field: String, target: String },

    #[error("field `{field}`: converter rejected its options: {message}")]
    InvalidConverterOptions { field: String, message: String },

    #[error("field `{field}`: `{kind}` binding is not usable here: {reason}")]
    UnsupportedBinding {
        field: String,
        kind: &'static str,
        reason: String,
    },
}

/// Top-level binding error.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The mapping document itself failed validation.
    #[error(transparent)]
    Spec(#[from] sheetbind_spec::ValidationError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("mapping `{record}` targets sheet `{sheet}` which the grid does not contain")]
    MissingSheet { record: String, sheet: String },

    /// First recoverable failure in fail-fast mode.
    #[error("pass aborted: {0}")]
    Aborted(Box<ConversionFailure>),
}
