use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IltError {
    #[error("ILThermo rejected the query: {0}")]
    Query(String),

    #[error("invalid abbreviation {0:?} for physical property")]
    UnknownProperty(String),

    #[error("invalid setid: {0}")]
    InvalidSetId(String),

    #[error("malformed citation string: {0:?}")]
    MalformedCitation(String),

    #[error("setid {0:?} is unknown to ILThermo")]
    SetNotFound(String),

    #[error(
        "data row {row} does not match the column layout of row 0 (expected {expected} values, found {found})"
    )]
    ShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("ILThermo request failed: {0}")]
    Http(String),

    #[error("ILThermo returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected ILThermo payload: {0}")]
    Decode(String),

    #[error("Crossref request failed: {0}")]
    CrossrefHttp(String),

    #[error("Crossref returned status {status}: {message}")]
    CrossrefStatus { status: u16, message: String },

    #[error("{0}")]
    DoiResolution(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
