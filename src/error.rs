//! Crate-wide error type and the mapping onto the RPC error envelope's
//! numeric codes.

use thiserror::Error;

/// Error codes carried in the `{code, message}` response envelope.
pub mod code {
    pub const ALL_GOOD: i64 = 0;
    pub const UNKNOWN: i64 = 1;
    pub const INVALID_COMMAND: i64 = 2;
    pub const INVALID_QUERY: i64 = 3;
    pub const INVALID_SOURCE_URI: i64 = 4;
    pub const INVALID_CONTEXT: i64 = 5;
    pub const INVALID_SOURCE: i64 = 6;
    pub const INVALID_RESOURCE: i64 = 7;
}

#[derive(Debug, Error)]
pub enum RispError {
    #[error("{0}")]
    Unknown(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid source uri: {0}")]
    InvalidSourceUri(String),

    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Search(#[from] tantivy::TantivyError),

    #[error(transparent)]
    OpenDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error(transparent)]
    OpenRead(#[from] tantivy::directory::error::OpenReadError),

    #[error("query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl RispError {
    /// Map this error onto the protocol-level error code (§6, §7).
    pub fn code(&self) -> i64 {
        match self {
            RispError::InvalidCommand(_) => code::INVALID_COMMAND,
            RispError::InvalidQuery(_) => code::INVALID_QUERY,
            RispError::InvalidSourceUri(_) => code::INVALID_SOURCE_URI,
            RispError::InvalidContext(_) => code::INVALID_CONTEXT,
            RispError::InvalidSource(_) => code::INVALID_SOURCE,
            RispError::InvalidResource(_) => code::INVALID_RESOURCE,
            _ => code::UNKNOWN,
        }
    }
}

pub type Result<T> = std::result::Result<T, RispError>;
