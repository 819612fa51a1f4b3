use reqwest::StatusCode;

/// Session file read/write/decode faults. A missing file is not an error;
/// `SessionStore::load` reports it as `None`.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("failed to access session file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode session file: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("login rejected with status {0}")]
    InvalidStatus(StatusCode),
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("usage request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("usage request rejected with status {0}")]
    InvalidStatus(StatusCode),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("failed to read CSV record: {0}")]
    Csv(#[from] csv::Error),
    #[error("row has {got} columns, expected at least {expected}")]
    MissingColumns { got: usize, expected: usize },
    #[error("invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("invalid hour '{value}': {source}")]
    InvalidHour {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid {column} '{value}': {source}")]
    InvalidNumber {
        column: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// Faults surfaced while constructing a client or re-running the login
/// handshake, where session storage and authentication compose.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("authentication: {0}")]
    Auth(#[from] AuthError),
    #[error("failed to build http client: {0}")]
    Http(reqwest::Error),
}
