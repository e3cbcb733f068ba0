use thiserror::Error;

/// Anything that went wrong while pulling the ticker listing from the exchange.
/// Callers treat every variant the same way: the cycle is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status from exchange: {0}")]
    Status(reqwest::StatusCode),

    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single ticker record that could not be turned into a funding rate.
#[derive(Debug, Error, PartialEq)]
pub enum ItemParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid number in `{field}`: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("funding time {0}s does not fit in milliseconds")]
    TimestampOverflow(u64),
}
