use thiserror::Error;

/// hourtrack error types
#[derive(Error, Debug)]
pub enum HourtrackError {
    /// Failed to parse a value (dates, URLs, metadata payloads)
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Session log could not be read as CSV
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Video metadata lookup failed
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for hourtrack
pub type Result<T> = std::result::Result<T, HourtrackError>;
