use thiserror::Error;

/// clawdash error types
#[derive(Error, Debug)]
pub enum ClawdashError {
    /// Failed to parse JSON/JSONL
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Transcript directory missing or unreadable
    #[error("event source unavailable: {0}")]
    SourceUnavailable(String),

    /// Live-session command failed or returned garbage
    #[error("live sessions unavailable: {0}")]
    LiveSession(String),

    /// Background collection task panicked or was cancelled
    #[error("collection task failed: {0}")]
    Task(String),
}

/// Result type alias for clawdash
pub type Result<T> = std::result::Result<T, ClawdashError>;
