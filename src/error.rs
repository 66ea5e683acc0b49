use thiserror::Error;

pub type Result<T> = std::result::Result<T, PacketError>;

#[derive(Error, Debug)]
pub enum PacketError {
    /// The page sequence of one input file cannot be segmented at all.
    #[error("corrupt input {file}: {reason}")]
    CorruptInput { file: String, reason: String },

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("pattern `{pattern}` must capture the student id in group 1")]
    MissingCaptureGroup { pattern: String },

    #[error("unsupported page source: {0}")]
    UnsupportedSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
