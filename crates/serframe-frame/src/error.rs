/// Errors that can occur while decoding or encoding framed messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A brace-balanced frame did not parse as JSON.
    #[error("frame of {len} bytes is not valid JSON: {source}")]
    Decode {
        len: usize,
        source: serde_json::Error,
    },

    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
