use std::path::PathBuf;

/// Errors that can occur in byte source/sink operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to apply line settings to an opened device.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested baud rate has no termios equivalent.
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// An I/O error occurred while reading or writing.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached end of stream.
    #[error("byte source closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
