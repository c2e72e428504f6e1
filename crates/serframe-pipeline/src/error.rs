/// Errors that can occur while running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] serframe_transport::TransportError),

    /// A pipeline thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    /// A pipeline thread panicked before it could be joined.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
