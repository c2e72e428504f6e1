use std::time::Duration;

/// Default number of bytes requested from the source per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Timing and sizing knobs for the reader and processor loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Bytes requested from the source per read.
    pub read_chunk_size: usize,
    /// Sleep after a read that returned nothing.
    pub read_idle: Duration,
    /// Longest wait for a message before the processor re-checks the stop
    /// signal. A push wakes it immediately.
    pub process_idle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            read_idle: Duration::from_millis(10),
            process_idle: Duration::from_millis(50),
        }
    }
}
