use std::sync::Arc;
use std::thread;

use serframe_frame::{FrameExtractor, Message};
use serframe_transport::{ByteSource, TransportError};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::queue::MessageQueue;
use crate::shutdown::StopSignal;

const PREVIEW_LEN: usize = 64;

/// Counters kept by a [`ReaderLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Bytes pulled from the source.
    pub bytes_read: u64,
    /// Brace-balanced frames cut from the buffer.
    pub frames: u64,
    /// Frames that decoded and were queued.
    pub messages: u64,
    /// Frames dropped because they were not valid JSON.
    pub decode_errors: u64,
    /// Failed reads (treated as empty reads).
    pub read_errors: u64,
}

/// Why a reader loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// The stop signal was observed.
    Stopped,
    /// The source reported end of stream.
    SourceClosed,
}

/// Outcome of a single reader iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    /// Bytes were read; this many messages were queued.
    Queued(usize),
    /// Nothing was available (or the read failed).
    Idle,
    /// The source reported end of stream.
    Closed,
}

/// Everything a finished reader loop hands back.
#[derive(Debug)]
pub struct ReaderOutcome<S> {
    /// The source, still open, for the caller to close.
    pub source: S,
    pub stats: ReaderStats,
    pub exit: ReaderExit,
    /// Bytes still buffered that never formed a complete frame.
    pub unframed_bytes: usize,
}

/// Pulls bytes from a source, frames them and queues decoded messages.
///
/// Owns the [`FrameExtractor`]; the buffer is never visible to another
/// thread.
pub struct ReaderLoop<S> {
    source: S,
    extractor: FrameExtractor,
    queue: Arc<MessageQueue<Message>>,
    stop: StopSignal,
    config: PipelineConfig,
    chunk: Vec<u8>,
    stats: ReaderStats,
}

impl<S: ByteSource> ReaderLoop<S> {
    /// Create a reader over `source` feeding `queue`.
    pub fn new(
        source: S,
        queue: Arc<MessageQueue<Message>>,
        stop: StopSignal,
        config: PipelineConfig,
    ) -> Self {
        let chunk = vec![0u8; config.read_chunk_size.max(1)];
        Self {
            source,
            extractor: FrameExtractor::new(),
            queue,
            stop,
            config,
            chunk,
            stats: ReaderStats::default(),
        }
    }

    /// Run one iteration: read, frame, decode, queue.
    pub fn poll_once(&mut self) -> ReadStep {
        let read = match self.source.read_available(&mut self.chunk) {
            Ok(n) => n,
            Err(TransportError::Closed) => return ReadStep::Closed,
            Err(err) => {
                self.stats.read_errors += 1;
                warn!(error = %err, "read from byte source failed");
                return ReadStep::Idle;
            }
        };

        if read == 0 {
            return ReadStep::Idle;
        }

        self.stats.bytes_read += read as u64;
        self.extractor.add_data(&self.chunk[..read]);
        ReadStep::Queued(self.queue_complete_frames())
    }

    /// Loop until the stop signal is raised or the source closes.
    pub fn run(mut self) -> ReaderOutcome<S> {
        info!("reader loop started");

        let exit = loop {
            if self.stop.is_triggered() {
                break ReaderExit::Stopped;
            }
            match self.poll_once() {
                ReadStep::Queued(_) => {}
                ReadStep::Idle => thread::sleep(self.config.read_idle),
                ReadStep::Closed => break ReaderExit::SourceClosed,
            }
        };

        let unframed_bytes = self.extractor.len();
        if unframed_bytes > 0 {
            debug!(bytes = unframed_bytes, "discarding unframed bytes");
        }
        info!(
            ?exit,
            bytes_read = self.stats.bytes_read,
            messages = self.stats.messages,
            decode_errors = self.stats.decode_errors,
            "reader loop stopped"
        );

        ReaderOutcome {
            source: self.source,
            stats: self.stats,
            exit,
            unframed_bytes,
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Bytes buffered but not yet framed.
    pub fn buffered(&self) -> &[u8] {
        self.extractor.buffered()
    }

    fn queue_complete_frames(&mut self) -> usize {
        let mut queued = 0usize;
        while let Some(boundary) = self.extractor.try_extract_next() {
            let frame = self.extractor.consume_frame(boundary);
            self.stats.frames += 1;

            match frame.decode() {
                Ok(message) => {
                    debug!(
                        size = message.wire_size(),
                        msg_type = message.message_type(),
                        "queued message"
                    );
                    self.queue.push(message);
                    queued += 1;
                }
                Err(err) => {
                    self.stats.decode_errors += 1;
                    warn!(
                        error = %err,
                        preview = %preview(frame.as_bytes()),
                        "dropping malformed frame"
                    );
                }
            }
        }
        self.stats.messages += queued as u64;
        queued
    }
}

fn preview(bytes: &[u8]) -> String {
    let cut = bytes.len().min(PREVIEW_LEN);
    let mut text = String::from_utf8_lossy(&bytes[..cut]).into_owned();
    if bytes.len() > cut {
        text.push('…');
    }
    text
}
