use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serframe_frame::Message;
use serframe_transport::ByteSource;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::handler::MessageHandler;
use crate::processor::{ProcessorLoop, ProcessorOutcome, ProcessorStats};
use crate::queue::MessageQueue;
use crate::reader::{ReaderExit, ReaderLoop, ReaderOutcome, ReaderStats};
use crate::shutdown::StopSignal;

const READER_THREAD: &str = "serframe-reader";
const PROCESSOR_THREAD: &str = "serframe-processor";

/// Starts the reader and processor threads around one shared queue.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    stop: StopSignal,
}

impl Pipeline {
    /// Pipeline with default timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override timing and read sizing.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing stop signal, e.g. one wired to ctrl-c.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Spawn both loops.
    ///
    /// The source must already be open; it is returned by
    /// [`PipelineHandle::join`] so the caller can close it. If the source
    /// reports end of stream the reader raises the stop signal itself.
    pub fn spawn<S, H>(self, source: S, handler: H) -> Result<PipelineHandle<S, H>>
    where
        S: ByteSource + 'static,
        H: MessageHandler + 'static,
    {
        let queue: Arc<MessageQueue<Message>> = Arc::new(MessageQueue::new());
        let producer_done = StopSignal::new();

        let processor = ProcessorLoop::new(
            Arc::clone(&queue),
            self.stop.clone(),
            handler,
            self.config.clone(),
        )
        .with_producer_done(producer_done.clone());

        let processor = thread::Builder::new()
            .name(PROCESSOR_THREAD.to_string())
            .spawn(move || processor.run())
            .map_err(|source| PipelineError::Spawn {
                name: PROCESSOR_THREAD,
                source,
            })?;

        let reader = ReaderLoop::new(
            source,
            Arc::clone(&queue),
            self.stop.clone(),
            self.config.clone(),
        );
        let guard = ReaderExitGuard {
            stop: self.stop.clone(),
            producer_done: producer_done.clone(),
        };

        let reader = thread::Builder::new()
            .name(READER_THREAD.to_string())
            .spawn(move || {
                let outcome = reader.run();
                if outcome.exit == ReaderExit::SourceClosed && guard.stop.trigger() {
                    debug!("byte source closed; stopping pipeline");
                }
                drop(guard);
                outcome
            });

        let reader = match reader {
            Ok(reader) => reader,
            Err(source) => {
                self.stop.trigger();
                producer_done.trigger();
                let _ = processor.join();
                return Err(PipelineError::Spawn {
                    name: READER_THREAD,
                    source,
                });
            }
        };

        Ok(PipelineHandle {
            stop: self.stop,
            queue,
            reader,
            processor,
        })
    }
}

/// Raises both signals when the reader thread ends, panics included.
struct ReaderExitGuard {
    stop: StopSignal,
    producer_done: StopSignal,
}

impl Drop for ReaderExitGuard {
    fn drop(&mut self) {
        self.stop.trigger();
        self.producer_done.trigger();
    }
}

/// A running pipeline.
pub struct PipelineHandle<S, H> {
    stop: StopSignal,
    queue: Arc<MessageQueue<Message>>,
    reader: JoinHandle<ReaderOutcome<S>>,
    processor: JoinHandle<ProcessorOutcome<H>>,
}

impl<S, H> PipelineHandle<S, H> {
    /// Raise the stop signal. Both loops finish their current iteration,
    /// the processor drains the queue, then both threads exit.
    pub fn stop(&self) {
        self.stop.trigger();
    }

    /// Another handle to the pipeline's stop signal.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Messages waiting for the processor right now.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether both threads have exited.
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished() && self.processor.is_finished()
    }

    /// Wait for both threads and collect what they hand back.
    ///
    /// Does not raise the stop signal; call [`stop`](Self::stop) first
    /// unless the source is expected to close on its own.
    pub fn join(self) -> Result<PipelineReport<S, H>> {
        let reader = self.reader.join();
        let processor = self.processor.join();

        let reader = reader.map_err(|_| PipelineError::ThreadPanicked(READER_THREAD))?;
        let processor = processor.map_err(|_| PipelineError::ThreadPanicked(PROCESSOR_THREAD))?;

        Ok(PipelineReport {
            source: reader.source,
            handler: processor.handler,
            reader: reader.stats,
            processor: processor.stats,
            reader_exit: reader.exit,
            unframed_bytes: reader.unframed_bytes,
        })
    }
}

impl<S, H> std::fmt::Debug for PipelineHandle<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("stopped", &self.stop.is_triggered())
            .field("queued", &self.queue.len())
            .finish()
    }
}

/// What a joined pipeline hands back.
#[derive(Debug)]
pub struct PipelineReport<S, H> {
    /// The byte source, still open.
    pub source: S,
    pub handler: H,
    pub reader: ReaderStats,
    pub processor: ProcessorStats,
    pub reader_exit: ReaderExit,
    /// Bytes left in the frame buffer when the reader stopped.
    pub unframed_bytes: usize,
}
