use std::sync::Arc;

use serframe_frame::Message;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::handler::MessageHandler;
use crate::queue::MessageQueue;
use crate::shutdown::StopSignal;

/// Counters kept by a [`ProcessorLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Messages handed to the handler, drained ones included.
    pub dispatched: u64,
    /// Messages handed to the handler after the stop signal.
    pub drained: u64,
}

/// Everything a finished processor loop hands back.
#[derive(Debug)]
pub struct ProcessorOutcome<H> {
    pub handler: H,
    pub stats: ProcessorStats,
}

/// Takes messages off the queue and dispatches them to a handler.
///
/// Once the stop signal is raised the loop stops waiting for new messages
/// and drains whatever is still queued before returning.
pub struct ProcessorLoop<H> {
    queue: Arc<MessageQueue<Message>>,
    stop: StopSignal,
    producer_done: Option<StopSignal>,
    handler: H,
    config: PipelineConfig,
    stats: ProcessorStats,
}

impl<H: MessageHandler> ProcessorLoop<H> {
    /// Create a processor draining `queue` into `handler`.
    pub fn new(
        queue: Arc<MessageQueue<Message>>,
        stop: StopSignal,
        handler: H,
        config: PipelineConfig,
    ) -> Self {
        Self {
            queue,
            stop,
            producer_done: None,
            handler,
            config,
            stats: ProcessorStats::default(),
        }
    }

    /// Keep dispatching after the stop signal until `done` is raised too.
    ///
    /// Set by [`Pipeline`](crate::Pipeline) with a signal the reader raises
    /// on exit, so messages queued during the reader's final iteration are
    /// still delivered.
    pub fn with_producer_done(mut self, done: StopSignal) -> Self {
        self.producer_done = Some(done);
        self
    }

    /// Wait up to the idle interval for one message and dispatch it.
    ///
    /// Returns `true` when a message was dispatched.
    pub fn poll_once(&mut self) -> bool {
        match self.queue.pop_timeout(self.config.process_idle) {
            Some(message) => {
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Dispatch everything currently queued without waiting.
    ///
    /// Returns the number of messages dispatched.
    pub fn drain(&mut self) -> u64 {
        let mut drained = 0u64;
        while let Some(message) = self.queue.try_pop() {
            self.dispatch(message);
            drained += 1;
        }
        self.stats.drained += drained;
        drained
    }

    /// Loop until stopped, then drain.
    pub fn run(mut self) -> ProcessorOutcome<H> {
        info!("processor loop started");

        while !self.stop.is_triggered() {
            self.poll_once();
        }

        if let Some(done) = self.producer_done.clone() {
            while !done.is_triggered() {
                self.poll_once();
            }
        }

        let remaining = self.queue.len();
        debug!(remaining, "draining queue");
        let drained = self.drain();

        info!(
            dispatched = self.stats.dispatched,
            drained, "processor loop stopped"
        );

        ProcessorOutcome {
            handler: self.handler,
            stats: self.stats,
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    fn dispatch(&mut self, message: Message) {
        self.handler.handle(message);
        self.stats.dispatched += 1;
    }
}
