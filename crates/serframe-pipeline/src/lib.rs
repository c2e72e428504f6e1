//! Reader/processor pipeline for framed JSON messages.
//!
//! Two threads share one [`MessageQueue`] and one [`StopSignal`]:
//! - [`ReaderLoop`] pulls bytes from a [`ByteSource`](serframe_transport::ByteSource),
//!   frames them and queues decoded messages
//! - [`ProcessorLoop`] takes messages off the queue and hands them to a
//!   [`MessageHandler`], draining the queue once stopped
//!
//! [`Pipeline`] wires both together and spawns the threads.

pub mod config;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod reader;
pub mod shutdown;

pub use config::{PipelineConfig, DEFAULT_READ_CHUNK_SIZE};
pub use error::{PipelineError, Result};
pub use handler::{CollectingHandler, MessageHandler};
pub use pipeline::{Pipeline, PipelineHandle, PipelineReport};
pub use processor::{ProcessorLoop, ProcessorOutcome, ProcessorStats};
pub use queue::MessageQueue;
pub use reader::{ReadStep, ReaderExit, ReaderLoop, ReaderOutcome, ReaderStats};
pub use shutdown::StopSignal;
