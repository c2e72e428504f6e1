//! Byte source and sink abstraction for serframe.
//!
//! The framing core never touches a device directly. It reads through
//! [`ByteSource`] and writes through [`ByteSink`]:
//! - [`SerialPort`]: raw, non-blocking serial device (Unix termios)
//! - [`PollSource`]: non-blocking adapter over pipes, stdin and files (Unix)
//! - [`ReadSource`] / [`WriteSink`]: adapters over `std::io` streams
//!
//! This is the lowest layer of serframe.

pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod poll;
#[cfg(unix)]
pub mod serial;

pub use config::{SerialConfig, DEFAULT_BAUD_RATE};
pub use error::{Result, TransportError};
pub use traits::{ByteSink, ByteSource, ReadSource, WriteSink};

#[cfg(unix)]
pub use poll::PollSource;
#[cfg(unix)]
pub use serial::SerialPort;
