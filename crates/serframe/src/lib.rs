//! Frame back-to-back JSON messages off a serial line.
//!
//! serframe reads a raw byte stream from a device that writes JSON objects
//! with no length prefix and no delimiter, recovers message boundaries from
//! brace nesting, and hands decoded messages to a second thread.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte source/sink traits, serial port, `std::io` adapters
//! - [`frame`]: Brace-depth framing and JSON decoding
//! - [`pipeline`]: Queue, stop signal, reader/processor loops

/// Re-export transport types.
pub mod transport {
    pub use serframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serframe_frame::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use serframe_pipeline::*;
}
