//! Brace-depth framing of back-to-back JSON objects.
//!
//! Devices on the other end of a serial line write JSON objects one after
//! another with no length prefix and no delimiter. This crate recovers the
//! message boundaries:
//! - A frame starts at the head of the buffer and ends at the `}` that
//!   closes the outermost object
//! - Braces inside quoted strings, and escaped quotes, are ignored
//! - A frame that does not parse as JSON is still consumed
//!
//! Enable the `async` feature for a `tokio_util` codec.

pub mod error;
pub mod extractor;
pub mod frame;

#[cfg(feature = "async")]
pub mod codec;

pub use error::{FrameError, Result};
pub use extractor::{find_frame_end, FrameBoundary, FrameExtractor};
pub use frame::{encode_message, Frame, Message};

#[cfg(feature = "async")]
pub use codec::JsonFrameCodec;
