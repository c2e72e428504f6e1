use bytes::BytesMut;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::error::{FrameError, Result};
use crate::extractor::find_frame_end;
use crate::frame::{encode_message, Frame, Message};

/// `tokio_util` codec for brace-framed JSON streams.
///
/// Decoding follows the same rules as [`FrameExtractor`](crate::FrameExtractor):
/// frames that fail to parse are logged, counted and skipped. Bytes left
/// over at end of stream are an incomplete frame and are discarded.
#[derive(Debug, Default, Clone)]
pub struct JsonFrameCodec {
    decode_errors: u64,
}

impl JsonFrameCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of malformed frames skipped so far.
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors
    }
}

impl Decoder for JsonFrameCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        while let Some(end) = find_frame_end(src) {
            let frame = Frame::new(src.split_to(end).freeze());
            match frame.decode() {
                Ok(message) => return Ok(Some(message)),
                Err(err) => {
                    self.decode_errors += 1;
                    warn!(error = %err, "dropping malformed frame");
                }
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        if !src.is_empty() {
            debug!(bytes = src.len(), "discarding incomplete frame at end of stream");
            src.clear();
        }
        Ok(None)
    }
}

impl<'a> Encoder<&'a Value> for JsonFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a Value, dst: &mut BytesMut) -> Result<()> {
        encode_message(item, dst)
    }
}
