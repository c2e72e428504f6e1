use bytes::BytesMut;

use crate::error::Result;
use crate::frame::{Frame, Message};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Find the end of the first complete frame in `buf`.
///
/// Scans from the start with brace depth 0, tracking whether the cursor is
/// inside a quoted string and whether the next byte is escaped. Returns the
/// frame length (closing brace included) once a `}` outside a string brings
/// depth back to 0 after it had become positive, or `None` when the buffer
/// holds no complete frame.
pub fn find_frame_end(buf: &[u8]) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut was_positive = false;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in buf.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => {
                depth += 1;
                was_positive |= depth > 0;
            }
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 && was_positive {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Location of a complete frame at the head of a [`FrameExtractor`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBoundary {
    end: usize,
}

impl FrameBoundary {
    /// Offset one past the closing brace.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Offset of the closing brace.
    pub fn closing_brace(&self) -> usize {
        self.end - 1
    }
}

/// Incremental splitter of back-to-back JSON objects.
///
/// Bytes are appended with [`add_data`](Self::add_data); complete frames are
/// located with [`try_extract_next`](Self::try_extract_next) and removed with
/// [`consume_frame`](Self::consume_frame). A frame is consumed whether or not
/// it decodes, so one malformed chunk never stalls the stream.
///
/// The buffer has no upper bound. Input that never closes its outermost
/// brace, or that never contains `{`, is retained indefinitely.
#[derive(Debug)]
pub struct FrameExtractor {
    buf: BytesMut,
}

impl FrameExtractor {
    /// Create an empty extractor.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append bytes to the tail of the buffer. No scanning happens here.
    pub fn add_data(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Locate the first complete frame without modifying the buffer.
    pub fn try_extract_next(&self) -> Option<FrameBoundary> {
        find_frame_end(&self.buf).map(|end| FrameBoundary { end })
    }

    /// Remove the frame at `boundary` from the head of the buffer.
    pub fn consume_frame(&mut self, boundary: FrameBoundary) -> Frame {
        let end = boundary.end.min(self.buf.len());
        Frame::new(self.buf.split_to(end).freeze())
    }

    /// Locate and consume the next complete frame.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let boundary = self.try_extract_next()?;
        Some(self.consume_frame(boundary))
    }

    /// Locate, consume and decode the next complete frame.
    ///
    /// `Some(Err(_))` means a frame was consumed but was not valid JSON;
    /// callers keep going, later frames are unaffected.
    pub fn next_message(&mut self) -> Option<Result<Message>> {
        self.next_frame().map(|frame| frame.decode())
    }

    /// Bytes currently buffered, not yet part of a consumed frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}
