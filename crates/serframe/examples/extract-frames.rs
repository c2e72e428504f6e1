//! Feed a byte stream to the frame extractor in arbitrary chunks.
//!
//! Run with:
//!   cargo run --example extract-frames

use serframe::frame::FrameExtractor;

fn main() {
    let stream: &[u8] = br#"{"type":"status","text":"brace } inside"}{"type":"reading","v":[1,2]}{oops}{"type":"tail""#;

    let mut extractor = FrameExtractor::new();
    for chunk in stream.chunks(9) {
        extractor.add_data(chunk);
        while let Some(frame) = extractor.next_frame() {
            match frame.decode() {
                Ok(message) => println!("message: {}", message.value()),
                Err(err) => println!("skipped {} bytes: {err}", frame.wire_size()),
            }
        }
    }

    println!("still buffered: {} bytes", extractor.len());
}
