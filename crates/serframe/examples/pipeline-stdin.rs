//! Run the reader/processor pipeline over stdin and print each message type.
//!
//! Run with:
//!   printf '{"type":"ping"}{"type":"pong"}' | cargo run --example pipeline-stdin

use serframe::frame::Message;
use serframe::pipeline::Pipeline;
use serframe::transport::ReadSource;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = ReadSource::new(std::io::stdin());

    let handle = Pipeline::new().spawn(source, |message: Message| {
        println!(
            "{} ({} bytes)",
            message.message_type().unwrap_or("<untyped>"),
            message.wire_size()
        );
    })?;

    // stdin closing stops the pipeline; the queue is drained first.
    let report = handle.join()?;
    eprintln!(
        "messages: {}, decode errors: {}, unframed bytes: {}",
        report.reader.messages, report.reader.decode_errors, report.unframed_bytes
    );
    Ok(())
}
