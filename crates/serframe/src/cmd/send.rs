use std::fs;

use bytes::BytesMut;
use serde_json::Value;
use serframe_frame::encode_message;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, USAGE};

#[cfg(unix)]
pub fn run(args: SendArgs) -> CliResult<i32> {
    use serframe_transport::{ByteSink, SerialPort};
    use tracing::info;

    use crate::exit::{transport_error, SUCCESS};

    let serial = args.port.resolve()?;
    let message = resolve_message(&args)?;

    let mut wire = BytesMut::new();
    encode_message(&message, &mut wire).map_err(|err| frame_error("encode failed", err))?;

    let mut port = SerialPort::open(&serial).map_err(|err| transport_error("open failed", err))?;
    port.write_bytes(&wire)
        .map_err(|err| transport_error("write failed", err))?;

    let msg_type = message_type(&message);
    info!(
        port = %port.path().display(),
        bytes = wire.len(),
        msg_type,
        "message sent"
    );
    port.close();

    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: SendArgs) -> CliResult<i32> {
    Err(CliError::new(USAGE, "serial ports are only supported on unix"))
}

fn resolve_message(args: &SendArgs) -> CliResult<Value> {
    let (text, source, code) = match (&args.json, &args.file) {
        (Some(json), _) => (json.clone(), "--json".to_string(), USAGE),
        (None, Some(path)) => {
            let text = fs::read_to_string(path).map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            })?;
            (text, path.display().to_string(), DATA_INVALID)
        }
        (None, None) => return Err(CliError::new(USAGE, "provide --json or --file")),
    };
    parse_message(&text).map_err(|reason| CliError::new(code, format!("{source}: {reason}")))
}

fn message_type(message: &Value) -> &str {
    message
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("-")
}

/// The receiver frames on braces, so only objects survive the trip.
fn parse_message(text: &str) -> Result<Value, String> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| format!("not valid JSON: {err}"))?;
    if !value.is_object() {
        return Err("message must be a JSON object".to_string());
    }
    Ok(value)
}
