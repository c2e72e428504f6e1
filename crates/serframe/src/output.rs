use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use serframe_frame::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    msg_type: Option<&'a str>,
    size: usize,
    message: &'a Value,
    timestamp: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                msg_type: message.message_type(),
                size: message.wire_size(),
                message: message.value(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SIZE", "MESSAGE"])
                .add_row(vec![
                    type_label(message).to_string(),
                    message.wire_size().to_string(),
                    message.value().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let body = serde_json::to_string_pretty(message.value())
                .unwrap_or_else(|_| message.value().to_string());
            println!(
                "type={} size={}\n{body}",
                type_label(message),
                message.wire_size()
            );
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(message.raw());
            let _ = out.write_all(b"\n");
            let _ = out.flush();
        }
    }
}

fn type_label(message: &Message) -> &str {
    message.message_type().unwrap_or("-")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
