use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use serframe_frame::Message;
use serframe_pipeline::{MessageHandler, PipelineConfig, StopSignal};
use tracing::info;

use crate::config::PortArgs;
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::{print_message, OutputFormat};

pub mod listen;
pub mod replay;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read messages from a serial port and print them.
    Listen(ListenArgs),
    /// Run a capture file (or stdin) through the same pipeline.
    Replay(ReplayArgs),
    /// Write one JSON message to a serial port.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub port: PortArgs,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file to read, or `-` for stdin.
    pub input: PathBuf,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Stop after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// JSON message text.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub json: Option<String>,
    /// Read the JSON message from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Loop timing flags shared by `listen` and `replay`.
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Reader sleep after an empty read (e.g. 10ms).
    #[arg(long, value_name = "DURATION")]
    pub read_idle: Option<String>,
    /// Longest processor wait between stop checks (e.g. 50ms).
    #[arg(long, value_name = "DURATION")]
    pub process_idle: Option<String>,
}

impl PipelineArgs {
    pub fn resolve(&self) -> CliResult<PipelineConfig> {
        let mut config = PipelineConfig::default();
        if let Some(read_idle) = &self.read_idle {
            config.read_idle = parse_duration(read_idle)?;
        }
        if let Some(process_idle) = &self.process_idle {
            config.process_idle = parse_duration(process_idle)?;
        }
        Ok(config)
    }
}

/// Prints each message and raises the stop signal once `limit` is reached.
pub struct PrintHandler {
    format: OutputFormat,
    limit: Option<usize>,
    printed: usize,
    stop: StopSignal,
}

impl PrintHandler {
    pub fn new(format: OutputFormat, limit: Option<usize>, stop: StopSignal) -> Self {
        Self {
            format,
            limit,
            printed: 0,
            stop,
        }
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.printed >= limit)
    }
}

impl MessageHandler for PrintHandler {
    fn handle(&mut self, message: Message) {
        // Messages drained after the limit are dropped.
        if self.limit_reached() {
            return;
        }

        info!(
            msg_type = message.message_type().unwrap_or("-"),
            size = message.wire_size(),
            "message received"
        );
        print_message(&message, self.format);
        self.printed += 1;

        if self.limit_reached() {
            self.stop.trigger();
        }
    }
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
