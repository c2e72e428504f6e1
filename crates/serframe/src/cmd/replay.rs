use std::fs::File;
use std::path::Path;

use serframe_pipeline::{Pipeline, StopSignal};
use tracing::info;

use crate::cmd::listen::install_ctrlc_handler;
use crate::cmd::{PrintHandler, ReplayArgs};
use crate::exit::{io_error, pipeline_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let pipeline_config = args.pipeline.resolve()?;
    let source = open_source(&args.input)?;

    let stop = StopSignal::new();
    install_ctrlc_handler(stop.clone())?;

    let handler = PrintHandler::new(format, args.count, stop.clone());
    let handle = Pipeline::new()
        .with_config(pipeline_config)
        .with_stop_signal(stop)
        .spawn(source, handler)
        .map_err(|err| pipeline_error("pipeline start failed", err))?;

    let report = handle
        .join()
        .map_err(|err| pipeline_error("pipeline failed", err))?;

    info!(
        printed = report.handler.printed(),
        bytes = report.reader.bytes_read,
        decode_errors = report.reader.decode_errors,
        unframed_bytes = report.unframed_bytes,
        "replay finished"
    );

    Ok(SUCCESS)
}

/// Stdin is duplicated into a `File` so polling sees every buffered byte.
#[cfg(unix)]
fn open_source(path: &Path) -> CliResult<serframe_transport::PollSource<File>> {
    use std::os::fd::AsFd;

    let file = if path.as_os_str() == "-" {
        std::io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map(File::from)
            .map_err(|err| io_error("failed opening stdin", err))?
    } else {
        open_file(path)?
    };
    Ok(serframe_transport::PollSource::new(file))
}

#[cfg(not(unix))]
fn open_source(
    path: &Path,
) -> CliResult<serframe_transport::ReadSource<Box<dyn std::io::Read + Send>>> {
    let input: Box<dyn std::io::Read + Send> = if path.as_os_str() == "-" {
        Box::new(std::io::stdin())
    } else {
        Box::new(open_file(path)?)
    };
    Ok(serframe_transport::ReadSource::new(input))
}

fn open_file(path: &Path) -> CliResult<File> {
    File::open(path).map_err(|err| io_error(&format!("failed opening {}", path.display()), err))
}
