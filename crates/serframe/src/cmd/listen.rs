use serframe_pipeline::StopSignal;

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

#[cfg(unix)]
pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    use serframe_pipeline::Pipeline;
    use serframe_transport::SerialPort;
    use tracing::info;

    use crate::cmd::PrintHandler;
    use crate::exit::{pipeline_error, transport_error, SUCCESS};

    let serial = args.port.resolve()?;
    let pipeline_config = args.pipeline.resolve()?;

    let port = SerialPort::open(&serial).map_err(|err| transport_error("open failed", err))?;
    info!(
        port = %port.path().display(),
        baud = port.baud_rate(),
        "serial port open"
    );

    let stop = StopSignal::new();
    install_ctrlc_handler(stop.clone())?;

    let handler = PrintHandler::new(format, args.count, stop.clone());
    let handle = Pipeline::new()
        .with_config(pipeline_config)
        .with_stop_signal(stop)
        .spawn(port, handler)
        .map_err(|err| pipeline_error("pipeline start failed", err))?;

    let report = handle
        .join()
        .map_err(|err| pipeline_error("pipeline failed", err))?;

    info!(
        printed = report.handler.printed(),
        decode_errors = report.reader.decode_errors,
        drained = report.processor.drained,
        "listen finished"
    );
    report.source.close();

    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: ListenArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(CliError::new(
        crate::exit::USAGE,
        "serial ports are only supported on unix",
    ))
}

pub(crate) fn install_ctrlc_handler(stop: StopSignal) -> CliResult<()> {
    ctrlc::set_handler(move || {
        stop.trigger();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
