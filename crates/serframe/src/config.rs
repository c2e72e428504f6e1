use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use serframe_transport::{SerialConfig, DEFAULT_BAUD_RATE};

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, USAGE};

/// On-disk config: `{"uart": {"port": "/dev/ttyUSB0", "baudRate": 115200}}`.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub uart: UartSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UartSection {
    #[serde(alias = "path")]
    pub port: Option<PathBuf>,
    #[serde(alias = "baud_rate")]
    pub baud_rate: Option<u32>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CliError::new(
                    USAGE,
                    format!("config file not found: {}", path.display()),
                )
            } else {
                io_error(&format!("failed reading {}", path.display()), err)
            }
        })?;
        Self::parse(&text)
            .map_err(|err| CliError::new(DATA_INVALID, format!("{}: {err}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Serial port selection shared by `listen` and `send`.
#[derive(Args, Debug, Default)]
pub struct PortArgs {
    /// JSON config file with a `uart` section.
    #[arg(long, value_name = "FILE", env = "SERFRAME_CONFIG")]
    pub config: Option<PathBuf>,
    /// Serial device path; overrides the config file.
    #[arg(long, value_name = "PATH", env = "SERFRAME_PORT")]
    pub port: Option<PathBuf>,
    /// Baud rate; overrides the config file.
    #[arg(long, value_name = "RATE", env = "SERFRAME_BAUD")]
    pub baud: Option<u32>,
}

impl PortArgs {
    /// Merge flags over the config file.
    pub fn resolve(&self) -> CliResult<SerialConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?.uart,
            None => UartSection::default(),
        };

        let port = self.port.clone().or(file.port).ok_or_else(|| {
            CliError::new(USAGE, "no serial port given; use --port or --config")
        })?;
        let baud = self.baud.or(file.baud_rate).unwrap_or(DEFAULT_BAUD_RATE);

        Ok(SerialConfig::new(port).with_baud_rate(baud))
    }
}
