use std::path::PathBuf;

/// Default line speed when none is configured.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Settings needed to open a serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device node, e.g. `/dev/ttyUSB0`.
    pub device_path: PathBuf,
    /// Line speed in bits per second.
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Config for `device_path` at [`DEFAULT_BAUD_RATE`].
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}
