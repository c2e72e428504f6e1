use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource};

/// A serial device opened in raw, non-blocking mode.
///
/// Line settings are fixed at 8N1 with no flow control. Reads never block:
/// `read_available` returns `Ok(0)` when the device has nothing buffered.
/// The descriptor is released by [`SerialPort::close`] or on drop.
pub struct SerialPort {
    file: File,
    path: PathBuf,
    baud_rate: u32,
}

impl SerialPort {
    /// Baud rates accepted by [`SerialPort::open`].
    pub const SUPPORTED_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115_200, 230_400];

    /// Open and configure the device described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let speed = baud_to_speed(config.baud_rate)?;
        let path = config.device_path.clone();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        configure_raw(&file, speed).map_err(|e| TransportError::Configure {
            path: path.clone(),
            source: e,
        })?;

        info!(?path, baud_rate = config.baud_rate, "serial port opened");

        Ok(Self {
            file,
            path,
            baud_rate: config.baud_rate,
        })
    }

    /// The device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured line speed.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Try to clone this port (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
            baud_rate: self.baud_rate,
        })
    }

    /// Close the port, releasing the descriptor.
    pub fn close(self) {
        debug!(path = ?self.path, "serial port closed");
        drop(self.file);
    }
}

impl ByteSource for SerialPort {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.file.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl ByteSink for SerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.file.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        debug!(path = ?self.path, bytes = data.len(), "wrote to serial port");
        Ok(())
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}

fn baud_to_speed(baud_rate: u32) -> Result<libc::speed_t> {
    match baud_rate {
        9600 => Ok(libc::B9600),
        19200 => Ok(libc::B19200),
        38400 => Ok(libc::B38400),
        57600 => Ok(libc::B57600),
        115_200 => Ok(libc::B115200),
        230_400 => Ok(libc::B230400),
        other => Err(TransportError::UnsupportedBaudRate(other)),
    }
}

fn configure_raw(file: &File, speed: libc::speed_t) -> std::io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: an all-zero termios is a valid out-parameter for tcgetattr.
    let mut tty: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor owned by `file` and `tty` is writable.
    if unsafe { libc::tcgetattr(fd, &mut tty) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `tty` was initialized by tcgetattr above.
    unsafe { libc::cfmakeraw(&mut tty) };

    tty.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB | libc::CRTSCTS);
    tty.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
    tty.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
    tty.c_cc[libc::VMIN] = 0;
    tty.c_cc[libc::VTIME] = 0;

    // SAFETY: `tty` is a valid termios; the speed constant comes from libc.
    let rc = unsafe {
        libc::cfsetispeed(&mut tty, speed) | libc::cfsetospeed(&mut tty, speed)
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `fd` is open and `tty` is fully initialized.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tty) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(())
}
