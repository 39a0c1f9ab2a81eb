//! Port abstraction for serial communication.
//!
//! The protocol layer only ever talks to a [`Port`], which keeps it
//! independent of the `serialport` crate and lets the tests drive it with a
//! scripted port.
//!
//! ```text
//! +-------------------------+
//! |  Session / Device       |
//! +------------+------------+
//!              |
//! +------------v------------+
//! |  Link (retry engine)    |
//! +------------+------------+
//!              |
//! +------------v------------+
//! |  Port trait             |
//! +------------+------------+
//!              |
//! +------------v------------+
//! |  NativePort (serialport)|
//! +-------------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use citrusflash::port::Port;
//!
//! fn example<P: Port>(port: &mut P) -> citrusflash::Result<()> {
//!     port.write_all_bytes(&[0x56])?;
//!
//!     let mut buf = [0u8; 1];
//!     let n = port.read(&mut buf)?;
//!     println!("Received: {:?}", &buf[..n]);
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "native")]
pub mod native;

#[cfg(test)]
pub(crate) mod mock;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Serial port configuration.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyUSB0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read timeout. Fixed for the lifetime of the port.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 921_600,
            timeout: Duration::from_secs(1),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serial port information.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortInfo {
    /// Port name/path.
    pub name: String,
    /// USB vendor ID (if available).
    pub vid: Option<u16>,
    /// USB product ID (if available).
    pub pid: Option<u16>,
    /// Manufacturer string (if available).
    pub manufacturer: Option<String>,
    /// Product string (if available).
    pub product: Option<String>,
    /// Serial number (if available).
    pub serial_number: Option<String>,
}

/// Byte-stream port the loader protocol runs over.
///
/// Reads block for at most [`Port::timeout`]; a read that times out returns
/// either `Ok(0)` or an error of kind [`std::io::ErrorKind::TimedOut`].
pub trait Port: Read + Write + Send {
    /// Get the read timeout.
    fn timeout(&self) -> Duration;

    /// Get the baud rate.
    fn baud_rate(&self) -> u32;

    /// Discard any pending input and output.
    fn clear_buffers(&mut self) -> Result<()>;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Close the port and release resources.
    ///
    /// After calling this method, the port cannot be used for further I/O.
    /// Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Write all bytes, blocking until complete.
    fn write_all_bytes(&mut self, buf: &[u8]) -> Result<()> {
        std::io::Write::write_all(self, buf)?;
        std::io::Write::flush(self)?;
        Ok(())
    }
}

/// Trait for listing available serial ports.
///
/// This is separated from `Port` because it's a static operation that
/// doesn't require an open port instance.
pub trait PortEnumerator {
    /// List all available serial ports.
    fn list_ports() -> Result<Vec<PortInfo>>;
}

#[cfg(feature = "native")]
pub use native::{NativePort, NativePortEnumerator};
