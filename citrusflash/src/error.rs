//! Error types for citrusflash.

use std::io;
use thiserror::Error;

/// Result type for citrusflash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for citrusflash operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error on an already open port.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The serial port could not be opened or configured.
    #[cfg(feature = "native")]
    #[error("Cannot open serial port {port}: {source}")]
    PortOpen {
        /// Port name as given by the caller.
        port: String,
        /// Underlying serial port error.
        #[source]
        source: serialport::Error,
    },

    /// The device did not answer a frame within the read timeout.
    #[error("Timeout waiting for acknowledgement of command 0x{command:02X}")]
    AckTimeout {
        /// Command byte of the unanswered frame.
        command: u8,
    },

    /// The device kept asking for a retransmission.
    #[error("Command 0x{command:02X} rejected after {attempts} attempts")]
    RetryExhausted {
        /// Command byte of the rejected frame.
        command: u8,
        /// Number of times the frame was written.
        attempts: u32,
    },

    /// The boot loader wake handshake failed.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// A payload does not fit the length field of the frame format.
    #[error("Payload of {len} bytes exceeds the frame limit of {max} bytes")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Largest length the frame format can describe.
        max: usize,
    },

    /// The source image is larger than the target can allocate.
    #[error("Source image of {0} bytes is too large for the target")]
    SourceTooLarge(usize),

    /// Operation not supported by the selected target.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was interrupted by the embedding application.
    #[error("Operation interrupted")]
    Interrupted,
}

impl Error {
    /// Whether the error happened while talking to the device, as opposed to
    /// while validating inputs or opening the port.
    pub fn is_transfer_failure(&self) -> bool {
        match self {
            Self::Io(_)
            | Self::AckTimeout { .. }
            | Self::RetryExhausted { .. }
            | Self::Handshake(_) => true,
            #[cfg(feature = "native")]
            Self::Serial(_) => true,
            _ => false,
        }
    }
}
