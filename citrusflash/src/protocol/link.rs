//! Lockstep frame delivery with bounded retries.
//!
//! Every frame is written whole and followed by exactly one blocking read of
//! a single acknowledgement byte. Only one frame is ever in flight.

use {
    crate::{
        error::{Error, Result},
        port::Port,
        protocol::{
            frame::Frame,
            profile::{Ack, FrameProfile},
        },
    },
    log::{debug, trace},
};

/// Default number of retransmissions after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Outcome of delivering one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The device took the frame; carries the acknowledgement byte.
    Accepted(u8),
    /// Nothing came back within the read timeout.
    TimedOut,
    /// The device asked for a retransmission more often than allowed.
    Failed,
}

/// Frame transport over a [`Port`].
///
/// Owns the port for its whole lifetime.
pub struct Link<P: Port> {
    port: P,
    profile: FrameProfile,
    max_retries: u32,
}

impl<P: Port> Link<P> {
    /// Create a link speaking `profile` over `port`.
    pub fn new(port: P, profile: FrameProfile) -> Self {
        Self {
            port,
            profile,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the retransmission budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the link and return the underlying port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Block for a single byte from the device.
    ///
    /// Returns `None` when the read times out.
    pub fn read_ack(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self
            .port
            .read(&mut buf)
        {
            Ok(0) => Ok(None),
            Ok(_) => {
                trace!("Received 0x{:02X}", buf[0]);
                Ok(Some(buf[0]))
            },
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Write `frame` and wait for its acknowledgement, retransmitting the
    /// identical bytes while the device asks for it.
    ///
    /// A timeout ends the exchange at once; a dead link is never retried.
    /// `Err` is only returned for local port failures.
    pub fn send_with_retry(&mut self, frame: &[u8]) -> Result<Delivery> {
        let mut retries_left = self.max_retries;

        loop {
            trace!("Writing frame ({} bytes)", frame.len());
            self.port
                .write_all_bytes(frame)?;

            let Some(byte) = self.read_ack()? else {
                return Ok(Delivery::TimedOut);
            };

            match self
                .profile
                .ack
                .classify(byte)
            {
                Ack::Accept => return Ok(Delivery::Accepted(byte)),
                Ack::Retry if retries_left == 0 => return Ok(Delivery::Failed),
                Ack::Retry => {
                    retries_left -= 1;
                    debug!(
                        "Device asked for retransmission (0x{byte:02X}), {retries_left} retries left"
                    );
                },
            }
        }
    }

    /// Encode a frame and deliver it through the retry engine.
    pub fn deliver(&mut self, command: u8, payload: &[u8]) -> Result<Delivery> {
        let frame = Frame::new(command, payload).encode(&self.profile)?;
        self.send_with_retry(&frame)
    }

    /// Encode and deliver a frame, turning anything but acceptance into an
    /// error. Returns the acknowledgement byte.
    pub fn send(&mut self, command: u8, payload: &[u8]) -> Result<u8> {
        match self.deliver(command, payload)? {
            Delivery::Accepted(byte) => Ok(byte),
            Delivery::TimedOut => Err(Error::AckTimeout { command }),
            Delivery::Failed => Err(Error::RetryExhausted {
                command,
                attempts: self
                    .max_retries
                    .saturating_add(1),
            }),
        }
    }
}
