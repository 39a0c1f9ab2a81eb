//! Device control: wake handshake and one-shot command frames.
//!
//! The board owns the real state machine. The host only sends triggers and
//! reads the acknowledgement of each one.

use {
    crate::{
        error::{Error, Result},
        port::Port,
        protocol::{Delivery, Link},
        target::{CommandSet, TargetConfig, TargetFamily},
    },
    log::{debug, info, warn},
};

/// Payload of a KILL frame: the process id, little-endian.
#[must_use]
pub fn kill_payload(pid: u32) -> [u8; 4] {
    pid.to_le_bytes()
}

/// Payload of an ALLOC frame: the image length, little-endian.
pub fn alloc_payload(size: usize) -> Result<[u8; 4]> {
    let size = u32::try_from(size).map_err(|_| Error::SourceTooLarge(size))?;
    Ok(size.to_le_bytes())
}

/// Payload of a POINTER frame: x then y, both little-endian.
#[must_use]
pub fn pointer_payload(x: u16, y: u16) -> [u8; 4] {
    let [x0, x1] = x.to_le_bytes();
    let [y0, y1] = y.to_le_bytes();
    [x0, x1, y0, y1]
}

/// A connected board.
pub struct Device<P: Port> {
    link: Link<P>,
    family: TargetFamily,
    commands: CommandSet,
    wake_byte: Option<u8>,
    reset_acknowledged: bool,
}

impl<P: Port> Device<P> {
    /// Wrap an opened port for the given target.
    pub fn new(port: P, config: &TargetConfig) -> Self {
        debug!(
            "{} loader on {} at {} baud (timeout {:?})",
            config.family,
            port.name(),
            port.baud_rate(),
            port.timeout()
        );
        Self {
            link: Link::new(port, config.frame).with_max_retries(config.max_retries),
            family: config.family,
            commands: config.commands,
            wake_byte: config.wake_byte,
            reset_acknowledged: config.reset_acknowledged,
        }
    }

    /// Command bytes of the target.
    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Whether the target has a wake handshake.
    pub fn has_wake(&self) -> bool {
        self.wake_byte
            .is_some()
    }

    /// Consume the device and return the underlying port.
    pub fn into_port(self) -> P {
        self.link
            .into_port()
    }

    fn command(&self, name: &str, command: Option<u8>) -> Result<u8> {
        command.ok_or_else(|| Error::Unsupported(format!("{} has no {name} command", self.family)))
    }

    /// Put the loader into a receptive state.
    ///
    /// Writes the wake byte and requires it to be echoed back.
    pub fn enter_bootloader(&mut self) -> Result<()> {
        let wake = self
            .wake_byte
            .ok_or_else(|| Error::Unsupported(format!("{} has no wake handshake", self.family)))?;

        info!("Connecting to {}...", self.family);
        self.link
            .port_mut()
            .clear_buffers()?;
        self.link
            .port_mut()
            .write_all_bytes(&[wake])?;

        match self
            .link
            .read_ack()?
        {
            Some(echo) if echo == wake => {
                debug!("Loader echoed wake byte 0x{wake:02X}");
                Ok(())
            },
            Some(other) => Err(Error::Handshake(format!(
                "expected echo 0x{wake:02X}, got 0x{other:02X}"
            ))),
            None => Err(Error::AckTimeout { command: wake }),
        }
    }

    /// Reboot the target into its loader.
    ///
    /// On loaders that reboot without answering, the outcome of the exchange
    /// is ignored.
    pub fn reset(&mut self) -> Result<()> {
        let command = self.command("reset", self.commands.reset)?;
        info!("Resetting into the loader...");
        if self.reset_acknowledged {
            self.link
                .send(command, &[])?;
            return Ok(());
        }

        match self
            .link
            .deliver(command, &[])?
        {
            Delivery::Accepted(byte) => debug!("Reset answered with 0x{byte:02X}"),
            Delivery::TimedOut => debug!("No answer to reset, target is rebooting"),
            Delivery::Failed => warn!("Target kept rejecting reset, continuing"),
        }
        Ok(())
    }

    /// Let the target reserve storage for an image of `size` bytes.
    ///
    /// Must precede the first data block.
    pub fn allocate(&mut self, size: usize) -> Result<()> {
        let command = self.command("allocate", self.commands.alloc)?;
        let payload = alloc_payload(size)?;
        debug!("Allocating {size} bytes");
        self.link
            .send(command, &payload)?;
        Ok(())
    }

    /// Kill the process with the given id.
    pub fn kill(&mut self, pid: u32) -> Result<()> {
        let command = self.command("kill", self.commands.kill)?;
        info!("Killing process {pid}");
        self.link
            .send(command, &kill_payload(pid))?;
        Ok(())
    }

    /// Move the on-screen pointer.
    pub fn pointer(&mut self, x: u16, y: u16) -> Result<()> {
        let command = self.command("pointer", self.commands.pointer)?;
        debug!("Pointer at ({x}, {y})");
        self.link
            .send(command, &pointer_payload(x, y))?;
        Ok(())
    }

    /// Send one data block.
    pub fn write_block(&mut self, block: &[u8]) -> Result<()> {
        self.link
            .send(self.commands.data, block)?;
        Ok(())
    }

    /// Release the port.
    pub fn close(&mut self) -> Result<()> {
        self.link
            .port_mut()
            .close()
    }
}
