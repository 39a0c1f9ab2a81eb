//! Block transfer of a kernel or application image.
//!
//! A session owns the port for one invocation. It runs the preamble for the
//! selected [`LoadKind`], streams the image as fixed-size DATA frames and
//! closes the port on every exit path.
//!
//! An image whose length is an exact multiple of the block size (including an
//! empty image) is followed by one zero-length DATA frame, which the loader
//! takes as the end of the transfer.

use {
    crate::{
        error::{Error, Result},
        port::Port,
        progress::Progress,
        target::{TargetConfig, device::Device},
    },
    log::{debug, info, warn},
    std::{
        fmt,
        time::{Duration, Instant},
    },
};

/// What is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// User application: allocate, then blocks.
    Application,
    /// Kernel image: reset into the loader, then blocks.
    Kernel,
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
            Self::Kernel => write!(f, "kernel"),
        }
    }
}

/// How an image splits into DATA frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    /// Image length in bytes.
    pub length: usize,
    /// Payload size of a full block.
    pub block_size: usize,
    /// Number of frames carrying image bytes.
    pub data_blocks: usize,
    /// Whether an empty frame follows the last data block.
    pub trailing_empty: bool,
}

impl BlockPlan {
    /// Plan the transfer of `length` bytes in blocks of `block_size`.
    pub fn new(length: usize, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::Config("block size must be non-zero".into()));
        }
        Ok(Self {
            length,
            block_size,
            data_blocks: length.div_ceil(block_size),
            trailing_empty: length % block_size == 0,
        })
    }

    /// Number of DATA frames the transfer sends.
    #[must_use]
    pub fn total_blocks(&self) -> usize {
        self.data_blocks + usize::from(self.trailing_empty)
    }

    /// Payload of every DATA frame, in order.
    ///
    /// Fails when `data` is not the length the plan was made for.
    pub fn blocks<'a>(&self, data: &'a [u8]) -> Result<impl Iterator<Item = &'a [u8]>> {
        if data.len() != self.length {
            return Err(Error::Config(format!(
                "plan covers {} bytes, got {}",
                self.length,
                data.len()
            )));
        }
        let trailing = self
            .trailing_empty
            .then_some(&data[data.len()..]);
        Ok(data
            .chunks(self.block_size)
            .chain(trailing))
    }
}

/// Summary of a finished transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Image bytes delivered.
    pub bytes: usize,
    /// DATA frames delivered, trailing frame included.
    pub frames: usize,
    /// Time from the first preamble frame to the last acknowledgement.
    pub elapsed: Duration,
}

/// One transfer over an owned port.
pub struct TransferSession<P: Port> {
    device: Device<P>,
    config: TargetConfig,
    interrupted: fn() -> bool,
}

impl<P: Port> TransferSession<P> {
    /// Create a session for `config` over an opened port.
    pub fn new(port: P, config: &TargetConfig) -> Self {
        Self {
            device: Device::new(port, config),
            config: config.clone(),
            interrupted: crate::is_interrupted_requested,
        }
    }

    /// Replace the check polled between blocks.
    #[must_use]
    pub fn with_interrupt_check(mut self, check: fn() -> bool) -> Self {
        self.interrupted = check;
        self
    }

    /// Consume the session and return the underlying port.
    pub fn into_port(self) -> P {
        self.device
            .into_port()
    }

    /// Load `data` onto the target.
    ///
    /// The port is closed when this returns, whatever the outcome.
    pub fn run(
        &mut self,
        data: &[u8],
        kind: LoadKind,
        progress: &mut dyn Progress,
    ) -> Result<TransferReport> {
        let result = self.transfer(data, kind, progress);
        let closed = self
            .device
            .close();

        match (result, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close port: {close_err}");
                Err(e)
            },
        }
    }

    fn check_supported(&self, kind: LoadKind) -> Result<()> {
        if self
            .config
            .supports(kind)
        {
            return Ok(());
        }
        Err(Error::Unsupported(format!(
            "{} cannot load {kind} images",
            self.config
                .family
        )))
    }

    fn preamble(&mut self, kind: LoadKind, length: usize) -> Result<()> {
        if self
            .device
            .has_wake()
        {
            self.device
                .enter_bootloader()?;
        }

        match kind {
            LoadKind::Application => self
                .device
                .allocate(length),
            LoadKind::Kernel => {
                self.device
                    .reset()?;
                if self
                    .device
                    .commands()
                    .alloc
                    .is_some()
                {
                    self.device
                        .allocate(length)?;
                }
                Ok(())
            },
        }
    }

    fn transfer(
        &mut self,
        data: &[u8],
        kind: LoadKind,
        progress: &mut dyn Progress,
    ) -> Result<TransferReport> {
        self.config
            .validate()?;
        self.check_supported(kind)?;

        let plan = BlockPlan::new(data.len(), self.config.block_size)?;
        let total = plan.total_blocks();
        progress.set_total(total);

        let start = Instant::now();
        self.preamble(kind, data.len())?;

        info!(
            "Sending {kind} ({} bytes) in {total} blocks of {} bytes",
            data.len(),
            plan.block_size
        );

        let mut frames = 0;
        for block in plan.blocks(data)? {
            if (self.interrupted)() {
                warn!("Transfer interrupted after {frames}/{total} blocks");
                return Err(Error::Interrupted);
            }
            self.device
                .write_block(block)?;
            frames += 1;
            debug!("Block {frames}/{total} accepted ({} bytes)", block.len());
            progress.increment(block.len());
        }

        progress.finish();
        let elapsed = start.elapsed();
        info!("Transfer complete in {:.2}s", elapsed.as_secs_f64());

        Ok(TransferReport {
            bytes: data.len(),
            frames,
            elapsed,
        })
    }
}
