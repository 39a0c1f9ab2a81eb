//! Target abstraction for the supported loaders.
//!
//! Each [`TargetFamily`] names one receiver running on the board: the Citrus
//! kernel's own receiver, the Cinnamon application loader, or the c-boot
//! kernel loader. A [`TargetConfig`] holds everything the host needs to talk
//! to it: frame profile, command bytes, block size and link settings.

pub mod device;
pub mod session;

use {
    crate::{
        error::{Error, Result},
        port::SerialConfig,
        protocol::{DEFAULT_MAX_RETRIES, FrameProfile},
    },
    std::{fmt, str::FromStr, time::Duration},
};

pub use {
    device::Device,
    session::{BlockPlan, LoadKind, TransferReport, TransferSession},
};

/// Supported loader families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetFamily {
    /// Receiver built into the running Citrus kernel (compact frames).
    #[default]
    Citrus,
    /// Cinnamon application loader (delimited frames).
    Cinnamon,
    /// c-boot kernel loader (delimited frames).
    CBoot,
}

impl TargetFamily {
    /// All families, in display order.
    pub const ALL: [Self; 3] = [Self::Citrus, Self::Cinnamon, Self::CBoot];

    /// Get the default baud rate for this family.
    #[must_use]
    pub fn default_baud(&self) -> u32 {
        match self {
            Self::Citrus => 921_600,
            Self::Cinnamon => 576_000,
            Self::CBoot => 230_400,
        }
    }

    /// Baud rates the loaders are known to run at.
    #[must_use]
    pub fn supported_bauds() -> &'static [u32] {
        &[230_400, 576_000, 921_600]
    }

    /// Get the default read timeout for this family.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Cinnamon => Duration::from_secs(3),
            Self::Citrus | Self::CBoot => Duration::from_secs(1),
        }
    }

    /// Frame profile spoken by this family.
    #[must_use]
    pub fn frame_profile(&self) -> FrameProfile {
        match self {
            Self::Citrus => FrameProfile::COMPACT,
            Self::Cinnamon | Self::CBoot => FrameProfile::DELIMITED,
        }
    }

    /// Payload size of a full data block.
    #[must_use]
    pub fn block_size(&self) -> usize {
        match self {
            Self::Citrus => 4096,
            Self::Cinnamon | Self::CBoot => 512,
        }
    }

    /// Command bytes understood by this family.
    #[must_use]
    pub fn commands(&self) -> CommandSet {
        match self {
            Self::Citrus => CommandSet {
                data: 0x00,
                alloc: Some(0x01),
                reset: Some(0x02),
                kill: Some(0x03),
                pointer: Some(0x0B),
            },
            Self::Cinnamon => CommandSet {
                data: 0x01,
                alloc: Some(0x02),
                reset: None,
                kill: None,
                pointer: None,
            },
            Self::CBoot => CommandSet {
                data: 0x04,
                alloc: None,
                reset: Some(0x06),
                kill: None,
                pointer: None,
            },
        }
    }

    /// Byte that wakes the loader and is echoed back, if the family has one.
    #[must_use]
    pub fn wake_byte(&self) -> Option<u8> {
        match self {
            Self::Citrus => None,
            Self::Cinnamon => Some(0x56),
            Self::CBoot => Some(0x06),
        }
    }

    /// Whether the loader acknowledges RESET.
    ///
    /// The Citrus receiver reboots as soon as it sees the frame and never
    /// answers it.
    #[must_use]
    pub fn reset_acknowledged(&self) -> bool {
        !matches!(self, Self::Citrus)
    }

    /// Get the family from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name
            .to_lowercase()
            .as_str()
        {
            "citrus" => Some(Self::Citrus),
            "cinnamon" => Some(Self::Cinnamon),
            "cboot" | "c-boot" => Some(Self::CBoot),
            _ => None,
        }
    }
}

impl fmt::Display for TargetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Citrus => write!(f, "citrus"),
            Self::Cinnamon => write!(f, "cinnamon"),
            Self::CBoot => write!(f, "cboot"),
        }
    }
}

impl FromStr for TargetFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::Config(format!("unknown target '{s}'")))
    }
}

/// Command bytes of a loader. `None` means the loader lacks the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSet {
    /// Write one block of the image.
    pub data: u8,
    /// Reserve storage for the whole image.
    pub alloc: Option<u8>,
    /// Reboot into the loader.
    pub reset: Option<u8>,
    /// Kill a running process.
    pub kill: Option<u8>,
    /// Move the on-screen pointer.
    pub pointer: Option<u8>,
}

/// Target configuration parameters.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Loader family.
    pub family: TargetFamily,
    /// Frame format.
    pub frame: FrameProfile,
    /// Command bytes.
    pub commands: CommandSet,
    /// Payload size of a full data block.
    pub block_size: usize,
    /// Link baud rate.
    pub baud_rate: u32,
    /// Per-read acknowledgement timeout.
    pub timeout: Duration,
    /// Wake byte for the boot loader handshake.
    pub wake_byte: Option<u8>,
    /// Retransmissions allowed per frame.
    pub max_retries: u32,
    /// Whether RESET waits for an acknowledgement.
    pub reset_acknowledged: bool,
}

impl TargetConfig {
    /// Create a new target configuration for the given family.
    pub fn new(family: TargetFamily) -> Self {
        Self {
            family,
            frame: family.frame_profile(),
            commands: family.commands(),
            block_size: family.block_size(),
            baud_rate: family.default_baud(),
            timeout: family.default_timeout(),
            wake_byte: family.wake_byte(),
            max_retries: DEFAULT_MAX_RETRIES,
            reset_acknowledged: family.reset_acknowledged(),
        }
    }

    /// Set the baud rate.
    #[must_use]
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the acknowledgement timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retransmission budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Check the configuration for values the loaders cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::Config("block size must be non-zero".into()));
        }
        if self.block_size > self.frame.framing.max_payload() {
            return Err(Error::Config(format!(
                "block size {} does not fit the frame length field",
                self.block_size
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".into()));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud rate must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether the target's loader can receive `kind`.
    ///
    /// Applications need an ALLOC command, kernels a RESET command.
    #[must_use]
    pub fn supports(&self, kind: LoadKind) -> bool {
        match kind {
            LoadKind::Application => self
                .commands
                .alloc
                .is_some(),
            LoadKind::Kernel => self
                .commands
                .reset
                .is_some(),
        }
    }

    /// Serial settings for opening `port_name` against this target.
    pub fn serial_config(&self, port_name: impl Into<String>) -> SerialConfig {
        SerialConfig::new(port_name, self.baud_rate).with_timeout(self.timeout)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::new(TargetFamily::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Framing;

    #[test]
    fn test_from_name() {
        assert_eq!(TargetFamily::from_name("citrus"), Some(TargetFamily::Citrus));
        assert_eq!(TargetFamily::from_name("CINNAMON"), Some(TargetFamily::Cinnamon));
        assert_eq!(TargetFamily::from_name("c-boot"), Some(TargetFamily::CBoot));
        assert_eq!(TargetFamily::from_name("ws63"), None);
    }

    #[test]
    fn test_display_round_trips_through_from_name() {
        for family in TargetFamily::ALL {
            assert_eq!(TargetFamily::from_name(&family.to_string()), Some(family));
        }
    }

    #[test]
    fn test_from_str_error() {
        let err = "nope"
            .parse::<TargetFamily>()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_citrus_config() {
        let config = TargetConfig::new(TargetFamily::Citrus);
        assert!(matches!(config.frame.framing, Framing::Compact { .. }));
        assert_eq!(config.frame.polynomial, 0x45);
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.baud_rate, 921_600);
        assert_eq!(config.wake_byte, None);
        assert_eq!(config.commands.kill, Some(0x03));
        assert!(!config.reset_acknowledged);
    }

    #[test]
    fn test_delimited_configs() {
        let cinnamon = TargetConfig::new(TargetFamily::Cinnamon);
        assert_eq!(cinnamon.frame.polynomial, 0xB2);
        assert_eq!(cinnamon.block_size, 512);
        assert_eq!(cinnamon.timeout, Duration::from_secs(3));
        assert_eq!(cinnamon.commands.alloc, Some(0x02));
        assert_eq!(cinnamon.commands.reset, None);

        let cboot = TargetConfig::new(TargetFamily::CBoot);
        assert_eq!(cboot.baud_rate, 230_400);
        assert_eq!(cboot.commands.data, 0x04);
        assert_eq!(cboot.commands.reset, Some(0x06));
        assert_eq!(cboot.commands.alloc, None);
        assert!(cboot.reset_acknowledged);
    }

    #[test]
    fn test_builders_and_serial_config() {
        let config = TargetConfig::new(TargetFamily::CBoot)
            .with_baud(576_000)
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(3);
        assert_eq!(config.max_retries, 3);

        let serial = config.serial_config("/dev/ttyS4");
        assert_eq!(serial.port_name, "/dev/ttyS4");
        assert_eq!(serial.baud_rate, 576_000);
        assert_eq!(serial.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate() {
        assert!(
            TargetConfig::default()
                .validate()
                .is_ok()
        );

        let mut config = TargetConfig::new(TargetFamily::Cinnamon);
        config.block_size = 70_000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = TargetConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_supported_load_kinds() {
        let citrus = TargetConfig::new(TargetFamily::Citrus);
        assert!(citrus.supports(LoadKind::Application));
        assert!(citrus.supports(LoadKind::Kernel));

        let cinnamon = TargetConfig::new(TargetFamily::Cinnamon);
        assert!(cinnamon.supports(LoadKind::Application));
        assert!(!cinnamon.supports(LoadKind::Kernel));

        let cboot = TargetConfig::new(TargetFamily::CBoot);
        assert!(!cboot.supports(LoadKind::Application));
        assert!(cboot.supports(LoadKind::Kernel));
    }

    #[test]
    fn test_default_bauds_are_supported() {
        for family in TargetFamily::ALL {
            assert!(TargetFamily::supported_bauds().contains(&family.default_baud()));
        }
    }
}
