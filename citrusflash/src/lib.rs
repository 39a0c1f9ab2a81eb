//! # citrusflash
//!
//! Host side of the serial loaders used by the Citrus operating system.
//!
//! This crate provides the pieces needed to get a kernel or an application
//! onto a board over a serial line:
//!
//! - CRC-8 checksum with a configurable polynomial
//! - Compact and delimited frame encoders
//! - Lockstep send/acknowledge link with bounded retransmission
//! - Device control: wake handshake, reset, allocate, kill, pointer
//! - Block transfer sessions with progress reporting
//!
//! ## Supported Targets
//!
//! - `citrus`: receiver inside the running kernel (compact frames)
//! - `cinnamon`: application loader (delimited frames)
//! - `cboot`: kernel loader (delimited frames)
//!
//! ## Features
//!
//! - `native` (default): serial ports through the `serialport` crate
//! - `serde`: Serialization support for data types
//!
//! ## Example
//!
//! ```rust,no_run
//! use citrusflash::{LoadKind, NoProgress, TargetConfig, TargetFamily, TransferSession};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let image = std::fs::read("app.bin")?;
//!     let config = TargetConfig::new(TargetFamily::Cinnamon);
//!
//!     #[cfg(feature = "native")]
//!     {
//!         let port = citrusflash::NativePort::open(&config.serial_config("/dev/ttyUSB0"))?;
//!         let mut session = TransferSession::new(port, &config);
//!         let report = session.run(&image, LoadKind::Application, &mut NoProgress)?;
//!         println!("Sent {} bytes in {} frames", report.bytes, report.frames);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::{Arc, OnceLock};

pub mod error;
pub mod port;
pub mod progress;
pub mod protocol;
pub mod target;

static INTERRUPT_CHECKER: OnceLock<Arc<dyn Fn() -> bool + Send + Sync>> = OnceLock::new();

/// Register a global interruption checker polled between transfer blocks.
///
/// The checker should return `true` when the current operation should stop
/// (for example after receiving Ctrl-C in CLI applications). Only the first
/// registration takes effect.
pub fn set_interrupt_checker<F>(checker: F)
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let _ = INTERRUPT_CHECKER.set(Arc::new(checker));
}

/// Returns whether interruption was requested by the embedding application.
#[must_use]
pub fn is_interrupted_requested() -> bool {
    INTERRUPT_CHECKER
        .get()
        .is_some_and(|checker| checker())
}

#[cfg(test)]
pub(crate) fn test_set_interrupted(value: bool) {
    use std::sync::atomic::{AtomicBool, Ordering};

    static TEST_INTERRUPT_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

    let flag = TEST_INTERRUPT_FLAG
        .get_or_init(|| {
            let shared = Arc::new(AtomicBool::new(false));
            let checker = Arc::clone(&shared);
            set_interrupt_checker(move || checker.load(Ordering::Relaxed));
            shared
        })
        .clone();

    flag.store(value, Ordering::Relaxed);
}

#[cfg(feature = "native")]
pub use port::{NativePort, NativePortEnumerator};
pub use {
    error::{Error, Result},
    port::{Port, PortEnumerator, PortInfo, SerialConfig},
    progress::{NoProgress, Progress},
    protocol::{
        Ack, AckPolicy, ChecksumScope, DEFAULT_MAX_RETRIES, Delivery, Frame, FrameProfile,
        Framing, Link, crc8, crc8_update,
    },
    target::{
        BlockPlan, CommandSet, Device, LoadKind, TargetConfig, TargetFamily, TransferReport,
        TransferSession,
    },
};
