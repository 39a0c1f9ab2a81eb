//! Loader wire protocol: checksum, frame profiles, encoder and retry engine.

pub mod crc;
pub mod frame;
pub mod link;
pub mod profile;

// Re-export common types
pub use {
    crc::{crc8, crc8_update},
    frame::Frame,
    link::{DEFAULT_MAX_RETRIES, Delivery, Link},
    profile::{Ack, AckPolicy, ChecksumScope, FrameProfile, Framing},
};
