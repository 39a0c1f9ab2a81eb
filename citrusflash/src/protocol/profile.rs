//! Frame profiles.
//!
//! The Citrus kernel receiver and the Cinnamon / c-boot loaders speak two
//! framings of the same idea. A [`FrameProfile`] captures everything that
//! differs between them so one codec and one retry engine serve both.
//!
//! ## Compact framing
//!
//! ```text
//! +------+-----+-----+------------+---------------+-----------+
//! | SYNC | CRC | CMD | HEADER_LEN |  PAYLOAD_LEN  |  PAYLOAD  |
//! +------+-----+-----+------------+---------------+-----------+
//! |  1   |  1  |  1  |     1      |   4 (LE)      |     N     |
//! +------+-----+-----+------------+---------------+-----------+
//! ```
//!
//! ## Delimited framing
//!
//! ```text
//! +-------+-----+---------------+-----------+-----+-----+
//! | START | CMD |  PAYLOAD_LEN  |  PAYLOAD  | CRC | END |
//! +-------+-----+---------------+-----------+-----+-----+
//! |   1   |  1  |   2 (LE)      |     N     |  1  |  1  |
//! +-------+-----+---------------+-----------+-----+-----+
//! ```

use crate::protocol::crc::{CINNAMON_POLY, CITRUS_POLY};

/// Sync byte of the compact framing.
pub const COMPACT_SYNC: u8 = 0xCA;

/// Header length announced by compact frames.
pub const COMPACT_HEADER_LEN: u8 = 8;

/// Start marker of the delimited framing.
pub const DELIMITED_START: u8 = 0xAA;

/// End marker of the delimited framing.
pub const DELIMITED_END: u8 = 0x55;

/// Acknowledgement asking for a retransmission on the compact framing.
pub const COMPACT_RETRY: u8 = 0x00;

/// Acknowledgements accepted on the delimited framing.
pub const DELIMITED_ACCEPT: &[u8] = &[0x01, 0x06];

/// Byte layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Sync byte and self-describing 32-bit length, no end marker.
    Compact {
        /// Leading sync byte.
        sync: u8,
        /// Value of the header length field.
        header_len: u8,
    },
    /// Start and end markers around a 16-bit length frame.
    Delimited {
        /// Leading start marker.
        start: u8,
        /// Trailing end marker.
        end: u8,
    },
}

impl Framing {
    /// Width in bytes of the little-endian payload length field.
    pub fn length_width(&self) -> usize {
        match self {
            Self::Compact { .. } => 4,
            Self::Delimited { .. } => 2,
        }
    }

    /// Largest payload the length field can describe.
    pub fn max_payload(&self) -> usize {
        match self {
            Self::Compact { .. } => usize::try_from(u32::MAX).unwrap_or(usize::MAX),
            Self::Delimited { .. } => usize::from(u16::MAX),
        }
    }

    /// Number of bytes a frame adds around its payload.
    pub fn overhead(&self) -> usize {
        // Compact: sync, crc, cmd, header_len. Delimited: start, cmd, crc, end.
        4 + self.length_width()
    }
}

/// Which bytes of a frame the checksum covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumScope {
    /// Payload bytes only.
    Payload,
    /// Command byte, length field and payload, in that order.
    Body,
}

/// How the single acknowledgement byte is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// This byte asks for a retransmission; every other byte accepts.
    RetryOn(u8),
    /// These bytes accept; every other byte asks for a retransmission.
    AcceptOnly(&'static [u8]),
}

/// Meaning of a received acknowledgement byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The frame was taken.
    Accept,
    /// The frame must be sent again.
    Retry,
}

impl AckPolicy {
    /// Classify an acknowledgement byte.
    pub fn classify(&self, byte: u8) -> Ack {
        match self {
            Self::RetryOn(retry) if byte == *retry => Ack::Retry,
            Self::RetryOn(_) => Ack::Accept,
            Self::AcceptOnly(accept) if accept.contains(&byte) => Ack::Accept,
            Self::AcceptOnly(_) => Ack::Retry,
        }
    }
}

/// Complete description of a frame format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProfile {
    /// Byte layout.
    pub framing: Framing,
    /// CRC-8 polynomial.
    pub polynomial: u8,
    /// Checksum coverage.
    pub checksum_scope: ChecksumScope,
    /// Acknowledgement interpretation.
    pub ack: AckPolicy,
}

impl FrameProfile {
    /// Compact framing spoken by the Citrus kernel receiver.
    pub const COMPACT: Self = Self {
        framing: Framing::Compact {
            sync: COMPACT_SYNC,
            header_len: COMPACT_HEADER_LEN,
        },
        polynomial: CITRUS_POLY,
        checksum_scope: ChecksumScope::Payload,
        ack: AckPolicy::RetryOn(COMPACT_RETRY),
    };

    /// Delimited framing spoken by the Cinnamon loader and c-boot.
    pub const DELIMITED: Self = Self {
        framing: Framing::Delimited {
            start: DELIMITED_START,
            end: DELIMITED_END,
        },
        polynomial: CINNAMON_POLY,
        checksum_scope: ChecksumScope::Body,
        ack: AckPolicy::AcceptOnly(DELIMITED_ACCEPT),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_ack_policy() {
        let ack = FrameProfile::COMPACT.ack;
        assert_eq!(ack.classify(0x00), Ack::Retry);
        assert_eq!(ack.classify(0x01), Ack::Accept);
        // Any non-zero byte is taken as acceptance.
        assert_eq!(ack.classify(0xFF), Ack::Accept);
        assert_eq!(ack.classify(0x03), Ack::Accept);
    }

    #[test]
    fn test_delimited_ack_policy() {
        let ack = FrameProfile::DELIMITED.ack;
        assert_eq!(ack.classify(0x01), Ack::Accept);
        assert_eq!(ack.classify(0x06), Ack::Accept);
        assert_eq!(ack.classify(0x00), Ack::Retry);
        assert_eq!(ack.classify(0x15), Ack::Retry);
    }

    #[test]
    fn test_length_field_limits() {
        assert_eq!(FrameProfile::DELIMITED.framing.max_payload(), 65_535);
        assert_eq!(FrameProfile::DELIMITED.framing.length_width(), 2);
        assert_eq!(FrameProfile::COMPACT.framing.length_width(), 4);
        assert!(FrameProfile::COMPACT.framing.max_payload() >= 65_536);
    }

    #[test]
    fn test_overhead() {
        assert_eq!(FrameProfile::COMPACT.framing.overhead(), 8);
        assert_eq!(FrameProfile::DELIMITED.framing.overhead(), 6);
    }
}
