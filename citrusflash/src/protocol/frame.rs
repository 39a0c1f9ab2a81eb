//! Frame encoder.
//!
//! Frames are only ever built on the host; the device answers with a single
//! acknowledgement byte, so there is no decoder here.

use {
    crate::{
        error::{Error, Result},
        protocol::{
            crc::{crc8, crc8_update},
            profile::{ChecksumScope, FrameProfile, Framing},
        },
    },
    byteorder::{LittleEndian, WriteBytesExt},
};

/// A single loader frame: command byte plus payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    command: u8,
    payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Create a frame.
    pub fn new(command: u8, payload: &'a [u8]) -> Self {
        Self { command, payload }
    }

    /// Little-endian length field as it appears on the wire.
    fn length_field(&self, framing: Framing) -> Result<Vec<u8>> {
        let len = self
            .payload
            .len();
        let too_large = || Error::PayloadTooLarge {
            len,
            max: framing.max_payload(),
        };

        let mut field = Vec::with_capacity(framing.length_width());
        match framing {
            Framing::Compact { .. } => {
                field.write_u32::<LittleEndian>(u32::try_from(len).map_err(|_| too_large())?)?;
            },
            Framing::Delimited { .. } => {
                field.write_u16::<LittleEndian>(u16::try_from(len).map_err(|_| too_large())?)?;
            },
        }
        Ok(field)
    }

    /// The exact bytes the checksum is computed over, in order.
    pub fn checksum_region(&self, profile: &FrameProfile) -> Result<Vec<u8>> {
        match profile.checksum_scope {
            ChecksumScope::Payload => Ok(self
                .payload
                .to_vec()),
            ChecksumScope::Body => {
                let length = self.length_field(profile.framing)?;
                let mut region = Vec::with_capacity(1 + length.len() + self.payload.len());
                region.push(self.command);
                region.extend_from_slice(&length);
                region.extend_from_slice(self.payload);
                Ok(region)
            },
        }
    }

    /// Checksum byte of this frame under `profile`.
    pub fn checksum(&self, profile: &FrameProfile) -> Result<u8> {
        let poly = profile.polynomial;
        match profile.checksum_scope {
            ChecksumScope::Payload => Ok(crc8(self.payload, poly)),
            ChecksumScope::Body => {
                let length = self.length_field(profile.framing)?;
                let crc = crc8(&[self.command], poly);
                let crc = crc8_update(crc, &length, poly);
                Ok(crc8_update(crc, self.payload, poly))
            },
        }
    }

    /// Encode the frame into its wire representation.
    pub fn encode(&self, profile: &FrameProfile) -> Result<Vec<u8>> {
        let framing = profile.framing;
        let length = self.length_field(framing)?;
        let crc = self.checksum(profile)?;

        let mut buf = Vec::with_capacity(
            framing.overhead()
                + self
                    .payload
                    .len(),
        );
        match framing {
            Framing::Compact { sync, header_len } => {
                buf.push(sync);
                buf.push(crc);
                buf.push(self.command);
                buf.push(header_len);
                buf.extend_from_slice(&length);
                buf.extend_from_slice(self.payload);
            },
            Framing::Delimited { start, end } => {
                buf.push(start);
                buf.push(self.command);
                buf.extend_from_slice(&length);
                buf.extend_from_slice(self.payload);
                buf.push(crc);
                buf.push(end);
            },
        }
        Ok(buf)
    }
}
