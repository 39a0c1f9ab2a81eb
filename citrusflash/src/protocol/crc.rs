//! CRC-8 used by the loader frame formats.
//!
//! Both loaders run the same bitwise CRC-8, processed LSB first, and only
//! differ in the polynomial. Each input byte is XORed into the accumulator;
//! then, for every bit, the polynomial is XORed in when the low bit is set
//! and the accumulator is shifted right by one. The XOR happens before the
//! shift, so the polynomial is not the usual reflected form.

/// Polynomial of the compact (Citrus) frame format.
pub const CITRUS_POLY: u8 = 0x45;

/// Polynomial of the delimited (Cinnamon / c-boot) frame format.
pub const CINNAMON_POLY: u8 = 0xB2;

/// Calculate the CRC-8 of `data` with the given polynomial.
#[must_use]
pub fn crc8(data: &[u8], poly: u8) -> u8 {
    crc8_update(0, data, poly)
}

/// Continue a CRC-8 computation over `data`.
///
/// `crc8_update(crc8(a, p), b, p) == crc8(a ++ b, p)`.
#[must_use]
pub fn crc8_update(crc: u8, data: &[u8], poly: u8) -> u8 {
    data.iter()
        .fold(crc, |mut crc, &byte| {
            crc ^= byte;
            for _ in 0..8 {
                if crc & 0x01 != 0 {
                    crc ^= poly;
                }
                crc >>= 1;
            }
            crc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_empty_is_zero() {
        assert_eq!(crc8(&[], CITRUS_POLY), 0);
        assert_eq!(crc8(&[], CINNAMON_POLY), 0);
    }

    #[test]
    fn test_crc8_known_values() {
        assert_eq!(crc8(&[0x01], CITRUS_POLY), 0x05);
        assert_eq!(crc8(b"123456789", CITRUS_POLY), 0x0B);
        assert_eq!(crc8(b"123456789", CINNAMON_POLY), 0x28);
        assert_eq!(crc8(&[0xD2, 0x04, 0x00, 0x00], CITRUS_POLY), 0x22);
    }

    #[test]
    fn test_crc8_polynomial_matters() {
        assert_ne!(
            crc8(b"123456789", CITRUS_POLY),
            crc8(b"123456789", CINNAMON_POLY)
        );
    }

    #[test]
    fn test_crc8_order_matters() {
        assert_ne!(
            crc8(&[0x01, 0x02], CINNAMON_POLY),
            crc8(&[0x02, 0x01], CINNAMON_POLY)
        );
    }

    #[test]
    fn test_crc8_update_matches_one_shot() {
        let data: Vec<u8> = (0..=255).collect();
        for poly in [CITRUS_POLY, CINNAMON_POLY] {
            for split in [0, 1, 3, 128, 255, 256] {
                let (head, tail) = data.split_at(split);
                assert_eq!(
                    crc8_update(crc8(head, poly), tail, poly),
                    crc8(&data, poly),
                    "poly 0x{poly:02X}, split {split}"
                );
            }
        }
    }
}
