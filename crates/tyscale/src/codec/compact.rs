// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compact (variable-length) unsigned integers.
//!
//! The two low bits of the first byte select the mode:
//!
//! | mode | range            | layout                                   |
//! |------|------------------|------------------------------------------|
//! | 0b00 | `< 2^6`          | 1 byte, `v << 2`                         |
//! | 0b01 | `< 2^14`         | 2 bytes LE, `v << 2 \| 1`                |
//! | 0b10 | `< 2^30`         | 4 bytes LE, `v << 2 \| 2`                |
//! | 0b11 | up to 536 bits   | `(n - 4) << 2 \| 3`, then `n` bytes LE   |
//!
//! Decoding only accepts the shortest encoding of a value.

use super::wire::Reader;
use crate::error::CodecError;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

const SINGLE_MAX: u64 = 1 << 6;
const TWO_MAX: u64 = 1 << 14;
const FOUR_MAX: u64 = 1 << 30;
/// Largest payload length expressible in big-integer mode.
const BIG_MAX_BYTES: usize = 67;

/// Encode a machine-sized value.
pub(crate) fn encode_u64(value: u64, out: &mut Vec<u8>) {
    if value < SINGLE_MAX {
        out.push((value as u8) << 2);
    } else if value < TWO_MAX {
        out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes());
    } else if value < FOUR_MAX {
        out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes());
    } else {
        let bytes = value.to_le_bytes();
        let len = 8 - (value.leading_zeros() as usize / 8);
        out.push((((len - 4) as u8) << 2) | 0b11);
        out.extend_from_slice(&bytes[..len]);
    }
}

/// Encode an arbitrary-precision value.
pub(crate) fn encode_big(value: &BigUint, out: &mut Vec<u8>) -> Result<(), CodecError> {
    if let Some(small) = value.to_u64() {
        encode_u64(small, out);
        return Ok(());
    }
    let bytes = value.to_bytes_le();
    if bytes.len() > BIG_MAX_BYTES {
        return Err(CodecError::IntegerOutOfRange {
            value: value.to_string(),
            ty: "compact".to_string(),
        });
    }
    out.push((((bytes.len() - 4) as u8) << 2) | 0b11);
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Decode a value of any magnitude.
pub(crate) fn decode_big(reader: &mut Reader<'_>) -> Result<BigUint, CodecError> {
    let first = reader.read_u8()?;
    if first & 0b11 != 0b11 {
        return decode_small(first, reader).map(BigUint::from);
    }
    let len = usize::from(first >> 2) + 4;
    let bytes = reader.read_bytes(len)?;
    if bytes.last() == Some(&0) {
        return Err(CodecError::NonCanonicalCompact);
    }
    let value = BigUint::from_bytes_le(bytes);
    if value < BigUint::from(FOUR_MAX) {
        return Err(CodecError::NonCanonicalCompact);
    }
    Ok(value)
}

/// Decode a value that must fit in a `u64` (lengths, counts).
pub(crate) fn decode_u64(reader: &mut Reader<'_>) -> Result<u64, CodecError> {
    let first = reader.read_u8()?;
    if first & 0b11 != 0b11 {
        return decode_small(first, reader);
    }
    let len = usize::from(first >> 2) + 4;
    if len > 8 {
        return Err(CodecError::IntegerOutOfRange {
            value: format!("{}-byte compact", len),
            ty: "u64".to_string(),
        });
    }
    let bytes = reader.read_bytes(len)?;
    if bytes.last() == Some(&0) {
        return Err(CodecError::NonCanonicalCompact);
    }
    let mut buf = [0u8; 8];
    buf[..len].copy_from_slice(bytes);
    let value = u64::from_le_bytes(buf);
    if value < FOUR_MAX {
        return Err(CodecError::NonCanonicalCompact);
    }
    Ok(value)
}

/// Decode a length prefix and convert it to `usize`.
pub(crate) fn decode_len(reader: &mut Reader<'_>) -> Result<usize, CodecError> {
    let len = decode_u64(reader)?;
    usize::try_from(len).map_err(|_| CodecError::IntegerOutOfRange {
        value: len.to_string(),
        ty: "usize".to_string(),
    })
}

fn decode_small(first: u8, reader: &mut Reader<'_>) -> Result<u64, CodecError> {
    match first & 0b11 {
        0b00 => Ok(u64::from(first >> 2)),
        0b01 => {
            let [second] = reader.read_array::<1>()?;
            let value = u64::from(u16::from_le_bytes([first, second]) >> 2);
            if value < SINGLE_MAX {
                return Err(CodecError::NonCanonicalCompact);
            }
            Ok(value)
        }
        _ => {
            let rest = reader.read_array::<3>()?;
            let value = u64::from(u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 2);
            if value < TWO_MAX {
                return Err(CodecError::NonCanonicalCompact);
            }
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_u64(value, &mut out);
        out
    }

    #[test]
    fn test_mode_boundaries() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(63), vec![0xfc]);
        assert_eq!(encoded(64), vec![0x01, 0x01]);
        assert_eq!(encoded(16383), vec![0xfd, 0xff]);
        assert_eq!(encoded(16384), vec![0x02, 0x00, 0x01, 0x00]);
        assert_eq!(encoded((1 << 30) - 1), vec![0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(encoded(1 << 30), vec![0x03, 0x00, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn test_big_mode_trims_leading_zeros() {
        assert_eq!(
            encoded(u64::MAX),
            vec![0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(encoded(1 << 32), vec![0x07, 0x00, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_decode_roundtrip_small_and_big() {
        for value in [0, 1, 63, 64, 16383, 16384, (1 << 30) - 1, 1 << 30, u64::MAX] {
            let bytes = encoded(value);
            let mut reader = Reader::new(&bytes);
            assert_eq!(decode_u64(&mut reader).unwrap(), value);
            assert_eq!(reader.remaining(), 0);

            let mut reader = Reader::new(&bytes);
            assert_eq!(decode_big(&mut reader).unwrap(), BigUint::from(value));
        }
    }

    #[test]
    fn test_u128_max() {
        let value = BigUint::from(u128::MAX);
        let mut out = Vec::new();
        encode_big(&value, &mut out).unwrap();
        assert_eq!(out.len(), 17);
        assert_eq!(out[0], (12 << 2) | 0b11);
        assert_eq!(decode_big(&mut Reader::new(&out)).unwrap(), value);
    }

    #[test]
    fn test_too_large_for_compact() {
        let value = BigUint::from(1u8) << (68 * 8);
        assert!(encode_big(&value, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_non_canonical_rejected() {
        // 1 in two-byte mode
        assert_eq!(
            decode_u64(&mut Reader::new(&[0x05, 0x00])),
            Err(CodecError::NonCanonicalCompact)
        );
        // 64 in four-byte mode
        assert_eq!(
            decode_u64(&mut Reader::new(&[0x02, 0x01, 0x00, 0x00])),
            Err(CodecError::NonCanonicalCompact)
        );
        // big mode with a zero high byte
        assert_eq!(
            decode_big(&mut Reader::new(&[0x07, 0, 0, 0, 0x40, 0x00])),
            Err(CodecError::NonCanonicalCompact)
        );
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            decode_u64(&mut Reader::new(&[0x03, 0x00])),
            Err(CodecError::BufferTooSmall { .. })
        ));
    }
}
