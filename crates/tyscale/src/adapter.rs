// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value adapter: normalizes host value conventions before they reach the
//! wire encoders, and builds host values from decoded wire data.
//!
//! - byte blobs: raw bytes, `0x` hex text, plain text (UTF-8) or a list of
//!   integers in `0..=255`; decoding always yields raw bytes;
//! - enums: the inline form `{Variant: payload}` is canonical; the explicit
//!   form `{tag: "Variant", value: payload}` is accepted on encode;
//! - integers: machine, arbitrary-precision or `n`-suffixed decimal text
//!   (`"42n"`) on encode; decoding yields a machine integer when the
//!   declared width always fits in an `i64`.

use crate::codec::compiler::EnumCodec;
use crate::descriptor::{PrimitiveKind, TypeId};
use crate::error::CodecError;
use crate::value::Value;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use std::borrow::Cow;

fn mismatch(expected: impl Into<String>, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.into(),
        found: found.kind_name().to_string(),
    }
}

/// Normalize a byte-like value to raw bytes.
pub(crate) fn to_bytes(value: &Value) -> Result<Cow<'_, [u8]>, CodecError> {
    match value {
        Value::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        Value::Text(text) => match text.strip_prefix("0x") {
            Some(hex_digits) => hex::decode(hex_digits)
                .map(Cow::Owned)
                .map_err(|e| CodecError::InvalidHex(e.to_string())),
            None => Ok(Cow::Borrowed(text.as_bytes())),
        },
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| mismatch("byte (0..=255)", item))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Cow::Owned),
        other => Err(mismatch("bytes", other)),
    }
}

/// Integer written as decimal digits with an `n` suffix, e.g. `"-42n"`.
fn parse_suffixed(text: &str) -> Option<BigInt> {
    let digits = text.strip_suffix('n')?;
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn to_bigint(value: &Value, kind: PrimitiveKind) -> Result<BigInt, CodecError> {
    let n = match value {
        Value::Text(text) => parse_suffixed(text),
        other => other.as_bigint(),
    };
    n.ok_or_else(|| mismatch(kind.name(), value))
}

fn out_of_range(value: impl ToString, kind: PrimitiveKind) -> CodecError {
    CodecError::IntegerOutOfRange {
        value: value.to_string(),
        ty: kind.name().to_string(),
    }
}

/// Little-endian fixed-width encoding of an integer value.
pub(crate) fn write_int(
    value: &Value,
    kind: PrimitiveKind,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let size = kind.size().unwrap_or(0);
    let bits = size * 8;

    if let (Value::Integer(v), true) = (value, size <= 8) {
        let v = i128::from(*v);
        let (min, max) = if kind.is_signed() {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        };
        if v < min || v > max {
            return Err(out_of_range(v, kind));
        }
        out.extend_from_slice(&v.to_le_bytes()[..size]);
        return Ok(());
    }

    let n = to_bigint(value, kind)?;
    let (bytes, fill) = if kind.is_signed() {
        let limit = BigInt::from(1u8) << (bits - 1);
        if n < -limit.clone() || n >= limit {
            return Err(out_of_range(&n, kind));
        }
        let fill = if n.sign() == Sign::Minus { 0xff } else { 0x00 };
        (n.to_signed_bytes_le(), fill)
    } else {
        let Some(unsigned) = n.to_biguint() else {
            return Err(out_of_range(&n, kind));
        };
        if unsigned.bits() > bits as u64 {
            return Err(out_of_range(&n, kind));
        }
        (unsigned.to_bytes_le(), 0x00)
    };
    let used = bytes.len().min(size);
    out.extend_from_slice(&bytes[..used]);
    out.extend(std::iter::repeat(fill).take(size - used));
    Ok(())
}

/// Host value of a little-endian fixed-width integer.
pub(crate) fn read_int(bytes: &[u8], kind: PrimitiveKind) -> Value {
    if kind.fits_native() {
        let fill = if kind.is_signed() && bytes.last().is_some_and(|b| b & 0x80 != 0) {
            0xff
        } else {
            0x00
        };
        let mut buf = [fill; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        return Value::Integer(i64::from_le_bytes(buf));
    }
    if kind.is_signed() {
        Value::BigInteger(BigInt::from_signed_bytes_le(bytes))
    } else {
        Value::BigInteger(BigInt::from_bytes_le(Sign::Plus, bytes))
    }
}

/// Non-negative integer bounded by `kind`, for compact encoding.
pub(crate) fn to_unsigned(value: &Value, kind: PrimitiveKind) -> Result<BigUint, CodecError> {
    let n = to_bigint(value, kind)?;
    let bits = kind.size().unwrap_or(0) as u64 * 8;
    match n.to_biguint() {
        Some(unsigned) if unsigned.bits() <= bits => Ok(unsigned),
        _ => Err(out_of_range(&n, kind)),
    }
}

/// Host value of a decoded compact integer of width `kind`.
pub(crate) fn from_unsigned(n: BigUint, kind: PrimitiveKind) -> Result<Value, CodecError> {
    let bits = kind.size().unwrap_or(0) as u64 * 8;
    if n.bits() > bits {
        return Err(out_of_range(&n, kind));
    }
    if kind.fits_native() {
        let small = n.to_u64().ok_or_else(|| out_of_range(&n, kind))?;
        return Ok(Value::Integer(small as i64));
    }
    Ok(Value::BigInteger(BigInt::from(n)))
}

/// Variant selected by an enum value.
pub(crate) struct Selected<'v> {
    pub tag: u8,
    pub payload_ty: Option<TypeId>,
    pub payload: &'v Value,
}

static NULL: Value = Value::Null;

/// Resolve an inline (`{Name: payload}`) or explicit (`{tag, value}`) enum
/// value against the variants of `codec`.
pub(crate) fn select_variant<'v>(
    value: &'v Value,
    codec: &EnumCodec,
) -> Result<Selected<'v>, CodecError> {
    let map = value
        .as_map()
        .ok_or_else(|| mismatch("enum value (single-entry map)", value))?;

    let (name, payload) = match map.iter().next() {
        Some((name, payload)) if map.len() == 1 && codec.has_variant(name) => {
            (name.as_str(), payload)
        }
        _ => match explicit_form(map) {
            Some(pair) => pair,
            None if map.len() == 1 => {
                let name = map.keys().next().map(String::as_str).unwrap_or_default();
                return Err(CodecError::UnknownVariant(name.to_string()));
            }
            None => return Err(mismatch("enum value (single-entry map)", value)),
        },
    };

    let (tag, payload_ty) = codec
        .by_name(name)
        .ok_or_else(|| CodecError::UnknownVariant(name.to_string()))?;
    if payload_ty.is_none() && !payload.is_null() {
        return Err(CodecError::UnexpectedPayload(name.to_string()));
    }
    Ok(Selected {
        tag,
        payload_ty,
        payload,
    })
}

fn explicit_form(
    map: &std::collections::BTreeMap<String, Value>,
) -> Option<(&str, &Value)> {
    let tag = map.get("tag")?.as_str()?;
    let only_known_keys = map.keys().all(|k| k == "tag" || k == "value");
    if !only_known_keys {
        return None;
    }
    Some((tag, map.get("value").unwrap_or(&NULL)))
}
