// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversions between [`Value`] and `serde_json::Value`.
//!
//! Integers outside the `i64` range are written as strings with an `n`
//! suffix (`"340282366920938463463374607431768211455n"`). JSON strings always
//! read back as text; the encoder accepts the suffixed form wherever an
//! integer is expected. Byte blobs are written as `0x`-prefixed hex text.
//! Floating-point numbers are rejected.

use crate::error::CodecError;
use crate::value::Value;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::{Map, Number, Value as Json};

impl TryFrom<Json> for Value {
    type Error = CodecError;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Value::Integer(v)
                } else if let Some(v) = n.as_u64() {
                    Value::BigInteger(BigInt::from(v))
                } else {
                    return Err(CodecError::TypeMismatch {
                        expected: "integer".to_string(),
                        found: format!("number {}", n),
                    });
                }
            }
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl Value {
    /// JSON form of this value.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(v) => Json::Number(Number::from(*v)),
            Value::BigInteger(v) => match v.to_i64() {
                Some(small) => Json::Number(Number::from(small)),
                None => Json::String(format!("{}n", v)),
            },
            Value::Bytes(bytes) => Json::String(format!("0x{}", hex::encode(bytes))),
            Value::Text(text) => Json::String(text.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Parse a JSON document into a value.
    pub fn from_json_str(text: &str) -> crate::Result<Value> {
        let json: Json =
            serde_json::from_str(text).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
        Ok(Value::try_from(json)?)
    }
}
