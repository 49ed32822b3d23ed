// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled codecs.
//!
//! A [`Codec`] pairs a [`Registry`] with the id of one type. Building it
//! compiles every type reachable from the root once; the compiled nodes are
//! cached in the registry and shared by all codecs built from it.

mod compact;
pub(crate) mod compiler;
mod decode;
mod encode;
mod wire;

pub(crate) use compiler::CodecNode;

use crate::descriptor::TypeId;
use crate::error::{CodecError, Result};
use crate::registry::Registry;
use crate::value::Value;

/// How a caller designates a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Position of a top-level definition.
    Position(usize),
    /// A type expression in DSL syntax, e.g. `"Option<u64>"` or `"[u8; 4]"`.
    Expr(String),
    /// Anonymous tuple of the definitions at the given positions.
    Tuple(Vec<usize>),
    /// A descriptor id of the registry.
    Id(TypeId),
}

impl From<usize> for TypeRef {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

impl From<&str> for TypeRef {
    fn from(text: &str) -> Self {
        Self::Expr(text.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(text: String) -> Self {
        Self::Expr(text)
    }
}

impl From<&[usize]> for TypeRef {
    fn from(positions: &[usize]) -> Self {
        Self::Tuple(positions.to_vec())
    }
}

impl From<Vec<usize>> for TypeRef {
    fn from(positions: Vec<usize>) -> Self {
        Self::Tuple(positions)
    }
}

/// Anonymous tuple of the named types, e.g. `["u8", "str", "Person"]`.
impl From<&[&str]> for TypeRef {
    fn from(names: &[&str]) -> Self {
        Self::Expr(format!("({})", names.join(", ")))
    }
}

impl<const N: usize> From<[&str; N]> for TypeRef {
    fn from(names: [&str; N]) -> Self {
        Self::from(&names[..])
    }
}

impl From<Vec<&str>> for TypeRef {
    fn from(names: Vec<&str>) -> Self {
        Self::from(names.as_slice())
    }
}

impl From<TypeId> for TypeRef {
    fn from(id: TypeId) -> Self {
        Self::Id(id)
    }
}

/// Encoder/decoder for one type of a registry.
///
/// Cheap to clone; thread-safe.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Registry,
    root: TypeId,
}

impl Codec {
    pub(crate) fn new(registry: Registry, root: TypeId) -> Result<Self> {
        compiler::compile_reachable(&registry, root)?;
        Ok(Self { registry, root })
    }

    /// Id of the type this codec handles.
    pub fn type_id(&self) -> TypeId {
        self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode `value` into a fresh buffer.
    pub fn encode(&self, value: &Value) -> std::result::Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode_to(value, &mut out)?;
        Ok(out)
    }

    /// Append the encoding of `value` to `out`.
    ///
    /// On error `out` may hold a partial encoding.
    pub fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> std::result::Result<(), CodecError> {
        encode::Encoder::new(&self.registry, out).encode(self.root, value)
    }

    /// Decode a value that spans the whole of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<Value, CodecError> {
        let (value, consumed) = self.decode_prefix(bytes)?;
        if consumed != bytes.len() {
            return Err(CodecError::TrailingBytes(bytes.len() - consumed));
        }
        Ok(value)
    }

    /// Decode one value from the front of `bytes`, returning it together
    /// with the number of bytes consumed.
    pub fn decode_prefix(&self, bytes: &[u8]) -> std::result::Result<(Value, usize), CodecError> {
        let mut decoder = decode::Decoder::new(&self.registry, bytes);
        let value = decoder.decode(self.root)?;
        Ok((value, decoder.position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_conversions() {
        assert_eq!(TypeRef::from(3usize), TypeRef::Position(3));
        assert_eq!(TypeRef::from("u8"), TypeRef::Expr("u8".to_string()));
        assert_eq!(TypeRef::from(vec![0, 1]), TypeRef::Tuple(vec![0, 1]));
        assert_eq!(TypeRef::from(&[2usize][..]), TypeRef::Tuple(vec![2]));
    }

    #[test]
    fn test_tuple_of_named_types() {
        assert_eq!(
            TypeRef::from(["u8", "str", "Person"]),
            TypeRef::Expr("(u8, str, Person)".to_string())
        );
        assert_eq!(TypeRef::from(vec!["u8"]), TypeRef::Expr("(u8)".to_string()));

        let registry = Registry::parse("Person = {name: str, age: u32}").unwrap();
        let codec = registry.codec(["u8", "str", "Person"]).unwrap();
        let person = Value::map([("name", Value::from("Al")), ("age", Value::from(3u32))]);
        let value = Value::list([Value::from(7u8), Value::from("hi"), person]);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes, [7, 0x08, b'h', b'i', 0x08, b'A', b'l', 3, 0, 0, 0]);
        assert_eq!(codec.decode(&bytes).unwrap(), value);

        let single = registry.codec(vec!["u16"]).unwrap();
        assert_eq!(single.encode(&Value::list([5u16])).unwrap(), [5, 0]);
    }

    #[test]
    fn test_struct_roundtrip() {
        let registry = Registry::parse("Person = {name: str, age: u32}").unwrap();
        let codec = registry.codec("Person").unwrap();
        let value = Value::map([("name", Value::from("Tom")), ("age", Value::from(9u32))]);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes, [0x0c, b'T', b'o', b'm', 9, 0, 0, 0]);
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_trailing_bytes_and_prefix() {
        let registry = Registry::empty();
        let codec = registry.codec("u16").unwrap();
        assert_eq!(
            codec.decode(&[1, 0, 7]),
            Err(CodecError::TrailingBytes(1))
        );
        assert_eq!(
            codec.decode_prefix(&[1, 0, 7]).unwrap(),
            (Value::Integer(1), 2)
        );
    }

    #[test]
    fn test_encode_to_appends() {
        let registry = Registry::empty();
        let codec = registry.codec("bool").unwrap();
        let mut out = vec![0xaa];
        codec.encode_to(&Value::Bool(true), &mut out).unwrap();
        assert_eq!(out, [0xaa, 0x01]);
    }
}
