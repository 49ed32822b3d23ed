// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value -> wire encoding.

use super::compact;
use super::compiler::{self, CodecNode};
use crate::adapter;
use crate::descriptor::TypeId;
use crate::error::CodecError;
use crate::registry::Registry;
use crate::value::Value;

pub(crate) struct Encoder<'a> {
    registry: &'a Registry,
    out: &'a mut Vec<u8>,
}

fn mismatch(expected: &str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(registry: &'a Registry, out: &'a mut Vec<u8>) -> Self {
        Self { registry, out }
    }

    pub(crate) fn encode(&mut self, id: TypeId, value: &Value) -> Result<(), CodecError> {
        let node = compiler::node(self.registry, id)?;
        match &*node {
            CodecNode::Bool => {
                let v = value.as_bool().ok_or_else(|| mismatch("bool", value))?;
                self.out.push(u8::from(v));
                Ok(())
            }
            CodecNode::Int(kind) => adapter::write_int(value, *kind, self.out),
            CodecNode::Str => {
                let text = value.as_str().ok_or_else(|| mismatch("str", value))?;
                compact::encode_u64(text.len() as u64, self.out);
                self.out.extend_from_slice(text.as_bytes());
                Ok(())
            }
            CodecNode::Compact(kind) => {
                let n = adapter::to_unsigned(value, *kind)?;
                compact::encode_big(&n, self.out)
            }
            CodecNode::Bytes { len } => {
                let bytes = adapter::to_bytes(value)?;
                match len {
                    Some(len) if bytes.len() != *len => Err(CodecError::ArityMismatch {
                        expected: *len,
                        found: bytes.len(),
                    }),
                    Some(_) => {
                        self.out.extend_from_slice(&bytes);
                        Ok(())
                    }
                    None => {
                        compact::encode_u64(bytes.len() as u64, self.out);
                        self.out.extend_from_slice(&bytes);
                        Ok(())
                    }
                }
            }
            CodecNode::Sequence { element, .. } => {
                let items = value.as_list().ok_or_else(|| mismatch("list", value))?;
                compact::encode_u64(items.len() as u64, self.out);
                self.encode_all(items.iter().map(|item| (*element, item)))
            }
            CodecNode::Array { element, len } => {
                let items = value.as_list().ok_or_else(|| mismatch("list", value))?;
                if items.len() != *len {
                    return Err(CodecError::ArityMismatch {
                        expected: *len,
                        found: items.len(),
                    });
                }
                self.encode_all(items.iter().map(|item| (*element, item)))
            }
            CodecNode::Tuple(members) => self.encode_tuple(members, value),
            CodecNode::Struct(fields) => {
                let map = value.as_map().ok_or_else(|| mismatch("map", value))?;
                for field in fields {
                    match map.get(&field.name) {
                        Some(v) => self.encode(field.ty, v)?,
                        None if compiler::node(self.registry, field.ty)?.accepts_absent() => {
                            self.encode(field.ty, &Value::Null)?
                        }
                        None => return Err(CodecError::MissingField(field.name.clone())),
                    }
                }
                Ok(())
            }
            CodecNode::Enum(codec) => {
                let selected = adapter::select_variant(value, codec)?;
                self.out.push(selected.tag);
                match selected.payload_ty {
                    Some(ty) => self.encode(ty, selected.payload),
                    None => Ok(()),
                }
            }
            CodecNode::NativeOption {
                none,
                some,
                payload,
            } => {
                if value.is_null() {
                    self.out.push(*none);
                    return Ok(());
                }
                self.out.push(*some);
                self.encode(*payload, value)
            }
        }
    }

    fn encode_tuple(&mut self, members: &[TypeId], value: &Value) -> Result<(), CodecError> {
        if members.is_empty() {
            return match value {
                Value::Null => Ok(()),
                Value::List(items) if items.is_empty() => Ok(()),
                other => Err(mismatch("null or empty list", other)),
            };
        }
        let items = value.as_list().ok_or_else(|| mismatch("list", value))?;
        if items.len() != members.len() {
            return Err(CodecError::ArityMismatch {
                expected: members.len(),
                found: items.len(),
            });
        }
        self.encode_all(members.iter().copied().zip(items))
    }

    fn encode_all<'v>(
        &mut self,
        pairs: impl Iterator<Item = (TypeId, &'v Value)>,
    ) -> Result<(), CodecError> {
        for (ty, item) in pairs {
            self.encode(ty, item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(types: &str, ty: &str, value: Value) -> Result<Vec<u8>, CodecError> {
        let registry = Registry::parse(types).unwrap();
        let id = registry.resolve(ty).unwrap();
        let mut out = Vec::new();
        Encoder::new(&registry, &mut out).encode(id, &value)?;
        Ok(out)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(encode("", "bool", Value::Bool(true)).unwrap(), [1]);
        assert_eq!(encode("", "i16", Value::Integer(-2)).unwrap(), [0xfe, 0xff]);
        assert_eq!(encode("", "str", Value::from("ab")).unwrap(), [0x08, b'a', b'b']);
        assert_eq!(encode("", "@u32", Value::Integer(64)).unwrap(), [0x01, 0x01]);
    }

    #[test]
    fn test_bool_rejects_integer() {
        assert!(matches!(
            encode("", "bool", Value::Integer(1)),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_sequences_and_arrays() {
        assert_eq!(
            encode("", "[u16]", Value::list([1u16, 2])).unwrap(),
            [0x08, 1, 0, 2, 0]
        );
        assert_eq!(
            encode("", "[u16; 2]", Value::list([1u16, 2])).unwrap(),
            [1, 0, 2, 0]
        );
        assert_eq!(
            encode("", "[u16; 3]", Value::list([1u16, 2])),
            Err(CodecError::ArityMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_byte_blobs() {
        assert_eq!(encode("", "[u8]", Value::from("0x0102")).unwrap(), [0x08, 1, 2]);
        assert_eq!(encode("", "[u8; 2]", Value::from("hi")).unwrap(), b"hi");
        assert!(matches!(
            encode("", "[u8; 3]", Value::from("hi")),
            Err(CodecError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_unit_accepts_null_or_empty_list() {
        assert_eq!(encode("", "()", Value::Null).unwrap(), Vec::<u8>::new());
        assert_eq!(encode("", "()", Value::List(vec![])).unwrap(), Vec::<u8>::new());
        assert!(encode("", "()", Value::Integer(0)).is_err());
    }

    #[test]
    fn test_struct_fields() {
        let types = "P = {a: u8, b: <_None, _Some: u8>}";
        assert_eq!(
            encode(types, "P", Value::map([("a", 1u8)])).unwrap(),
            [1, 0]
        );
        assert_eq!(
            encode(types, "P", Value::map([("a", 1u8), ("b", 2u8)])).unwrap(),
            [1, 1, 2]
        );
        assert_eq!(
            encode(types, "P", Value::map([("b", 2u8)])),
            Err(CodecError::MissingField("a".to_string()))
        );
    }

    #[test]
    fn test_enum_forms() {
        let types = "E = <A, B: u8, C::5>";
        assert_eq!(encode(types, "E", Value::variant("A", ())).unwrap(), [0]);
        assert_eq!(encode(types, "E", Value::variant("B", 7u8)).unwrap(), [1, 7]);
        assert_eq!(encode(types, "E", Value::tagged("B", 7u8)).unwrap(), [1, 7]);
        assert_eq!(encode(types, "E", Value::variant("C", ())).unwrap(), [5]);
        assert_eq!(
            encode(types, "E", Value::variant("D", ())),
            Err(CodecError::UnknownVariant("D".to_string()))
        );
        assert_eq!(
            encode(types, "E", Value::variant("A", 1u8)),
            Err(CodecError::UnexpectedPayload("A".to_string()))
        );
    }
}
