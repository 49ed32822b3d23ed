// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire -> value decoding.

use super::compact;
use super::compiler::{self, CodecNode};
use super::wire::Reader;
use crate::adapter;
use crate::descriptor::TypeId;
use crate::error::CodecError;
use crate::registry::Registry;
use crate::value::Value;
use std::collections::BTreeMap;

/// Deepest value nesting accepted from the wire.
pub(crate) const MAX_DEPTH: usize = 256;

/// Longest sequence of zero-sized elements accepted from the wire.
pub(crate) const MAX_ZERO_SIZED_LEN: usize = 65536;

pub(crate) struct Decoder<'a> {
    registry: &'a Registry,
    reader: Reader<'a>,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(registry: &'a Registry, bytes: &'a [u8]) -> Self {
        Self {
            registry,
            reader: Reader::new(bytes),
            depth: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.reader.position()
    }

    pub(crate) fn decode(&mut self, id: TypeId) -> Result<Value, CodecError> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::NestingTooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.decode_node(id);
        self.depth -= 1;
        result
    }

    fn decode_node(&mut self, id: TypeId) -> Result<Value, CodecError> {
        let node = compiler::node(self.registry, id)?;
        match &*node {
            CodecNode::Bool => match self.reader.read_u8()? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(CodecError::InvalidBool(other)),
            },
            CodecNode::Int(kind) => {
                let size = kind.size().unwrap_or(0);
                let bytes = self.reader.read_bytes(size)?;
                Ok(adapter::read_int(bytes, *kind))
            }
            CodecNode::Str => {
                let len = compact::decode_len(&mut self.reader)?;
                let bytes = self.reader.read_bytes(len)?;
                std::str::from_utf8(bytes)
                    .map(|text| Value::Text(text.to_string()))
                    .map_err(|e| CodecError::InvalidUtf8(e.to_string()))
            }
            CodecNode::Compact(kind) => {
                let n = compact::decode_big(&mut self.reader)?;
                adapter::from_unsigned(n, *kind)
            }
            CodecNode::Bytes { len } => {
                let len = match len {
                    Some(len) => *len,
                    None => compact::decode_len(&mut self.reader)?,
                };
                Ok(Value::Bytes(self.reader.read_bytes(len)?.to_vec()))
            }
            CodecNode::Sequence {
                element,
                zero_sized,
            } => {
                let count = compact::decode_len(&mut self.reader)?;
                if *zero_sized && count > MAX_ZERO_SIZED_LEN {
                    return Err(CodecError::SequenceTooLong {
                        len: count,
                        limit: MAX_ZERO_SIZED_LEN,
                    });
                }
                // every non-zero-sized element takes at least one byte
                let capacity = if *zero_sized {
                    count
                } else {
                    count.min(self.reader.remaining())
                };
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(self.decode(*element)?);
                }
                Ok(Value::List(items))
            }
            CodecNode::Array { element, len } => {
                let mut items = Vec::with_capacity((*len).min(self.reader.remaining().max(1)));
                for _ in 0..*len {
                    items.push(self.decode(*element)?);
                }
                Ok(Value::List(items))
            }
            CodecNode::Tuple(members) if members.is_empty() => Ok(Value::Null),
            CodecNode::Tuple(members) => {
                let mut items = Vec::with_capacity(members.len());
                for member in members {
                    items.push(self.decode(*member)?);
                }
                Ok(Value::List(items))
            }
            CodecNode::Struct(fields) => {
                let mut map = BTreeMap::new();
                for field in fields {
                    let value = self.decode(field.ty)?;
                    map.insert(field.name.clone(), value);
                }
                Ok(Value::Map(map))
            }
            CodecNode::Enum(codec) => {
                let tag = self.reader.read_u8()?;
                let (name, payload_ty) = codec.by_tag(tag).ok_or(CodecError::InvalidEnumTag(tag))?;
                let payload = match payload_ty {
                    Some(ty) => self.decode(ty)?,
                    None => Value::Null,
                };
                Ok(Value::variant(name, payload))
            }
            CodecNode::NativeOption {
                none,
                some,
                payload,
            } => {
                let tag = self.reader.read_u8()?;
                if tag == *none {
                    Ok(Value::Null)
                } else if tag == *some {
                    self.decode(*payload)
                } else {
                    Err(CodecError::InvalidEnumTag(tag))
                }
            }
        }
    }
}
