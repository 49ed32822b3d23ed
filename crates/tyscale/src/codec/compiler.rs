// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor -> codec node compilation.
//!
//! Nodes live in the registry's cache, one per [`TypeId`]. Children are
//! referenced by id and fetched from the same cache, so recursive types
//! compile without recursion.

use crate::descriptor::{EnumDescriptor, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeId};
use crate::error::CodecError;
use crate::registry::Registry;
use std::collections::HashMap;
use std::sync::Arc;

/// Compiled form of one descriptor.
#[derive(Debug)]
pub(crate) enum CodecNode {
    Bool,
    /// Fixed-width little-endian integer.
    Int(PrimitiveKind),
    Str,
    /// Compact integer bounded by the width of the wrapped primitive.
    Compact(PrimitiveKind),
    /// `[u8]` or `[u8; len]`: copied as one blob.
    Bytes { len: Option<usize> },
    /// `zero_sized` elements occupy no bytes on the wire.
    Sequence { element: TypeId, zero_sized: bool },
    Array { element: TypeId, len: usize },
    Tuple(Vec<TypeId>),
    Struct(Vec<FieldDescriptor>),
    Enum(EnumCodec),
    /// `<_None, _Some:T>`, represented as null or the bare payload.
    NativeOption { none: u8, some: u8, payload: TypeId },
}

/// Variant lookup tables for one enum.
#[derive(Debug)]
pub(crate) struct EnumCodec {
    by_name: HashMap<String, (u8, Option<TypeId>)>,
    by_tag: HashMap<u8, (String, Option<TypeId>)>,
}

impl EnumCodec {
    fn new(desc: &EnumDescriptor) -> Self {
        let mut by_name = HashMap::with_capacity(desc.variants.len());
        let mut by_tag = HashMap::with_capacity(desc.variants.len());
        for v in &desc.variants {
            by_name.insert(v.name.clone(), (v.index, v.payload));
            by_tag.insert(v.index, (v.name.clone(), v.payload));
        }
        Self { by_name, by_tag }
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<(u8, Option<TypeId>)> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn by_tag(&self, tag: u8) -> Option<(&str, Option<TypeId>)> {
        self.by_tag.get(&tag).map(|(name, payload)| (name.as_str(), *payload))
    }

    pub(crate) fn has_variant(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

impl CodecNode {
    /// Whether a missing struct field of this type encodes as null.
    pub(crate) fn accepts_absent(&self) -> bool {
        matches!(self, Self::NativeOption { .. })
    }
}

/// Fetch the node for `id`, compiling it on first use.
///
/// Two threads racing on the same id may both compile; the first insert
/// wins and both results are equivalent.
pub(crate) fn node(registry: &Registry, id: TypeId) -> Result<Arc<CodecNode>, CodecError> {
    if let Some(node) = registry.codec_cache().get(&id) {
        return Ok(Arc::clone(node.value()));
    }
    let node = Arc::new(compile(registry, id)?);
    log::debug!("compiled codec for {} ({})", registry.render(id), id);
    Ok(Arc::clone(
        registry.codec_cache().entry(id).or_insert(node).value(),
    ))
}

/// Compile `root` and everything reachable from it.
pub(crate) fn compile_reachable(registry: &Registry, root: TypeId) -> Result<(), CodecError> {
    let mut pending = vec![root];
    let mut seen = std::collections::HashSet::new();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let compiled = node(registry, id)?;
        match &*compiled {
            CodecNode::Sequence { element, .. } | CodecNode::Array { element, .. } => {
                pending.push(*element)
            }
            CodecNode::Tuple(members) => pending.extend(members.iter().copied()),
            CodecNode::Struct(fields) => pending.extend(fields.iter().map(|f| f.ty)),
            CodecNode::Enum(e) => pending.extend(e.by_name.values().filter_map(|(_, p)| *p)),
            CodecNode::NativeOption { payload, .. } => pending.push(*payload),
            CodecNode::Bool
            | CodecNode::Int(_)
            | CodecNode::Str
            | CodecNode::Compact(_)
            | CodecNode::Bytes { .. } => {}
        }
    }
    Ok(())
}

fn is_u8(registry: &Registry, id: TypeId) -> bool {
    matches!(
        registry.descriptor(id),
        Some(TypeDescriptor::Primitive(PrimitiveKind::U8))
    )
}

/// Whether values of `id` always encode to zero bytes.
fn is_zero_sized(registry: &Registry, id: TypeId) -> bool {
    let mut pending = vec![id];
    let mut seen = std::collections::HashSet::new();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        match registry.descriptor(id) {
            Some(TypeDescriptor::Tuple(members)) => pending.extend(members),
            Some(TypeDescriptor::Struct(fields)) => pending.extend(fields.iter().map(|f| f.ty)),
            Some(TypeDescriptor::Array { len: 0, .. }) => {}
            Some(TypeDescriptor::Array { element, .. }) => pending.push(element),
            _ => return false,
        }
    }
    true
}

/// Whether `id` may itself be represented as null. A native option over
/// such a payload would read two byte strings back as the same value, so
/// it keeps the tagged enum form instead.
fn holds_null(registry: &Registry, id: TypeId) -> bool {
    match registry.descriptor(id) {
        Some(TypeDescriptor::Tuple(members)) => members.is_empty(),
        Some(TypeDescriptor::Enum(e)) => e.native_option().is_some(),
        _ => false,
    }
}

fn compile(registry: &Registry, id: TypeId) -> Result<CodecNode, CodecError> {
    let desc = registry
        .descriptor(id)
        .ok_or(CodecError::UnknownTypeId(id))?;

    Ok(match desc {
        TypeDescriptor::Primitive(PrimitiveKind::Bool) => CodecNode::Bool,
        TypeDescriptor::Primitive(PrimitiveKind::Str) => CodecNode::Str,
        TypeDescriptor::Primitive(kind) => CodecNode::Int(kind),
        TypeDescriptor::Compact(inner) => match registry.descriptor(inner) {
            Some(TypeDescriptor::Primitive(kind)) if kind.is_unsigned() => CodecNode::Compact(kind),
            _ => {
                return Err(CodecError::TypeMismatch {
                    expected: "unsigned integer inside compact".to_string(),
                    found: registry.render(inner),
                })
            }
        },
        TypeDescriptor::Sequence(element) if is_u8(registry, element) => {
            CodecNode::Bytes { len: None }
        }
        TypeDescriptor::Sequence(element) => CodecNode::Sequence {
            element,
            zero_sized: is_zero_sized(registry, element),
        },
        TypeDescriptor::Array { element, len } if is_u8(registry, element) => {
            CodecNode::Bytes { len: Some(len) }
        }
        TypeDescriptor::Array { element, len } => CodecNode::Array { element, len },
        TypeDescriptor::Tuple(members) => CodecNode::Tuple(members),
        TypeDescriptor::Struct(fields) => CodecNode::Struct(fields),
        TypeDescriptor::Enum(e) => match (e.native_option(), e.variants.as_slice()) {
            (Some(payload), [none, some]) if !holds_null(registry, payload) => {
                CodecNode::NativeOption {
                    none: none.index,
                    some: some.index,
                    payload,
                }
            }
            _ => CodecNode::Enum(EnumCodec::new(&e)),
        },
    })
}
