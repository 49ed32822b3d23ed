// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: the closed set of type shapes a registry can hold.

use std::fmt;

/// Index of a descriptor inside a registry's arena.
///
/// Ids are only meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
    Str,
}

impl PrimitiveKind {
    /// Every primitive, in declaration order.
    pub const ALL: [PrimitiveKind; 14] = [
        Self::Bool,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::U128,
        Self::U256,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::I128,
        Self::I256,
        Self::Str,
    ];

    /// Look up a primitive by its DSL name (`u32`, `str`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// DSL name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::U256 => "u256",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::I256 => "i256",
            Self::Str => "str",
        }
    }

    /// Encoded size in bytes (None for strings).
    pub fn size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 => Some(4),
            Self::U64 | Self::I64 => Some(8),
            Self::U128 | Self::I128 => Some(16),
            Self::U256 | Self::I256 => Some(32),
            Self::Str => None,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::Str)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::I128 | Self::I256
        )
    }

    pub fn is_unsigned(self) -> bool {
        self.is_integer() && !self.is_signed()
    }

    /// Whether every value of this integer kind fits in an `i64`.
    ///
    /// Decoders produce `Value::Integer` for these kinds and
    /// `Value::BigInteger` for the rest.
    pub fn fits_native(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::U16 | Self::U32 | Self::I8 | Self::I16 | Self::I32 | Self::I64
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete type descriptor.
///
/// Composite shapes refer to their members by [`TypeId`], so descriptors
/// may form cycles through the registry without owning each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Fixed-width integer, bool or string.
    Primitive(PrimitiveKind),
    /// Variable-length unsigned integer wrapping an unsigned primitive.
    Compact(TypeId),
    /// Variable-length homogeneous list.
    Sequence(TypeId),
    /// Fixed-length homogeneous list.
    Array { element: TypeId, len: usize },
    /// Heterogeneous product without names. The empty tuple is the unit type.
    Tuple(Vec<TypeId>),
    /// Tagged union.
    Enum(EnumDescriptor),
    /// Named product; field order is encoding order.
    Struct(Vec<FieldDescriptor>),
}

impl TypeDescriptor {
    /// The unit type `()`.
    pub fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Tuple(members) if members.is_empty())
    }

    /// Get fields if this is a struct.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Get the enum descriptor if this is an enum.
    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Every type id this descriptor refers to.
    pub fn references(&self) -> Vec<TypeId> {
        match self {
            Self::Primitive(_) => Vec::new(),
            Self::Compact(inner) | Self::Sequence(inner) => vec![*inner],
            Self::Array { element, .. } => vec![*element],
            Self::Tuple(members) => members.clone(),
            Self::Enum(e) => e.variants.iter().filter_map(|v| v.payload).collect(),
            Self::Struct(fields) => fields.iter().map(|f| f.ty).collect(),
        }
    }
}

/// Field descriptor for struct members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypeId,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Enumeration (tagged union) descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    /// Variants in declaration order.
    pub variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    pub fn new(variants: Vec<EnumVariant>) -> Self {
        Self { variants }
    }

    /// Get variant by name.
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Get variant by wire tag.
    pub fn variant_by_index(&self, index: u8) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.index == index)
    }

    /// Payload type when this enum follows the native option convention
    /// (exactly `_None` without payload and `_Some` with one).
    pub fn native_option(&self) -> Option<TypeId> {
        match self.variants.as_slice() {
            [none, some] if none.name == "_None" && none.payload.is_none() && some.name == "_Some" => {
                some.payload
            }
            _ => None,
        }
    }
}

/// Enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    /// Variant name.
    pub name: String,
    /// Wire tag.
    pub index: u8,
    /// Payload type, if the variant carries one.
    pub payload: Option<TypeId>,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, index: u8, payload: Option<TypeId>) -> Self {
        Self {
            name: name.into(),
            index,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_size() {
        assert_eq!(PrimitiveKind::Bool.size(), Some(1));
        assert_eq!(PrimitiveKind::U32.size(), Some(4));
        assert_eq!(PrimitiveKind::I128.size(), Some(16));
        assert_eq!(PrimitiveKind::U256.size(), Some(32));
        assert_eq!(PrimitiveKind::Str.size(), None);
    }

    #[test]
    fn test_primitive_names_roundtrip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("f64"), None);
    }

    #[test]
    fn test_native_width() {
        assert!(PrimitiveKind::U32.fits_native());
        assert!(PrimitiveKind::I64.fits_native());
        assert!(!PrimitiveKind::U64.fits_native());
        assert!(!PrimitiveKind::I128.fits_native());
    }

    #[test]
    fn test_enum_descriptor() {
        let e = EnumDescriptor::new(vec![
            EnumVariant::new("Red", 0, None),
            EnumVariant::new("Green", 1, None),
            EnumVariant::new("Blue", 5, Some(TypeId(3))),
        ]);

        assert_eq!(e.variant("Green").map(|v| v.index), Some(1));
        assert_eq!(e.variant_by_index(5).map(|v| v.name.as_str()), Some("Blue"));
        assert!(e.variant_by_index(2).is_none());
        assert!(e.native_option().is_none());
    }

    #[test]
    fn test_native_option_detection() {
        let e = EnumDescriptor::new(vec![
            EnumVariant::new("_None", 0, None),
            EnumVariant::new("_Some", 1, Some(TypeId(7))),
        ]);
        assert_eq!(e.native_option(), Some(TypeId(7)));
    }

    #[test]
    fn test_struct_field_lookup() {
        let desc = TypeDescriptor::Struct(vec![
            FieldDescriptor::new("name", TypeId(0)),
            FieldDescriptor::new("age", TypeId(1)),
        ]);
        assert_eq!(desc.field("age").map(|f| f.ty), Some(TypeId(1)));
        assert!(desc.field("height").is_none());
        assert_eq!(desc.references(), vec![TypeId(0), TypeId(1)]);
    }
}
