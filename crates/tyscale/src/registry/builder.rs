// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Programmatic registry construction.
//!
//! For callers that already hold type information in structured form and
//! do not want to go through DSL text.

use super::resolver::{check_shape, validate};
use super::{Registry, TypeTable};
use crate::descriptor::{
    EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeId,
};
use crate::error::ResolveError;

/// Builder for [`Registry`] instances.
///
/// ```
/// use tyscale::{PrimitiveKind, RegistryBuilder, StructBuilder};
///
/// let mut builder = RegistryBuilder::new();
/// let name = builder.primitive(PrimitiveKind::Str);
/// let age = builder.primitive(PrimitiveKind::U32);
/// builder
///     .add_named("Person", StructBuilder::new().field("name", name).field("age", age).build())
///     .unwrap();
/// let registry = builder.build().unwrap();
/// assert!(registry.lookup("Person").is_some());
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    table: TypeTable,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a primitive without giving it a position.
    pub fn primitive(&mut self, kind: PrimitiveKind) -> TypeId {
        self.table.intern(TypeDescriptor::Primitive(kind))
    }

    /// Intern any descriptor without giving it a position.
    pub fn intern(&mut self, desc: TypeDescriptor) -> Result<TypeId, ResolveError> {
        check_shape(&desc)?;
        Ok(self.table.intern(desc))
    }

    /// Append a positional definition.
    pub fn add(&mut self, desc: TypeDescriptor) -> Result<TypeId, ResolveError> {
        let id = self.intern(desc)?;
        self.table.positions.push(Some(id));
        self.table.position_names.push(None);
        Ok(id)
    }

    /// Append a named positional definition.
    pub fn add_named(
        &mut self,
        name: impl Into<String>,
        desc: TypeDescriptor,
    ) -> Result<TypeId, ResolveError> {
        let name = name.into();
        self.check_name(&name)?;
        let id = self.add(desc)?;
        if let Some(last) = self.table.position_names.last_mut() {
            *last = Some(name.clone());
        }
        self.table.bind_name(name, id);
        Ok(id)
    }

    /// Reserve a named positional slot for a recursive type; fill it later
    /// with [`define`](Self::define).
    pub fn reserve(&mut self, name: impl Into<String>) -> Result<TypeId, ResolveError> {
        let name = name.into();
        self.check_name(&name)?;
        let slot = self.table.reserve();
        self.table.positions.push(Some(slot));
        self.table.position_names.push(Some(name.clone()));
        self.table.bind_name(name, slot);
        Ok(slot)
    }

    /// Fill a slot obtained from [`reserve`](Self::reserve).
    pub fn define(&mut self, slot: TypeId, desc: TypeDescriptor) -> Result<(), ResolveError> {
        if !self.table.contains(slot) || self.table.is_filled(slot) {
            return Err(ResolveError::UnknownTypeId(slot.index()));
        }
        check_shape(&desc)?;
        self.table.fill(slot, desc);
        Ok(())
    }

    /// Check the closed-world invariant and freeze the registry.
    pub fn build(self) -> Result<Registry, ResolveError> {
        validate(&self.table, 0)?;
        log::debug!(
            "registry built programmatically: {} positions, {} descriptors",
            self.table.positions.len(),
            self.table.len()
        );
        Ok(Registry::from_table(self.table))
    }

    fn check_name(&self, name: &str) -> Result<(), ResolveError> {
        if PrimitiveKind::from_name(name).is_some() {
            return Err(ResolveError::ReservedName(name.to_string()));
        }
        if self.table.names.contains_key(name) {
            return Err(ResolveError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

/// Fluent builder for struct descriptors.
#[derive(Debug, Default)]
pub struct StructBuilder {
    fields: Vec<FieldDescriptor>,
}

impl StructBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; fields encode in the order they are added.
    pub fn field(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::Struct(self.fields)
    }
}

/// Fluent builder for enum descriptors.
///
/// Variants without an explicit tag take their position, as in the DSL.
#[derive(Debug, Default)]
pub struct EnumBuilder {
    variants: Vec<EnumVariant>,
}

impl EnumBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self) -> u8 {
        self.variants.len() as u8
    }

    /// Add a variant without payload.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        let index = self.position();
        self.variants.push(EnumVariant::new(name, index, None));
        self
    }

    /// Add a variant carrying a payload.
    pub fn payload(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        let index = self.position();
        self.variants.push(EnumVariant::new(name, index, Some(ty)));
        self
    }

    /// Add a variant with an explicit tag.
    pub fn variant_at(mut self, name: impl Into<String>, index: u8, payload: Option<TypeId>) -> Self {
        self.variants.push(EnumVariant::new(name, index, payload));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::Enum(EnumDescriptor::new(self.variants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_matches_dsl() {
        let mut builder = RegistryBuilder::new();
        let str_id = builder.primitive(PrimitiveKind::Str);
        let u32_id = builder.primitive(PrimitiveKind::U32);
        builder
            .add_named(
                "Person",
                StructBuilder::new()
                    .field("name", str_id)
                    .field("age", u32_id)
                    .build(),
            )
            .unwrap();
        let built = builder.build().unwrap();

        let parsed = Registry::parse("Person = {name: str, age: u32}").unwrap();
        let a = built.descriptor(built.lookup("Person").unwrap()).unwrap();
        let b = parsed.descriptor(parsed.lookup("Person").unwrap()).unwrap();
        assert_eq!(built.render(built.lookup("Person").unwrap()), "Person");
        assert_eq!(a.fields().map(<[_]>::len), b.fields().map(<[_]>::len));
    }

    #[test]
    fn test_enum_builder_positions() {
        let desc = EnumBuilder::new()
            .variant("Red")
            .variant("Green")
            .variant_at("Blue", 5, None)
            .build();
        let e = desc.as_enum().unwrap();
        assert_eq!(e.variant("Green").map(|v| v.index), Some(1));
        assert_eq!(e.variant("Blue").map(|v| v.index), Some(5));
    }

    #[test]
    fn test_recursive_via_reserve() {
        let mut builder = RegistryBuilder::new();
        let u8_id = builder.primitive(PrimitiveKind::U8);
        let list = builder.reserve("List").unwrap();
        let cell = builder
            .intern(TypeDescriptor::Tuple(vec![u8_id, list]))
            .unwrap();
        builder
            .define(list, EnumBuilder::new().variant("Nil").payload("Cons", cell).build())
            .unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.type_at(0).unwrap(), list);
    }

    #[test]
    fn test_unfilled_slot_rejected() {
        let mut builder = RegistryBuilder::new();
        let slot = builder.reserve("Later").unwrap();
        assert_eq!(builder.build().unwrap_err(), ResolveError::UndefinedSlot(slot));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut builder = RegistryBuilder::new();
        builder
            .add(TypeDescriptor::Sequence(TypeId::from_index(42)))
            .unwrap();
        assert_eq!(builder.build().unwrap_err(), ResolveError::UnknownTypeId(42));
    }

    #[test]
    fn test_duplicate_variant_rejected() {
        let mut builder = RegistryBuilder::new();
        let desc = EnumBuilder::new().variant("A").variant_at("B", 0, None).build();
        assert!(matches!(
            builder.add(desc),
            Err(ResolveError::DuplicateVariantIndex { .. })
        ));
    }
}
