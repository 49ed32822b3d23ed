// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tyscale - SCALE-style binary codecs from a type DSL
//!
//! Describe types in a small text language, resolve them (generics
//! included) into a registry of descriptors, and get compiled
//! encoder/decoder pairs that produce a compact little-endian wire format.
//!
//! ## Quick Start
//!
//! ```rust
//! use tyscale::{Registry, Value};
//!
//! # fn main() -> tyscale::Result<()> {
//! let registry = Registry::parse(
//!     "
//!     Option<T> = <None, Some: T>
//!     Person = { name: str, age: u32, nick: Option<str> }
//!     ",
//! )?;
//!
//! let codec = registry.codec("Person")?;
//! let tom = Value::map([
//!     ("name", Value::from("Tom")),
//!     ("age", Value::from(9u32)),
//!     ("nick", Value::variant("None", ())),
//! ]);
//! let bytes = codec.encode(&tom)?;
//! assert_eq!(bytes, [0x0c, b'T', b'o', b'm', 9, 0, 0, 0, 0]);
//! assert_eq!(codec.decode(&bytes)?, tom);
//! # Ok(())
//! # }
//! ```
//!
//! ## Type language
//!
//! ```text
//! #u8                  primitive (bool, u8..u256, i8..i256, str)
//! @0                   compact integer of the type at position 0
//! [u16]  [u8; 32]      sequence / fixed array
//! (u8, str)            tuple, `()` is the unit type
//! <A, B: u32, C::7>    enum: variants, optional payload, optional tag
//! {name: str}          struct
//! Name<T> = [T]        named and generic definitions
//! ```
//!
//! Definitions are separated by newlines or `;`; a definition may span
//! several lines while brackets are open. Every top-level definition also
//! gets a position (`0`, `1`, ...) usable as a reference.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Resolved descriptors, names, generic declarations, codec cache |
//! | [`Codec`] | Encoder/decoder for one type |
//! | [`Value`] | Host-level value handed to / returned by codecs |
//! | [`TypeDescriptor`] | Structural description of one type |
//! | [`RegistryBuilder`] | Registry construction without DSL text |
//!
//! ## Features
//!
//! - `json` (default): conversions between [`Value`] and `serde_json::Value`.

mod adapter;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod grammar;
#[cfg(feature = "json")]
pub mod json;
pub mod registry;
pub mod value;

pub use codec::{Codec, TypeRef};
pub use descriptor::{
    EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeId,
};
pub use error::{CodecError, Error, ParseError, ResolveError, Result};
pub use grammar::{parse_definitions, parse_type_expr};
pub use registry::{EnumBuilder, Registry, RegistryBuilder, StructBuilder};
pub use value::Value;

/// Parse and resolve DSL text into a registry.
pub fn parse_types(text: &str) -> Result<Registry> {
    Registry::parse(text)
}

/// Codec of `ty` in `registry`.
pub fn codec(ty: impl Into<TypeRef>, registry: &Registry) -> Result<Codec> {
    registry.codec(ty)
}

fn registry_or_empty(registry: Option<&Registry>) -> Registry {
    registry.cloned().unwrap_or_else(Registry::empty)
}

/// Encode `value` as `ty`.
///
/// Without a registry only anonymous types over primitives can be named,
/// e.g. `"(u32, [u8])"`.
pub fn encode(value: &Value, ty: impl Into<TypeRef>, registry: Option<&Registry>) -> Result<Vec<u8>> {
    let codec = registry_or_empty(registry).codec(ty)?;
    Ok(codec.encode(value)?)
}

/// Decode `bytes` as `ty`; the whole buffer must be consumed.
pub fn decode(bytes: &[u8], ty: impl Into<TypeRef>, registry: Option<&Registry>) -> Result<Value> {
    let codec = registry_or_empty(registry).codec(ty)?;
    Ok(codec.decode(bytes)?)
}

/// [`encode`] against a registry parsed from `types`.
pub fn encode_with_types(value: &Value, ty: impl Into<TypeRef>, types: &str) -> Result<Vec<u8>> {
    encode(value, ty, Some(&Registry::parse(types)?))
}

/// [`decode`] against a registry parsed from `types`.
pub fn decode_with_types(bytes: &[u8], ty: impl Into<TypeRef>, types: &str) -> Result<Value> {
    decode(bytes, ty, Some(&Registry::parse(types)?))
}
