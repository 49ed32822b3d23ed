// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.
//!
//! Four failure classes surface to callers: grammar errors from the DSL
//! parser, resolution errors while building (or lazily extending) a
//! registry, and encode / decode errors from a compiled codec.

use crate::descriptor::TypeId;
use std::fmt;
use thiserror::Error;

/// Malformed DSL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line of the offending token.
    pub line: usize,
    /// 1-based column of the offending token.
    pub column: usize,
    /// What went wrong.
    pub message: String,
    /// The full text of the offending line.
    pub source_line: String,
}

impl ParseError {
    pub(crate) fn new(
        source: &str,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        let source_line = source
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default()
            .trim_end()
            .to_string();
        Self {
            line,
            column,
            message: message.into(),
            source_line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}:{}: {}\n  | {}",
            self.line, self.column, self.message, self.source_line
        )
    }
}

impl std::error::Error for ParseError {}

/// A reference or declaration that cannot be turned into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("unknown primitive `#{0}`")]
    UnknownPrimitive(String),

    #[error("type id {0} is out of range")]
    UnknownTypeId(usize),

    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("`{0}` is not generic but was given type arguments")]
    NotGeneric(String),

    #[error("generic type `{0}` used without type arguments")]
    MissingTypeArguments(String),

    #[error("`{0}` expands to itself without indirection")]
    InfiniteType(String),

    #[error("instantiation of `{0}` exceeds the maximum nesting depth")]
    InstantiationTooDeep(String),

    #[error("`{0}` is declared more than once")]
    DuplicateName(String),

    #[error("`{0}` is a primitive type name and cannot be redefined")]
    ReservedName(String),

    #[error("enum variant `{0}` is declared more than once")]
    DuplicateVariant(String),

    #[error("enum tag {index} of variant `{name}` collides with another variant")]
    DuplicateVariantIndex { name: String, index: u8 },

    #[error("enum tag {index} of variant `{name}` does not fit in one byte")]
    InvalidVariantIndex { name: String, index: u64 },

    #[error("enum has more than 256 variants")]
    TooManyVariants,

    #[error("struct field `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("compact encoding requires an unsigned integer, found `{0}`")]
    InvalidCompact(String),

    #[error("type slot {0} was reserved but never defined")]
    UndefinedSlot(TypeId),

    #[error("in definition `{definition}` (line {line}): {source}")]
    InDefinition {
        line: usize,
        definition: String,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    pub(crate) fn in_definition(self, line: usize, definition: impl Into<String>) -> Self {
        match self {
            err @ Self::InDefinition { .. } => err,
            other => Self::InDefinition {
                line,
                definition: definition.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Encode and decode failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    // Encode side
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("length mismatch: expected {expected} element(s), found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("unknown enum variant `{0}`")]
    UnknownVariant(String),

    #[error("enum variant `{0}` carries no payload")]
    UnexpectedPayload(String),

    #[error("missing struct field `{0}`")]
    MissingField(String),

    #[error("integer {value} does not fit in {ty}")]
    IntegerOutOfRange { value: String, ty: String },

    #[error("invalid hex text: {0}")]
    InvalidHex(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    // Decode side
    #[error("buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    #[error("no enum variant with tag {0}")]
    InvalidEnumTag(u8),

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(String),

    #[error("non-canonical compact integer encoding")]
    NonCanonicalCompact,

    #[error("sequence of {len} zero-sized elements exceeds the limit of {limit}")]
    SequenceTooLong { len: usize, limit: usize },

    #[error("value nesting exceeds the limit of {0} levels")]
    NestingTooDeep(usize),

    #[error("{0} trailing byte(s) after decoded value")]
    TrailingBytes(usize),

    #[error("no codec for type id {0}")]
    UnknownTypeId(TypeId),
}

/// Top-level error for the convenience API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("grammar error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, Error>;
