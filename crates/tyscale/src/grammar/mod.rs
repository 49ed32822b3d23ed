// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type definition language.
//!
//! One definition per line (or `;`-separated), in either the anonymous
//! positional form or the named form:
//!
//! ```text
//! #u8                       // 0: primitive
//! [0]                       // 1: sequence of #0
//! (0,1)                     // 2: tuple
//! Option<T> = <None, Some:T>
//! Person = {
//!     name: str,
//!     age: @u32,
//! }
//! ```
//!
//! Parsing yields unresolved [`TypeExpr`] trees; the registry resolver turns
//! them into descriptors.

mod lexer;
mod parser;

pub use parser::{parse_definitions, parse_type_expr};

use std::fmt;

/// An unresolved type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `#name`
    Primitive(String),
    /// Positional reference (`0`, `1`, ...).
    Index(usize),
    /// A name with optional type arguments: `Person`, `u32`, `Option<T>`.
    Named { name: String, args: Vec<TypeExpr> },
    /// `@inner`
    Compact(Box<TypeExpr>),
    /// `[element]`
    Sequence(Box<TypeExpr>),
    /// `[element; len]`
    Array(Box<TypeExpr>, usize),
    /// `(a, b, ...)`
    Tuple(Vec<TypeExpr>),
    /// `<A, B:payload, C::5>`
    Enum(Vec<VariantExpr>),
    /// `{name: ty, ...}`
    Struct(Vec<FieldExpr>),
}

impl TypeExpr {
    /// A plain name without type arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// One enum variant as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantExpr {
    pub name: String,
    pub payload: Option<TypeExpr>,
    /// Explicit tag, if given.
    pub index: Option<u64>,
}

/// One struct field as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldExpr {
    pub name: String,
    pub ty: TypeExpr,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// `None` for anonymous positional definitions.
    pub name: Option<String>,
    /// Formal parameters; non-empty only for generic declarations.
    pub params: Vec<String>,
    pub body: TypeExpr,
    /// 1-based line where the statement starts.
    pub line: usize,
}

impl Definition {
    pub fn is_generic(&self) -> bool {
        !self.params.is_empty()
    }

    /// Name used in diagnostics: the declared name or `#position`.
    pub fn label(&self, position: usize) -> String {
        match &self.name {
            Some(name) if self.params.is_empty() => name.clone(),
            Some(name) => format!("{}<{}>", name, self.params.join(",")),
            None => format!("#{}", position),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(name) => write!(f, "#{}", name),
            Self::Index(i) => write!(f, "{}", i),
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args)?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Compact(inner) => write!(f, "@{}", inner),
            Self::Sequence(inner) => write!(f, "[{}]", inner),
            Self::Array(inner, len) => write!(f, "[{};{}]", inner, len),
            Self::Tuple(members) => {
                f.write_str("(")?;
                write_list(f, members)?;
                f.write_str(")")
            }
            Self::Enum(variants) => {
                f.write_str("<")?;
                write_list(f, variants)?;
                f.write_str(">")
            }
            Self::Struct(fields) => {
                f.write_str("{")?;
                write_list(f, fields)?;
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for VariantExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match (&self.payload, self.index) {
            (Some(ty), Some(i)) => write!(f, ":{}:{}", ty, i),
            (Some(ty), None) => write!(f, ":{}", ty),
            (None, Some(i)) => write!(f, "::{}", i),
            (None, None) => Ok(()),
        }
    }
}

impl fmt::Display for FieldExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}
