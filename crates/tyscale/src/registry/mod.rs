// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry.
//!
//! A [`Registry`] owns an arena of [`TypeDescriptor`]s addressed by
//! [`TypeId`], the positional table of top-level definitions, the symbol
//! table of named definitions, and the generic declarations they may
//! instantiate. Structurally identical descriptors share one id.
//!
//! Descriptors are never modified once published. Generic instantiations
//! requested after construction (e.g. `registry.resolve("Option<u64>")`)
//! append new descriptors; existing ids keep their meaning.

mod builder;
mod resolver;

pub use builder::{EnumBuilder, RegistryBuilder, StructBuilder};
pub use resolver::MAX_INSTANTIATION_DEPTH;

use crate::codec::{Codec, CodecNode, TypeRef};
use crate::descriptor::{TypeDescriptor, TypeId};
use crate::error::{ResolveError, Result};
use crate::grammar::{self, Definition, TypeExpr};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Rendering budget, in characters, before falling back to `#id`.
pub const RENDER_BUDGET: usize = 1024;

/// A generic declaration kept unresolved until instantiated.
#[derive(Debug, Clone)]
pub(crate) struct GenericDecl {
    pub params: Vec<String>,
    pub body: TypeExpr,
    pub line: usize,
}

/// Backing store shared by the resolver, the builder and the registry.
#[derive(Debug, Default)]
pub(crate) struct TypeTable {
    /// `None` marks a slot reserved for a recursive type not yet defined.
    slots: Vec<Option<TypeDescriptor>>,
    interned: HashMap<TypeDescriptor, TypeId>,
    /// Top-level definitions in declaration order; generic declarations
    /// occupy a position but have no descriptor.
    pub positions: Vec<Option<TypeId>>,
    /// Declared name of each position, if any.
    pub position_names: Vec<Option<String>>,
    pub names: HashMap<String, TypeId>,
    labels: HashMap<TypeId, String>,
    /// Ids bound to more than one declared name; rendered structurally.
    shared: HashSet<TypeId>,
    pub generics: HashMap<String, GenericDecl>,
    pub instances: HashMap<String, TypeId>,
    expressions: HashMap<String, TypeId>,
}

impl TypeTable {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: TypeId) -> bool {
        id.index() < self.slots.len()
    }

    pub fn intern(&mut self, desc: TypeDescriptor) -> TypeId {
        if let Some(&id) = self.interned.get(&desc) {
            return id;
        }
        let id = TypeId::from_index(self.slots.len());
        self.slots.push(Some(desc.clone()));
        self.interned.insert(desc, id);
        id
    }

    pub fn reserve(&mut self) -> TypeId {
        let id = TypeId::from_index(self.slots.len());
        self.slots.push(None);
        id
    }

    pub fn is_filled(&self, id: TypeId) -> bool {
        self.get(id).is_some()
    }

    pub fn fill(&mut self, slot: TypeId, desc: TypeDescriptor) {
        self.interned.entry(desc.clone()).or_insert(slot);
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = Some(desc);
        }
    }

    pub fn set_label(&mut self, id: TypeId, label: impl Into<String>) {
        if self.shared.contains(&id) || self.get(id).is_some_and(TypeDescriptor::is_primitive) {
            return;
        }
        self.labels.entry(id).or_insert_with(|| label.into());
    }

    /// Bind a declared name. An id reached by two names keeps neither as
    /// its label.
    pub fn bind_name(&mut self, name: String, id: TypeId) {
        if self.names.get(&name) == Some(&id) {
            return;
        }
        if self.names.values().any(|&other| other == id) {
            self.labels.remove(&id);
            self.shared.insert(id);
        } else {
            self.set_label(id, name.clone());
        }
        self.names.insert(name, id);
    }

    /// Drop everything appended since `mark` descriptors existed.
    pub fn rollback(&mut self, mark: usize) {
        self.slots.truncate(mark);
        self.interned.retain(|_, id| id.index() < mark);
        self.labels.retain(|id, _| id.index() < mark);
        self.shared.retain(|id| id.index() < mark);
        self.instances.retain(|_, id| id.index() < mark);
        self.expressions.retain(|_, id| id.index() < mark);
    }

    /// DSL text of `id`. Output past [`RENDER_BUDGET`] characters falls
    /// back to `#id` references.
    pub fn render(&self, id: TypeId) -> String {
        let mut stack = Vec::new();
        let mut budget = RENDER_BUDGET;
        self.render_into(id, &mut stack, &mut budget)
    }

    fn render_into(&self, id: TypeId, stack: &mut Vec<TypeId>, budget: &mut usize) -> String {
        if *budget == 0 {
            return id.to_string();
        }
        *budget -= 1;
        if let Some(label) = self.labels.get(&id) {
            *budget = budget.saturating_sub(label.len());
            return label.clone();
        }
        if stack.contains(&id) {
            return id.to_string();
        }
        let Some(desc) = self.get(id) else {
            return id.to_string();
        };

        stack.push(id);
        let text = self.render_desc(desc, stack, budget);
        stack.pop();
        text
    }

    /// Structure of `id` one level deep, ignoring its own label.
    pub fn render_body(&self, id: TypeId) -> String {
        let Some(desc) = self.get(id) else {
            return id.to_string();
        };
        let mut stack = vec![id];
        let mut budget = RENDER_BUDGET;
        self.render_desc(desc, &mut stack, &mut budget)
    }

    fn render_desc(
        &self,
        desc: &TypeDescriptor,
        stack: &mut Vec<TypeId>,
        budget: &mut usize,
    ) -> String {
        let mut render = |id: TypeId| self.render_into(id, stack, budget);
        let text = match desc {
            TypeDescriptor::Primitive(kind) => kind.name().to_string(),
            TypeDescriptor::Compact(inner) => format!("@{}", render(*inner)),
            TypeDescriptor::Sequence(inner) => format!("[{}]", render(*inner)),
            TypeDescriptor::Array { element, len } => format!("[{};{}]", render(*element), len),
            TypeDescriptor::Tuple(members) => {
                let members: Vec<String> = members.iter().map(|&m| render(m)).collect();
                format!("({})", members.join(","))
            }
            TypeDescriptor::Enum(e) => {
                let mut variants = Vec::with_capacity(e.variants.len());
                for (position, v) in e.variants.iter().enumerate() {
                    let explicit = usize::from(v.index) != position;
                    variants.push(match (v.payload, explicit) {
                        (Some(p), true) => format!("{}:{}:{}", v.name, render(p), v.index),
                        (Some(p), false) => format!("{}:{}", v.name, render(p)),
                        (None, true) => format!("{}::{}", v.name, v.index),
                        (None, false) => v.name.clone(),
                    });
                }
                format!("<{}>", variants.join(","))
            }
            TypeDescriptor::Struct(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}:{}", f.name, render(f.ty)))
                    .collect();
                format!("{{{}}}", fields.join(","))
            }
        };
        if let TypeDescriptor::Primitive(_) = desc {
            *budget = budget.saturating_sub(text.len());
        }
        text
    }
}

struct RegistryInner {
    table: RwLock<TypeTable>,
    codecs: DashMap<TypeId, Arc<CodecNode>>,
}

/// A closed set of resolved type descriptors.
///
/// Cloning is cheap: clones share the same descriptors and compiled codec
/// cache. A registry is `Send + Sync` and may be used from many threads.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub(crate) fn from_table(table: TypeTable) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                table: RwLock::new(table),
                codecs: DashMap::new(),
            }),
        }
    }

    /// Parse and resolve DSL text.
    ///
    /// Either every definition resolves or the whole text is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let definitions = grammar::parse_definitions(text)?;
        Ok(Self::from_definitions(definitions)?)
    }

    /// Resolve already-parsed definitions.
    pub fn from_definitions(definitions: Vec<Definition>) -> std::result::Result<Self, ResolveError> {
        let table = resolver::build(definitions)?;
        Ok(Self::from_table(table))
    }

    /// A registry without definitions; inline type expressions still resolve.
    pub fn empty() -> Self {
        Self::from_table(TypeTable::default())
    }

    /// Number of descriptors in the arena.
    pub fn len(&self) -> usize {
        self.inner.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of top-level definitions (including generic declarations).
    pub fn position_count(&self) -> usize {
        self.inner.table.read().positions.len()
    }

    /// Descriptor id of the definition at `position`.
    pub fn type_at(&self, position: usize) -> std::result::Result<TypeId, ResolveError> {
        match self.inner.table.read().positions.get(position) {
            Some(Some(id)) => Ok(*id),
            Some(None) => Err(ResolveError::MissingTypeArguments(format!("#{}", position))),
            None => Err(ResolveError::UnknownTypeId(position)),
        }
    }

    /// Declared name of the definition at `position`.
    pub fn position_name(&self, position: usize) -> Option<String> {
        self.inner
            .table
            .read()
            .position_names
            .get(position)
            .cloned()
            .flatten()
    }

    /// Descriptor id of a named, non-generic definition.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.inner.table.read().names.get(name).copied()
    }

    /// A copy of the descriptor stored under `id`.
    pub fn descriptor(&self, id: TypeId) -> Option<TypeDescriptor> {
        self.inner.table.read().get(id).cloned()
    }

    /// Resolve a type expression such as `Info<Option<u32>>`, `[u8;32]` or
    /// `3`, instantiating generics on first use.
    pub fn resolve(&self, text: &str) -> Result<TypeId> {
        if let Some(&id) = self.inner.table.read().expressions.get(text) {
            log::trace!("expression cache hit: {}", text);
            return Ok(id);
        }
        let expr = grammar::parse_type_expr(text)?;
        let id = self.resolve_expr(&expr)?;
        self.inner
            .table
            .write()
            .expressions
            .insert(text.to_string(), id);
        Ok(id)
    }

    /// Resolve a parsed type expression.
    pub fn resolve_expr(&self, expr: &TypeExpr) -> std::result::Result<TypeId, ResolveError> {
        let mut table = self.inner.table.write();
        resolver::resolve_lazy(&mut table, expr)
    }

    /// The anonymous tuple of the definitions at `positions`.
    pub fn resolve_tuple(&self, positions: &[usize]) -> std::result::Result<TypeId, ResolveError> {
        let members = positions
            .iter()
            .map(|&p| self.type_at(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self.inner.table.write().intern(TypeDescriptor::Tuple(members)))
    }

    /// Human-readable form of a type: its declared name if it has one,
    /// otherwise its structure in DSL syntax.
    pub fn render(&self, id: TypeId) -> String {
        self.inner.table.read().render(id)
    }

    /// Structure of a definition: like [`Registry::render`], but a named
    /// type shows its body instead of its name.
    pub fn render_definition(&self, id: TypeId) -> String {
        self.inner.table.read().render_body(id)
    }

    /// Named definitions, sorted by name.
    pub fn names(&self) -> Vec<(String, TypeId)> {
        let table = self.inner.table.read();
        let mut names: Vec<_> = table.names.iter().map(|(n, id)| (n.clone(), *id)).collect();
        names.sort();
        names
    }

    /// Names of generic declarations, sorted.
    pub fn generics(&self) -> Vec<String> {
        let table = self.inner.table.read();
        let mut names: Vec<_> = table.generics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Positional table: `None` marks a generic declaration.
    pub fn positions(&self) -> Vec<Option<TypeId>> {
        self.inner.table.read().positions.clone()
    }

    /// Map a caller-supplied type reference to a descriptor id.
    pub fn type_id(&self, ty: &TypeRef) -> Result<TypeId> {
        match ty {
            TypeRef::Position(position) => Ok(self.type_at(*position)?),
            TypeRef::Expr(text) => self.resolve(text),
            TypeRef::Tuple(positions) => Ok(self.resolve_tuple(positions)?),
            TypeRef::Id(id) => {
                if self.inner.table.read().contains(*id) {
                    Ok(*id)
                } else {
                    Err(ResolveError::UnknownTypeId(id.index()).into())
                }
            }
        }
    }

    /// Build (or fetch) the codec of a type.
    pub fn codec(&self, ty: impl Into<TypeRef>) -> Result<Codec> {
        let id = self.type_id(&ty.into())?;
        Codec::new(self.clone(), id)
    }

    pub(crate) fn codec_cache(&self) -> &DashMap<TypeId, Arc<CodecNode>> {
        &self.inner.codecs
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.table.read();
        f.debug_struct("Registry")
            .field("descriptors", &table.len())
            .field("positions", &table.positions.len())
            .field("names", &table.names.len())
            .field("generics", &table.generics.len())
            .field("codecs", &self.inner.codecs.len())
            .finish()
    }
}
