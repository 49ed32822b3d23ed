// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Turns parsed definitions into descriptors.
//!
//! Resolution is two-pass: every declaration is collected first so that
//! bodies may refer to names declared further down, then bodies are resolved
//! in declaration order. A self-reference resolves to a slot reserved up
//! front and filled once the body is known. Only a sequence, an enum or an
//! empty array can end a chain of values, so every cycle must pass through
//! one of them. A cycle made of structs, tuples and non-empty arrays
//! (`A = {x: A}`, `A = [A; 2]`, `Id<T> = T; B = Id<B>`) is reported as an
//! infinite type.

use super::{GenericDecl, TypeTable};
use crate::descriptor::{
    EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeId,
};
use crate::error::ResolveError;
use crate::grammar::{Definition, FieldExpr, TypeExpr, VariantExpr};
use std::collections::HashMap;

/// Maximum number of generic instantiations in progress at once.
pub const MAX_INSTANTIATION_DEPTH: usize = 64;

/// Generic parameter bindings.
type Scope = HashMap<String, TypeId>;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    /// Composite nesting when resolution started.
    start: usize,
    /// Slot handed out to guarded self-references.
    reserved: Option<TypeId>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Pending,
    Active(InFlight),
    Done(TypeId),
    Generic,
}

struct Resolver<'t> {
    table: &'t mut TypeTable,
    definitions: Vec<Definition>,
    by_name: HashMap<String, usize>,
    slots: Vec<Slot>,
    instances: HashMap<String, InFlight>,
    /// Reserved slots whose definition turned out to be another slot.
    aliases: Vec<(TypeId, TypeId)>,
    depth: usize,
}

/// Resolve a full set of definitions into a fresh table.
pub(crate) fn build(definitions: Vec<Definition>) -> Result<TypeTable, ResolveError> {
    let mut table = TypeTable::default();
    let mut by_name = HashMap::new();
    let mut slots = Vec::with_capacity(definitions.len());

    for (position, def) in definitions.iter().enumerate() {
        let Some(name) = &def.name else {
            slots.push(Slot::Pending);
            continue;
        };
        let context = |err: ResolveError| err.in_definition(def.line, def.label(position));

        if PrimitiveKind::from_name(name).is_some() {
            return Err(context(ResolveError::ReservedName(name.clone())));
        }
        if by_name.contains_key(name) || table.generics.contains_key(name) {
            return Err(context(ResolveError::DuplicateName(name.clone())));
        }
        if let Some(param) = def
            .params
            .iter()
            .find(|p| PrimitiveKind::from_name(p).is_some())
        {
            return Err(context(ResolveError::ReservedName(param.clone())));
        }

        if def.is_generic() {
            table.generics.insert(
                name.clone(),
                GenericDecl {
                    params: def.params.clone(),
                    body: def.body.clone(),
                    line: def.line,
                },
            );
            slots.push(Slot::Generic);
        } else {
            by_name.insert(name.clone(), position);
            slots.push(Slot::Pending);
        }
    }

    table.positions = vec![None; definitions.len()];
    table.position_names = definitions.iter().map(|d| d.name.clone()).collect();
    let generic_count = table.generics.len();

    let mut resolver = Resolver {
        table: &mut table,
        definitions,
        by_name,
        slots,
        instances: HashMap::new(),
        aliases: Vec::new(),
        depth: 0,
    };

    resolver.check_generic_bodies()?;
    for position in 0..resolver.definitions.len() {
        if !matches!(resolver.slots[position], Slot::Generic) {
            resolver.resolve_definition(position, 0)?;
        }
    }
    resolver.finish()?;
    let definition_count = resolver.definitions.len();

    validate(&table, 0)?;
    log::debug!(
        "registry built: {} definitions, {} generic, {} descriptors",
        definition_count,
        generic_count,
        table.len()
    );
    Ok(table)
}

/// Resolve one expression against a finished table, appending whatever it
/// needs. On failure the table is left exactly as it was.
pub(crate) fn resolve_lazy(table: &mut TypeTable, expr: &TypeExpr) -> Result<TypeId, ResolveError> {
    let mark = table.len();
    let result = resolve_appending(table, expr, mark);
    if result.is_err() {
        table.rollback(mark);
    }
    result
}

fn resolve_appending(
    table: &mut TypeTable,
    expr: &TypeExpr,
    mark: usize,
) -> Result<TypeId, ResolveError> {
    let mut resolver = Resolver {
        table,
        definitions: Vec::new(),
        by_name: HashMap::new(),
        slots: Vec::new(),
        instances: HashMap::new(),
        aliases: Vec::new(),
        depth: 0,
    };
    let id = resolver.resolve(expr, &Scope::new(), 0)?;
    resolver.finish()?;
    validate(&*resolver.table, mark)?;
    Ok(id)
}

impl Resolver<'_> {
    fn label(&self, position: usize) -> String {
        self.definitions
            .get(position)
            .map_or_else(|| format!("#{}", position), |d| d.label(position))
    }

    fn resolve_definition(
        &mut self,
        position: usize,
        composites: usize,
    ) -> Result<TypeId, ResolveError> {
        match self.slots[position] {
            Slot::Done(id) => Ok(id),
            Slot::Generic => Err(ResolveError::MissingTypeArguments(self.label(position))),
            Slot::Active(flight) => {
                if composites <= flight.start {
                    return Err(ResolveError::InfiniteType(self.label(position)));
                }
                if let Some(slot) = flight.reserved {
                    return Ok(slot);
                }
                let slot = self.table.reserve();
                if let Some(name) = self.definitions[position].name.clone() {
                    self.table.set_label(slot, name);
                }
                self.slots[position] = Slot::Active(InFlight {
                    reserved: Some(slot),
                    ..flight
                });
                Ok(slot)
            }
            Slot::Pending => {
                self.slots[position] = Slot::Active(InFlight {
                    start: composites,
                    reserved: None,
                });
                let body = self.definitions[position].body.clone();
                let line = self.definitions[position].line;
                let label = self.label(position);

                let resolved = self
                    .resolve(&body, &Scope::new(), composites)
                    .and_then(|id| self.settle(self.slots[position], id, &label))
                    .map_err(|e| e.in_definition(line, label))?;

                self.slots[position] = Slot::Done(resolved);
                self.table.positions[position] = Some(resolved);
                if let Some(name) = self.definitions[position].name.clone() {
                    self.table.bind_name(name, resolved);
                }
                Ok(resolved)
            }
        }
    }

    /// Finish an in-flight item whose body resolved to `id`.
    fn settle(&mut self, slot: Slot, id: TypeId, label: &str) -> Result<TypeId, ResolveError> {
        let reserved = match slot {
            Slot::Active(InFlight {
                reserved: Some(reserved),
                ..
            }) => reserved,
            _ => return Ok(id),
        };
        if id == reserved {
            return Err(ResolveError::InfiniteType(label.to_string()));
        }
        match self.table.get(id).cloned() {
            Some(desc) => self.table.fill(reserved, desc),
            None => self.aliases.push((reserved, id)),
        }
        Ok(reserved)
    }

    fn resolve(
        &mut self,
        expr: &TypeExpr,
        scope: &Scope,
        composites: usize,
    ) -> Result<TypeId, ResolveError> {
        let inner = composites + 1;
        match expr {
            TypeExpr::Primitive(name) => {
                let kind = PrimitiveKind::from_name(name)
                    .ok_or_else(|| ResolveError::UnknownPrimitive(name.clone()))?;
                Ok(self.table.intern(TypeDescriptor::Primitive(kind)))
            }
            TypeExpr::Index(position) => self.resolve_index(*position, composites),
            TypeExpr::Named { name, args } if args.is_empty() => {
                self.resolve_name(name, scope, composites)
            }
            TypeExpr::Named { name, args } => self.instantiate(name, args, scope, composites),
            TypeExpr::Compact(ty) => {
                let ty = self.resolve(ty, scope, inner)?;
                Ok(self.table.intern(TypeDescriptor::Compact(ty)))
            }
            TypeExpr::Sequence(ty) => {
                let ty = self.resolve(ty, scope, inner)?;
                Ok(self.table.intern(TypeDescriptor::Sequence(ty)))
            }
            TypeExpr::Array(ty, len) => {
                let element = self.resolve(ty, scope, inner)?;
                Ok(self
                    .table
                    .intern(TypeDescriptor::Array { element, len: *len }))
            }
            TypeExpr::Tuple(members) => {
                let members = members
                    .iter()
                    .map(|m| self.resolve(m, scope, inner))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.table.intern(TypeDescriptor::Tuple(members)))
            }
            TypeExpr::Enum(variants) => self.resolve_enum(variants, scope, inner),
            TypeExpr::Struct(fields) => self.resolve_struct(fields, scope, inner),
        }
    }

    fn resolve_index(&mut self, position: usize, composites: usize) -> Result<TypeId, ResolveError> {
        if position < self.definitions.len() {
            return self.resolve_definition(position, composites);
        }
        match self.table.positions.get(position) {
            Some(Some(id)) => Ok(*id),
            Some(None) => Err(ResolveError::MissingTypeArguments(format!("#{}", position))),
            None => Err(ResolveError::UnknownTypeId(position)),
        }
    }

    fn resolve_name(
        &mut self,
        name: &str,
        scope: &Scope,
        composites: usize,
    ) -> Result<TypeId, ResolveError> {
        if let Some(&id) = scope.get(name) {
            return Ok(id);
        }
        if let Some(&position) = self.by_name.get(name) {
            return self.resolve_definition(position, composites);
        }
        if let Some(&id) = self.table.names.get(name) {
            return Ok(id);
        }
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(self.table.intern(TypeDescriptor::Primitive(kind)));
        }
        if self.table.generics.contains_key(name) {
            return Err(ResolveError::MissingTypeArguments(name.to_string()));
        }
        Err(ResolveError::UnknownType(name.to_string()))
    }

    fn instantiate(
        &mut self,
        name: &str,
        args: &[TypeExpr],
        scope: &Scope,
        composites: usize,
    ) -> Result<TypeId, ResolveError> {
        let concrete = scope.contains_key(name)
            || self.by_name.contains_key(name)
            || self.table.names.contains_key(name)
            || PrimitiveKind::from_name(name).is_some();
        if concrete {
            return Err(ResolveError::NotGeneric(name.to_string()));
        }
        let decl = self
            .table
            .generics
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownType(name.to_string()))?;
        if decl.params.len() != args.len() {
            return Err(ResolveError::GenericArity {
                name: name.to_string(),
                expected: decl.params.len(),
                found: args.len(),
            });
        }
        if self.depth >= MAX_INSTANTIATION_DEPTH {
            return Err(ResolveError::InstantiationTooDeep(name.to_string()));
        }

        let arg_ids = args
            .iter()
            .map(|a| self.resolve(a, scope, composites + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let key = instance_key(name, &arg_ids);
        if let Some(&id) = self.table.instances.get(&key) {
            log::trace!("instance cache hit: {}", key);
            return Ok(id);
        }

        let label = format!(
            "{}<{}>",
            name,
            arg_ids
                .iter()
                .map(|&id| self.table.render(id))
                .collect::<Vec<_>>()
                .join(",")
        );

        if let Some(flight) = self.instances.get(&key).copied() {
            if composites <= flight.start {
                return Err(ResolveError::InfiniteType(label));
            }
            if let Some(slot) = flight.reserved {
                return Ok(slot);
            }
            let slot = self.table.reserve();
            self.table.set_label(slot, label);
            self.instances.insert(
                key,
                InFlight {
                    reserved: Some(slot),
                    ..flight
                },
            );
            return Ok(slot);
        }

        self.instances.insert(
            key.clone(),
            InFlight {
                start: composites,
                reserved: None,
            },
        );
        let bindings: Scope = decl.params.iter().cloned().zip(arg_ids).collect();

        self.depth += 1;
        let body = self.resolve(&decl.body, &bindings, composites);
        self.depth -= 1;

        let flight = self.instances.remove(&key);
        let resolved = body
            .and_then(|id| match flight {
                Some(flight) => self.settle(Slot::Active(flight), id, &label),
                None => Ok(id),
            })
            .map_err(|e| e.in_definition(decl.line, label.clone()))?;

        self.table.instances.insert(key, resolved);
        self.table.set_label(resolved, label.clone());
        log::debug!("instantiated {} as {}", label, resolved);
        Ok(resolved)
    }

    fn resolve_enum(
        &mut self,
        variants: &[VariantExpr],
        scope: &Scope,
        composites: usize,
    ) -> Result<TypeId, ResolveError> {
        if variants.len() > 256 {
            return Err(ResolveError::TooManyVariants);
        }
        let mut resolved = Vec::with_capacity(variants.len());
        for (position, variant) in variants.iter().enumerate() {
            let index = variant.index.unwrap_or(position as u64);
            let index = u8::try_from(index).map_err(|_| ResolveError::InvalidVariantIndex {
                name: variant.name.clone(),
                index,
            })?;
            let payload = variant
                .payload
                .as_ref()
                .map(|p| self.resolve(p, scope, composites))
                .transpose()?;
            resolved.push(EnumVariant::new(variant.name.clone(), index, payload));
        }
        let desc = TypeDescriptor::Enum(EnumDescriptor::new(resolved));
        check_shape(&desc)?;
        Ok(self.table.intern(desc))
    }

    fn resolve_struct(
        &mut self,
        fields: &[FieldExpr],
        scope: &Scope,
        composites: usize,
    ) -> Result<TypeId, ResolveError> {
        let mut resolved = Vec::with_capacity(fields.len());
        for field in fields {
            let ty = self.resolve(&field.ty, scope, composites)?;
            resolved.push(FieldDescriptor::new(field.name.clone(), ty));
        }
        let desc = TypeDescriptor::Struct(resolved);
        check_shape(&desc)?;
        Ok(self.table.intern(desc))
    }

    /// Fill reserved slots that were aliased to other reserved slots.
    fn finish(&mut self) -> Result<(), ResolveError> {
        while !self.aliases.is_empty() {
            let before = self.aliases.len();
            let mut pending = Vec::new();
            for (slot, target) in std::mem::take(&mut self.aliases) {
                match self.table.get(target).cloned() {
                    Some(desc) => self.table.fill(slot, desc),
                    None => pending.push((slot, target)),
                }
            }
            if pending.len() == before {
                return Err(ResolveError::UndefinedSlot(pending[0].0));
            }
            self.aliases = pending;
        }
        Ok(())
    }

    /// Reject unknown names and arity errors inside generic bodies before
    /// any instantiation is requested.
    fn check_generic_bodies(&self) -> Result<(), ResolveError> {
        for (position, def) in self.definitions.iter().enumerate() {
            if def.is_generic() {
                self.check_expr(&def.body, &def.params)
                    .map_err(|e| e.in_definition(def.line, def.label(position)))?;
            }
        }
        Ok(())
    }

    fn check_expr(&self, expr: &TypeExpr, params: &[String]) -> Result<(), ResolveError> {
        match expr {
            TypeExpr::Primitive(name) => PrimitiveKind::from_name(name)
                .map(|_| ())
                .ok_or_else(|| ResolveError::UnknownPrimitive(name.clone())),
            TypeExpr::Index(position) => {
                if *position < self.definitions.len() {
                    Ok(())
                } else {
                    Err(ResolveError::UnknownTypeId(*position))
                }
            }
            TypeExpr::Named { name, args } => {
                let known = params.contains(name)
                    || self.by_name.contains_key(name)
                    || PrimitiveKind::from_name(name).is_some();
                match self.table.generics.get(name) {
                    Some(decl) if !known => {
                        if decl.params.len() != args.len() {
                            return Err(ResolveError::GenericArity {
                                name: name.clone(),
                                expected: decl.params.len(),
                                found: args.len(),
                            });
                        }
                    }
                    _ if known && !args.is_empty() => {
                        return Err(ResolveError::NotGeneric(name.clone()))
                    }
                    None if !known => return Err(ResolveError::UnknownType(name.clone())),
                    _ => {}
                }
                args.iter().try_for_each(|a| self.check_expr(a, params))
            }
            TypeExpr::Compact(ty) | TypeExpr::Sequence(ty) | TypeExpr::Array(ty, _) => {
                self.check_expr(ty, params)
            }
            TypeExpr::Tuple(members) => members.iter().try_for_each(|m| self.check_expr(m, params)),
            TypeExpr::Enum(variants) => variants
                .iter()
                .filter_map(|v| v.payload.as_ref())
                .try_for_each(|p| self.check_expr(p, params)),
            TypeExpr::Struct(fields) => fields.iter().try_for_each(|f| self.check_expr(&f.ty, params)),
        }
    }
}

fn instance_key(name: &str, args: &[TypeId]) -> String {
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("{}<{}>", name, args.join(","))
}

/// Shape rules that do not depend on other descriptors.
pub(crate) fn check_shape(desc: &TypeDescriptor) -> Result<(), ResolveError> {
    match desc {
        TypeDescriptor::Enum(e) => {
            if e.variants.len() > 256 {
                return Err(ResolveError::TooManyVariants);
            }
            for (i, variant) in e.variants.iter().enumerate() {
                let earlier = &e.variants[..i];
                if earlier.iter().any(|v| v.name == variant.name) {
                    return Err(ResolveError::DuplicateVariant(variant.name.clone()));
                }
                if earlier.iter().any(|v| v.index == variant.index) {
                    return Err(ResolveError::DuplicateVariantIndex {
                        name: variant.name.clone(),
                        index: variant.index,
                    });
                }
            }
            Ok(())
        }
        TypeDescriptor::Struct(fields) => {
            for (i, field) in fields.iter().enumerate() {
                if fields[..i].iter().any(|f| f.name == field.name) {
                    return Err(ResolveError::DuplicateField(field.name.clone()));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Closed-world check over every descriptor at or after `from`: all slots
/// defined, all references in range, compact types wrap unsigned integers.
pub(crate) fn validate(table: &TypeTable, from: usize) -> Result<(), ResolveError> {
    for index in from..table.len() {
        let id = TypeId::from_index(index);
        let desc = table.get(id).ok_or(ResolveError::UndefinedSlot(id))?;
        check_shape(desc)?;
        for child in desc.references() {
            if !table.contains(child) {
                return Err(ResolveError::UnknownTypeId(child.index()));
            }
        }
        if let TypeDescriptor::Compact(inner) = desc {
            let unsigned = matches!(
                table.get(*inner),
                Some(TypeDescriptor::Primitive(kind)) if kind.is_unsigned()
            );
            if !unsigned {
                return Err(ResolveError::InvalidCompact(table.render(*inner)));
            }
        }
    }
    check_guarded(table, from)
}

/// Children a value of `desc` always contains.
fn unguarded_children(desc: &TypeDescriptor) -> Vec<TypeId> {
    match desc {
        TypeDescriptor::Compact(inner) => vec![*inner],
        TypeDescriptor::Array { element, len } if *len > 0 => vec![*element],
        TypeDescriptor::Tuple(members) => members.clone(),
        TypeDescriptor::Struct(fields) => fields.iter().map(|f| f.ty).collect(),
        _ => Vec::new(),
    }
}

/// Reject cycles that never pass through a sequence, an enum or an empty
/// array. Descriptors below `from` were checked when they were added and
/// never point at later ones.
fn check_guarded(table: &TypeTable, from: usize) -> Result<(), ResolveError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        Open,
        Closed,
    }

    let children = |index: usize| {
        table
            .get(TypeId::from_index(index))
            .map(unguarded_children)
            .unwrap_or_default()
    };
    let mut marks = vec![Mark::Unvisited; table.len().saturating_sub(from)];
    for root in from..table.len() {
        if marks[root - from] != Mark::Unvisited {
            continue;
        }
        marks[root - from] = Mark::Open;
        let mut stack = vec![(root, children(root))];
        while let Some((index, pending)) = stack.last_mut() {
            let index = *index;
            let Some(child) = pending.pop() else {
                marks[index - from] = Mark::Closed;
                stack.pop();
                continue;
            };
            let child = child.index();
            if child < from {
                continue;
            }
            match marks[child - from] {
                Mark::Open => {
                    return Err(ResolveError::InfiniteType(
                        table.render(TypeId::from_index(child)),
                    ))
                }
                Mark::Closed => {}
                Mark::Unvisited => {
                    marks[child - from] = Mark::Open;
                    stack.push((child, children(child)));
                }
            }
        }
    }
    Ok(())
}
