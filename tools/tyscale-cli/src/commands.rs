// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subcommand implementations, independent of argument parsing.

use anyhow::{bail, Context, Result};
use std::fmt::Write;
use std::path::PathBuf;
use tyscale::{Registry, TypeRef, Value};

/// Read and concatenate type files, then resolve them as one registry.
pub fn load_registry(files: &[PathBuf]) -> Result<Registry> {
    let mut text = String::new();
    for file in files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("reading type file {}", file.display()))?;
        text.push_str(&content);
        text.push('\n');
    }
    tracing::debug!("loaded {} type file(s), {} bytes", files.len(), text.len());
    Registry::parse(&text).context("resolving type definitions")
}

/// `--type` argument: a plain number selects a position, anything else is
/// a type expression.
pub fn type_ref(text: &str) -> TypeRef {
    match text.trim().parse::<usize>() {
        Ok(position) => TypeRef::Position(position),
        Err(_) => TypeRef::Expr(text.to_string()),
    }
}

/// Listing of a registry: positions, then names, then generics.
pub fn describe(registry: &Registry) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "positions:");
    for (position, id) in registry.positions().into_iter().enumerate() {
        let name = registry.position_name(position);
        let _ = match (id, name) {
            (Some(id), Some(name)) => writeln!(
                out,
                "  {:>4}  {} = {}",
                position,
                name,
                registry.render_definition(id)
            ),
            (Some(id), None) => writeln!(out, "  {:>4}  {}", position, registry.render_definition(id)),
            (None, Some(name)) => writeln!(out, "  {:>4}  {} (generic)", position, name),
            (None, None) => writeln!(out, "  {:>4}  (generic)", position),
        };
    }

    let names = registry.names();
    if !names.is_empty() {
        let _ = writeln!(out, "names:");
        for (name, id) in &names {
            let _ = writeln!(out, "  {} -> {}", name, id);
        }
    }

    let generics = registry.generics();
    if !generics.is_empty() {
        let _ = writeln!(out, "generics: {}", generics.join(", "));
    }
    out
}

/// Encode a JSON value as `ty`.
pub fn encode(registry: &Registry, ty: &str, json: &str) -> Result<Vec<u8>> {
    let value = Value::from_json_str(json).context("parsing --value")?;
    let codec = registry.codec(type_ref(ty))?;
    let bytes = codec.encode(&value)?;
    tracing::debug!("encoded {} as {} byte(s)", ty, bytes.len());
    Ok(bytes)
}

/// Parse hex input, with or without a `0x` prefix; whitespace is ignored.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text.split_whitespace().collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    hex::decode(digits).context("parsing hex input")
}

/// Decode `bytes` as `ty` and render the value as pretty JSON.
pub fn decode(registry: &Registry, ty: &str, bytes: &[u8]) -> Result<String> {
    let codec = registry.codec(type_ref(ty))?;
    let value = codec.decode(bytes)?;
    Ok(serde_json::to_string_pretty(&value.to_json())?)
}
