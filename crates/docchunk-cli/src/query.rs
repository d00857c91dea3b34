//! Implementation of the `docchunk show`, `list` and `dump` commands.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use docchunk_core::{DocChunk, DocContent, DocEntry, EntityKind, EntityRef, MetaValue, ReadError};

/// Read an artifact and load its documentation chunk.
///
/// A missing chunk is reported as such rather than as an empty module.
fn load(path: &Path) -> Result<DocChunk> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    match DocChunk::load_bytes(&bytes) {
        Ok(chunk) => Ok(chunk),
        Err(ReadError::ChunkNotFound) => Err(anyhow::anyhow!(
            "{}: no structured documentation available",
            path.display()
        )),
        Err(err) => Err(err)
            .with_context(|| format!("Failed to read documentation from {}", path.display())),
    }
}

/// Print the documentation of one entity.
pub fn show(path: &Path, entity: &EntityRef) -> Result<()> {
    let chunk = load(path)?;
    let entry = chunk.lookup(entity).ok_or_else(|| {
        anyhow::anyhow!(
            "No documentation entry for {} in module {}",
            entity,
            chunk.module_name()
        )
    })?;
    print!("{}", render_entry(entry));
    Ok(())
}

/// List entries, visible ones only unless `all` is set.
pub fn list(path: &Path, kind: Option<EntityKind>, all: bool) -> Result<()> {
    let chunk = load(path)?;
    let entries: Vec<&DocEntry> = if all {
        chunk.entries().collect()
    } else {
        chunk.list_visible()
    };

    for entry in entries {
        if let Some(kind) = kind {
            if entry.entity.item().map(|item| item.kind) != Some(kind) {
                continue;
            }
        }
        println!("{}\t{}", entry.entity, summary(&entry.content));
    }
    Ok(())
}

/// Print the whole chunk.
pub fn dump(path: &Path, json: bool) -> Result<()> {
    let chunk = load(path)?;
    if json {
        let out = serde_json::to_string_pretty(&chunk).context("Failed to serialize chunk")?;
        println!("{out}");
        return Ok(());
    }

    println!("module:  {}", chunk.module_name());
    println!("version: {}", chunk.version());
    println!("format:  {}", chunk.format());
    println!("digest:  {}", chunk.digest());
    for entry in chunk.entries() {
        println!();
        print!("{}", render_entry(entry));
    }
    Ok(())
}

fn summary(content: &DocContent) -> String {
    match content {
        DocContent::Authored(text) => text.lines().next().unwrap_or_default().to_string(),
        DocContent::Hidden => "(hidden)".to_string(),
        DocContent::None => "(undocumented)".to_string(),
    }
}

fn render_entry(entry: &DocEntry) -> String {
    let mut out = format!("{}\n", entry.entity);
    if let Some(signature) = &entry.signature {
        out.push_str(&format!("  signature: {signature}\n"));
    }
    if let Some(position) = entry.position {
        out.push_str(&format!("  position: {position}\n"));
    }
    for (key, value) in &entry.metadata {
        out.push_str(&format!("  {key}: {}\n", render_value(value)));
    }
    match &entry.content {
        DocContent::Authored(text) => {
            out.push('\n');
            for line in text.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
        other => out.push_str(&format!("  {}\n", summary(other))),
    }
    out
}

fn render_value(value: &MetaValue) -> String {
    match value {
        MetaValue::Text(text) => text.clone(),
        MetaValue::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        MetaValue::Int(n) => n.to_string(),
        MetaValue::Bool(b) => b.to_string(),
        MetaValue::List(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        MetaValue::Map(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k} => {}", render_value(v)))
                .collect();
            format!("#{{{}}}", pairs.join(", "))
        }
    }
}
