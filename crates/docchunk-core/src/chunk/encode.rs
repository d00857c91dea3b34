//! Chunk encoder - serializes a unit's documentation table

use tracing::debug;

use super::wire::ByteWriter;
use super::CHUNK_VERSION;
use crate::doc::{DocContent, DocEntry, EntityRef, MetaValue, NormalizedEntry};

pub(super) const REF_MODULE: u8 = 0;
pub(super) const REF_ITEM: u8 = 1;

pub(super) const CONTENT_NONE: u8 = 0;
pub(super) const CONTENT_HIDDEN: u8 = 1;
pub(super) const CONTENT_AUTHORED: u8 = 2;

pub(super) const VALUE_TEXT: u8 = 0;
pub(super) const VALUE_BYTES: u8 = 1;
pub(super) const VALUE_INT: u8 = 2;
pub(super) const VALUE_BOOL: u8 = 3;
pub(super) const VALUE_LIST: u8 = 4;
pub(super) const VALUE_MAP: u8 = 5;

/// Encode a unit's documentation into chunk bytes
///
/// Function entries whose declaration is not exported are dropped here no
/// matter what their content is. Remaining items are written in
/// (kind, name, arity) order so equal input always yields equal bytes.
pub fn encode(
    module_name: &str,
    module: &DocEntry,
    entries: &[NormalizedEntry],
    format: &str,
) -> Vec<u8> {
    let mut items: Vec<&DocEntry> = entries
        .iter()
        .filter(|normalized| !normalized.is_erased())
        .map(|normalized| &normalized.entry)
        .filter(|entry| entry.entity.item().is_some())
        .collect();
    items.sort_by(|a, b| a.entity.cmp(&b.entity));
    items.dedup_by(|later, earlier| later.entity == earlier.entity);

    let erased = entries.iter().filter(|e| e.is_erased()).count();
    debug!(
        module = module_name,
        items = items.len(),
        erased,
        "encoding documentation chunk"
    );

    write_chunk(module_name, format, module, &items)
}

/// Write an already filtered, sorted table
pub(super) fn write_chunk(
    module_name: &str,
    format: &str,
    module: &DocEntry,
    items: &[&DocEntry],
) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u16(CHUNK_VERSION);
    w.write_str(module_name);
    w.write_str(format);

    // The module entry is always stored under the module ref.
    write_entry_body(&mut w, &EntityRef::Module, module);

    w.write_len(items.len());
    for entry in items {
        write_entry_body(&mut w, &entry.entity, entry);
    }
    w.into_bytes()
}

fn write_entry_body(w: &mut ByteWriter, entity: &EntityRef, entry: &DocEntry) {
    match entity {
        EntityRef::Module => w.write_u8(REF_MODULE),
        EntityRef::Item(item) => {
            w.write_u8(REF_ITEM);
            w.write_u8(item.kind.tag());
            w.write_str(&item.name);
            w.write_u8(item.arity);
        }
    }

    match &entry.content {
        DocContent::None => w.write_u8(CONTENT_NONE),
        DocContent::Hidden => w.write_u8(CONTENT_HIDDEN),
        DocContent::Authored(text) => {
            w.write_u8(CONTENT_AUTHORED);
            w.write_str(text);
        }
    }

    match &entry.signature {
        Some(signature) => {
            w.write_u8(1);
            w.write_str(signature);
        }
        None => w.write_u8(0),
    }

    match entry.position {
        Some(pos) => {
            w.write_u8(1);
            w.write_u32(pos.line);
            w.write_u32(pos.column);
        }
        None => w.write_u8(0),
    }

    w.write_len(entry.metadata.len());
    for (key, value) in &entry.metadata {
        w.write_str(key);
        write_value(w, value);
    }
}

fn write_value(w: &mut ByteWriter, value: &MetaValue) {
    match value {
        MetaValue::Text(text) => {
            w.write_u8(VALUE_TEXT);
            w.write_str(text);
        }
        MetaValue::Bytes(bytes) => {
            w.write_u8(VALUE_BYTES);
            w.write_bytes(bytes);
        }
        MetaValue::Int(n) => {
            w.write_u8(VALUE_INT);
            w.write_i64(*n);
        }
        MetaValue::Bool(b) => {
            w.write_u8(VALUE_BOOL);
            w.write_u8(u8::from(*b));
        }
        MetaValue::List(items) => {
            w.write_u8(VALUE_LIST);
            w.write_len(items.len());
            for item in items {
                write_value(w, item);
            }
        }
        MetaValue::Map(map) => {
            w.write_u8(VALUE_MAP);
            w.write_len(map.len());
            for (key, item) in map {
                w.write_str(key);
                write_value(w, item);
            }
        }
    }
}
