//! Chunk reader - decodes persisted chunk bytes and answers queries

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::encode::{
    write_chunk, CONTENT_AUTHORED, CONTENT_HIDDEN, CONTENT_NONE, REF_ITEM, REF_MODULE,
    VALUE_BOOL, VALUE_BYTES, VALUE_INT, VALUE_LIST, VALUE_MAP, VALUE_TEXT,
};
use super::wire::ByteReader;
use super::{CHUNK_VERSION, DOCS_CHUNK_ID};
use crate::artifact::ChunkSource;
use crate::doc::{
    DocContent, DocEntry, EntityKind, EntityRef, ItemRef, MetaValue, Metadata, SourcePos,
    MAX_METADATA_DEPTH,
};
use crate::error::{ReadError, ReadResult};

/// Decoded documentation chunk of one module
///
/// Immutable once loaded; every query is a pure projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocChunk {
    version: u16,
    module: String,
    format: String,
    module_entry: DocEntry,
    /// Sorted by entity, no duplicates
    items: Vec<DocEntry>,
}

impl DocChunk {
    /// Locate and decode the documentation chunk of an artifact
    pub fn load(artifact: &impl ChunkSource) -> ReadResult<Self> {
        let bytes = artifact
            .find_chunk(DOCS_CHUNK_ID)
            .ok_or(ReadError::ChunkNotFound)?;
        Self::decode(bytes)
    }

    /// Parse raw artifact bytes, then load the chunk from them
    pub fn load_bytes(artifact: &[u8]) -> ReadResult<Self> {
        let artifact = crate::artifact::Artifact::parse(artifact)?;
        Self::load(&artifact)
    }

    /// Decode chunk bytes
    ///
    /// The version is checked before anything else is interpreted.
    pub fn decode(bytes: &[u8]) -> ReadResult<Self> {
        let mut r = ByteReader::new(bytes);
        let version = r.read_u16()?;
        if version == 0 || version > CHUNK_VERSION {
            return Err(ReadError::UnsupportedVersion {
                found: version,
                supported: CHUNK_VERSION,
            });
        }

        let module = r.read_str()?;
        let format = r.read_str()?;

        let module_entry = read_entry(&mut r)?;
        if module_entry.entity != EntityRef::Module {
            return Err(r.malformed("first entry is not the module entry"));
        }

        // ref tag + content tag + two option flags + metadata count
        let count = r.read_count(8)?;
        let mut items: Vec<DocEntry> = Vec::with_capacity(count);
        for _ in 0..count {
            let entry = read_entry(&mut r)?;
            if entry.entity == EntityRef::Module {
                return Err(r.malformed("module entry repeated"));
            }
            if let Some(prev) = items.last() {
                if prev.entity >= entry.entity {
                    return Err(r.malformed(format!(
                        "entry {} out of order after {}",
                        entry.entity, prev.entity
                    )));
                }
            }
            items.push(entry);
        }

        if !r.is_at_end() {
            return Err(r.malformed("trailing bytes after last entry"));
        }

        Ok(Self {
            version,
            module,
            format,
            module_entry,
            items,
        })
    }

    /// Re-encode this chunk; byte-identical to what the encoder produced
    pub fn to_bytes(&self) -> Vec<u8> {
        let items: Vec<&DocEntry> = self.items.iter().collect();
        write_chunk(&self.module, &self.format, &self.module_entry, &items)
    }

    /// Hex SHA-256 of the encoded chunk, stable across runs
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.to_bytes()))
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Documentation format of every authored text in the chunk
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn module_entry(&self) -> &DocEntry {
        &self.module_entry
    }

    /// Every entry, module first, hidden ones included
    pub fn entries(&self) -> impl Iterator<Item = &DocEntry> {
        std::iter::once(&self.module_entry).chain(self.items.iter())
    }

    /// Point query for one entity
    pub fn lookup(&self, entity: &EntityRef) -> Option<&DocEntry> {
        match entity {
            EntityRef::Module => Some(&self.module_entry),
            EntityRef::Item(item) => self.lookup_item(item),
        }
    }

    pub fn lookup_item(&self, item: &ItemRef) -> Option<&DocEntry> {
        self.items
            .binary_search_by(|entry| match &entry.entity {
                EntityRef::Module => std::cmp::Ordering::Less,
                EntityRef::Item(other) => other.cmp(item),
            })
            .ok()
            .map(|index| &self.items[index])
    }

    pub fn is_module_hidden(&self) -> bool {
        self.module_entry.content.is_hidden()
    }

    /// Entries for default listings
    ///
    /// Hidden entries are skipped at their own granularity only; a hidden
    /// module does not hide the items documented under it.
    pub fn list_visible(&self) -> Vec<&DocEntry> {
        self.entries().filter(|entry| entry.is_visible()).collect()
    }

    /// Visible items of one kind
    pub fn visible_items(&self, kind: EntityKind) -> impl Iterator<Item = &DocEntry> {
        self.items.iter().filter(move |entry| {
            entry.is_visible() && entry.entity.item().is_some_and(|item| item.kind == kind)
        })
    }
}

fn read_entry(r: &mut ByteReader<'_>) -> ReadResult<DocEntry> {
    let entity = match r.read_u8()? {
        REF_MODULE => EntityRef::Module,
        REF_ITEM => {
            let tag = r.read_u8()?;
            let kind = EntityKind::from_tag(tag)
                .ok_or_else(|| r.malformed(format!("unknown entity kind tag {tag}")))?;
            let name = r.read_str()?;
            let arity = r.read_u8()?;
            EntityRef::Item(ItemRef::new(kind, name, arity))
        }
        tag => return Err(r.malformed(format!("unknown entity ref tag {tag}"))),
    };

    let content = match r.read_u8()? {
        CONTENT_NONE => DocContent::None,
        CONTENT_HIDDEN => DocContent::Hidden,
        CONTENT_AUTHORED => DocContent::Authored(r.read_str()?),
        tag => return Err(r.malformed(format!("unknown content tag {tag}"))),
    };

    let signature = if read_flag(r)? {
        Some(r.read_str()?)
    } else {
        None
    };

    let position = if read_flag(r)? {
        let line = r.read_u32()?;
        let column = r.read_u32()?;
        Some(SourcePos::new(line, column))
    } else {
        None
    };

    let count = r.read_count(5)?;
    let mut metadata = Metadata::new();
    for _ in 0..count {
        let key = r.read_str()?;
        let value = read_value(r, 0)?;
        if metadata.insert(key, value).is_some() {
            return Err(r.malformed("duplicate metadata key"));
        }
    }

    Ok(DocEntry {
        entity,
        content,
        metadata,
        signature,
        position,
    })
}

fn read_flag(r: &mut ByteReader<'_>) -> ReadResult<bool> {
    match r.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(r.malformed(format!("invalid flag byte {other}"))),
    }
}

fn read_value(r: &mut ByteReader<'_>, depth: usize) -> ReadResult<MetaValue> {
    if depth > MAX_METADATA_DEPTH {
        return Err(r.malformed("metadata value nested too deeply"));
    }
    match r.read_u8()? {
        VALUE_TEXT => r.read_str().map(MetaValue::Text),
        VALUE_BYTES => r.read_bytes().map(MetaValue::Bytes),
        VALUE_INT => r.read_i64().map(MetaValue::Int),
        VALUE_BOOL => Ok(MetaValue::Bool(read_flag(r)?)),
        VALUE_LIST => {
            let count = r.read_count(1)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_value(r, depth + 1)?);
            }
            Ok(MetaValue::List(items))
        }
        VALUE_MAP => {
            let count = r.read_count(5)?;
            let mut map = Metadata::new();
            for _ in 0..count {
                let key = r.read_str()?;
                let value = read_value(r, depth + 1)?;
                if map.insert(key, value).is_some() {
                    return Err(r.malformed("duplicate map key"));
                }
            }
            Ok(MetaValue::Map(map))
        }
        tag => Err(r.malformed(format!("unknown value tag {tag}"))),
    }
}
