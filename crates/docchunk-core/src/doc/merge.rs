//! Metadata merge - combine the metadata maps declared for one entity
//!
//! Maps are folded left to right in declaration order. A later map replaces
//! earlier values key by key; values are never combined, so list-valued keys
//! are overwritten rather than concatenated.

use std::collections::BTreeMap;

use super::collector::{Declaration, Partial, Sourced};
use super::event::{DocPayload, MetaMap};
use super::schema::KnownKey;
use super::types::{EntityRef, MetaValue, SourcePos};

/// A merged metadata value with the position of the declaration it came from
#[derive(Debug, Clone, PartialEq)]
pub struct MergedValue {
    pub value: MetaValue,
    pub pos: SourcePos,
    /// Set for recognized keys; these are shape-checked during normalization
    pub known: Option<KnownKey>,
}

/// An entity after merge, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct DraftEntry {
    pub entity: EntityRef,
    pub content: Option<Sourced<DocPayload>>,
    pub metadata: BTreeMap<String, MergedValue>,
    pub declaration: Option<Declaration>,
}

/// Merge one entity's partial contributions into a draft entry
///
/// Content is carried over as is; the collector already guarantees it was
/// declared at most once.
pub fn merge(partial: Partial) -> DraftEntry {
    let Partial {
        entity,
        content,
        meta,
        declaration,
    } = partial;

    let mut metadata = BTreeMap::new();
    for Sourced { value: map, pos } in meta {
        for (key, value) in map {
            let known = KnownKey::parse(&key);
            metadata.insert(key, MergedValue { value, pos, known });
        }
    }

    DraftEntry {
        entity,
        content,
        metadata,
        declaration,
    }
}

/// Shallow last-write-wins merge of plain metadata maps
pub fn merge_maps<'a>(maps: impl IntoIterator<Item = &'a MetaMap>) -> MetaMap {
    let mut merged = MetaMap::new();
    for map in maps {
        merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
