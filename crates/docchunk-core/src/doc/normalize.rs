//! Normalizer - canonical text, validated metadata, resolved defaults

use std::collections::BTreeMap;

use super::event::{DocPayload, TextEncoding, TextPayload};
use super::merge::{DraftEntry, MergedValue};
use super::schema::{KnownKey, Shape};
use super::types::{
    DocContent, DocEntry, EntityKind, EntityRef, MetaValue, Metadata, MAX_METADATA_DEPTH,
};
use crate::error::{DocError, DocResult};

const BOM: char = '\u{feff}';

/// A normalized entry plus the export status of its declaration
///
/// Export status is not part of the persisted entry; it only decides
/// whether the encoder keeps the entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub entry: DocEntry,
    pub exported: bool,
}

impl NormalizedEntry {
    /// Private functions never reach the chunk, whatever their content
    pub fn is_erased(&self) -> bool {
        self.entry.entity.is_function() && !self.exported
    }
}

/// Normalize a merged draft into its final form
pub fn normalize(draft: DraftEntry) -> DocResult<NormalizedEntry> {
    let DraftEntry {
        entity,
        content,
        metadata,
        declaration,
    } = draft;

    let exported = match (&entity, &declaration) {
        (EntityRef::Module, _) => true,
        (_, Some(decl)) => decl.exported,
        // Undeclared functions are treated as private; other kinds have no export gate.
        (EntityRef::Item(item), None) => item.kind != EntityKind::Function,
    };

    let position = declaration
        .as_ref()
        .map(|decl| decl.pos)
        .or_else(|| content.as_ref().map(|c| c.pos));

    let content = match content {
        None => DocContent::None,
        Some(sourced) => match sourced.value {
            DocPayload::Hidden => DocContent::Hidden,
            DocPayload::Text(payload) => {
                let text = canonical_text(&payload).map_err(|reason| DocError::Encoding {
                    entity: entity.clone(),
                    position: sourced.pos,
                    reason,
                })?;
                DocContent::Authored(text)
            }
        },
    };

    let metadata = normalize_metadata(&entity, metadata)?;

    Ok(NormalizedEntry {
        entry: DocEntry {
            entity,
            content,
            metadata,
            signature: declaration.and_then(|decl| decl.signature),
            position,
        },
        exported,
    })
}

/// Convert a text payload to canonical UTF-8
///
/// A leading byte order mark is dropped.
pub fn canonical_text(payload: &TextPayload) -> Result<String, String> {
    let text = match payload {
        TextPayload::Chars(text) => text.clone(),
        TextPayload::Bytes { data, encoding } => decode_bytes(data, encoding)?,
    };
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

fn decode_bytes(data: &[u8], encoding: &TextEncoding) -> Result<String, String> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(data.to_vec()).map_err(|e| {
            format!(
                "invalid utf8 byte sequence at offset {}",
                e.utf8_error().valid_up_to()
            )
        }),
        TextEncoding::Latin1 => Ok(data.iter().map(|&b| char::from(b)).collect()),
        TextEncoding::Utf16le | TextEncoding::Utf16be => {
            if data.len() % 2 != 0 {
                return Err(format!("{encoding} data has odd length {}", data.len()));
            }
            let units = data.chunks_exact(2).map(|pair| {
                if *encoding == TextEncoding::Utf16le {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                }
            });
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|e| format!("unpaired surrogate 0x{:04x}", e.unpaired_surrogate()))
        }
        TextEncoding::Other(name) => Err(format!("unsupported encoding '{name}'")),
    }
}

fn normalize_metadata(
    entity: &EntityRef,
    metadata: BTreeMap<String, MergedValue>,
) -> DocResult<Metadata> {
    let mut out = Metadata::new();
    for (key, merged) in metadata {
        if merged.value.exceeds_depth(MAX_METADATA_DEPTH) {
            return Err(DocError::MetadataDepth {
                entity: entity.clone(),
                key,
                limit: MAX_METADATA_DEPTH,
                position: merged.pos,
            });
        }
        let value = match merged.known {
            None => merged.value,
            Some(known) => normalize_known(entity, &key, known, merged)?,
        };
        out.insert(key, value);
    }
    Ok(out)
}

fn normalize_known(
    entity: &EntityRef,
    key: &str,
    known: KnownKey,
    merged: MergedValue,
) -> DocResult<MetaValue> {
    let MergedValue { value, pos, .. } = merged;
    let type_error = |found: &'static str| DocError::MetadataType {
        entity: entity.clone(),
        key: key.to_string(),
        expected: known.shape(),
        found,
        position: pos,
    };
    let text_of = |value: MetaValue| -> DocResult<String> {
        match value {
            MetaValue::Text(text) => Ok(text),
            MetaValue::Bytes(bytes) => String::from_utf8(bytes).map_err(|_| DocError::Encoding {
                entity: entity.clone(),
                position: pos,
                reason: format!("metadata key '{key}' is not valid utf8"),
            }),
            other => Err(type_error(other.shape_name())),
        }
    };

    match (known.shape(), value) {
        (Shape::TextList, MetaValue::List(items)) => items
            .into_iter()
            .map(|item| text_of(item).map(MetaValue::Text))
            .collect::<DocResult<Vec<_>>>()
            .map(MetaValue::List),
        (Shape::TextList, other) => Err(type_error(other.shape_name())),
        (Shape::Text, value) => text_of(value).map(MetaValue::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{merge, DocCollector, Event, ItemRef, MetaMap, SourcePos};

    fn draft_for(events: Vec<Event>) -> DraftEntry {
        let mut collector = DocCollector::new();
        collector.observe_all(events).unwrap();
        let mut collected = collector.finish();
        let partial = if collected.items.is_empty() {
            collected.module
        } else {
            collected.items.remove(0)
        };
        merge(partial)
    }

    #[test]
    fn chars_and_utf8_bytes_normalize_identically() {
        let chars = canonical_text(&TextPayload::from("héllo")).unwrap();
        let bytes = canonical_text(&TextPayload::utf8_bytes("héllo".as_bytes())).unwrap();
        assert_eq!(chars, bytes);
    }

    #[test]
    fn latin1_is_widened() {
        let payload = TextPayload::Bytes {
            data: vec![0x68, 0xe9],
            encoding: TextEncoding::Latin1,
        };
        assert_eq!(canonical_text(&payload).unwrap(), "hé");
    }

    #[test]
    fn utf16_both_orders() {
        let le = TextPayload::Bytes {
            data: vec![0x68, 0x00, 0x69, 0x00],
            encoding: TextEncoding::Utf16le,
        };
        let be = TextPayload::Bytes {
            data: vec![0x00, 0x68, 0x00, 0x69],
            encoding: TextEncoding::Utf16be,
        };
        assert_eq!(canonical_text(&le).unwrap(), "hi");
        assert_eq!(canonical_text(&be).unwrap(), "hi");

        let odd = TextPayload::Bytes {
            data: vec![0x68],
            encoding: TextEncoding::Utf16le,
        };
        assert!(canonical_text(&odd).is_err());
    }

    #[test]
    fn bom_is_dropped() {
        let payload = TextPayload::utf8_bytes(b"\xef\xbb\xbfdoc".to_vec());
        assert_eq!(canonical_text(&payload).unwrap(), "doc");
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let f = ItemRef::function("f", 0);
        let draft = draft_for(vec![
            Event::declare(1, f.clone(), true),
            Event::entity_doc(
                2,
                f,
                DocPayload::Text(TextPayload::utf8_bytes(vec![0x66, 0xff])),
            ),
        ]);
        let err = normalize(draft).unwrap_err();
        assert!(matches!(err, DocError::Encoding { position, .. } if position == SourcePos::new(2, 1)));
    }

    #[test]
    fn unknown_encoding_tag_is_rejected() {
        let payload = TextPayload::Bytes {
            data: b"x".to_vec(),
            encoding: TextEncoding::Other("ebcdic".into()),
        };
        assert_eq!(
            canonical_text(&payload).unwrap_err(),
            "unsupported encoding 'ebcdic'"
        );
    }

    #[test]
    fn known_keys_are_shape_checked() {
        let meta: MetaMap = [("authors".to_string(), MetaValue::from("Jane"))].into();
        let draft = draft_for(vec![Event::module_meta(4, meta)]);
        let err = normalize(draft).unwrap_err();
        assert_eq!(
            err,
            DocError::MetadataType {
                entity: EntityRef::Module,
                key: "authors".into(),
                expected: Shape::TextList,
                found: "text",
                position: SourcePos::new(4, 1),
            }
        );

        let meta: MetaMap = [("license".to_string(), MetaValue::Int(2))].into();
        let err = normalize(draft_for(vec![Event::module_meta(1, meta)])).unwrap_err();
        assert!(matches!(err, DocError::MetadataType { expected: Shape::Text, .. }));
    }

    #[test]
    fn overly_nested_metadata_is_rejected() {
        let deep = (0..=MAX_METADATA_DEPTH).fold(MetaValue::Int(1), |inner, _| {
            MetaValue::List(vec![inner])
        });
        let meta: MetaMap = [("edit_url".to_string(), deep)].into();
        let err = normalize(draft_for(vec![Event::module_meta(7, meta)])).unwrap_err();
        assert_eq!(
            err,
            DocError::MetadataDepth {
                entity: EntityRef::Module,
                key: "edit_url".into(),
                limit: MAX_METADATA_DEPTH,
                position: SourcePos::new(7, 1),
            }
        );
    }

    #[test]
    fn known_byte_values_become_text() {
        let meta: MetaMap = [
            ("license".to_string(), MetaValue::Bytes(b"MIT".to_vec())),
            (
                "authors".to_string(),
                MetaValue::List(vec![MetaValue::Bytes(b"Jane".to_vec()), "Joe".into()]),
            ),
            ("edit_url".to_string(), MetaValue::Bytes(b"raw".to_vec())),
        ]
        .into();
        let normalized = normalize(draft_for(vec![Event::module_meta(1, meta)])).unwrap();
        let metadata = normalized.entry.metadata;
        assert_eq!(metadata["license"], MetaValue::from("MIT"));
        assert_eq!(
            metadata["authors"],
            MetaValue::List(vec!["Jane".into(), "Joe".into()])
        );
        // unknown keys pass through untouched
        assert_eq!(metadata["edit_url"], MetaValue::Bytes(b"raw".to_vec()));
    }

    #[test]
    fn private_functions_are_flagged_for_erasure() {
        let f = ItemRef::function("helper", 1);
        let draft = draft_for(vec![
            Event::declare(1, f.clone(), false),
            Event::entity_doc(2, f, DocPayload::text("internal")),
        ]);
        let normalized = normalize(draft).unwrap();
        assert!(normalized.is_erased());
    }

    #[test]
    fn undeclared_items() {
        let f = normalize(draft_for(vec![Event::entity_doc(
            1,
            ItemRef::function("ghost", 0),
            DocPayload::text("?"),
        )]))
        .unwrap();
        assert!(f.is_erased());

        let t = normalize(draft_for(vec![Event::entity_doc(
            1,
            ItemRef::type_("t", 0),
            DocPayload::text("a type"),
        )]))
        .unwrap();
        assert!(!t.is_erased());
        assert_eq!(t.entry.position, Some(SourcePos::new(1, 1)));
    }

    #[test]
    fn absent_doc_defaults_to_none() {
        let normalized = normalize(draft_for(vec![])).unwrap();
        assert_eq!(normalized.entry.entity, EntityRef::Module);
        assert_eq!(normalized.entry.content, DocContent::None);
        assert_eq!(normalized.entry.position, None);
    }
}
