//! Attribute events emitted by a compiler front end
//!
//! Events arrive in source declaration order for one compilation unit.
//! Textual inclusion of shared fragments has already been flattened into
//! this stream by the front end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::types::{EntityRef, ItemRef, MetaValue, SourcePos};

/// Encoding tag of an explicitly byte-encoded text payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Utf16le,
    Utf16be,
    /// Any other declared encoding; never decodable
    Other(String),
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("utf8"),
            TextEncoding::Latin1 => f.write_str("latin1"),
            TextEncoding::Utf16le => f.write_str("utf16le"),
            TextEncoding::Utf16be => f.write_str("utf16be"),
            TextEncoding::Other(name) => f.write_str(name),
        }
    }
}

/// Raw documentation text as written in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPayload {
    /// A character string literal
    Chars(String),
    /// A byte string literal with its declared encoding
    Bytes {
        data: Vec<u8>,
        #[serde(default = "default_encoding")]
        encoding: TextEncoding,
    },
}

fn default_encoding() -> TextEncoding {
    TextEncoding::Utf8
}

impl TextPayload {
    pub fn utf8_bytes(data: impl Into<Vec<u8>>) -> Self {
        TextPayload::Bytes {
            data: data.into(),
            encoding: TextEncoding::Utf8,
        }
    }
}

impl From<&str> for TextPayload {
    fn from(text: &str) -> Self {
        TextPayload::Chars(text.to_string())
    }
}

/// Payload of a doc attribute: text or the `hidden` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocPayload {
    Text(TextPayload),
    Hidden,
}

impl DocPayload {
    pub fn text(text: &str) -> Self {
        DocPayload::Text(TextPayload::from(text))
    }
}

/// Metadata map as declared in source, before validation
pub type MetaMap = BTreeMap<String, MetaValue>;

/// What an attribute event declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    ModuleDoc {
        doc: DocPayload,
    },
    ModuleMeta {
        meta: MetaMap,
    },
    EntityDoc {
        entity: ItemRef,
        doc: DocPayload,
    },
    EntityMeta {
        entity: ItemRef,
        meta: MetaMap,
    },
    /// A function, type or callback declaration and its export status
    Declare {
        entity: ItemRef,
        exported: bool,
        #[serde(default)]
        signature: Option<String>,
    },
}

impl EventKind {
    /// The entity this event contributes to
    pub fn target(&self) -> EntityRef {
        match self {
            EventKind::ModuleDoc { .. } | EventKind::ModuleMeta { .. } => EntityRef::Module,
            EventKind::EntityDoc { entity, .. }
            | EventKind::EntityMeta { entity, .. }
            | EventKind::Declare { entity, .. } => EntityRef::Item(entity.clone()),
        }
    }
}

/// An attribute event with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub pos: SourcePos,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(pos: SourcePos, kind: EventKind) -> Self {
        Self { pos, kind }
    }

    pub fn module_doc(line: u32, doc: DocPayload) -> Self {
        Self::new(SourcePos::new(line, 1), EventKind::ModuleDoc { doc })
    }

    pub fn module_meta(line: u32, meta: MetaMap) -> Self {
        Self::new(SourcePos::new(line, 1), EventKind::ModuleMeta { meta })
    }

    pub fn entity_doc(line: u32, entity: ItemRef, doc: DocPayload) -> Self {
        Self::new(SourcePos::new(line, 1), EventKind::EntityDoc { entity, doc })
    }

    pub fn entity_meta(line: u32, entity: ItemRef, meta: MetaMap) -> Self {
        Self::new(SourcePos::new(line, 1), EventKind::EntityMeta { entity, meta })
    }

    pub fn declare(line: u32, entity: ItemRef, exported: bool) -> Self {
        Self::new(
            SourcePos::new(line, 1),
            EventKind::Declare {
                entity,
                exported,
                signature: None,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_shape() {
        let json = r#"{
            "event": "entity_doc",
            "pos": { "line": 12, "column": 1 },
            "entity": { "kind": "function", "name": "map", "arity": 2 },
            "doc": { "text": { "chars": "Maps a list." } }
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.pos, SourcePos::new(12, 1));
        assert_eq!(
            event.kind,
            EventKind::EntityDoc {
                entity: ItemRef::function("map", 2),
                doc: DocPayload::text("Maps a list."),
            }
        );
    }

    #[test]
    fn missing_column_is_first_column() {
        let event: Event = serde_json::from_str(
            r#"{ "event": "module_doc", "pos": { "line": 3 }, "doc": "hidden" }"#,
        )
        .unwrap();
        assert_eq!(event.pos, SourcePos::new(3, 1));
        assert_eq!(event.pos.to_string(), "3:1");
    }

    #[test]
    fn hidden_and_bytes_payloads() {
        let hidden: Event =
            serde_json::from_str(r#"{ "event": "module_doc", "doc": "hidden" }"#).unwrap();
        assert_eq!(hidden.kind, EventKind::ModuleDoc { doc: DocPayload::Hidden });
        assert_eq!(hidden.pos, SourcePos::default());

        let bytes: DocPayload =
            serde_json::from_str(r#"{ "text": { "bytes": { "data": [104, 105] } } }"#).unwrap();
        assert_eq!(bytes, DocPayload::Text(TextPayload::utf8_bytes(b"hi".to_vec())));
    }

    #[test]
    fn target_of_events() {
        let decl = Event::declare(3, ItemRef::type_("t", 0), true);
        assert_eq!(decl.kind.target(), EntityRef::Item(ItemRef::type_("t", 0)));
        let meta = Event::module_meta(1, MetaMap::new());
        assert_eq!(meta.kind.target(), EntityRef::Module);
    }
}
