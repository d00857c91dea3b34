//! Types for representing finalized documentation entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of documented item below module level
///
/// The declaration order is the chunk sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Callback,
    Function,
    Type,
}

impl EntityKind {
    /// Get the display name for the entity kind
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Callback => "callback",
            EntityKind::Function => "function",
            EntityKind::Type => "type",
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            EntityKind::Callback => 0,
            EntityKind::Function => 1,
            EntityKind::Type => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(EntityKind::Callback),
            1 => Some(EntityKind::Function),
            2 => Some(EntityKind::Type),
            _ => None,
        }
    }
}

impl FromStr for EntityKind {
    type Err = ParseEntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "callback" => Ok(EntityKind::Callback),
            "function" => Ok(EntityKind::Function),
            "type" => Ok(EntityKind::Type),
            other => Err(ParseEntityError(format!("unknown entity kind '{other}'"))),
        }
    }
}

/// A function, callback or type identified by name and arity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: EntityKind,
    pub name: String,
    pub arity: u8,
}

impl ItemRef {
    /// Create a new item reference
    pub fn new(kind: EntityKind, name: impl Into<String>, arity: u8) -> Self {
        Self {
            kind,
            name: name.into(),
            arity,
        }
    }

    pub fn function(name: impl Into<String>, arity: u8) -> Self {
        Self::new(EntityKind::Function, name, arity)
    }

    pub fn callback(name: impl Into<String>, arity: u8) -> Self {
        Self::new(EntityKind::Callback, name, arity)
    }

    pub fn type_(name: impl Into<String>, arity: u8) -> Self {
        Self::new(EntityKind::Type, name, arity)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntityKind::Function => write!(f, "{}/{}", self.name, self.arity),
            kind => write!(f, "{} {}/{}", kind.display_name(), self.name, self.arity),
        }
    }
}

/// Identifies what a documentation entry documents
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Module,
    Item(ItemRef),
}

impl EntityRef {
    /// The item reference, if this is not the module itself
    pub fn item(&self) -> Option<&ItemRef> {
        match self {
            EntityRef::Module => None,
            EntityRef::Item(item) => Some(item),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, EntityRef::Item(item) if item.kind == EntityKind::Function)
    }
}

impl From<ItemRef> for EntityRef {
    fn from(item: ItemRef) -> Self {
        EntityRef::Item(item)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Module => f.write_str("module"),
            EntityRef::Item(item) => item.fmt(f),
        }
    }
}

/// Error returned when an entity reference cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity reference: {0}")]
pub struct ParseEntityError(String);

impl FromStr for EntityRef {
    type Err = ParseEntityError;

    /// Parses `module`, `name/arity`, `type name/arity` or `callback name/arity`.
    /// A `kind:name/arity` spelling is accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "module" {
            return Ok(EntityRef::Module);
        }

        let (kind, rest) = match s.split_once(|c: char| c == ' ' || c == ':') {
            Some((kind, rest)) => (kind.parse()?, rest.trim()),
            None => (EntityKind::Function, s),
        };

        let (name, arity) = rest
            .rsplit_once('/')
            .ok_or_else(|| ParseEntityError(format!("expected name/arity, got '{rest}'")))?;
        if name.is_empty() {
            return Err(ParseEntityError(format!("missing name in '{s}'")));
        }
        let arity = arity
            .parse::<u8>()
            .map_err(|_| ParseEntityError(format!("invalid arity '{arity}'")))?;

        Ok(EntityRef::Item(ItemRef::new(kind, name, arity)))
    }
}

/// Line and column of a declaration in its source file (1-based)
///
/// The default `0:0` marks an event whose front end reported no position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    #[serde(default = "first_column")]
    pub column: u32,
}

fn first_column() -> u32 {
    1
}

impl SourcePos {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Documentation content of an entity
///
/// `Hidden` is explicit and still queryable; `None` means nothing was declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "text")]
pub enum DocContent {
    Authored(String),
    Hidden,
    #[default]
    None,
}

impl DocContent {
    pub fn is_hidden(&self) -> bool {
        matches!(self, DocContent::Hidden)
    }

    /// The authored text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            DocContent::Authored(text) => Some(text),
            DocContent::Hidden | DocContent::None => None,
        }
    }
}

/// Deepest list/map nesting a metadata value may have
///
/// Shared by the normalizer and the chunk reader so that every chunk the
/// encoder writes can be read back.
pub const MAX_METADATA_DEPTH: usize = 64;

/// A metadata value
///
/// Known keys are normalized to `Text` or a `List` of `Text`; every other key
/// keeps whatever shape the front end supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Bool(bool),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    /// Get the shape name of this value, used in error messages
    pub fn shape_name(&self) -> &'static str {
        match self {
            MetaValue::Text(_) => "text",
            MetaValue::Bytes(_) => "bytes",
            MetaValue::Int(_) => "integer",
            MetaValue::Bool(_) => "boolean",
            MetaValue::List(_) => "list",
            MetaValue::Map(_) => "map",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether some value inside this one sits more than `limit` containers deep
    ///
    /// Stops descending at the limit, so arbitrarily deep input is safe.
    pub fn exceeds_depth(&self, limit: usize) -> bool {
        match self {
            MetaValue::List(items) => {
                !items.is_empty()
                    && (limit == 0 || items.iter().any(|item| item.exceeds_depth(limit - 1)))
            }
            MetaValue::Map(map) => {
                !map.is_empty()
                    && (limit == 0 || map.values().any(|item| item.exceeds_depth(limit - 1)))
            }
            _ => false,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

/// Metadata attached to an entity, ordered by key
pub type Metadata = BTreeMap<String, MetaValue>;

/// A finalized documentation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    pub entity: EntityRef,
    pub content: DocContent,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePos>,
}

impl DocEntry {
    /// Create an entry with no documentation
    pub fn undocumented(entity: EntityRef) -> Self {
        Self {
            entity,
            content: DocContent::None,
            metadata: Metadata::new(),
            signature: None,
            position: None,
        }
    }

    /// Whether default listings should include this entry
    pub fn is_visible(&self) -> bool {
        !self.content.is_hidden()
    }
}
