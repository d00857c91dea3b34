//! Recognized metadata keys and the shapes they must normalize to

use std::fmt;

/// Shape a known metadata key must have after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single text value
    Text,
    /// An ordered sequence of text values
    TextList,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Text => f.write_str("text"),
            Shape::TextList => f.write_str("list of text"),
        }
    }
}

/// Metadata key with a validated shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownKey {
    Authors,
    Behaviours,
    CrossReferences,
    Deprecated,
    Equiv,
    Format,
    License,
    Since,
}

impl KnownKey {
    pub const ALL: [KnownKey; 8] = [
        KnownKey::Authors,
        KnownKey::Behaviours,
        KnownKey::CrossReferences,
        KnownKey::Deprecated,
        KnownKey::Equiv,
        KnownKey::Format,
        KnownKey::License,
        KnownKey::Since,
    ];

    /// Look up a key; unknown keys are passed through unvalidated
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.as_str() == key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KnownKey::Authors => "authors",
            KnownKey::Behaviours => "behaviours",
            KnownKey::CrossReferences => "cross_references",
            KnownKey::Deprecated => "deprecated",
            KnownKey::Equiv => "equiv",
            KnownKey::Format => "format",
            KnownKey::License => "license",
            KnownKey::Since => "since",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            KnownKey::Authors | KnownKey::Behaviours | KnownKey::CrossReferences => {
                Shape::TextList
            }
            KnownKey::Deprecated
            | KnownKey::Equiv
            | KnownKey::Format
            | KnownKey::License
            | KnownKey::Since => Shape::Text,
        }
    }
}
