//! Error types for the write and read paths

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::doc::{EntityRef, Shape, SourcePos};

/// An error that aborts one compilation unit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    #[error("{second}: duplicate documentation for {entity} (first declared at {first})")]
    DuplicateDoc {
        entity: EntityRef,
        first: SourcePos,
        second: SourcePos,
    },

    #[error("{position}: cannot normalize text of {entity}: {reason}")]
    Encoding {
        entity: EntityRef,
        position: SourcePos,
        reason: String,
    },

    #[error("{position}: metadata key '{key}' of {entity} must be {expected}, found {found}")]
    MetadataType {
        entity: EntityRef,
        key: String,
        expected: Shape,
        found: &'static str,
        position: SourcePos,
    },

    #[error("{position}: metadata key '{key}' of {entity} nests deeper than {limit} levels")]
    MetadataDepth {
        entity: EntityRef,
        key: String,
        limit: usize,
        position: SourcePos,
    },

    #[error("failed to write documentation chunk: {0}")]
    Artifact(#[from] ArtifactError),
}

impl DocError {
    /// The entity the error is reported against, if any
    pub fn entity(&self) -> Option<&EntityRef> {
        match self {
            DocError::DuplicateDoc { entity, .. }
            | DocError::Encoding { entity, .. }
            | DocError::MetadataType { entity, .. }
            | DocError::MetadataDepth { entity, .. } => Some(entity),
            DocError::Artifact(_) => None,
        }
    }
}

/// Result type for compilation-side operations
pub type DocResult<T> = Result<T, DocError>;

/// A recoverable error on the read path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("artifact has no documentation chunk")]
    ChunkNotFound,

    #[error("documentation chunk version {found} is not supported (this tool reads up to version {supported}); upgrade your tooling")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("malformed documentation chunk at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },

    #[error("unreadable artifact: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Result type for read-side operations
pub type ReadResult<T> = Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::ItemRef;

    #[test]
    fn duplicate_message_names_both_positions() {
        let err = DocError::DuplicateDoc {
            entity: EntityRef::Item(ItemRef::function("f", 1)),
            first: SourcePos::new(3, 1),
            second: SourcePos::new(9, 1),
        };
        assert_eq!(
            err.to_string(),
            "9:1: duplicate documentation for f/1 (first declared at 3:1)"
        );
    }

    #[test]
    fn version_message_suggests_upgrade() {
        let err = ReadError::UnsupportedVersion {
            found: 7,
            supported: 1,
        };
        assert!(err.to_string().contains("upgrade your tooling"));
    }
}
