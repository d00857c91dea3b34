//! Compiled-module artifact container
//!
//! An IFF-style file: `FOR1`, a big-endian payload size, a four byte form
//! type, then named chunks. Each chunk is a four byte id, a big-endian
//! length, the data, and zero padding up to a four byte boundary.
//!
//! ```text
//! "FOR1" <size:u32be> <form:4>
//!   <id:4> <len:u32be> <data> <pad>
//!   ...
//! ```

#![allow(clippy::cast_possible_truncation)] // Sizes are checked against u32::MAX on append

use std::fmt;

use thiserror::Error;
use tracing::info;

const MAGIC: &[u8; 4] = b"FOR1";

/// Errors from reading or building an artifact
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("not an artifact: missing FOR1 header")]
    BadMagic,

    #[error("artifact truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("artifact size field says {declared} bytes but {actual} follow")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("chunk '{0}' already present")]
    DuplicateChunk(ChunkId),

    #[error("chunk '{id}' is too large ({len} bytes)")]
    ChunkTooLarge { id: ChunkId, len: usize },
}

/// Four byte chunk name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// Build an id from a four character ASCII name
    pub fn from_name(name: &str) -> Option<Self> {
        let bytes: [u8; 4] = name.as_bytes().try_into().ok()?;
        bytes.iter().all(u8::is_ascii).then_some(Self(bytes))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Read access to named chunks
pub trait ChunkSource {
    fn find_chunk(&self, id: ChunkId) -> Option<&[u8]>;
}

/// Append access to named chunks
///
/// Chunks are never replaced; a recompilation builds a new artifact.
pub trait ChunkSink {
    fn append_chunk(&mut self, id: ChunkId, data: Vec<u8>) -> Result<(), ArtifactError>;
}

/// An in-memory artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    form: ChunkId,
    chunks: Vec<(ChunkId, Vec<u8>)>,
}

impl Artifact {
    /// Create an empty artifact with the given form type
    pub fn new(form: ChunkId) -> Self {
        Self {
            form,
            chunks: Vec::new(),
        }
    }

    pub fn form(&self) -> ChunkId {
        self.form
    }

    /// Raw bytes of a named chunk
    pub fn chunk(&self, id: ChunkId) -> Option<&[u8]> {
        self.find_chunk(id)
    }

    /// Chunk ids in file order
    pub fn chunk_ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.chunks.iter().map(|(id, _)| *id)
    }

    /// Parse artifact bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() < 12 {
            return if bytes.len() >= 4 && &bytes[..4] != MAGIC {
                Err(ArtifactError::BadMagic)
            } else {
                Err(ArtifactError::Truncated {
                    offset: bytes.len(),
                })
            };
        }
        if &bytes[..4] != MAGIC {
            return Err(ArtifactError::BadMagic);
        }

        let declared = read_be_u32(bytes, 4)? as usize;
        let actual = bytes.len() - 8;
        if declared != actual {
            return Err(ArtifactError::SizeMismatch { declared, actual });
        }

        let mut artifact = Self::new(ChunkId(take4(bytes, 8)?));
        let mut offset = 12;
        while offset < bytes.len() {
            let id = ChunkId(take4(bytes, offset)?);
            let len = read_be_u32(bytes, offset + 4)? as usize;
            let start = offset + 8;
            let end = start
                .checked_add(len)
                .filter(|end| *end <= bytes.len())
                .ok_or(ArtifactError::Truncated { offset: start })?;
            artifact.push(id, bytes[start..end].to_vec())?;
            offset = end + padding(len);
        }
        if offset != bytes.len() {
            return Err(ArtifactError::Truncated { offset });
        }

        Ok(artifact)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.payload_len();
        let mut out = Vec::with_capacity(8 + payload);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(payload as u32).to_be_bytes());
        out.extend_from_slice(&self.form.0);
        for (id, data) in &self.chunks {
            out.extend_from_slice(&id.0);
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            out.extend_from_slice(data);
            out.resize(out.len() + padding(data.len()), 0);
        }
        out
    }

    fn payload_len(&self) -> usize {
        4 + self
            .chunks
            .iter()
            .map(|(_, data)| 8 + data.len() + padding(data.len()))
            .sum::<usize>()
    }

    fn push(&mut self, id: ChunkId, data: Vec<u8>) -> Result<(), ArtifactError> {
        if self.find_chunk(id).is_some() {
            return Err(ArtifactError::DuplicateChunk(id));
        }
        let grown = self.payload_len() + 8 + data.len() + padding(data.len());
        if grown > u32::MAX as usize {
            return Err(ArtifactError::ChunkTooLarge {
                id,
                len: data.len(),
            });
        }
        self.chunks.push((id, data));
        Ok(())
    }
}

impl ChunkSource for Artifact {
    fn find_chunk(&self, id: ChunkId) -> Option<&[u8]> {
        self.chunks
            .iter()
            .find(|(chunk_id, _)| *chunk_id == id)
            .map(|(_, data)| data.as_slice())
    }
}

impl ChunkSink for Artifact {
    fn append_chunk(&mut self, id: ChunkId, data: Vec<u8>) -> Result<(), ArtifactError> {
        let len = data.len();
        self.push(id, data)?;
        info!(chunk = %id, len, "appended chunk");
        Ok(())
    }
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn take4(bytes: &[u8], offset: usize) -> Result<[u8; 4], ArtifactError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(ArtifactError::Truncated { offset })
}

fn read_be_u32(bytes: &[u8], offset: usize) -> Result<u32, ArtifactError> {
    take4(bytes, offset).map(u32::from_be_bytes)
}
