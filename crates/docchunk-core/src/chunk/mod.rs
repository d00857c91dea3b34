//! Versioned binary documentation chunk
//!
//! This module provides:
//! - `encode`: normalized entries to chunk bytes, erasing private functions
//! - `DocChunk`: decoding plus the point and listing queries used by tools

mod encode;
mod reader;
mod wire;

use crate::artifact::ChunkId;

pub use encode::encode;
pub use reader::DocChunk;

/// Current chunk format version; readers reject anything newer
pub const CHUNK_VERSION: u16 = 1;

/// Name of the documentation chunk inside an artifact
pub const DOCS_CHUNK_ID: ChunkId = ChunkId(*b"Docs");

/// Documentation format used when a module declares none
pub const DEFAULT_FORMAT: &str = "text/markdown";
