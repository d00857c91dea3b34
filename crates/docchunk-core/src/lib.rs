//! Docchunk Core - structured documentation chunks for compiled modules
//!
//! This crate provides the core functionality:
//! - Doc: attribute events, collection, metadata merge, normalization
//! - Chunk: versioned binary encoding and the query reader
//! - Artifact: the named-chunk container chunks are appended to
//! - Pipeline: per-module compilation units and parallel batches
//! - Config: `docchunk.toml` settings

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Artifact container - named chunks in an IFF-style file
pub mod artifact;

/// Documentation chunk codec and reader
pub mod chunk;

/// Build configuration
pub mod config;

/// Documentation model and the collect/merge/normalize stages
pub mod doc;

/// Error types
pub mod error;

/// Compilation-unit pipeline
pub mod pipeline;

/// Test utilities - helpers for testing documentation round trips
pub mod testutil;

/// Convenience re-export of the artifact container
pub use artifact::{Artifact, ArtifactError, ChunkId, ChunkSink, ChunkSource};

/// Convenience re-export of chunk types
pub use chunk::{DocChunk, CHUNK_VERSION, DOCS_CHUNK_ID};

/// Convenience re-export of configuration
pub use config::{ConfigError, DocConfig};

/// Convenience re-export of the documentation model
pub use doc::{DocContent, DocEntry, DocPayload, EntityKind, EntityRef, Event, ItemRef, MetaValue};

/// Convenience re-export of errors
pub use error::{DocError, DocResult, ReadError, ReadResult};

/// Convenience re-export of the pipeline
pub use pipeline::{
    compile_batch, compile_unit, CompilationUnit, CompileOptions, FinishedUnit, UnitInput,
    UnitOutcome,
};
