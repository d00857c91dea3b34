//! Test utilities for docchunk
//!
//! Helpers that push an event stream through the whole write path and read
//! the result back, the way a compiler and a doc tool would.

use crate::artifact::{Artifact, ChunkId};
use crate::chunk::DocChunk;
use crate::doc::{DocPayload, Event, ItemRef};
use crate::pipeline::{CompilationUnit, CompileOptions};

/// Result type for test helpers
pub type TestResult<T> = Result<T, String>;

/// Form type used for artifacts built by the helpers
pub const TEST_FORM: ChunkId = ChunkId(*b"BEAM");

/// Compile events into serialized artifact bytes
///
/// # Errors
/// Returns error if the unit fails to compile or the chunk cannot be appended
pub fn compile_to_artifact(
    module: &str,
    events: Vec<Event>,
    options: CompileOptions,
) -> TestResult<Vec<u8>> {
    let mut unit = CompilationUnit::new(module, options);
    unit.observe_all(events)
        .map_err(|e| format!("Collect error: {e}"))?;
    let finished = unit.finish().map_err(|e| format!("Finish error: {e}"))?;

    let mut artifact = Artifact::new(TEST_FORM);
    finished
        .write_to(&mut artifact)
        .map_err(|e| format!("Write error: {e}"))?;
    Ok(artifact.to_bytes())
}

/// Compile events with default options and load the chunk back
///
/// # Errors
/// Returns error if compilation or loading fails
pub fn round_trip(module: &str, events: Vec<Event>) -> TestResult<DocChunk> {
    let bytes = compile_to_artifact(module, events, CompileOptions::default())?;
    DocChunk::load_bytes(&bytes).map_err(|e| format!("Load error: {e}"))
}

/// Events for an exported, documented function
pub fn exported_fn(line: u32, name: &str, arity: u8, doc: &str) -> Vec<Event> {
    let item = ItemRef::function(name, arity);
    vec![
        Event::entity_doc(line, item.clone(), DocPayload::text(doc)),
        Event::declare(line + 1, item, true),
    ]
}

/// Events for a private, documented function
pub fn private_fn(line: u32, name: &str, arity: u8, doc: &str) -> Vec<Event> {
    let item = ItemRef::function(name, arity);
    vec![
        Event::entity_doc(line, item.clone(), DocPayload::text(doc)),
        Event::declare(line + 1, item, false),
    ]
}

/// A module with `count` exported documented functions
pub fn large_unit(count: usize) -> Vec<Event> {
    let mut events = vec![Event::module_doc(1, DocPayload::text("Generated module."))];
    for i in 0..count {
        let line = u32::try_from(i * 2 + 2).unwrap_or(u32::MAX);
        let arity = u8::try_from(i % 4).unwrap_or(0);
        events.extend(exported_fn(
            line,
            &format!("fun_{i:05}"),
            arity,
            &format!("Documentation for function number {i}."),
        ));
    }
    events
}
