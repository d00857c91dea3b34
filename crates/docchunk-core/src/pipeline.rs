//! Compilation-unit pipeline
//!
//! One `CompilationUnit` per module runs collect, merge, normalize and
//! (unless disabled) encode. Units share nothing, so a batch of modules is
//! compiled in parallel with each unit reporting its own result.

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::artifact::ChunkSink;
use crate::chunk::{self, DEFAULT_FORMAT, DOCS_CHUNK_ID};
use crate::doc::{
    merge, normalize, Collected, DocCollector, DocEntry, Event, KnownKey, MetaValue,
    NormalizedEntry,
};
use crate::error::{DocError, DocResult};

/// Per-unit compilation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Format id stored when the module does not declare one
    pub default_format: String,
    /// Run collection and normalization for diagnostics only; emit no chunk
    pub skip_chunk: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_format: DEFAULT_FORMAT.to_string(),
            skip_chunk: false,
        }
    }
}

/// Documentation state for a single module being compiled
#[derive(Debug)]
pub struct CompilationUnit {
    module: String,
    options: CompileOptions,
    collector: DocCollector,
}

impl CompilationUnit {
    pub fn new(module: impl Into<String>, options: CompileOptions) -> Self {
        Self {
            module: module.into(),
            options,
            collector: DocCollector::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Observe the next attribute event
    pub fn observe(&mut self, event: Event) -> DocResult<()> {
        self.collector.observe(event)
    }

    pub fn observe_all(&mut self, events: impl IntoIterator<Item = Event>) -> DocResult<()> {
        self.collector.observe_all(events)
    }

    /// Finalize the unit: merge, normalize and encode exactly once
    pub fn finish(self) -> DocResult<FinishedUnit> {
        let CompilationUnit {
            module,
            options,
            collector,
        } = self;
        let Collected {
            module: module_partial,
            items,
        } = collector.finish();

        for partial in &items {
            if partial.entity.is_function()
                && partial.declaration.is_none()
                && partial.content.is_some()
            {
                warn!(
                    module = %module,
                    entity = %partial.entity,
                    "documentation for undeclared function is erased"
                );
            }
        }

        let mut module_entry = normalize(merge(module_partial))?.entry;
        let format = match module_entry.metadata.remove(KnownKey::Format.as_str()) {
            Some(MetaValue::Text(format)) => format,
            // normalization has already shape-checked the key
            _ => options.default_format.clone(),
        };

        let entries = items
            .into_iter()
            .map(|partial| normalize(merge(partial)))
            .collect::<DocResult<Vec<_>>>()?;

        let chunk = if options.skip_chunk {
            None
        } else {
            Some(chunk::encode(&module, &module_entry, &entries, &format))
        };

        debug!(
            module = %module,
            entries = entries.len(),
            chunk_len = chunk.as_ref().map_or(0, Vec::len),
            "finished compilation unit"
        );

        Ok(FinishedUnit {
            module,
            module_entry,
            entries,
            format,
            chunk,
        })
    }
}

/// A finalized unit; immutable input to the artifact writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedUnit {
    pub module: String,
    pub module_entry: DocEntry,
    /// Every normalized item, including ones the chunk erases
    pub entries: Vec<NormalizedEntry>,
    pub format: String,
    /// Encoded chunk, absent when chunk generation was skipped
    pub chunk: Option<Vec<u8>>,
}

impl FinishedUnit {
    /// Append the documentation chunk to an artifact
    ///
    /// Returns whether a chunk was written.
    pub fn write_to(&self, sink: &mut impl ChunkSink) -> DocResult<bool> {
        match &self.chunk {
            Some(bytes) => {
                sink.append_chunk(DOCS_CHUNK_ID, bytes.clone())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A serialized event stream for one module
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitInput {
    pub module: String,
    pub events: Vec<Event>,
}

/// Run one serialized unit through the pipeline
pub fn compile_unit(input: UnitInput, options: CompileOptions) -> DocResult<FinishedUnit> {
    let mut unit = CompilationUnit::new(input.module, options);
    unit.observe_all(input.events)?;
    unit.finish()
}

/// Outcome of one unit in a batch
#[derive(Debug)]
pub struct UnitOutcome {
    pub module: String,
    pub result: Result<FinishedUnit, DocError>,
}

/// Compile independent units in parallel
///
/// A failing unit does not affect the others. Outcomes keep input order.
pub fn compile_batch(inputs: Vec<UnitInput>, options: &CompileOptions) -> Vec<UnitOutcome> {
    let outcomes: Vec<UnitOutcome> = inputs
        .into_par_iter()
        .map(|input| {
            let module = input.module.clone();
            let result = compile_unit(input, options.clone());
            UnitOutcome { module, result }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(units = outcomes.len(), failed, "batch compilation complete");
    outcomes
}
