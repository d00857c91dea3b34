//! Documentation collection for one compilation unit
//!
//! Attribute events flow through three stages:
//! - `DocCollector`: folds the ordered event stream into per-entity partials
//! - `merge`: combines each entity's metadata maps, last write wins
//! - `normalize`: canonical UTF-8 text, metadata shape checks, defaults

mod collector;
mod event;
mod merge;
mod normalize;
mod schema;
mod types;

pub use collector::{Collected, Declaration, DocCollector, Partial, Sourced};
pub use event::{DocPayload, Event, EventKind, MetaMap, TextEncoding, TextPayload};
pub use merge::{merge, merge_maps, DraftEntry, MergedValue};
pub use normalize::{canonical_text, normalize, NormalizedEntry};
pub use schema::{KnownKey, Shape};
pub use types::{
    DocContent, DocEntry, EntityKind, EntityRef, ItemRef, MetaValue, Metadata, ParseEntityError,
    SourcePos, MAX_METADATA_DEPTH,
};
