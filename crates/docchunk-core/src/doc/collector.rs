//! Attribute collector - folds one unit's event stream into partial entries

use std::collections::BTreeMap;

use tracing::trace;

use super::event::{DocPayload, Event, EventKind, MetaMap};
use super::types::{EntityRef, ItemRef, SourcePos};
use crate::error::{DocError, DocResult};

/// A value together with where it was declared
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub pos: SourcePos,
}

impl<T> Sourced<T> {
    pub fn new(value: T, pos: SourcePos) -> Self {
        Self { value, pos }
    }
}

/// Declaration facts reported by the front end for an item
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub exported: bool,
    pub signature: Option<String>,
    pub pos: SourcePos,
}

/// Everything observed for one entity, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub entity: EntityRef,
    /// The single content declaration, if any
    pub content: Option<Sourced<DocPayload>>,
    /// Metadata maps in the order they were declared
    pub meta: Vec<Sourced<MetaMap>>,
    pub declaration: Option<Declaration>,
}

impl Partial {
    fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            content: None,
            meta: Vec::new(),
            declaration: None,
        }
    }

    fn set_content(&mut self, doc: DocPayload, pos: SourcePos) -> DocResult<()> {
        if let Some(first) = &self.content {
            return Err(DocError::DuplicateDoc {
                entity: self.entity.clone(),
                first: first.pos,
                second: pos,
            });
        }
        self.content = Some(Sourced::new(doc, pos));
        Ok(())
    }

    fn declare(&mut self, exported: bool, signature: Option<String>, pos: SourcePos) {
        match &mut self.declaration {
            Some(existing) => {
                existing.exported |= exported;
                if existing.signature.is_none() {
                    existing.signature = signature;
                }
            }
            None => {
                self.declaration = Some(Declaration {
                    exported,
                    signature,
                    pos,
                });
            }
        }
    }
}

/// Output of collection: the module partial plus every item seen
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub module: Partial,
    pub items: Vec<Partial>,
}

/// Collects documentation attribute events for a single compilation unit
///
/// State lives only as long as the collector; nothing is shared between units.
#[derive(Debug)]
pub struct DocCollector {
    module: Partial,
    items: BTreeMap<ItemRef, Partial>,
}

impl Default for DocCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DocCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            module: Partial::new(EntityRef::Module),
            items: BTreeMap::new(),
        }
    }

    /// Observe the next event in source order
    ///
    /// A second content declaration for the same entity is rejected, whether
    /// or not its payload matches the first.
    pub fn observe(&mut self, event: Event) -> DocResult<()> {
        let Event { pos, kind } = event;
        trace!(%pos, entity = %kind.target(), "observe doc event");

        match kind {
            EventKind::ModuleDoc { doc } => self.module.set_content(doc, pos),
            EventKind::ModuleMeta { meta } => {
                self.module.meta.push(Sourced::new(meta, pos));
                Ok(())
            }
            EventKind::EntityDoc { entity, doc } => self.item(entity).set_content(doc, pos),
            EventKind::EntityMeta { entity, meta } => {
                self.item(entity).meta.push(Sourced::new(meta, pos));
                Ok(())
            }
            EventKind::Declare {
                entity,
                exported,
                signature,
            } => {
                self.item(entity).declare(exported, signature, pos);
                Ok(())
            }
        }
    }

    /// Observe a whole event stream, stopping at the first error
    pub fn observe_all(&mut self, events: impl IntoIterator<Item = Event>) -> DocResult<()> {
        events.into_iter().try_for_each(|event| self.observe(event))
    }

    fn item(&mut self, entity: ItemRef) -> &mut Partial {
        self.items
            .entry(entity)
            .or_insert_with_key(|entity| Partial::new(EntityRef::Item(entity.clone())))
    }

    /// Number of distinct items observed so far
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Hand over the collected partials, items in (kind, name, arity) order
    pub fn finish(self) -> Collected {
        Collected {
            module: self.module,
            items: self.items.into_values().collect(),
        }
    }
}
