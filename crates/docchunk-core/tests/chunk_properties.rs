//! Integration tests for the documentation chunk write and read paths
//!
//! Every test goes through artifact bytes, the same boundary a doc tool sees.

use std::collections::BTreeMap;

use docchunk_core::artifact::{Artifact, ChunkId, ChunkSink};
use docchunk_core::chunk::{DocChunk, CHUNK_VERSION, DOCS_CHUNK_ID};
use docchunk_core::doc::{
    DocContent, DocPayload, EntityKind, EntityRef, Event, ItemRef, MetaMap, MetaValue,
    TextEncoding, TextPayload,
};
use docchunk_core::error::{DocError, ReadError};
use docchunk_core::pipeline::{compile_batch, CompilationUnit, CompileOptions, UnitInput};
use docchunk_core::testutil::{compile_to_artifact, exported_fn, private_fn, round_trip};

fn meta(pairs: &[(&str, MetaValue)]) -> MetaMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn text_list(items: &[&str]) -> MetaValue {
    MetaValue::List(items.iter().map(|s| MetaValue::from(*s)).collect())
}

#[test]
fn test_lookup_matches_normalized_entries() {
    let map = ItemRef::function("map", 2);
    let t = ItemRef::type_("t", 0);
    let init = ItemRef::callback("init", 1);
    let events = vec![
        Event::module_doc(1, DocPayload::text("\u{feff}Lists.")),
        Event::module_meta(2, meta(&[("authors", text_list(&["ada"]))])),
        Event::entity_doc(4, map.clone(), DocPayload::text("Maps.")),
        Event::entity_meta(5, map.clone(), meta(&[("since", MetaValue::from("1.2"))])),
        Event::declare(6, map.clone(), true),
        Event::entity_doc(
            8,
            t.clone(),
            DocPayload::Text(TextPayload::Bytes {
                data: vec![0x63, 0x61, 0x66, 0xe9],
                encoding: TextEncoding::Latin1,
            }),
        ),
        Event::declare(9, t, true),
        Event::entity_doc(11, init.clone(), DocPayload::Hidden),
        Event::declare(12, init, true),
    ];

    let mut unit = CompilationUnit::new("lists", CompileOptions::default());
    unit.observe_all(events).unwrap();
    let finished = unit.finish().unwrap();

    let mut artifact = Artifact::new(ChunkId(*b"BEAM"));
    finished.write_to(&mut artifact).unwrap();
    let chunk = DocChunk::load_bytes(&artifact.to_bytes()).unwrap();

    assert_eq!(chunk.lookup(&EntityRef::Module), Some(&finished.module_entry));
    for normalized in &finished.entries {
        assert_eq!(chunk.lookup(&normalized.entry.entity), Some(&normalized.entry));
    }

    assert_eq!(chunk.module_entry().content, DocContent::Authored("Lists.".to_string()));
    let t_entry = chunk.lookup_item(&ItemRef::type_("t", 0)).unwrap();
    assert_eq!(t_entry.content.text(), Some("café"));
}

#[test]
fn test_private_functions_are_erased() {
    let mut events = exported_fn(1, "public_api", 1, "Public.");
    events.extend(private_fn(5, "internal", 1, "Internal."));
    events.push(Event::entity_doc(
        9,
        ItemRef::function("hidden_internal", 0),
        DocPayload::Hidden,
    ));
    events.push(Event::declare(10, ItemRef::function("hidden_internal", 0), false));
    // Documented but never declared: treated as private.
    events.push(Event::entity_doc(
        12,
        ItemRef::function("ghost", 0),
        DocPayload::text("Ghost."),
    ));

    let chunk = round_trip("m", events).unwrap();

    for name in ["internal", "hidden_internal", "ghost"] {
        let arity = if name == "internal" { 1 } else { 0 };
        assert!(chunk.lookup_item(&ItemRef::function(name, arity)).is_none());
        assert!(chunk
            .list_visible()
            .iter()
            .all(|entry| entry.entity.item().map(|i| i.name.as_str()) != Some(name)));
    }
    assert!(chunk.lookup_item(&ItemRef::function("public_api", 1)).is_some());

    let bytes = chunk.to_bytes();
    assert!(!bytes.windows(b"Internal.".len()).any(|w| w == b"Internal."));
}

#[test]
fn test_duplicate_doc_is_a_collection_error() {
    let f = ItemRef::function("f", 1);

    let mut unit = CompilationUnit::new("m", CompileOptions::default());
    unit.observe(Event::entity_doc(1, f.clone(), DocPayload::text("one")))
        .unwrap();
    let err = unit
        .observe(Event::entity_doc(3, f.clone(), DocPayload::text("two")))
        .unwrap_err();
    match err {
        DocError::DuplicateDoc {
            entity,
            first,
            second,
        } => {
            assert_eq!(entity, EntityRef::Item(f.clone()));
            assert_eq!(first.line, 1);
            assert_eq!(second.line, 3);
        }
        other => panic!("expected DuplicateDoc, got {other:?}"),
    }

    let mut unit = CompilationUnit::new("m", CompileOptions::default());
    unit.observe(Event::entity_doc(1, f.clone(), DocPayload::Hidden))
        .unwrap();
    assert!(matches!(
        unit.observe(Event::entity_doc(2, f, DocPayload::Hidden)),
        Err(DocError::DuplicateDoc { .. })
    ));
}

#[test]
fn test_metadata_merge_is_overwrite_only() {
    let f = ItemRef::function("f", 0);
    let events = vec![
        Event::entity_meta(1, f.clone(), meta(&[("a", MetaValue::Int(1))])),
        Event::entity_meta(
            2,
            f.clone(),
            meta(&[("a", MetaValue::Int(2)), ("b", MetaValue::Int(3))]),
        ),
        Event::entity_meta(3, f.clone(), meta(&[("b", MetaValue::Int(4))])),
        Event::declare(4, f.clone(), true),
    ];
    let chunk = round_trip("m", events).unwrap();

    let expected: BTreeMap<String, MetaValue> =
        meta(&[("a", MetaValue::Int(2)), ("b", MetaValue::Int(4))]);
    assert_eq!(chunk.lookup_item(&f).unwrap().metadata, expected);
}

#[test]
fn test_list_metadata_is_replaced() {
    let events = vec![
        Event::module_meta(1, meta(&[("cross_references", text_list(&["a", "b"]))])),
        Event::module_meta(2, meta(&[("cross_references", text_list(&["c"]))])),
    ];
    let chunk = round_trip("m", events).unwrap();
    assert_eq!(
        chunk.module_entry().metadata.get("cross_references"),
        Some(&text_list(&["c"]))
    );
}

#[test]
fn test_module_entry_always_exists() {
    let chunk = round_trip("bare", Vec::new()).unwrap();
    let module = chunk.lookup(&EntityRef::Module).unwrap();
    assert_eq!(module.content, DocContent::None);
    assert_eq!(chunk.module_name(), "bare");
    assert_eq!(chunk.version(), CHUNK_VERSION);
}

#[test]
fn test_hidden_module_does_not_hide_functions() {
    let mut events = vec![Event::module_doc(1, DocPayload::Hidden)];
    events.extend(exported_fn(3, "run", 0, "Runs."));
    let chunk = round_trip("m", events).unwrap();

    assert!(chunk.is_module_hidden());
    let visible = chunk.list_visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].entity, EntityRef::Item(ItemRef::function("run", 0)));

    // Still queryable, just not listed.
    assert_eq!(chunk.lookup(&EntityRef::Module).unwrap().content, DocContent::Hidden);
}

#[test]
fn test_newer_chunk_version_is_rejected() {
    let bytes = compile_to_artifact("m", exported_fn(1, "f", 0, "F."), CompileOptions::default())
        .unwrap();
    let artifact = Artifact::parse(&bytes).unwrap();
    let mut chunk = DocChunk::load(&artifact).unwrap().to_bytes();

    let newer = CHUNK_VERSION + 1;
    chunk[..2].copy_from_slice(&newer.to_le_bytes());

    let mut rebuilt = Artifact::new(ChunkId(*b"BEAM"));
    rebuilt.append_chunk(DOCS_CHUNK_ID, chunk).unwrap();
    assert_eq!(
        DocChunk::load_bytes(&rebuilt.to_bytes()),
        Err(ReadError::UnsupportedVersion {
            found: newer,
            supported: CHUNK_VERSION,
        })
    );
}

#[test]
fn test_missing_chunk_is_distinct_from_no_docs() {
    let options = CompileOptions {
        skip_chunk: true,
        ..CompileOptions::default()
    };
    let bytes = compile_to_artifact("m", exported_fn(1, "f", 0, "F."), options).unwrap();
    assert_eq!(DocChunk::load_bytes(&bytes), Err(ReadError::ChunkNotFound));
}

#[test]
fn test_encoding_is_deterministic() {
    let mut forward = exported_fn(1, "a", 0, "A.");
    forward.extend(exported_fn(3, "b", 1, "B."));
    forward.push(Event::declare(5, ItemRef::type_("t", 0), true));

    let mut backward = vec![Event::declare(5, ItemRef::type_("t", 0), true)];
    backward.extend(exported_fn(3, "b", 1, "B."));
    backward.extend(exported_fn(1, "a", 0, "A."));

    let one = round_trip("m", forward).unwrap();
    let two = round_trip("m", backward).unwrap();
    assert_eq!(one.digest(), two.digest());

    let kinds: Vec<EntityKind> = one
        .entries()
        .filter_map(|e| e.entity.item().map(|i| i.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![EntityKind::Function, EntityKind::Function, EntityKind::Type]
    );
}

#[test]
fn test_batch_failure_is_per_module() {
    let inputs = vec![
        UnitInput {
            module: "ok".to_string(),
            events: exported_fn(1, "f", 0, "F."),
        },
        UnitInput {
            module: "broken".to_string(),
            events: vec![Event::module_doc(
                1,
                DocPayload::Text(TextPayload::Bytes {
                    data: vec![0xff, 0xfe, 0x00],
                    encoding: TextEncoding::Utf8,
                }),
            )],
        },
    ];

    let outcomes = compile_batch(inputs, &CompileOptions::default());
    assert!(outcomes[0].result.is_ok());
    assert!(matches!(
        outcomes[1].result,
        Err(DocError::Encoding { .. })
    ));
}
