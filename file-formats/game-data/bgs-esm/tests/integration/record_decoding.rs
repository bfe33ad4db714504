//! Field loop behaviour observed through whole files

use crate::common::*;
use bgs_esm::records::{Global, ObjectRecord};
use bgs_esm::{Database, EsmError, FormTag, FormatVersion, ParseOptions};
use pretty_assertions::assert_eq;

const TES5: FormatVersion = FormatVersion::Tes5;

/// Root record followed by one top-level group; returns the bytes and the
/// offset of the first record payload in the group
fn plugin_with(tag: &[u8; 4], records: &[Vec<u8>]) -> (Vec<u8>, u64) {
    let mut bytes = tes4_root(TES5, 0.94, 0, &[]);
    let first_payload = (bytes.len() + 24 + record_header_len(TES5)) as u64;
    bytes.extend(top_group(TES5, tag, records));
    (bytes, first_payload)
}

#[test]
fn test_trailing_bytes_are_a_record_size_mismatch() {
    let mut payload = field(TES5, b"EDID", &zstring("Alph"));
    payload.extend(field(TES5, b"FNAM", b"s"));
    assert_eq!(payload.len(), 18);
    payload.extend_from_slice(&[0, 0]);

    let (bytes, offset) = plugin_with(b"GLOB", &[record(TES5, b"GLOB", 0, 0x10, &payload)]);
    let db = Database::from_bytes(bytes).unwrap();

    let err = db.records(FormTag::GLOB).unwrap_err();
    match err {
        EsmError::SizeMismatch {
            record,
            field,
            offset: at,
            expected,
            actual,
        } => {
            assert_eq!(record, FormTag::GLOB);
            assert_eq!(field, None);
            assert_eq!(at, offset);
            assert_eq!((expected, actual), (20, 18));
        }
        other => panic!("expected a size mismatch, got {other:?}"),
    }

    // Nothing was committed; the group is still unloaded
    assert!(!db.top_group(FormTag::GLOB).unwrap().is_loaded());
}

#[test]
fn test_field_overrunning_its_record() {
    let mut payload = b"FLTV".to_vec();
    payload.extend_from_slice(&10u16.to_le_bytes());
    payload.extend_from_slice(&1.5f32.to_le_bytes());

    let (bytes, offset) = plugin_with(b"GLOB", &[record(TES5, b"GLOB", 0, 0x10, &payload)]);
    let db = Database::from_bytes(bytes).unwrap();

    let err = db.records(FormTag::GLOB).unwrap_err();
    assert!(matches!(
        err,
        EsmError::SizeMismatch {
            field: Some(FormTag::FLTV),
            expected: 10,
            actual: 4,
            ..
        }
    ));
    assert!(err.to_string().contains(&format!("offset {offset}")));
}

#[test]
fn test_oversize_escape_carries_the_next_field_size() {
    let hashes: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
    let mut payload = field(TES5, b"EDID", &zstring("MountainSlab"));
    payload.extend(oversize_field(b"MODT", &hashes));
    payload.extend(field(TES5, b"MODL", &zstring("Landscape\\Mountains\\Slab01.nif")));

    let (bytes, _) = plugin_with(b"STAT", &[record(TES5, b"STAT", 0, 0x20, &payload)]);
    let db = Database::from_bytes(bytes).unwrap();

    let slab = &db.records(FormTag::STAT).unwrap()[0];
    assert_eq!(slab.editor_id(), Some("MountainSlab"));
    let model = slab.get::<ObjectRecord>().unwrap().core.model.clone().unwrap();
    assert_eq!(model.texture_hashes.map(|h| h.len()), Some(70_000));
    assert_eq!(model.path, "Landscape\\Mountains\\Slab01.nif");
}

#[test]
fn test_compressed_record_decodes_like_plain() {
    let mut payload = field(TES5, b"EDID", &zstring("PlayerGold"));
    payload.extend(field(TES5, b"FNAM", b"l"));
    payload.extend(field(TES5, b"FLTV", &250.0f32.to_le_bytes()));

    let (bytes, _) = plugin_with(
        b"GLOB",
        &[
            record(TES5, b"GLOB", 0, 0x30, &payload),
            compressed_record(TES5, b"GLOB", 0x31, &payload),
        ],
    );
    let db = Database::from_bytes(bytes).unwrap();

    let globals = db.records(FormTag::GLOB).unwrap();
    assert_eq!(globals.len(), 2);
    assert!(!globals[0].header.is_compressed());
    assert!(globals[1].header.is_compressed());
    assert_eq!(globals[0].data, globals[1].data);
    assert_eq!(globals[1].get::<Global>().map(|g| g.value), Some(250.0));
}

#[test]
fn test_corrupt_zlib_stream() {
    let mut data = 64u32.to_le_bytes().to_vec();
    data.extend_from_slice(b"definitely not zlib");
    let (bytes, _) = plugin_with(b"GLOB", &[record(TES5, b"GLOB", COMPRESSED, 0x40, &data)]);
    let db = Database::from_bytes(bytes).unwrap();

    let err = db.records(FormTag::GLOB).unwrap_err();
    assert!(matches!(err, EsmError::Decompression { .. }));
}

#[test]
fn test_inflated_size_must_match_prefix() {
    let payload = field(TES5, b"EDID", &zstring("Short"));
    let mut data = bgs_esm::compression::compress_record(&payload).unwrap();
    data[..4].copy_from_slice(&((payload.len() + 2) as u32).to_le_bytes());
    let (bytes, _) = plugin_with(b"GLOB", &[record(TES5, b"GLOB", COMPRESSED, 0x41, &data)]);
    let db = Database::from_bytes(bytes).unwrap();

    let err = db.records(FormTag::GLOB).unwrap_err();
    assert!(matches!(
        err,
        EsmError::DecompressionSizeMismatch { expected, actual, .. }
            if expected == payload.len() + 2 && actual == payload.len()
    ));
}

#[test]
fn test_unknown_records_are_skipped_by_size() {
    let global = field(TES5, b"EDID", &zstring("Kept"));
    let (bytes, _) = plugin_with(
        b"GLOB",
        &[
            record(TES5, b"ZZZZ", 0, 0x50, &[1, 2, 3, 4, 5, 6, 7]),
            record(TES5, b"GLOB", 0, 0x51, &global),
        ],
    );
    let db = Database::from_bytes(bytes).unwrap();

    let globals = db.records(FormTag::GLOB).unwrap();
    assert_eq!(globals.len(), 1);
    assert_eq!(globals[0].editor_id(), Some("Kept"));
    assert_eq!(db.top_group(FormTag::GLOB).unwrap().records().len(), 1);
}

#[test]
fn test_record_size_limit() {
    let payload = field(TES5, b"EDID", &zstring("AMuchLongerEditorIdThanTheLimitAllows"));
    let (bytes, _) = plugin_with(b"GLOB", &[record(TES5, b"GLOB", 0, 0x60, &payload)]);
    let options = ParseOptions::default().with_max_record_size(32);
    let db = Database::from_source(bytes, options).unwrap();

    let err = db.records(FormTag::GLOB).unwrap_err();
    assert!(matches!(err, EsmError::MemoryLimitExceeded { limit: 32, .. }));
}
