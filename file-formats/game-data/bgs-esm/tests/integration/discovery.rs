//! Header-only discovery and bulk decoding

use crate::common::*;
use bgs_esm::parallel::decode_records;
use bgs_esm::{EsmError, FormTag, FormatVersion, GameEdition, ParseOptions, ReadContext, discover};
use pretty_assertions::assert_eq;
use std::io::Cursor;

const TES5: FormatVersion = FormatVersion::Tes5;

fn sample() -> Vec<u8> {
    let mut bytes = tes4_root(TES5, 0.94, 0, &[]);
    let globals: Vec<Vec<u8>> = (0..16u32)
        .map(|i| {
            let mut payload = field(TES5, b"EDID", &zstring(&format!("Global{i:02}")));
            payload.extend(field(TES5, b"FLTV", &(i as f32).to_le_bytes()));
            if i % 2 == 0 {
                compressed_record(TES5, b"GLOB", 0x100 + i, &payload)
            } else {
                record(TES5, b"GLOB", 0, 0x100 + i, &payload)
            }
        })
        .collect();
    bytes.extend(top_group(TES5, b"GLOB", &globals));
    bytes
}

#[test]
fn test_discovery_sees_every_header() {
    let bytes = sample();
    let index = discover(&mut Cursor::new(&bytes)).unwrap();

    assert_eq!(index.format, TES5);
    assert_eq!(index.length, bytes.len() as u64);
    assert_eq!(index.groups.len(), 1);
    assert_eq!(index.count(FormTag::GLOB), 16);
    assert_eq!(index.compressed_records(), 8);
    assert_eq!(index.records_in(0).count(), 16);
}

#[test]
fn test_bulk_decode_keeps_stream_order() {
    let bytes = sample();
    let index = discover(&mut Cursor::new(&bytes)).unwrap();
    let records = decode_records(
        &bytes,
        &index,
        ReadContext::new(GameEdition::Skyrim),
        &ParseOptions::default(),
    )
    .unwrap();

    // Root record first, then the globals in file order
    assert_eq!(records.len(), 17);
    assert_eq!(records[0].tag(), FormTag::TES4);
    let names: Vec<_> = records[1..]
        .iter()
        .map(|r| r.editor_id().unwrap().to_string())
        .collect();
    let expected: Vec<_> = (0..16).map(|i| format!("Global{i:02}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_discovery_rejects_short_groups() {
    let mut bytes = tes4_root(TES5, 0.94, 0, &[]);
    let root_len = bytes.len();
    let mut globals = top_group(TES5, b"GLOB", &[record(TES5, b"GLOB", 0, 1, &[0; 12])]);
    // Claim four bytes fewer than the group holds
    let total = u32::from_le_bytes(globals[4..8].try_into().unwrap()) - 4;
    globals[4..8].copy_from_slice(&total.to_le_bytes());
    bytes.extend(globals);
    assert!(bytes.len() > root_len);

    let err = discover(&mut Cursor::new(&bytes)).unwrap_err();
    assert!(matches!(err, EsmError::GroupSizeMismatch { .. }));
}
