//! Opening files: schema detection, root records and top-level groups

use crate::common::*;
use bgs_esm::records::MasterFile;
use bgs_esm::{Database, EsmError, FormTag, FormatVersion, GameEdition, LString, ParseOptions};
use pretty_assertions::assert_eq;

const TES5: FormatVersion = FormatVersion::Tes5;

#[test]
fn test_open_morrowind_master_from_disk() {
    let mut bytes = tes3_root(1.3, 1, "Bethesda Softworks", "The main data file", 2);
    let mut global = field(FormatVersion::Tes3, b"NAME", &zstring("GameHour"));
    global.extend(field(FormatVersion::Tes3, b"FNAM", b"f"));
    global.extend(field(FormatVersion::Tes3, b"FLTV", &9.0f32.to_le_bytes()));
    bytes.extend(record(FormatVersion::Tes3, b"GLOB", 0, 0, &global));
    let (_dir, path) = write_plugin("Morrowind.esm", &bytes);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.format(), FormatVersion::Tes3);
    assert_eq!(db.edition(), GameEdition::Morrowind);

    let header = db.header();
    assert!((header.version - 1.3).abs() < f32::EPSILON);
    assert_eq!(header.file_type, Some(1));
    assert_eq!(header.author, "Bethesda Softworks");
    assert_eq!(header.description, "The main data file");
    assert_eq!(header.num_records, 2);

    let globals = db.records(FormTag::GLOB).unwrap();
    assert_eq!(globals.len(), 1);
    assert_eq!(globals[0].editor_id(), Some("GameHour"));
}

#[test]
fn test_open_oblivion_uses_twenty_byte_headers() {
    let format = FormatVersion::Tes4;
    let mut bytes = tes4_root(format, 1.0, 0, &[]);
    let global = field(format, b"EDID", &zstring("TimeScale"));
    bytes.extend(top_group(format, b"GLOB", &[record(format, b"GLOB", 0, 0x3A, &global)]));

    let db = Database::from_bytes(bytes).unwrap();
    assert_eq!(db.format(), FormatVersion::Tes4);
    assert_eq!(db.edition(), GameEdition::Oblivion);
    assert_eq!(db.header().next_object_id, Some(0x0100_0800));
    assert_eq!(db.records(FormTag::GLOB).unwrap()[0].editor_id(), Some("TimeScale"));
}

#[test]
fn test_localized_plugin_with_masters() {
    let mut size = Vec::new();
    size.extend_from_slice(&0x0F00_0000u32.to_le_bytes());
    size.extend_from_slice(&1u32.to_le_bytes());
    let root = tes4_root(
        TES5,
        1.71,
        0x81,
        &[
            field(TES5, b"CNAM", &zstring("mcarofano")),
            field(TES5, b"MAST", &zstring("Skyrim.esm")),
            field(TES5, b"DATA", &size),
        ],
    );
    let mut stat = field(TES5, b"EDID", &zstring("RockPile01"));
    stat.extend(field(TES5, b"FULL", &0x0000_1234u32.to_le_bytes()));
    let mut bytes = root;
    bytes.extend(top_group(TES5, b"STAT", &[record(TES5, b"STAT", 0, 0x0100_0D62, &stat)]));

    let db = Database::from_bytes(bytes).unwrap();
    assert_eq!(db.edition(), GameEdition::SkyrimSE);
    assert!(db.is_localized());
    assert_eq!(db.header().author, "mcarofano");
    assert_eq!(
        db.header().masters,
        vec![MasterFile {
            name: "Skyrim.esm".into(),
            size: Some(0x1_0F00_0000),
        }]
    );

    let rock = &db.records(FormTag::STAT).unwrap()[0];
    assert_eq!(rock.name(), Some(&LString::Id(0x1234)));
}

#[test]
fn test_hedr_0_94_is_skyrim_unless_forced() {
    let bytes = tes4_root(TES5, 0.94, 0, &[]);
    let db = Database::from_bytes(bytes.clone()).unwrap();
    assert_eq!(db.edition(), GameEdition::Skyrim);

    let forced = Database::from_source(bytes, ParseOptions::default().with_edition(GameEdition::Fallout3))
        .unwrap();
    assert_eq!(forced.edition(), GameEdition::Fallout3);
}

#[test]
fn test_repeated_top_level_labels_share_a_node() {
    let mut bytes = tes4_root(TES5, 0.94, 0, &[]);
    for (id, name) in [(0x10, "First"), (0x11, "Second")] {
        let global = field(TES5, b"EDID", &zstring(name));
        bytes.extend(top_group(TES5, b"GLOB", &[record(TES5, b"GLOB", 0, id, &global)]));
    }

    let db = Database::from_bytes(bytes).unwrap();
    assert_eq!(db.top_groups().len(), 1);
    let globals = db.top_group(FormTag::GLOB).unwrap();
    assert_eq!(globals.headers().len(), 2);
    assert_eq!(db.records(FormTag::GLOB).unwrap().len(), 2);
    assert_eq!(globals.materializations(), 1);
}

#[test]
fn test_invalid_magic() {
    let bytes = record(TES5, b"WEAP", 0, 1, &[]);
    let err = Database::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, EsmError::InvalidMagic { offset: 0, .. }));
}

#[test]
fn test_top_group_past_end_of_file() {
    let mut bytes = tes4_root(TES5, 0.94, 0, &[]);
    let mut globals = top_group(TES5, b"GLOB", &[record(TES5, b"GLOB", 0, 1, &[])]);
    globals.truncate(globals.len() - 4);
    bytes.extend(globals);

    let err = Database::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, EsmError::GroupSizeMismatch { .. }));
}
