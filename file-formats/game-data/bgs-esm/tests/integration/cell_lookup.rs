//! Exterior and interior cell lookup through nested groups

use crate::common::*;
use bgs_esm::records::{Cell, Land};
use bgs_esm::types::FormId;
use bgs_esm::{Database, FormatVersion, GridId, Query};
use pretty_assertions::assert_eq;

const WORLD: u32 = 0x3C;

fn exterior_cell(format: FormatVersion, name: &str, x: i32, y: i32) -> Vec<u8> {
    let mut payload = field(format, b"EDID", &zstring(name));
    payload.extend(field(format, b"DATA", &[0x02]));
    payload.extend(field(format, b"XCLC", &i32s(&[x, y])));
    payload
}

/// Cell record plus its children group holding one land record
fn cell_with_land(format: FormatVersion, id: u32, name: &str, x: i32, y: i32) -> Vec<Vec<u8>> {
    let land = record(format, b"LAND", 0, id + 1, &field(format, b"DATA", &[0x01, 0, 0, 0]));
    let temporary = group(format, id, kind::CELL_TEMPORARY, &[land]);
    vec![
        record(format, b"CELL", 0, id, &exterior_cell(format, name, x, y)),
        group(format, id, kind::CELL_CHILDREN, &[temporary]),
    ]
}

fn sub_block(format: FormatVersion, x: i32, y: i32, chunks: Vec<Vec<u8>>) -> Vec<u8> {
    let key = GridId::exterior(FormId(WORLD), x, y).sub_block_key();
    group(format, key, kind::EXTERIOR_SUB_BLOCK, &chunks)
}

fn block(format: FormatVersion, x: i32, y: i32, sub_blocks: &[Vec<u8>]) -> Vec<u8> {
    let key = GridId::exterior(FormId(WORLD), x, y).block_key();
    group(format, key, kind::EXTERIOR_BLOCK, sub_blocks)
}

/// Oblivion-style file: one world with cells on both sides of the origin
/// and one interior cell
fn world_file(format: FormatVersion) -> Vec<u8> {
    let mut bytes = tes4_root(format, if format == FormatVersion::Tes4 { 1.0 } else { 0.94 }, 0, &[]);

    let interior = {
        let mut payload = field(format, b"EDID", &zstring("ICMarketDistrictTheMainEvent"));
        payload.extend(field(format, b"DATA", &[0x01]));
        record(format, b"CELL", 0, 0x2C0F, &payload)
    };
    bytes.extend(top_group(
        format,
        b"CELL",
        &[group(
            format,
            5,
            kind::INTERIOR_BLOCK,
            &[group(format, 1, kind::INTERIOR_SUB_BLOCK, &[interior])],
        )],
    ));

    let origin = sub_block(format, 0, 0, cell_with_land(format, 0x100, "Anvil", 0, 0));
    let mut neighbours = cell_with_land(format, 0x110, "GoldCoast", 10, 3);
    neighbours.push(record(format, b"CELL", 0, 0x112, &exterior_cell(format, "", 11, 3)));
    let east = sub_block(format, 10, 3, neighbours);
    let west = block(
        format,
        -1,
        -1,
        &[sub_block(format, -1, -1, cell_with_land(format, 0x120, "Bravil", -1, -1))],
    );

    let world = record(format, b"WRLD", 0, WORLD, &field(format, b"EDID", &zstring("Tamriel")));
    let children = group(
        format,
        WORLD,
        kind::WORLD_CHILDREN,
        &[block(format, 0, 0, &[origin, east]), west],
    );
    bytes.extend(top_group(format, b"WRLD", &[world, children]));
    bytes
}

fn grid(x: i32, y: i32) -> GridId {
    GridId::exterior(FormId(WORLD), x, y)
}

#[test]
fn test_cell_grid_comes_from_xclc() {
    let db = Database::from_bytes(world_file(FormatVersion::Tes4)).unwrap();

    let cell = db.query(&Query::Grid(grid(10, 3))).unwrap().unwrap();
    assert_eq!(cell.editor_id(), Some("GoldCoast"));
    let body = cell.get::<Cell>().unwrap();
    assert_eq!(body.grid, Some((10, 3)));
    assert!(!body.is_interior());
    assert_eq!(GridId::of_cell(body, FormId(WORLD)), grid(10, 3));
}

#[test]
fn test_negative_coordinates_use_their_own_block() {
    let db = Database::from_bytes(world_file(FormatVersion::Tes5)).unwrap();

    let bravil = db.query(&Query::Grid(grid(-1, -1))).unwrap().unwrap();
    assert_eq!(bravil.form_id(), FormId(0x120));
    let land = db.query(&Query::Land(grid(-1, -1))).unwrap().unwrap();
    assert!(land.get::<Land>().is_some());
    assert_eq!(land.form_id(), FormId(0x121));

    assert_eq!(db.query(&Query::Grid(grid(-2, 5))).unwrap(), None);
}

#[test]
fn test_sub_block_is_resolved_once() {
    let db = Database::from_bytes(world_file(FormatVersion::Tes5)).unwrap();

    for _ in 0..3 {
        assert!(db.query(&Query::Grid(grid(10, 3))).unwrap().is_some());
        assert!(db.query(&Query::Grid(grid(11, 3))).unwrap().is_some());
        assert!(db.query(&Query::Land(grid(10, 3))).unwrap().is_some());
    }
    assert_eq!(db.query(&Query::Land(grid(11, 3))).unwrap(), None);

    let world = db.world_children(FormId(WORLD)).unwrap().unwrap();
    let block = db.group(world.children_with_label(grid(10, 3).block_key())[0]).unwrap();
    assert_eq!(block.spatial_loads(), 1);
    assert_eq!(db.session().sub_blocks_loaded(), 1);

    // The other sub-block of the same block is resolved separately
    assert!(db.query(&Query::Grid(grid(0, 0))).unwrap().is_some());
    assert_eq!(block.spatial_loads(), 2);
}

#[test]
fn test_concurrent_lookups_share_one_load() {
    let db = Database::from_bytes(world_file(FormatVersion::Tes5)).unwrap();

    std::thread::scope(|scope| {
        for i in 0..8 {
            let db = &db;
            scope.spawn(move || {
                let target = if i % 2 == 0 { grid(10, 3) } else { grid(11, 3) };
                let cell = db.query(&Query::Grid(target)).unwrap().unwrap();
                assert_eq!(cell.get::<Cell>().unwrap().grid, Some((target.x, target.y)));
            });
        }
    });

    assert_eq!(db.session().sub_blocks_loaded(), 1);
    let world = db.world_children(FormId(WORLD)).unwrap().unwrap();
    let block = db.group(world.children_with_label(grid(10, 3).block_key())[0]).unwrap();
    assert_eq!(block.spatial_loads(), 1);
}

#[test]
fn test_interior_cell_by_name() {
    let db = Database::from_bytes(world_file(FormatVersion::Tes4)).unwrap();

    let cell = db
        .query(&Query::CellName("icmarketdistrictthemainevent"))
        .unwrap()
        .unwrap();
    assert_eq!(cell.form_id(), FormId(0x2C0F));
    assert!(cell.get::<Cell>().unwrap().is_interior());
    assert_eq!(cell.get::<Cell>().unwrap().grid_position(), (0, 0));

    // Interiors are never found by grid
    assert_eq!(db.query(&Query::Grid(GridId::interior(0, 0))).unwrap(), None);
    assert_eq!(db.query(&Query::CellName("Tamriel")).unwrap(), None);
}
