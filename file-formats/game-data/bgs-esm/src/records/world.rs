//! World data: cells, land, worldspaces, regions, climates, path grids and
//! placed references.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink};
use crate::record::Record;
use crate::records::common::{ObjectCore, read_ref, reserve_counted};
use crate::records::RecordBody;
use crate::tag::FormTag;
use crate::types::{Color, FormId, FormRef, Placement};
use crate::version::FormatVersion;

/// Cell flag marking an interior cell
pub const CELL_INTERIOR: u32 = 0x0001;

/// Tes3 cell ambient lighting (`AMBI`, 16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellAmbient {
    /// Ambient color
    pub ambient: Color,
    /// Sunlight color
    pub sunlight: Color,
    /// Fog color
    pub fog: Color,
    /// Fog density
    pub fog_density: f32,
}

/// Reference stored inline in a Tes3 cell, introduced by `FRMR`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellReference {
    /// Reference index (`FRMR`)
    pub index: u32,
    /// Base object id (`NAME`)
    pub base: String,
    /// Scale (`XSCL`)
    pub scale: Option<f32>,
    /// Position and rotation (`DATA`)
    pub placement: Placement,
    /// Door destination (`DODT`)
    pub destination: Option<Placement>,
    /// Destination cell name (`DNAM`)
    pub destination_cell: Option<String>,
    /// Owner (`ANAM`)
    pub owner: Option<String>,
    /// Stack count (`NAM9`)
    pub count: Option<i32>,
    /// Deleted (`DELE`)
    pub deleted: bool,
}

impl FieldSink for CellReference {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::NAME, _) => self.base = field.read_zstring()?,
            (FormTag::XSCL, 4) => self.scale = Some(field.read_f32()?),
            (FormTag::DATA, 24) => self.placement = field.read()?,
            (FormTag::DODT, 24) => self.destination = Some(field.read()?),
            (FormTag::DNAM, _) => self.destination_cell = Some(field.read_zstring()?),
            (FormTag::ANAM, _) => self.owner = Some(field.read_zstring()?),
            (FormTag::NAM9, 4) => self.count = Some(field.read_i32()?),
            (FormTag::DELE, _) => {
                self.deleted = true;
                field.skip(field.remaining())?;
            }
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `CELL` record
///
/// ```text
/// Tes3  DATA (12 bytes): flags u32, grid x i32, grid y i32
/// Tes4  DATA (1 byte) flags, XCLC (8 bytes): grid x, grid y
/// Tes5+ DATA (2 bytes) flags, XCLC (12 bytes): grid x, grid y, land flags
/// ```
///
/// Tes3 cells carry their references inline: every field after the first
/// `FRMR` belongs to the most recent reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    /// Common fields; Tes3 cells use the cell name as editor id
    pub core: ObjectCore,
    /// Cell flags
    pub flags: u32,
    /// Exterior grid coordinates
    pub grid: Option<(i32, i32)>,
    /// Water height
    pub water_height: Option<f32>,
    /// Region (Tes3 `RGNN`)
    pub region: Option<String>,
    /// Regions (`XCLR`)
    pub regions: Vec<FormId>,
    /// Climate (`XCCM`)
    pub climate: Option<FormId>,
    /// Water type (`XCWT`)
    pub water: Option<FormId>,
    /// Owner (`XOWN`)
    pub owner: Option<FormId>,
    /// Tes3 ambient lighting
    pub ambient: Option<CellAmbient>,
    /// Tes3 inline references
    pub references: Vec<CellReference>,
}

impl Cell {
    /// Whether the cell is an interior
    #[must_use]
    pub fn is_interior(&self) -> bool {
        self.flags & CELL_INTERIOR != 0
    }

    /// Grid position used for lookups: the `XCLC`/`DATA` grid for exteriors,
    /// `(0, 0)` for interiors and cells without one
    #[must_use]
    pub fn grid_position(&self) -> (i32, i32) {
        if self.is_interior() {
            return (0, 0);
        }
        self.grid.unwrap_or((0, 0))
    }
}

impl FieldSink for Cell {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        if tes3 {
            if field.tag() == FormTag::FRMR && field.len() == 4 {
                self.references.push(CellReference {
                    index: field.read_u32()?,
                    ..CellReference::default()
                });
                return Ok(FieldOutcome::Handled);
            }
            if let Some(reference) = self.references.last_mut() {
                return reference.read_field(field);
            }
        }

        match (field.tag(), field.len()) {
            (FormTag::DATA, 12) if tes3 => {
                self.flags = field.read_u32()?;
                let x = field.read_i32()?;
                let y = field.read_i32()?;
                self.grid = Some((x, y));
            }
            (FormTag::RGNN, _) if tes3 => self.region = Some(field.read_zstring()?),
            (FormTag::WHGT, 4) if tes3 => self.water_height = Some(field.read_f32()?),
            (FormTag::INTV, 4) if tes3 => self.water_height = Some(field.read_i32()? as f32),
            (FormTag::AMBI, 16) if tes3 => {
                let ambient = field.read()?;
                let sunlight = field.read()?;
                let fog = field.read()?;
                let fog_density = field.read_f32()?;
                self.ambient = Some(CellAmbient {
                    ambient,
                    sunlight,
                    fog,
                    fog_density,
                });
            }
            (FormTag::NAM0, 4) if tes3 => reserve_counted(field, &mut self.references)?,
            (FormTag::DATA, 1) => self.flags = u32::from(field.read_u8()?),
            (FormTag::DATA, 2) => self.flags = u32::from(field.read_u16()?),
            (FormTag::XCLC, 8 | 12) => {
                let x = field.read_i32()?;
                let y = field.read_i32()?;
                field.skip(field.remaining())?;
                self.grid = Some((x, y));
            }
            (FormTag::XCLW, 4) => self.water_height = Some(field.read_f32()?),
            (FormTag::XCLR, _) => self.regions = field.read_form_ids()?,
            (FormTag::XCCM, 4) => self.climate = Some(field.read_form_id()?),
            (FormTag::XCWT, 4) => self.water = Some(field.read_form_id()?),
            (FormTag::XOWN, 4) => self.owner = Some(field.read_form_id()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Terrain height grid as stored in `VHGT`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeightMap {
    /// Height of the first vertex
    pub offset: f32,
    /// Per-vertex deltas, row-major
    pub deltas: Vec<i8>,
}

/// Texture layer of a land quadrant (`BTXT`/`ATXT`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandLayer {
    /// Land texture
    pub texture: FormId,
    /// Quadrant 0..=3
    pub quadrant: u8,
    /// Layer; `None` for the base layer
    pub layer: Option<u16>,
    /// Alpha points (`VTXT`): vertex position and opacity
    pub alpha: Vec<(u16, f32)>,
}

/// `LAND` record
///
/// ```text
/// Tes3  INTV (8 bytes): grid x, grid y
///       VHGT (4232 bytes): offset f32, deltas i8[65*65], pad u8[3]
///       VTEX (512 bytes): texture index u16[16*16]
/// Tes4+ VHGT (1096 bytes): offset f32, deltas i8[33*33], pad u8[3]
///       BTXT/ATXT (8 bytes): texture, quadrant u8, pad u8, layer u16
///       VTXT (8 bytes each): position u16, pad u16, opacity f32
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Land {
    /// Data flags
    pub flags: u32,
    /// Grid position (Tes3; later games take it from the cell)
    pub grid: Option<(i32, i32)>,
    /// Vertex normals (`VNML`)
    pub normals: Option<Vec<u8>>,
    /// Heights (`VHGT`)
    pub height_map: Option<HeightMap>,
    /// Vertex colors (`VCLR`)
    pub colors: Option<Vec<u8>>,
    /// Tes3 texture indices (`VTEX`)
    pub texture_indices: Option<Vec<u16>>,
    /// Texture layers
    pub layers: Vec<LandLayer>,
}

impl Land {
    /// Vertices per side: 65 for Tes3 land, 33 otherwise
    #[must_use]
    pub fn side(&self) -> Option<usize> {
        let len = self.height_map.as_ref()?.deltas.len();
        [65usize, 33].into_iter().find(|side| side * side == len)
    }

    /// Absolute heights in world units, row-major.
    ///
    /// Each row starts from the previous row's first vertex plus the row's
    /// first delta; within a row every delta adds to the previous vertex.
    /// Stored units are multiplied by 8.
    #[must_use]
    pub fn heights(&self) -> Option<Vec<f32>> {
        let map = self.height_map.as_ref()?;
        let side = self.side()?;
        let mut heights = Vec::with_capacity(side * side);
        let mut row_start = map.offset;
        for row in map.deltas.chunks_exact(side) {
            row_start += f32::from(row[0]);
            let mut height = row_start;
            heights.push(height * 8.0);
            for &delta in &row[1..] {
                height += f32::from(delta);
                heights.push(height * 8.0);
            }
        }
        Some(heights)
    }
}

impl FieldSink for Land {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let len = field.len();
        match (field.tag(), len) {
            (FormTag::INTV, 8) => {
                let x = field.read_i32()?;
                let y = field.read_i32()?;
                self.grid = Some((x, y));
            }
            (FormTag::DATA, 4) => self.flags = field.read_u32()?,
            (FormTag::VNML, _) => self.normals = Some(field.read_to_end()?),
            (FormTag::VCLR, _) => self.colors = Some(field.read_to_end()?),
            (FormTag::VHGT, 4232 | 1096) => {
                let side = if len == 4232 { 65 } else { 33 };
                let offset = field.read_f32()?;
                let deltas = field
                    .read_bytes(side * side)?
                    .into_iter()
                    .map(|b| b as i8)
                    .collect();
                field.skip(3)?;
                self.height_map = Some(HeightMap { offset, deltas });
            }
            (FormTag::VTEX, 512) => self.texture_indices = Some(field.read_all()?),
            (FormTag::BTXT | FormTag::ATXT, 8) => {
                let texture = field.read_form_id()?;
                let quadrant = field.read_u8()?;
                let _pad = field.read_u8()?;
                let layer = field.read_u16()?;
                self.layers.push(LandLayer {
                    texture,
                    quadrant,
                    layer: (field.tag() == FormTag::ATXT).then_some(layer),
                    alpha: Vec::new(),
                });
            }
            (FormTag::VTXT, _) if len % 8 == 0 => {
                let mut alpha = Vec::with_capacity(len / 8);
                while field.remaining() > 0 {
                    let position = field.read_u16()?;
                    field.skip(2)?;
                    alpha.push((position, field.read_f32()?));
                }
                match self.layers.last_mut() {
                    Some(layer) => layer.alpha = alpha,
                    None => log::warn!("LAND alpha data without a texture layer"),
                }
            }
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

impl RecordBody for Land {
    fn editor_id(&self) -> Option<&str> {
        None
    }
}

/// `WRLD` record (Oblivion and later)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worldspace {
    /// Common fields
    pub core: ObjectCore,
    /// Parent worldspace (`WNAM`)
    pub parent: Option<FormRef<Worldspace>>,
    /// Climate (`CNAM`)
    pub climate: Option<FormRef<Climate>>,
    /// Water (`NAM2`)
    pub water: Option<FormId>,
    /// Flags (`DATA`)
    pub flags: u8,
    /// South-west corner of the object bounds (`NAM0`)
    pub min: Option<[f32; 2]>,
    /// North-east corner of the object bounds (`NAM9`)
    pub max: Option<[f32; 2]>,
}

impl FieldSink for Worldspace {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::WNAM, 4) => self.parent = Some(read_ref(field)?),
            (FormTag::CNAM, 4) => self.climate = Some(read_ref(field)?),
            (FormTag::NAM2, 4) => self.water = Some(field.read_form_id()?),
            (FormTag::DATA, 1) => self.flags = field.read_u8()?,
            (FormTag::NAM0, 8) => self.min = Some(field.read()?),
            (FormTag::NAM9, 8) => self.max = Some(field.read()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `REGN` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    /// Common fields
    pub core: ObjectCore,
    /// Map color (`CNAM` for Tes3, `RCLR` otherwise)
    pub color: Option<Color>,
    /// Worldspace (`WNAM`)
    pub world: Option<FormId>,
    /// Tes3 weather chances (`WEAT`)
    pub weather_chances: Vec<u8>,
    /// Tes3 sleep creature (`BNAM`)
    pub sleep_creature: Option<String>,
    /// Tes3 ambient sounds (`SNAM`): name and chance
    pub sounds: Vec<(String, u8)>,
    /// Area outlines (`RPLD`)
    pub areas: Vec<Vec<[f32; 2]>>,
}

impl FieldSink for Region {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::WEAT, _) if tes3 => self.weather_chances = field.read_to_end()?,
            (FormTag::BNAM, _) if tes3 => self.sleep_creature = Some(field.read_zstring()?),
            (FormTag::CNAM, 4) if tes3 => self.color = Some(field.read()?),
            (FormTag::SNAM, 33) if tes3 => {
                let name = field.read_fixed_string(32)?;
                let chance = field.read_u8()?;
                self.sounds.push((name, chance));
            }
            (FormTag::RCLR, 4) => self.color = Some(field.read()?),
            (FormTag::WNAM, 4) if !tes3 => self.world = Some(field.read_form_id()?),
            (FormTag::RPLD, len) if len % 8 == 0 => self.areas.push(field.read_all()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Weather entry of a climate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateWeather {
    /// Weather
    pub weather: FormId,
    /// Chance
    pub chance: i32,
    /// Global controlling the chance (Skyrim and later)
    pub global: Option<FormId>,
}

/// `CLMT` record (Oblivion and later)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Climate {
    /// Common fields
    pub core: ObjectCore,
    /// Weather list (`WLST`, 8 or 12 bytes per entry)
    pub weathers: Vec<ClimateWeather>,
    /// Sun texture (`FNAM`)
    pub sun_texture: Option<String>,
    /// Sun glare texture (`GNAM`)
    pub glare_texture: Option<String>,
    /// Sunrise/sunset timing, volatility and moon phases (`TNAM`)
    pub timing: Option<[u8; 6]>,
}

impl FieldSink for Climate {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::WLST, len) => {
                let stride = if field.format() == FormatVersion::Tes4 || len % 12 != 0 {
                    8
                } else {
                    12
                };
                if len % stride != 0 {
                    return Ok(FieldOutcome::Unhandled);
                }
                while field.remaining() > 0 {
                    let weather = field.read_form_id()?;
                    let chance = field.read_i32()?;
                    let global = if stride == 12 {
                        Some(field.read_form_id()?)
                    } else {
                        None
                    };
                    self.weathers.push(ClimateWeather {
                        weather,
                        chance,
                        global,
                    });
                }
            }
            (FormTag::FNAM, _) => self.sun_texture = Some(field.read_zstring()?),
            (FormTag::GNAM, _) => self.glare_texture = Some(field.read_zstring()?),
            (FormTag::TNAM, 6) => self.timing = Some(field.read()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Node of a path grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathPoint {
    /// Position
    pub position: [f32; 3],
    /// Number of connections
    pub connections: u8,
}

/// `PGRD` record (Morrowind and Oblivion)
///
/// ```text
/// Tes3 DATA (12 bytes): grid x, grid y, granularity u16, point count u16
///      PGRP (16 bytes each): x, y, z i32, auto u8, connections u8, pad u16
///      PGRC: connected point indices u32[]
/// Tes4 DATA (2 bytes): point count u16
///      PGRP (16 bytes each): x, y, z f32, connections u8, pad u8[3]
///      PGRR: connected point indices u16[]
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathGrid {
    /// Common fields; Tes3 path grids name their cell
    pub core: ObjectCore,
    /// Grid position (Tes3)
    pub grid: Option<(i32, i32)>,
    /// Granularity (Tes3)
    pub granularity: Option<u16>,
    /// Declared point count
    pub point_count: u16,
    /// Points
    pub points: Vec<PathPoint>,
    /// Connection targets, in point order
    pub edges: Vec<u32>,
}

impl FieldSink for PathGrid {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::DATA, 12) if tes3 => {
                let x = field.read_i32()?;
                let y = field.read_i32()?;
                self.grid = Some((x, y));
                self.granularity = Some(field.read_u16()?);
                self.point_count = field.read_u16()?;
            }
            (FormTag::DATA, 2) => self.point_count = field.read_u16()?,
            (FormTag::PGRP, len) if len % 16 == 0 => {
                while field.remaining() > 0 {
                    let position = if tes3 {
                        let x = field.read_i32()?;
                        let y = field.read_i32()?;
                        let z = field.read_i32()?;
                        let _auto = field.read_u8()?;
                        [x as f32, y as f32, z as f32]
                    } else {
                        field.read()?
                    };
                    let connections = field.read_u8()?;
                    field.skip(if tes3 { 2 } else { 3 })?;
                    self.points.push(PathPoint {
                        position,
                        connections,
                    });
                }
            }
            (FormTag::PGRC, len) if tes3 && len % 4 == 0 => {
                self.edges = field.read_all()?;
            }
            (FormTag::PGRR, len) if !tes3 && len % 2 == 0 => {
                let edges: Vec<u16> = field.read_all()?;
                self.edges = edges.into_iter().map(u32::from).collect();
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Enable parent of a reference (`XESP`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableParent {
    /// Parent reference
    pub reference: FormId,
    /// Flags; bit 0 inverts the parent state
    pub flags: u8,
}

/// Door teleport destination (`XTEL`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Teleport {
    /// Destination door reference
    pub door: FormId,
    /// Destination position and rotation
    pub placement: Placement,
}

/// Placed references: `REFR`, `ACHR`, `ACRE` and the placed projectiles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference {
    /// Editor id (`EDID`)
    pub editor_id: Option<String>,
    /// Base object (`NAME`)
    pub base: Option<FormRef<Record>>,
    /// Position and rotation (`DATA`)
    pub placement: Placement,
    /// Scale (`XSCL`)
    pub scale: Option<f32>,
    /// Enable parent (`XESP`)
    pub enable_parent: Option<EnableParent>,
    /// Teleport destination (`XTEL`)
    pub teleport: Option<Teleport>,
    /// Owner (`XOWN`)
    pub owner: Option<FormId>,
}

impl FieldSink for Reference {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::EDID, _) => self.editor_id = Some(field.read_zstring()?),
            (FormTag::NAME, 4) => self.base = Some(FormRef::id(field.read_form_id()?)),
            (FormTag::DATA, 24) => self.placement = field.read()?,
            (FormTag::XSCL, 4) => self.scale = Some(field.read_f32()?),
            (FormTag::XESP, 8) => {
                let reference = field.read_form_id()?;
                let flags = field.read_u8()?;
                field.skip(3)?;
                self.enable_parent = Some(EnableParent { reference, flags });
            }
            (FormTag::XTEL, 28 | 32) => {
                let door = field.read_form_id()?;
                let placement = field.read()?;
                field.skip(field.remaining())?;
                self.teleport = Some(Teleport { door, placement });
            }
            (FormTag::XOWN, 4) => self.owner = Some(field.read_form_id()?),
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

impl RecordBody for Reference {
    fn editor_id(&self) -> Option<&str> {
        self.editor_id.as_deref()
    }
}

object_body!(Cell, Worldspace, Region, Climate, PathGrid);
