//! Magic: effects, spells, enchantments, potions, ingredients and scripts.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink};
use crate::records::common::{EffectList, ObjectCore};
use crate::tag::FormTag;
use crate::version::FormatVersion;

/// `MGEF` record
///
/// ```text
/// Tes3 MEDT (36 bytes): school i32, base cost f32, flags u32, rgb i32[3],
///                       speed f32, size f32, size cap f32
/// Tes4+ DATA (36+ bytes): flags u32, base cost f32, ... (tail varies)
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MagicEffect {
    /// Common fields
    pub core: ObjectCore,
    /// Tes3 effect index (`INDX`)
    pub index: Option<u32>,
    /// Magic school (Tes3)
    pub school: Option<i32>,
    /// Base magicka cost
    pub base_cost: f32,
    /// Effect flags
    pub flags: u32,
}

impl FieldSink for MagicEffect {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::INDX, 4) if tes3 => self.index = Some(field.read_u32()?),
            (FormTag::MEDT, 36) if tes3 => {
                self.school = Some(field.read_i32()?);
                self.base_cost = field.read_f32()?;
                self.flags = field.read_u32()?;
                field.skip(field.remaining())?;
            }
            (FormTag::DATA, len) if !tes3 && len >= 36 => {
                self.flags = field.read_u32()?;
                self.base_cost = field.read_f32()?;
                field.skip(field.remaining())?;
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Spell, enchantment and alchemy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagicData {
    /// Spell/enchantment type
    pub kind: u32,
    /// Magicka cost
    pub cost: u32,
    /// Charge (enchantments)
    pub charge: Option<u32>,
    /// Flags (auto-calc and friends)
    pub flags: u32,
}

/// `SPEL` record
///
/// ```text
/// Tes3  SPDT (12 bytes): type, cost, flags
/// Tes4  SPIT (16 bytes): type, cost, level, flags u8 + 3 pad
/// Tes5+ SPIT (36 bytes): cost, flags, type, charge time f32, cast type,
///                        delivery, cast duration f32, range f32, perk
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spell {
    /// Common fields
    pub core: ObjectCore,
    /// Spell parameters
    pub data: MagicData,
    /// Effects
    pub effects: EffectList,
}

impl FieldSink for Spell {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::SPDT, 12) => {
                let kind = field.read_u32()?;
                let cost = field.read_u32()?;
                let flags = field.read_u32()?;
                self.data = MagicData {
                    kind,
                    cost,
                    charge: None,
                    flags,
                };
            }
            (FormTag::SPIT, 16) => {
                let kind = field.read_u32()?;
                let cost = field.read_u32()?;
                let _level = field.read_u32()?;
                let flags = u32::from(field.read_u8()?);
                field.skip(3)?;
                self.data = MagicData {
                    kind,
                    cost,
                    charge: None,
                    flags,
                };
            }
            (FormTag::SPIT, 36) => {
                let cost = field.read_u32()?;
                let flags = field.read_u32()?;
                let kind = field.read_u32()?;
                field.skip(field.remaining())?;
                self.data = MagicData {
                    kind,
                    cost,
                    charge: None,
                    flags,
                };
            }
            _ => match self.effects.read_field(field)? {
                FieldOutcome::Handled => {}
                FieldOutcome::Unhandled => return self.core.read_field(field),
            },
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `ENCH` record
///
/// ```text
/// Tes3  ENDT (16 bytes): type, cost, charge, auto-calc
/// Tes4  ENIT (16 bytes): type, charge, cost, flags u8 + 3 pad
/// Tes5+ ENIT (32/36 bytes): cost, flags, cast type, charge, ...
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Enchantment {
    /// Common fields
    pub core: ObjectCore,
    /// Enchantment parameters
    pub data: MagicData,
    /// Effects
    pub effects: EffectList,
}

impl FieldSink for Enchantment {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let format = field.format();
        match (field.tag(), field.len()) {
            (FormTag::ENDT, 16) => {
                let kind = field.read_u32()?;
                let cost = field.read_u32()?;
                let charge = field.read_u32()?;
                let flags = field.read_u32()?;
                self.data = MagicData {
                    kind,
                    cost,
                    charge: Some(charge),
                    flags,
                };
            }
            (FormTag::ENIT, 16) if format == FormatVersion::Tes4 => {
                let kind = field.read_u32()?;
                let charge = field.read_u32()?;
                let cost = field.read_u32()?;
                let flags = u32::from(field.read_u8()?);
                field.skip(3)?;
                self.data = MagicData {
                    kind,
                    cost,
                    charge: Some(charge),
                    flags,
                };
            }
            (FormTag::ENIT, 32 | 36) if format == FormatVersion::Tes5 => {
                let cost = field.read_u32()?;
                let flags = field.read_u32()?;
                let kind = field.read_u32()?;
                let charge = field.read_u32()?;
                field.skip(field.remaining())?;
                self.data = MagicData {
                    kind,
                    cost,
                    charge: Some(charge),
                    flags,
                };
            }
            _ => match self.effects.read_field(field)? {
                FieldOutcome::Handled => {}
                FieldOutcome::Unhandled => return self.core.read_field(field),
            },
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `ALCH` record
///
/// ```text
/// Tes3 ALDT (12 bytes): weight f32, value i32, auto-calc i32
/// Tes4 DATA (4 bytes) weight, ENIT (8 bytes): value i32, flags u8 + 3 pad
/// Tes5 DATA (4 bytes) weight, ENIT (20 bytes): value i32, flags u32, addiction,
///                                              addiction chance, use sound
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Potion {
    /// Common fields
    pub core: ObjectCore,
    /// Weight
    pub weight: f32,
    /// Value in gold
    pub value: i32,
    /// Flags
    pub flags: u32,
    /// Effects
    pub effects: EffectList,
}

impl FieldSink for Potion {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::ALDT, 12) => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                self.flags = field.read_u32()?;
            }
            (FormTag::TEXT, _) if field.format() == FormatVersion::Tes3 => {
                self.core.icon = Some(field.read_zstring()?);
            }
            (FormTag::DATA, 4) => self.weight = field.read_f32()?,
            (FormTag::ENIT, 8) => {
                self.value = field.read_i32()?;
                self.flags = u32::from(field.read_u8()?);
                field.skip(3)?;
            }
            (FormTag::ENIT, 20) => {
                self.value = field.read_i32()?;
                self.flags = field.read_u32()?;
                field.skip(field.remaining())?;
            }
            _ => match self.effects.read_field(field)? {
                FieldOutcome::Handled => {}
                FieldOutcome::Unhandled => return self.core.read_field(field),
            },
        }
        Ok(FieldOutcome::Handled)
    }
}

/// One of the four Tes3 ingredient effect slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngredientSlot {
    /// Effect index; `-1` when empty
    pub effect: i32,
    /// Affected skill
    pub skill: i32,
    /// Affected attribute
    pub attribute: i32,
}

/// `INGR` record
///
/// Tes3 packs everything into `IRDT` (56 bytes): weight f32, value i32,
/// then four effect ids, four skill ids and four attribute ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ingredient {
    /// Common fields
    pub core: ObjectCore,
    /// Weight
    pub weight: f32,
    /// Value in gold
    pub value: i32,
    /// Flags
    pub flags: u32,
    /// Tes3 effect slots
    pub slots: Vec<IngredientSlot>,
    /// Effects (Oblivion and later)
    pub effects: EffectList,
}

impl FieldSink for Ingredient {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::IRDT, 56) => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                let raw: [[i32; 4]; 3] = field.read()?;
                self.slots = (0..4)
                    .map(|i| IngredientSlot {
                        effect: raw[0][i],
                        skill: raw[1][i],
                        attribute: raw[2][i],
                    })
                    .filter(|slot| slot.effect >= 0)
                    .collect();
            }
            (FormTag::DATA, 4) => self.weight = field.read_f32()?,
            (FormTag::ENIT, 8) => {
                self.value = field.read_i32()?;
                self.flags = u32::from(field.read_u8()?);
                field.skip(3)?;
            }
            _ => match self.effects.read_field(field)? {
                FieldOutcome::Handled => {}
                FieldOutcome::Unhandled => return self.core.read_field(field),
            },
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Script header counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptHeader {
    /// Number of short locals (Tes3)
    pub num_shorts: u32,
    /// Number of long locals (Tes3)
    pub num_longs: u32,
    /// Number of float locals (Tes3)
    pub num_floats: u32,
    /// Compiled size
    pub compiled_size: u32,
    /// Local variable count or size
    pub variable_count: u32,
    /// Script type (Oblivion and Fallout)
    pub kind: Option<u16>,
}

/// `SCPT` record (Morrowind to New Vegas)
///
/// ```text
/// Tes3 SCHD (52 bytes): name char[32], shorts, longs, floats, data size, var size
/// Tes4 SCHR (20 bytes): unused, ref count, compiled size, variable count,
///                       type u16, flags u16
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    /// Common fields
    pub core: ObjectCore,
    /// Header counters
    pub header: ScriptHeader,
    /// Local variable names
    pub variables: Vec<String>,
    /// Compiled bytecode (`SCDT`/`SCDA`)
    pub compiled: Vec<u8>,
    /// Source text (`SCTX`)
    pub source: String,
}

impl FieldSink for Script {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::SCHD, 52) => {
                self.core.editor_id = Some(field.read_fixed_string(32)?);
                self.header.num_shorts = field.read_u32()?;
                self.header.num_longs = field.read_u32()?;
                self.header.num_floats = field.read_u32()?;
                self.header.compiled_size = field.read_u32()?;
                self.header.variable_count = field.read_u32()?;
            }
            (FormTag::SCHR, 20) => {
                field.skip(4)?;
                let _ref_count = field.read_u32()?;
                self.header.compiled_size = field.read_u32()?;
                self.header.variable_count = field.read_u32()?;
                self.header.kind = Some(field.read_u16()?);
                let _flags = field.read_u16()?;
            }
            (FormTag::SCVR, _) => {
                // Tes3 packs every name in one NUL-separated field
                let raw = field.read_to_end()?;
                self.variables.extend(
                    raw.split(|&b| b == 0)
                        .filter(|name| !name.is_empty())
                        .map(|name| String::from_utf8_lossy(name).into_owned()),
                );
            }
            (FormTag::SCDT | FormTag::SCDA, _) => self.compiled = field.read_to_end()?,
            (FormTag::SCTX, _) => self.source = field.read_zstring()?,
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

object_body!(MagicEffect, Spell, Enchantment, Potion, Ingredient, Script);
