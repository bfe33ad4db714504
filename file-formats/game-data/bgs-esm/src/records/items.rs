//! Inventory items.
//!
//! Stat blocks moved between fields and changed width across games. Each
//! record matches on `(field tag, size)`, which is unambiguous within a tier.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink, LString};
use crate::records::common::{ObjectCore, read_ref};
use crate::records::magic::Enchantment;
use crate::tag::FormTag;
use crate::types::{Color, FormId, FormRef};
use crate::version::FormatVersion;

/// Weapon statistics common to every tier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeaponStats {
    /// Value in gold
    pub value: i32,
    /// Weight
    pub weight: f32,
    /// Base damage (Tes3: maximum chop damage)
    pub damage: u16,
    /// Condition
    pub health: Option<u32>,
    /// Attack speed
    pub speed: Option<f32>,
    /// Reach
    pub reach: Option<f32>,
    /// Weapon type
    pub kind: Option<u32>,
    /// Flags
    pub flags: u32,
}

/// `WEAP` record
///
/// ```text
/// Tes3 WPDT (32 bytes): weight, value, type u16, health u16, speed, reach,
///                       enchant u16, chop u8[2], slash u8[2], thrust u8[2], flags
/// Tes4 DATA (30 bytes): type, speed, reach, flags, value, health, weight, damage u16
/// FO3  DATA (15 bytes): value, health, weight, damage i16, clip size u8
/// Tes5 DATA (10 bytes): value, weight, damage u16
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Weapon {
    /// Common fields
    pub core: ObjectCore,
    /// Statistics
    pub stats: WeaponStats,
    /// Enchantment (`ENAM`)
    pub enchantment: Option<FormRef<Enchantment>>,
    /// Enchantment points (`ANAM`/`EAMT`)
    pub enchant_points: Option<u16>,
}

impl FieldSink for Weapon {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let s = &mut self.stats;
        match (field.tag(), field.len()) {
            (FormTag::WPDT, 32) => {
                s.weight = field.read_f32()?;
                s.value = field.read_i32()?;
                s.kind = Some(u32::from(field.read_u16()?));
                s.health = Some(u32::from(field.read_u16()?));
                s.speed = Some(field.read_f32()?);
                s.reach = Some(field.read_f32()?);
                self.enchant_points = Some(field.read_u16()?);
                let _chop_min = field.read_u8()?;
                s.damage = u16::from(field.read_u8()?);
                field.skip(4)?;
                s.flags = field.read_u32()?;
            }
            (FormTag::DATA, 30) => {
                s.kind = Some(field.read_u32()?);
                s.speed = Some(field.read_f32()?);
                s.reach = Some(field.read_f32()?);
                s.flags = field.read_u32()?;
                s.value = field.read_i32()?;
                s.health = Some(field.read_u32()?);
                s.weight = field.read_f32()?;
                s.damage = field.read_u16()?;
            }
            (FormTag::DATA, 15) => {
                s.value = field.read_i32()?;
                s.health = Some(field.read_i32()?.max(0) as u32);
                s.weight = field.read_f32()?;
                s.damage = field.read_i16()?.max(0) as u16;
                let _clip = field.read_u8()?;
            }
            (FormTag::DATA, 10) => {
                s.value = field.read_i32()?;
                s.weight = field.read_f32()?;
                s.damage = field.read_u16()?;
            }
            (FormTag::ENAM, _) => self.enchantment = Some(read_ref(field)?),
            (FormTag::ANAM, 2) => self.enchant_points = Some(field.read_u16()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `ARMO` record
///
/// ```text
/// Tes3 AODT (24 bytes): type, weight, value, health, enchant, armor
/// Tes4 DATA (14 bytes): armor u16, value, health, weight
/// FO3  DATA (12 bytes): value, health, weight
/// Tes5 DATA (8 bytes):  value, weight; DNAM armor rating x100
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Armor {
    /// Common fields
    pub core: ObjectCore,
    /// Armor rating
    pub armor: f32,
    /// Value in gold
    pub value: i32,
    /// Weight
    pub weight: f32,
    /// Condition
    pub health: Option<u32>,
    /// Armor type (Tes3)
    pub kind: Option<u32>,
    /// Biped slot flags (`BMDT`)
    pub biped_flags: Option<u32>,
    /// Enchantment (`ENAM`)
    pub enchantment: Option<FormRef<Enchantment>>,
}

impl FieldSink for Armor {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::AODT, 24) => {
                self.kind = Some(field.read_u32()?);
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                self.health = Some(field.read_u32()?);
                let _enchant_points = field.read_u32()?;
                self.armor = field.read_i32()? as f32;
            }
            (FormTag::DATA, 14) => {
                self.armor = f32::from(field.read_u16()?) / 100.0;
                self.value = field.read_i32()?;
                self.health = Some(field.read_u32()?);
                self.weight = field.read_f32()?;
            }
            (FormTag::DATA, 12) => {
                self.value = field.read_i32()?;
                self.health = Some(field.read_u32()?);
                self.weight = field.read_f32()?;
            }
            (FormTag::DATA, 8) => {
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
            }
            (FormTag::DNAM, 4) => self.armor = field.read_i32()? as f32 / 100.0,
            (FormTag::BMDT, 4 | 8) => {
                self.biped_flags = Some(field.read_u32()?);
                field.skip(field.remaining())?;
            }
            (FormTag::ENAM, _) => self.enchantment = Some(read_ref(field)?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `AMMO` record (Oblivion and later)
///
/// ```text
/// Tes4   DATA (18 bytes): speed, flags u8 + 3 pad, value, weight, damage u16
/// FO3    DATA (13 bytes): speed, flags u8 + 3 pad, value, clip rounds u8
/// Tes5   DATA (16 bytes): projectile, flags, damage f32, value
/// SSE+   DATA (20 bytes): as Tes5 + weight
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ammo {
    /// Common fields
    pub core: ObjectCore,
    /// Value in gold
    pub value: u32,
    /// Weight
    pub weight: Option<f32>,
    /// Damage
    pub damage: f32,
    /// Flags
    pub flags: u32,
    /// Projectile (Skyrim and later)
    pub projectile: Option<FormId>,
}

impl FieldSink for Ammo {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::DATA, 18) => {
                let _speed = field.read_f32()?;
                self.flags = u32::from(field.read_u8()?);
                field.skip(3)?;
                self.value = field.read_u32()?;
                self.weight = Some(field.read_f32()?);
                self.damage = f32::from(field.read_u16()?);
            }
            (FormTag::DATA, 13) => {
                let _speed = field.read_f32()?;
                self.flags = u32::from(field.read_u8()?);
                field.skip(3)?;
                self.value = field.read_u32()?;
                let _clip_rounds = field.read_u8()?;
            }
            (FormTag::DATA, 16 | 20) => {
                self.projectile = Some(field.read_form_id()?);
                self.flags = field.read_u32()?;
                self.damage = field.read_f32()?;
                self.value = field.read_u32()?;
                if field.remaining() == 4 {
                    self.weight = Some(field.read_f32()?);
                }
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `BOOK` record
///
/// ```text
/// Tes3 BKDT (20 bytes): weight, value, scroll, skill, enchant
/// Tes4 DATA (10 bytes): flags u8, skill i8, value, weight
/// Tes5 DATA (16 bytes): flags u8, type u8, pad u16, teaches, value, weight
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Book {
    /// Common fields
    pub core: ObjectCore,
    /// Value in gold
    pub value: i32,
    /// Weight
    pub weight: f32,
    /// Flags (Tes3: scroll flag)
    pub flags: u32,
    /// Skill or spell taught; `-1` when none
    pub teaches: i32,
    /// Tes3 book text (`TEXT`)
    pub text: Option<String>,
    /// Enchantment (`ENAM`)
    pub enchantment: Option<FormRef<Enchantment>>,
}

impl Book {
    /// Book text: `TEXT` for Tes3, the description otherwise
    pub fn body(&self) -> Option<LString> {
        self.text
            .clone()
            .map(LString::Text)
            .or_else(|| self.core.description.clone())
    }
}

impl FieldSink for Book {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::BKDT, 20) => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                self.flags = field.read_u32()?;
                self.teaches = field.read_i32()?;
                let _enchant_points = field.read_i32()?;
            }
            (FormTag::TEXT, _) if field.format() == FormatVersion::Tes3 => {
                self.text = Some(field.read_zstring()?);
            }
            (FormTag::DATA, 10) => {
                self.flags = u32::from(field.read_u8()?);
                self.teaches = i32::from(field.read_u8()? as i8);
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
            }
            (FormTag::DATA, 16) => {
                self.flags = u32::from(field.read_u8()?);
                let _kind = field.read_u8()?;
                field.skip(2)?;
                self.teaches = field.read_i32()?;
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
            }
            (FormTag::ENAM, _) => self.enchantment = Some(read_ref(field)?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `CLOT` record (Morrowind and Oblivion)
///
/// ```text
/// Tes3 CTDT (12 bytes): type, weight, value u16, enchant u16
/// Tes4 DATA (8 bytes):  value, weight
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clothing {
    /// Common fields
    pub core: ObjectCore,
    /// Clothing type (Tes3)
    pub kind: Option<u32>,
    /// Value in gold
    pub value: i32,
    /// Weight
    pub weight: f32,
    /// Biped slot flags (`BMDT`)
    pub biped_flags: Option<u32>,
    /// Enchantment (`ENAM`)
    pub enchantment: Option<FormRef<Enchantment>>,
}

impl FieldSink for Clothing {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::CTDT, 12) => {
                self.kind = Some(field.read_u32()?);
                self.weight = field.read_f32()?;
                self.value = i32::from(field.read_u16()?);
                let _enchant_points = field.read_u16()?;
            }
            (FormTag::DATA, 8) => {
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
            }
            (FormTag::BMDT, 4) => self.biped_flags = Some(field.read_u32()?),
            (FormTag::ENAM, _) => self.enchantment = Some(read_ref(field)?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `LIGH` record
///
/// ```text
/// Tes3 LHDT (24 bytes): weight, value, time, radius, color, flags
/// Tes4 DATA (24 bytes): time, radius, color, flags, value, weight
/// Tes4 DATA (32 bytes): time, radius, color, flags, falloff, fov, value, weight
/// Tes5 DATA (48 bytes): time, radius, color, flags, falloff, fov, near clip,
///                       flicker period, intensity amp, movement amp, value, weight
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Light {
    /// Common fields
    pub core: ObjectCore,
    /// Burn time in seconds; `-1` for infinite
    pub time: i32,
    /// Radius
    pub radius: u32,
    /// Light color
    pub color: Color,
    /// Flags
    pub flags: u32,
    /// Falloff exponent
    pub falloff: Option<f32>,
    /// Field of view
    pub fov: Option<f32>,
    /// Value in gold
    pub value: i32,
    /// Weight
    pub weight: f32,
    /// Sound (`SNAM`)
    pub sound: Option<FormRef<crate::records::objects::Sound>>,
}

impl FieldSink for Light {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::LHDT, 24) => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                self.time = field.read_i32()?;
                self.radius = field.read_u32()?;
                self.color = field.read()?;
                self.flags = field.read_u32()?;
            }
            (FormTag::DATA, 24 | 32 | 48) => {
                let len = field.len();
                self.time = field.read_i32()?;
                self.radius = field.read_u32()?;
                self.color = field.read()?;
                self.flags = field.read_u32()?;
                if len > 24 {
                    self.falloff = Some(field.read_f32()?);
                    self.fov = Some(field.read_f32()?);
                }
                if len == 48 {
                    field.skip(16)?;
                }
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
            }
            (FormTag::SNAM, _) => self.sound = Some(read_ref(field)?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Stat block layouts of the simple item records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemLayout {
    /// value i32, weight f32
    ValueWeight,
    /// weight f32, value i32, unknown u32
    WeightValueFlags,
    /// weight f32, value i32, quality f32, uses u32
    WeightValueQualityUses,
    /// weight f32, value i32, uses u32, quality f32
    WeightValueUsesQuality,
    /// type u32, quality f32, weight f32, value i32
    KindQualityWeightValue,
    /// type u8, value u32, weight f32, quality f32
    KindValueWeightQuality,
    /// uses u32, value u32, weight f32, quality f32
    UsesValueWeightQuality,
}

/// Stat field per `(tag, size)` for MISC, KEYM, SLGM, APPA, LOCK, PROB and REPA.
const ITEM_RULES: &[(FormTag, usize, ItemLayout)] = &[
    (FormTag::MCDT, 12, ItemLayout::WeightValueFlags),
    (FormTag::LKDT, 16, ItemLayout::WeightValueQualityUses),
    (FormTag::PBDT, 16, ItemLayout::WeightValueQualityUses),
    (FormTag::RIDT, 16, ItemLayout::WeightValueUsesQuality),
    (FormTag::AADT, 16, ItemLayout::KindQualityWeightValue),
    (FormTag::DATA, 8, ItemLayout::ValueWeight),
    (FormTag::DATA, 13, ItemLayout::KindValueWeightQuality),
    (FormTag::DATA, 16, ItemLayout::UsesValueWeightQuality),
];

/// Misc items, keys, soul gems, apparatus, lockpicks, probes and repair tools.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleItem {
    /// Common fields
    pub core: ObjectCore,
    /// Value in gold
    pub value: i32,
    /// Weight
    pub weight: f32,
    /// Tool quality
    pub quality: Option<f32>,
    /// Number of uses
    pub uses: Option<u32>,
    /// Apparatus type
    pub kind: Option<u32>,
    /// Contained soul (`SOUL`)
    pub soul: Option<u8>,
    /// Soul capacity (`SLCP`)
    pub soul_capacity: Option<u8>,
}

impl SimpleItem {
    fn read_stats(&mut self, layout: ItemLayout, field: &mut FieldReader<'_>) -> Result<()> {
        match layout {
            ItemLayout::ValueWeight => {
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
            }
            ItemLayout::WeightValueFlags => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                let _unknown = field.read_u32()?;
            }
            ItemLayout::WeightValueQualityUses => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                self.quality = Some(field.read_f32()?);
                self.uses = Some(field.read_u32()?);
            }
            ItemLayout::WeightValueUsesQuality => {
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
                self.uses = Some(field.read_u32()?);
                self.quality = Some(field.read_f32()?);
            }
            ItemLayout::KindQualityWeightValue => {
                self.kind = Some(field.read_u32()?);
                self.quality = Some(field.read_f32()?);
                self.weight = field.read_f32()?;
                self.value = field.read_i32()?;
            }
            ItemLayout::KindValueWeightQuality => {
                self.kind = Some(u32::from(field.read_u8()?));
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
                self.quality = Some(field.read_f32()?);
            }
            ItemLayout::UsesValueWeightQuality => {
                self.uses = Some(field.read_u32()?);
                self.value = field.read_i32()?;
                self.weight = field.read_f32()?;
                self.quality = Some(field.read_f32()?);
            }
        }
        Ok(())
    }
}

impl FieldSink for SimpleItem {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let (tag, len) = (field.tag(), field.len());
        if let Some(&(_, _, layout)) = ITEM_RULES.iter().find(|(t, s, _)| *t == tag && *s == len) {
            self.read_stats(layout, field)?;
            return Ok(FieldOutcome::Handled);
        }
        match (tag, len) {
            (FormTag::SOUL, 1) => self.soul = Some(field.read_u8()?),
            (FormTag::SLCP, 1) => self.soul_capacity = Some(field.read_u8()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

object_body!(Weapon, Armor, Ammo, Book, Clothing, Light, SimpleItem);
