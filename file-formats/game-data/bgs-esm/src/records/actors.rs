//! Non-player characters and creatures (`NPC_`, `CREA`).
//!
//! # Base stats
//!
//! ```text
//! Tes3 NPC_ NPDT (52 bytes): level i16, attributes u8[8], skills u8[27], pad,
//!                            health, magicka, fatigue u16, disposition,
//!                            reputation, rank, pad u8, gold i32
//! Tes3 NPC_ NPDT (12 bytes): level i16, disposition, reputation, rank, pad u8[3], gold i32
//! Tes3 CREA NPDT (96 bytes): type, level, ... gold (last i32)
//! Tes4 ACBS (16 bytes):      flags, spell points u16, fatigue u16, barter u16,
//!                            level i16, calc min u16, calc max u16
//! FO3+ ACBS (24 bytes):      flags, u16 x2, level i16, calc min u16, calc max u16, ...
//! ```

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink};
use crate::records::character::{Class, Faction, Race};
use crate::records::common::{ItemEntry, ObjectCore, read_name32, read_ref};
use crate::records::magic::Spell;
use crate::tag::FormTag;
use crate::types::{FormId, FormRef};
use crate::version::FormatVersion;

/// Faction membership of an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorFaction {
    /// Faction
    pub faction: FormRef<Faction>,
    /// Rank within the faction
    pub rank: i8,
}

/// `NPC_` and `CREA` records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Actor {
    /// Common fields
    pub core: ObjectCore,
    /// Actor flags (`ACBS` or Tes3 `FLAG`)
    pub flags: u32,
    /// Level; a multiplier when levelled with the player
    pub level: i16,
    /// Level bounds when levelled with the player
    pub calc_levels: Option<(u16, u16)>,
    /// Gold carried (Tes3)
    pub gold: Option<i32>,
    /// Race (`RNAM`)
    pub race: Option<FormRef<Race>>,
    /// Class (`CNAM`)
    pub class: Option<FormRef<Class>>,
    /// Factions (`SNAM`, or Tes3 `ANAM`)
    pub factions: Vec<ActorFaction>,
    /// Inventory
    pub items: Vec<ItemEntry>,
    /// Spells and abilities
    pub spells: Vec<FormRef<Spell>>,
    /// AI packages (`PKID`)
    pub packages: Vec<FormId>,
    /// Death item (`INAM`)
    pub death_item: Option<FormId>,
}

impl Actor {
    fn read_tes3_stats(&mut self, field: &mut FieldReader<'_>) -> Result<()> {
        match (field.record_tag(), field.len()) {
            (FormTag::CREA, 96) => {
                let _kind = field.read_i32()?;
                self.level = field.read_i32()?.clamp(0, i32::from(i16::MAX)) as i16;
                field.skip(84)?;
                self.gold = Some(field.read_i32()?);
            }
            (_, 52) => {
                self.level = field.read_i16()?;
                field.skip(44)?;
                let rank = field.read_u8()? as i8;
                let _unknown = field.read_u8()?;
                self.gold = Some(field.read_i32()?);
                self.set_tes3_rank(rank);
            }
            _ => {
                self.level = field.read_i16()?;
                let _disposition = field.read_u8()?;
                let _reputation = field.read_u8()?;
                let rank = field.read_u8()? as i8;
                field.skip(3)?;
                self.gold = Some(field.read_i32()?);
                self.set_tes3_rank(rank);
            }
        }
        Ok(())
    }

    fn set_tes3_rank(&mut self, rank: i8) {
        if let Some(faction) = self.factions.last_mut() {
            faction.rank = rank;
        }
    }
}

impl FieldSink for Actor {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        if let Some(entry) = ItemEntry::read(field)? {
            self.items.push(entry);
            return Ok(FieldOutcome::Handled);
        }
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::NPDT, 12 | 52 | 96) if tes3 => self.read_tes3_stats(field)?,
            (FormTag::FLAG, 4) if tes3 => self.flags = field.read_u32()?,
            (FormTag::ANAM, _) if tes3 => self.factions.push(ActorFaction {
                faction: read_ref(field)?,
                rank: 0,
            }),
            (FormTag::NPCS, 32) if tes3 => self.spells.push(read_name32(field)?),
            (FormTag::RNAM, _) => self.race = Some(read_ref(field)?),
            (FormTag::CNAM, _) => self.class = Some(read_ref(field)?),
            (FormTag::ACBS, 16) => {
                self.flags = field.read_u32()?;
                field.skip(6)?;
                self.level = field.read_i16()?;
                let min = field.read_u16()?;
                let max = field.read_u16()?;
                self.calc_levels = Some((min, max));
            }
            (FormTag::ACBS, 24) => {
                self.flags = field.read_u32()?;
                field.skip(4)?;
                self.level = field.read_i16()?;
                let min = field.read_u16()?;
                let max = field.read_u16()?;
                self.calc_levels = Some((min, max));
                field.skip(field.remaining())?;
            }
            (FormTag::SNAM, 5 | 8) if !tes3 => {
                let faction = FormRef::id(field.read_form_id()?);
                let rank = field.read_u8()? as i8;
                field.skip(field.remaining())?;
                self.factions.push(ActorFaction { faction, rank });
            }
            (FormTag::SPLO, 4) => self.spells.push(FormRef::id(field.read_form_id()?)),
            (FormTag::PKID, 4) => self.packages.push(field.read_form_id()?),
            (FormTag::INAM, 4) if !tes3 => self.death_item = Some(field.read_form_id()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

object_body!(Actor);
