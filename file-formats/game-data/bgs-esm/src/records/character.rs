//! Character definitions: classes, factions, races, birthsigns and skills.

use binrw::BinRead;

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink};
use crate::records::common::{ObjectCore, read_name32, read_ref};
use crate::records::magic::Spell;
use crate::tag::FormTag;
use crate::types::FormRef;
use crate::version::FormatVersion;

/// Tes3 class data (`CLDT`, 60 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead)]
#[br(little)]
pub struct ClassData {
    /// Primary attributes
    pub attributes: [i32; 2],
    /// Specialization: combat, magic or stealth
    pub specialization: i32,
    /// Minor/major skill pairs
    pub skills: [[i32; 2]; 5],
    /// Playable flag
    pub flags: u32,
    /// Services offered
    pub services: u32,
}

/// `CLAS` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Class {
    /// Common fields
    pub core: ObjectCore,
    /// Tes3 class data
    pub data: Option<ClassData>,
}

impl FieldSink for Class {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::CLDT, 60) => self.data = Some(field.read()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Reaction of a faction towards another.
#[derive(Debug, Clone, PartialEq)]
pub struct FactionRelation {
    /// The other faction
    pub faction: FormRef<Faction>,
    /// Disposition modifier
    pub modifier: i32,
    /// Combat reaction (Fallout 3 and later)
    pub reaction: Option<u32>,
}

/// A faction rank.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactionRank {
    /// Rank number
    pub number: i32,
    /// Male title (`MNAM`, or the Tes3 `RNAM` name)
    pub male_title: Option<String>,
    /// Female title (`FNAM`)
    pub female_title: Option<String>,
}

/// `FACT` record
///
/// Tes3 stores relations as `ANAM` (faction name) followed by `INTV`
/// (reaction); later games pack both into `XNAM`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Faction {
    /// Common fields
    pub core: ObjectCore,
    /// Faction flags
    pub flags: u32,
    /// Relations with other factions
    pub relations: Vec<FactionRelation>,
    /// Ranks
    pub ranks: Vec<FactionRank>,
}

impl FieldSink for Faction {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::RNAM, 32) if tes3 => {
                let number = self.ranks.len() as i32;
                self.ranks.push(FactionRank {
                    number,
                    male_title: Some(field.read_fixed_string(32)?),
                    female_title: None,
                });
            }
            (FormTag::ANAM, _) if tes3 => self.relations.push(FactionRelation {
                faction: read_ref(field)?,
                modifier: 0,
                reaction: None,
            }),
            (FormTag::INTV, 4) if tes3 => {
                let modifier = field.read_i32()?;
                match self.relations.last_mut() {
                    Some(relation) => relation.modifier = modifier,
                    None => return Ok(FieldOutcome::Unhandled),
                }
            }
            (FormTag::FADT, 240) if tes3 => {
                field.skip(236)?;
                self.flags = field.read_u32()?;
            }
            (FormTag::XNAM, 8 | 12) if !tes3 => {
                let faction = FormRef::id(field.read_form_id()?);
                let modifier = field.read_i32()?;
                let reaction = if field.remaining() == 4 {
                    Some(field.read_u32()?)
                } else {
                    None
                };
                self.relations.push(FactionRelation {
                    faction,
                    modifier,
                    reaction,
                });
            }
            (FormTag::DATA, 1) if !tes3 => self.flags = u32::from(field.read_u8()?),
            (FormTag::DATA, 2) if !tes3 => self.flags = u32::from(field.read_u16()?),
            (FormTag::DATA, 4) if !tes3 => self.flags = field.read_u32()?,
            (FormTag::RNAM, 4) if !tes3 => self.ranks.push(FactionRank {
                number: field.read_i32()?,
                ..FactionRank::default()
            }),
            (FormTag::MNAM, _) if !tes3 => match self.ranks.last_mut() {
                Some(rank) => rank.male_title = Some(field.read_zstring()?),
                None => return Ok(FieldOutcome::Unhandled),
            },
            (FormTag::FNAM, _) if !tes3 => match self.ranks.last_mut() {
                Some(rank) => rank.female_title = Some(field.read_zstring()?),
                None => return Ok(FieldOutcome::Unhandled),
            },
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Skill bonus granted by a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead)]
#[br(little)]
pub struct SkillBonus {
    /// Skill index
    pub skill: i32,
    /// Bonus points
    pub bonus: i32,
}

/// Tes3 race data (`RADT`, 140 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead)]
#[br(little)]
pub struct RaceData {
    /// Skill bonuses
    pub skill_bonuses: [SkillBonus; 7],
    /// Male/female base attributes
    pub attributes: [[i32; 2]; 8],
    /// Male/female height
    pub height: [f32; 2],
    /// Male/female weight
    pub weight: [f32; 2],
    /// Playable/beast flags
    pub flags: u32,
}

/// `RACE` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Race {
    /// Common fields
    pub core: ObjectCore,
    /// Tes3 race data
    pub data: Option<RaceData>,
    /// Racial spells and powers
    pub spells: Vec<FormRef<Spell>>,
}

impl FieldSink for Race {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::RADT, 140) => self.data = Some(field.read()?),
            (FormTag::NPCS, 32) => self.spells.push(read_name32(field)?),
            (FormTag::SPLO, 4) => self.spells.push(FormRef::id(field.read_form_id()?)),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `BSGN` record (Morrowind and Oblivion)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Birthsign {
    /// Common fields
    pub core: ObjectCore,
    /// Constellation texture (`TNAM`, Tes3)
    pub texture: Option<String>,
    /// Granted spells
    pub spells: Vec<FormRef<Spell>>,
}

impl FieldSink for Birthsign {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::TNAM, _) => self.texture = Some(field.read_zstring()?),
            (FormTag::NPCS, 32) => self.spells.push(read_name32(field)?),
            (FormTag::SPLO, 4) => self.spells.push(FormRef::id(field.read_form_id()?)),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Skill training parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillData {
    /// Governing attribute
    pub attribute: i32,
    /// Specialization
    pub specialization: u32,
    /// Experience gained per use action
    pub use_values: Vec<f32>,
}

/// `SKIL` record (Morrowind and Oblivion)
///
/// ```text
/// Tes3 SKDT (24 bytes): attribute i32, specialization i32, use values f32[4]
/// Tes4 DATA (20 bytes): action i32, attribute i32, specialization u32, use values f32[2]
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skill {
    /// Common fields
    pub core: ObjectCore,
    /// Skill index (`INDX`)
    pub index: Option<i32>,
    /// Training parameters
    pub data: Option<SkillData>,
}

impl FieldSink for Skill {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::INDX, 4) => self.index = Some(field.read_i32()?),
            (FormTag::SKDT, 24) => {
                let attribute = field.read_i32()?;
                let specialization = field.read_i32()?.max(0) as u32;
                let use_values = field.read_all()?;
                self.data = Some(SkillData {
                    attribute,
                    specialization,
                    use_values,
                });
            }
            (FormTag::DATA, 20) => {
                let _action = field.read_i32()?;
                let attribute = field.read_i32()?;
                let specialization = field.read_u32()?;
                let use_values = field.read_all()?;
                self.data = Some(SkillData {
                    attribute,
                    specialization,
                    use_values,
                });
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

object_body!(Class, Faction, Race, Birthsign, Skill);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ReadContext, read_fields};
    use crate::types::FormId;
    use crate::version::GameEdition;
    use pretty_assertions::assert_eq;

    fn tes4_field(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn tes3_field(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn faction_relations_and_ranks() {
        let mut xnam = 0x13u32.to_le_bytes().to_vec();
        xnam.extend_from_slice(&(-20i32).to_le_bytes());
        xnam.extend_from_slice(&1u32.to_le_bytes());

        let mut data = tes4_field(b"EDID", b"GuardFaction\0");
        data.extend(tes4_field(b"XNAM", &xnam));
        data.extend(tes4_field(b"DATA", &[0x01, 0x00, 0x00, 0x00]));
        data.extend(tes4_field(b"RNAM", &0i32.to_le_bytes()));
        data.extend(tes4_field(b"MNAM", b"Recruit\0"));
        data.extend(tes4_field(b"FNAM", b"Recruit\0"));

        let mut faction = Faction::default();
        read_fields(
            &data,
            0,
            FormTag::FACT,
            ReadContext::new(GameEdition::Skyrim),
            &mut faction,
        )
        .unwrap();

        assert_eq!(faction.flags, 1);
        assert_eq!(faction.relations.len(), 1);
        assert_eq!(faction.relations[0].faction.form_id(), Some(FormId(0x13)));
        assert_eq!(faction.relations[0].modifier, -20);
        assert_eq!(faction.relations[0].reaction, Some(1));
        assert_eq!(faction.ranks[0].male_title.as_deref(), Some("Recruit"));
    }

    #[test]
    fn tes3_faction_pairs_anam_with_intv() {
        let mut data = tes3_field(b"NAME", b"Mages Guild\0");
        data.extend(tes3_field(b"ANAM", b"Fighters Guild\0"));
        data.extend(tes3_field(b"INTV", &(-1i32).to_le_bytes()));

        let mut faction = Faction::default();
        read_fields(
            &data,
            0,
            FormTag::FACT,
            ReadContext::new(GameEdition::Morrowind),
            &mut faction,
        )
        .unwrap();

        assert_eq!(faction.core.editor_id.as_deref(), Some("Mages Guild"));
        assert_eq!(faction.relations[0].modifier, -1);
    }

    #[test]
    fn tes3_skill_data() {
        let mut skdt = 2i32.to_le_bytes().to_vec();
        skdt.extend_from_slice(&1i32.to_le_bytes());
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            skdt.extend_from_slice(&v.to_le_bytes());
        }
        let mut data = tes3_field(b"INDX", &8i32.to_le_bytes());
        data.extend(tes3_field(b"SKDT", &skdt));

        let mut skill = Skill::default();
        read_fields(
            &data,
            0,
            FormTag::SKIL,
            ReadContext::new(GameEdition::Morrowind),
            &mut skill,
        )
        .unwrap();

        assert_eq!(skill.index, Some(8));
        let data = skill.data.unwrap();
        assert_eq!(data.attribute, 2);
        assert_eq!(data.use_values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
