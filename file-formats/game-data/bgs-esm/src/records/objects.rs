//! Static objects, containers, lists and texture records.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink};
use crate::record::Record;
use crate::records::common::{ItemEntry, ObjectCore, read_ref, reserve_counted};
use crate::tag::FormTag;
use crate::types::{FormId, FormRef};
use crate::version::FormatVersion;

/// `SOUN` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sound {
    /// Common fields
    pub core: ObjectCore,
    /// Sound file (`FNAM`)
    pub file: Option<String>,
    /// Volume (Tes3)
    pub volume: Option<u8>,
    /// Minimum and maximum range (Tes3)
    pub range: Option<(u8, u8)>,
}

impl FieldSink for Sound {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::FNAM, _) => self.file = Some(field.read_zstring()?),
            (FormTag::DATA, 3) if field.format() == FormatVersion::Tes3 => {
                self.volume = Some(field.read_u8()?);
                let min = field.read_u8()?;
                let max = field.read_u8()?;
                self.range = Some((min, max));
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `CONT` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Container {
    /// Common fields
    pub core: ObjectCore,
    /// Capacity (Tes3) or weight
    pub weight: f32,
    /// Container flags
    pub flags: u32,
    /// Contents
    pub items: Vec<ItemEntry>,
    /// Open sound
    pub open_sound: Option<FormRef<Sound>>,
    /// Close sound
    pub close_sound: Option<FormRef<Sound>>,
}

impl FieldSink for Container {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        if let Some(entry) = ItemEntry::read(field)? {
            self.items.push(entry);
            return Ok(FieldOutcome::Handled);
        }
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::CNDT, 4) => self.weight = field.read_f32()?,
            (FormTag::FLAG, 4) => self.flags = field.read_u32()?,
            (FormTag::DATA, 5) if !tes3 => {
                self.flags = u32::from(field.read_u8()?);
                self.weight = field.read_f32()?;
            }
            (FormTag::COCT, 4) => reserve_counted(field, &mut self.items)?,
            (FormTag::SNAM, 4) if !tes3 => self.open_sound = Some(read_ref(field)?),
            (FormTag::QNAM, 4) if !tes3 => self.close_sound = Some(read_ref(field)?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `DOOR` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Door {
    /// Common fields
    pub core: ObjectCore,
    /// Open sound (`SNAM`)
    pub open_sound: Option<FormRef<Sound>>,
    /// Close sound (`ANAM`)
    pub close_sound: Option<FormRef<Sound>>,
    /// Loop sound (`BNAM`)
    pub loop_sound: Option<FormRef<Sound>>,
    /// Door flags (`FNAM`, Oblivion and later)
    pub flags: u8,
    /// Random teleport destinations (`TNAM`, Oblivion)
    pub random_teleports: Vec<FormId>,
}

impl FieldSink for Door {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::SNAM, _) => self.open_sound = Some(read_ref(field)?),
            (FormTag::ANAM, _) => self.close_sound = Some(read_ref(field)?),
            (FormTag::BNAM, 4) if !tes3 => self.loop_sound = Some(read_ref(field)?),
            (FormTag::FNAM, 1) if !tes3 => self.flags = field.read_u8()?,
            (FormTag::TNAM, 4) if !tes3 => self.random_teleports.push(field.read_form_id()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `TXST` record (Fallout 3 and later)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureSet {
    /// Common fields
    pub core: ObjectCore,
    /// Texture slots `TX00`..`TX07`
    pub textures: [Option<String>; 8],
    /// Flags (`DNAM`)
    pub flags: u16,
}

const TEXTURE_SLOTS: [FormTag; 8] = [
    FormTag::TX00,
    FormTag::TX01,
    FormTag::TX02,
    FormTag::TX03,
    FormTag::TX04,
    FormTag::TX05,
    FormTag::TX06,
    FormTag::TX07,
];

impl FieldSink for TextureSet {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tag = field.tag();
        if let Some(slot) = TEXTURE_SLOTS.iter().position(|&t| t == tag) {
            self.textures[slot] = Some(field.read_zstring()?);
            return Ok(FieldOutcome::Handled);
        }
        match (tag, field.len()) {
            (FormTag::DNAM, 2) => self.flags = field.read_u16()?,
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `FLST` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormList {
    /// Common fields
    pub core: ObjectCore,
    /// Entries (`LNAM`), in order
    pub entries: Vec<FormId>,
}

impl FieldSink for FormList {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::LNAM, 4) => self.entries.push(field.read_form_id()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// One entry of a leveled list.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledEntry {
    /// Minimum player level
    pub level: u16,
    /// Referenced creature, item, actor or spell
    pub item: FormRef<Record>,
    /// Count
    pub count: u16,
}

/// Leveled lists: `LVLC`, `LVLI`, `LVLN`, `LVSP` and Tes3 `LEVC`/`LEVI`.
///
/// Tes3 lists each entry as a name (`CNAM`/`INAM`) followed by its level
/// (`INTV`). Later games pack entries into `LVLO`:
///
/// ```text
/// LVLO (12 bytes): level i16, pad u16, form id, count i16, pad u16
/// LVLO (8 bytes):  level i16, pad u16, form id
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeveledList {
    /// Common fields
    pub core: ObjectCore,
    /// Chance that nothing is chosen, in percent
    pub chance_none: u8,
    /// List flags
    pub flags: u32,
    /// Global overriding the chance (`LVLG`)
    pub chance_global: Option<FormId>,
    /// Entries
    pub entries: Vec<LeveledEntry>,
}

impl FieldSink for LeveledList {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::DATA, 4) if tes3 => self.flags = field.read_u32()?,
            (FormTag::NNAM, 1) if tes3 => self.chance_none = field.read_u8()?,
            (FormTag::INDX, 4) if tes3 => reserve_counted(field, &mut self.entries)?,
            (FormTag::CNAM | FormTag::INAM, _) if tes3 => self.entries.push(LeveledEntry {
                level: 0,
                item: read_ref(field)?,
                count: 1,
            }),
            (FormTag::INTV, 2) if tes3 => {
                let level = field.read_u16()?;
                match self.entries.last_mut() {
                    Some(entry) => entry.level = level,
                    None => return Ok(FieldOutcome::Unhandled),
                }
            }
            (FormTag::LVLD, 1) => self.chance_none = field.read_u8()?,
            (FormTag::LVLF, 1) => self.flags = u32::from(field.read_u8()?),
            (FormTag::DATA, 1) if !tes3 => self.flags = u32::from(field.read_u8()?),
            (FormTag::LVLG, 4) => self.chance_global = Some(field.read_form_id()?),
            (FormTag::LLCT, 1) => {
                let count = field.read_u8()?;
                self.entries.reserve(usize::from(count));
            }
            (FormTag::LVLO, 8 | 12) => {
                let level = field.read_i16()?.max(0) as u16;
                field.skip(2)?;
                let item = FormRef::id(field.read_form_id()?);
                let count = if field.remaining() == 4 {
                    let count = field.read_i16()?.max(0) as u16;
                    field.skip(2)?;
                    count
                } else {
                    1
                };
                self.entries.push(LeveledEntry { level, item, count });
            }
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// `LTEX` record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandTexture {
    /// Common fields
    pub core: ObjectCore,
    /// Tes3 texture index (`INTV`), referenced by `VTEX` minus one
    pub index: Option<u32>,
    /// Texture path (Tes3 `DATA`, Oblivion `ICON`)
    pub texture: Option<String>,
    /// Texture set (`TNAM`, Skyrim and later)
    pub texture_set: Option<FormId>,
    /// Material (`MNAM`, Skyrim and later)
    pub material: Option<FormId>,
    /// Havok data (`HNAM`)
    pub havok: Option<Vec<u8>>,
    /// Specular exponent (`SNAM`)
    pub specular: Option<u8>,
    /// Grasses (`GNAM`)
    pub grasses: Vec<FormId>,
}

impl FieldSink for LandTexture {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::INTV, 4) if tes3 => self.index = Some(field.read_u32()?),
            (FormTag::DATA, _) if tes3 => self.texture = Some(field.read_zstring()?),
            (FormTag::ICON, _) if !tes3 => self.texture = Some(field.read_zstring()?),
            (FormTag::TNAM, 4) => self.texture_set = Some(field.read_form_id()?),
            (FormTag::MNAM, 4) => self.material = Some(field.read_form_id()?),
            (FormTag::HNAM, 2 | 3) => self.havok = Some(field.read_to_end()?),
            (FormTag::SNAM, 1) => self.specular = Some(field.read_u8()?),
            (FormTag::GNAM, 4) => self.grasses.push(field.read_form_id()?),
            _ => return self.core.read_field(field),
        }
        Ok(FieldOutcome::Handled)
    }
}

object_body!(
    Sound,
    Container,
    Door,
    TextureSet,
    FormList,
    LeveledList,
    LandTexture
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ReadContext, read_fields};
    use crate::types::FormKey;
    use crate::version::GameEdition;
    use pretty_assertions::assert_eq;

    fn tes3_field(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn tes4_field(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn skyrim_container_items() {
        let mut cnto = 0xFu32.to_le_bytes().to_vec();
        cnto.extend_from_slice(&100i32.to_le_bytes());
        let mut data_field = vec![0x02];
        data_field.extend_from_slice(&0.0f32.to_le_bytes());

        let mut data = tes4_field(b"EDID", b"Chest\0");
        data.extend(tes4_field(b"COCT", &1u32.to_le_bytes()));
        data.extend(tes4_field(b"CNTO", &cnto));
        data.extend(tes4_field(b"DATA", &data_field));

        let mut container = Container::default();
        read_fields(
            &data,
            0,
            FormTag::CONT,
            ReadContext::new(GameEdition::Skyrim),
            &mut container,
        )
        .unwrap();

        assert_eq!(container.items.len(), 1);
        assert_eq!(container.items[0].item.form_id(), Some(FormId(0xF)));
        assert_eq!(container.items[0].count, 100);
        assert_eq!(container.flags, 2);
    }

    #[test]
    fn tes3_leveled_list_pairs_names_and_levels() {
        let mut data = tes3_field(b"NAME", b"random_sword\0");
        data.extend(tes3_field(b"DATA", &1u32.to_le_bytes()));
        data.extend(tes3_field(b"NNAM", &[25]));
        data.extend(tes3_field(b"INDX", &2u32.to_le_bytes()));
        data.extend(tes3_field(b"INAM", b"iron sword\0"));
        data.extend(tes3_field(b"INTV", &1u16.to_le_bytes()));
        data.extend(tes3_field(b"INAM", b"steel sword\0"));
        data.extend(tes3_field(b"INTV", &5u16.to_le_bytes()));

        let mut list = LeveledList::default();
        read_fields(
            &data,
            0,
            FormTag::LEVI,
            ReadContext::new(GameEdition::Morrowind),
            &mut list,
        )
        .unwrap();

        assert_eq!(list.chance_none, 25);
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[1].level, 5);
        assert_eq!(
            list.entries[1].item.key(),
            &FormKey::EditorId("steel sword".into())
        );
    }

    #[test]
    fn leveled_entries_in_lvlo() {
        let mut lvlo = 3i16.to_le_bytes().to_vec();
        lvlo.extend_from_slice(&[0, 0]);
        lvlo.extend_from_slice(&0x1234u32.to_le_bytes());
        lvlo.extend_from_slice(&2i16.to_le_bytes());
        lvlo.extend_from_slice(&[0, 0]);

        let mut data = tes4_field(b"LVLD", &[10]);
        data.extend(tes4_field(b"LVLF", &[1]));
        data.extend(tes4_field(b"LLCT", &[1]));
        data.extend(tes4_field(b"LVLO", &lvlo));

        let mut list = LeveledList::default();
        read_fields(
            &data,
            0,
            FormTag::LVLI,
            ReadContext::new(GameEdition::Skyrim),
            &mut list,
        )
        .unwrap();

        assert_eq!(
            list.entries,
            vec![LeveledEntry {
                level: 3,
                item: FormRef::id(FormId(0x1234)),
                count: 2
            }]
        );
    }

    #[test]
    fn texture_set_slots() {
        let mut data = tes4_field(b"TX00", b"landscape\\dirt.dds\0");
        data.extend(tes4_field(b"TX01", b"landscape\\dirt_n.dds\0"));
        data.extend(tes4_field(b"DNAM", &1u16.to_le_bytes()));

        let mut set = TextureSet::default();
        read_fields(
            &data,
            0,
            FormTag::TXST,
            ReadContext::new(GameEdition::Fallout4),
            &mut set,
        )
        .unwrap();

        assert_eq!(set.textures[0].as_deref(), Some("landscape\\dirt.dds"));
        assert_eq!(set.textures[1].as_deref(), Some("landscape\\dirt_n.dds"));
        assert_eq!(set.textures[2], None);
        assert_eq!(set.flags, 1);
    }
}
