//! Fields shared by most record types.
//!
//! Records offer every field to their own rules first and then to
//! [`ObjectCore`], which knows the identity, naming, model and keyword fields
//! that nearly every record carries.

use binrw::BinRead;

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink, LString};
use crate::record::Record;
use crate::records::magic::Script;
use crate::tag::FormTag;
use crate::types::{FormId, FormRef};
use crate::version::FormatVersion;

/// Read a reference field: an editor id string for Tes3, a form id otherwise.
pub(crate) fn read_ref<T>(field: &mut FieldReader<'_>) -> Result<FormRef<T>> {
    match field.format() {
        FormatVersion::Tes3 => Ok(FormRef::editor_id(field.read_zstring()?)),
        FormatVersion::Tes4 | FormatVersion::Tes5 => Ok(FormRef::id(field.read_form_id()?)),
    }
}

/// Entries pre-allocated for a count field, however large the count.
pub(crate) const MAX_COUNT_HINT: usize = 1024;

/// Read a `u32` entry-count field and reserve room for the entries that
/// follow. The count is a hint from the file, so the reservation is capped.
pub(crate) fn reserve_counted<T>(field: &mut FieldReader<'_>, list: &mut Vec<T>) -> Result<()> {
    let count = field.read_u32()? as usize;
    list.reserve(count.min(MAX_COUNT_HINT));
    Ok(())
}

/// Read a Tes3 fixed 32-byte name as a reference.
pub(crate) fn read_name32<T>(field: &mut FieldReader<'_>) -> Result<FormRef<T>> {
    Ok(FormRef::editor_id(field.read_fixed_string(32)?))
}

/// Object bounds (`OBND`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead)]
#[br(little)]
pub struct ObjectBounds {
    /// Minimum corner
    pub min: [i16; 3],
    /// Maximum corner
    pub max: [i16; 3],
}

/// Model path plus its optional companion fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    /// Mesh path (`MODL`)
    pub path: String,
    /// Bound radius (`MODB`, Oblivion)
    pub bound_radius: Option<f32>,
    /// Texture hash blob (`MODT`)
    pub texture_hashes: Option<Vec<u8>>,
}

/// Identity and presentation fields common to most records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectCore {
    /// Editor id (`EDID`, or `NAME` for Tes3)
    pub editor_id: Option<String>,
    /// Display name (`FULL`, or `FNAM` for Tes3)
    pub name: Option<LString>,
    /// Model
    pub model: Option<Model>,
    /// Inventory icon (`ICON`/`ITEX`)
    pub icon: Option<String>,
    /// Small icon (`MICO`)
    pub small_icon: Option<String>,
    /// Description (`DESC`)
    pub description: Option<LString>,
    /// Attached script (`SCRI`)
    pub script: Option<FormRef<Script>>,
    /// Object bounds (`OBND`)
    pub bounds: Option<ObjectBounds>,
    /// Keywords (`KWDA`)
    pub keywords: Vec<FormId>,
    /// Tes3 deletion marker (`DELE`)
    pub deleted: bool,
}

impl FieldSink for ObjectCore {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match field.tag() {
            FormTag::EDID if !tes3 => self.editor_id = Some(field.read_zstring()?),
            FormTag::NAME if tes3 => self.editor_id = Some(field.read_zstring()?),
            FormTag::FULL if !tes3 => self.name = Some(field.read_lstring()?),
            FormTag::FNAM if tes3 => self.name = Some(LString::Text(field.read_zstring()?)),
            FormTag::MODL => {
                self.model.get_or_insert_with(Model::default).path = field.read_zstring()?;
            }
            FormTag::MODB if field.len() == 4 => {
                self.model.get_or_insert_with(Model::default).bound_radius =
                    Some(field.read_f32()?);
            }
            FormTag::MODT => {
                self.model.get_or_insert_with(Model::default).texture_hashes =
                    Some(field.read_to_end()?);
            }
            FormTag::ICON | FormTag::ITEX => self.icon = Some(field.read_zstring()?),
            FormTag::MICO => self.small_icon = Some(field.read_zstring()?),
            FormTag::DESC => self.description = Some(field.read_lstring()?),
            FormTag::SCRI => self.script = Some(read_ref(field)?),
            FormTag::OBND if field.len() == 12 => self.bounds = Some(field.read()?),
            FormTag::KSIZ if field.len() == 4 => reserve_counted(field, &mut self.keywords)?,
            FormTag::KWDA => self.keywords.extend(field.read_form_ids()?),
            FormTag::DELE if tes3 => {
                self.deleted = true;
                field.skip(field.remaining())?;
            }
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Record shape used for every registered tag without a dedicated model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectRecord {
    /// Common fields
    pub core: ObjectCore,
}

impl FieldSink for ObjectRecord {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        self.core.read_field(field)
    }
}

/// Magic effect identifier; the encoding changed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectId {
    /// Tes3 effect index
    Index(u16),
    /// Oblivion four-character effect code
    Code(FormTag),
    /// Magic effect form id (Fallout 3 and later)
    Form(FormId),
}

/// One magic effect entry of a spell, enchantment, potion or ingredient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    /// Effect identifier
    pub id: EffectId,
    /// Magnitude (minimum for Tes3)
    pub magnitude: f32,
    /// Maximum magnitude (Tes3)
    pub magnitude_max: Option<f32>,
    /// Area of effect
    pub area: u32,
    /// Duration in seconds
    pub duration: u32,
    /// Range: self, touch or target
    pub range: Option<u32>,
    /// Affected skill or attribute
    pub actor_value: Option<i32>,
}

impl Effect {
    fn new(id: EffectId) -> Self {
        Self {
            id,
            magnitude: 0.0,
            magnitude_max: None,
            area: 0,
            duration: 0,
            range: None,
            actor_value: None,
        }
    }
}

/// Effect list shared by spells, enchantments, potions and ingredients.
///
/// ```text
/// Tes3:    ENAM (24 bytes per effect)
/// Tes4:    EFID (code) + EFIT (24 bytes)
/// FO3/FNV: EFID (form) + EFIT (20 bytes)
/// Tes5+:   EFID (form) + EFIT (12 bytes)
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectList(pub Vec<Effect>);

impl EffectList {
    fn last_or_insert(&mut self, id: EffectId) -> &mut Effect {
        if self.0.is_empty() {
            self.0.push(Effect::new(id));
        }
        let last = self.0.len() - 1;
        &mut self.0[last]
    }
}

impl FieldSink for EffectList {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let format = field.format();
        match (field.tag(), field.len()) {
            (FormTag::ENAM, 24) if format == FormatVersion::Tes3 => {
                let index = field.read_u16()?;
                let skill = field.read_u8()? as i8;
                let attribute = field.read_u8()? as i8;
                let range = field.read_i32()?;
                let area = field.read_i32()?;
                let duration = field.read_i32()?;
                let min = field.read_i32()?;
                let max = field.read_i32()?;
                let mut effect = Effect::new(EffectId::Index(index));
                effect.magnitude = min as f32;
                effect.magnitude_max = Some(max as f32);
                effect.area = area.max(0) as u32;
                effect.duration = duration.max(0) as u32;
                effect.range = Some(range.max(0) as u32);
                effect.actor_value = Some(i32::from(if skill >= 0 { skill } else { attribute }));
                self.0.push(effect);
            }
            (FormTag::EFID, 4) if format != FormatVersion::Tes3 => {
                let id = match format {
                    FormatVersion::Tes4 => EffectId::Code(field.read_tag()?),
                    _ => EffectId::Form(field.read_form_id()?),
                };
                self.0.push(Effect::new(id));
            }
            (FormTag::EFIT, 24) if format == FormatVersion::Tes4 => {
                let code = EffectId::Code(field.read_tag()?);
                let magnitude = field.read_u32()?;
                let area = field.read_u32()?;
                let duration = field.read_u32()?;
                let range = field.read_u32()?;
                let actor_value = field.read_i32()?;
                let effect = self.last_or_insert(code);
                effect.magnitude = magnitude as f32;
                effect.area = area;
                effect.duration = duration;
                effect.range = Some(range);
                effect.actor_value = Some(actor_value);
            }
            (FormTag::EFIT, 20) if format == FormatVersion::Tes5 => {
                let magnitude = field.read_u32()?;
                let area = field.read_u32()?;
                let duration = field.read_u32()?;
                let range = field.read_u32()?;
                let actor_value = field.read_i32()?;
                let effect = self.last_or_insert(EffectId::Form(FormId::NONE));
                effect.magnitude = magnitude as f32;
                effect.area = area;
                effect.duration = duration;
                effect.range = Some(range);
                effect.actor_value = Some(actor_value);
            }
            (FormTag::EFIT, 12) if format == FormatVersion::Tes5 => {
                let magnitude = field.read_f32()?;
                let area = field.read_u32()?;
                let duration = field.read_u32()?;
                let effect = self.last_or_insert(EffectId::Form(FormId::NONE));
                effect.magnitude = magnitude;
                effect.area = area;
                effect.duration = duration;
            }
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

/// Inventory entry of a container or actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntry {
    /// Item record
    pub item: FormRef<Record>,
    /// Count; negative counts restock in Tes3
    pub count: i32,
}

impl ItemEntry {
    /// Decode `NPCO` (Tes3, 36 bytes) or `CNTO` (8 bytes); `None` for other fields.
    pub(crate) fn read(field: &mut FieldReader<'_>) -> Result<Option<Self>> {
        match (field.tag(), field.len()) {
            (FormTag::NPCO, 36) => {
                let count = field.read_i32()?;
                let item = read_name32(field)?;
                Ok(Some(Self { item, count }))
            }
            (FormTag::CNTO, 8) => {
                let item = FormRef::id(field.read_form_id()?);
                let count = field.read_i32()?;
                Ok(Some(Self { item, count }))
            }
            _ => Ok(None),
        }
    }
}
