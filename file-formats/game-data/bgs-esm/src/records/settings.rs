//! Game settings and global variables.

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink, LString};
use crate::records::RecordBody;
use crate::tag::FormTag;
use crate::version::FormatVersion;

/// Value of a game setting.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SettingValue {
    /// Not present
    #[default]
    None,
    /// Integer setting (`i`/`u` prefix, or Tes3 `INTV`)
    Int(i32),
    /// Float setting (`f` prefix, or Tes3 `FLTV`)
    Float(f32),
    /// Boolean setting (`b` prefix)
    Bool(bool),
    /// String setting (`s` prefix, or Tes3 `STRV`)
    String(LString),
}

/// `GMST` record.
///
/// From Oblivion on the first letter of the editor id selects the type of
/// the `DATA` field, so `EDID` must precede `DATA`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameSetting {
    /// Setting name
    pub editor_id: Option<String>,
    /// Setting value
    pub value: SettingValue,
}

impl FieldSink for GameSetting {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match field.tag() {
            FormTag::NAME if tes3 => self.editor_id = Some(field.read_zstring()?),
            FormTag::EDID if !tes3 => self.editor_id = Some(field.read_zstring()?),
            FormTag::STRV if tes3 => {
                self.value = SettingValue::String(LString::Text(field.read_zstring()?));
            }
            FormTag::INTV if tes3 && field.len() == 4 => {
                self.value = SettingValue::Int(field.read_i32()?);
            }
            FormTag::FLTV if tes3 && field.len() == 4 => {
                self.value = SettingValue::Float(field.read_f32()?);
            }
            FormTag::DATA if !tes3 => {
                let kind = self
                    .editor_id
                    .as_deref()
                    .and_then(|id| id.chars().next())
                    .map(|c| c.to_ascii_lowercase());
                self.value = match (kind, field.len()) {
                    (Some('s'), _) => SettingValue::String(field.read_lstring()?),
                    (Some('f'), 4) => SettingValue::Float(field.read_f32()?),
                    (Some('i' | 'u'), 4) => SettingValue::Int(field.read_i32()?),
                    (Some('b'), 4) => SettingValue::Bool(field.read_u32()? != 0),
                    _ => {
                        log::debug!(
                            "GMST {:?}: cannot type {}-byte DATA from its editor id",
                            self.editor_id,
                            field.len()
                        );
                        return Ok(FieldOutcome::Unhandled);
                    }
                };
            }
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

impl RecordBody for GameSetting {
    fn editor_id(&self) -> Option<&str> {
        self.editor_id.as_deref()
    }
}

/// `GLOB` record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Global {
    /// Variable name
    pub editor_id: Option<String>,
    /// Declared type: `s` short, `l` long, `f` float
    pub kind: Option<char>,
    /// Value; always stored as a float
    pub value: f32,
}

impl FieldSink for Global {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        let tes3 = field.format() == FormatVersion::Tes3;
        match (field.tag(), field.len()) {
            (FormTag::NAME, _) if tes3 => self.editor_id = Some(field.read_zstring()?),
            (FormTag::EDID, _) if !tes3 => self.editor_id = Some(field.read_zstring()?),
            (FormTag::FNAM, 1) => self.kind = Some(char::from(field.read_u8()?)),
            (FormTag::FLTV, 4) => self.value = field.read_f32()?,
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

impl RecordBody for Global {
    fn editor_id(&self) -> Option<&str> {
        self.editor_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ReadContext, read_fields};
    use crate::version::GameEdition;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn tes4_field(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test_case(b"fJumpHeight\0", &2.5f32.to_le_bytes(), SettingValue::Float(2.5))]
    #[test_case(b"iMaxLevel\0", &81i32.to_le_bytes(), SettingValue::Int(81))]
    #[test_case(b"bAllowJump\0", &1u32.to_le_bytes(), SettingValue::Bool(true))]
    #[test_case(b"sGold\0", b"Gold\0", SettingValue::String(LString::Text("Gold".into())))]
    fn setting_type_follows_editor_id(edid: &[u8], data: &[u8], expected: SettingValue) {
        let mut bytes = tes4_field(b"EDID", edid);
        bytes.extend(tes4_field(b"DATA", data));

        let mut setting = GameSetting::default();
        read_fields(
            &bytes,
            0,
            FormTag::GMST,
            ReadContext::new(GameEdition::Oblivion),
            &mut setting,
        )
        .unwrap();
        assert_eq!(setting.value, expected);
    }

    #[test]
    fn tes3_setting_uses_typed_fields() {
        let mut bytes = b"NAME".to_vec();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(b"iLevel\0\0");
        bytes.extend_from_slice(b"INTV");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&12i32.to_le_bytes());

        let mut setting = GameSetting::default();
        read_fields(
            &bytes,
            0,
            FormTag::GMST,
            ReadContext::new(GameEdition::Morrowind),
            &mut setting,
        )
        .unwrap();
        assert_eq!(setting.editor_id.as_deref(), Some("iLevel"));
        assert_eq!(setting.value, SettingValue::Int(12));
    }

    #[test]
    fn global_value() {
        let mut bytes = tes4_field(b"EDID", b"GameHour\0");
        bytes.extend(tes4_field(b"FNAM", b"f"));
        bytes.extend(tes4_field(b"FLTV", &9.5f32.to_le_bytes()));

        let mut global = Global::default();
        read_fields(
            &bytes,
            0,
            FormTag::GLOB,
            ReadContext::new(GameEdition::Skyrim),
            &mut global,
        )
        .unwrap();
        assert_eq!(global.kind, Some('f'));
        assert_eq!(global.value, 9.5);
    }
}
