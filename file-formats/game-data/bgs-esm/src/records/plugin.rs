//! Root record (`TES3` / `TES4`).
//!
//! # Binary Layout
//!
//! ```text
//! Tes3 HEDR (300 bytes)            Tes4 HEDR (12 bytes)
//! 0x000 version      f32           0x00 version       f32
//! 0x004 file type    u32           0x04 record count  i32
//! 0x008 company      char[32]      0x08 next object   u32
//! 0x028 description  char[256]
//! 0x128 record count u32
//! ```
//!
//! Both variants list their masters as `MAST` (file name) followed by
//! `DATA` (u64 file size).

use crate::error::Result;
use crate::field::{FieldOutcome, FieldReader, FieldSink, LString};
use crate::records::RecordBody;
use crate::tag::FormTag;
use crate::types::FormId;

/// Size of the Tes3 `HEDR` payload
pub const TES3_HEDR_SIZE: usize = 300;

/// Size of the Tes4/Tes5 `HEDR` payload
pub const TES4_HEDR_SIZE: usize = 12;

/// Root header flag marking a localized plugin
pub const LOCALIZED_FLAG: u32 = 0x0000_0080;

/// A master file the plugin depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MasterFile {
    /// File name (`MAST`)
    pub name: String,
    /// File size recorded when the plugin was saved (`DATA`)
    pub size: Option<u64>,
}

/// File-level metadata from the root record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PluginHeader {
    /// Format version number
    pub version: f32,
    /// Tes3 file type (0 = plugin, 1 = master, 32 = save)
    pub file_type: Option<u32>,
    /// Author (`CNAM` or the Tes3 company field)
    pub author: String,
    /// Description (`SNAM` or the Tes3 description field)
    pub description: String,
    /// Number of records and groups in the file
    pub num_records: u32,
    /// Next free object id (Tes4 and later)
    pub next_object_id: Option<u32>,
    /// Master files, in load order
    pub masters: Vec<MasterFile>,
    /// Overridden forms (`ONAM`)
    pub overrides: Vec<FormId>,
    /// Internal version (`INTV`)
    pub internal_version: Option<u32>,
    /// Incremental counter (`INCC`)
    pub incc: Option<u32>,
}

impl PluginHeader {
    /// Master names in load order
    pub fn master_names(&self) -> impl Iterator<Item = &str> {
        self.masters.iter().map(|m| m.name.as_str())
    }
}

impl FieldSink for PluginHeader {
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome> {
        match (field.tag(), field.len()) {
            (FormTag::HEDR, TES3_HEDR_SIZE) => {
                self.version = field.read_f32()?;
                self.file_type = Some(field.read_u32()?);
                self.author = field.read_fixed_string(32)?;
                self.description = field.read_fixed_string(256)?;
                self.num_records = field.read_u32()?;
            }
            (FormTag::HEDR, TES4_HEDR_SIZE) => {
                self.version = field.read_f32()?;
                self.num_records = field.read_i32()?.max(0) as u32;
                self.next_object_id = Some(field.read_u32()?);
            }
            (FormTag::CNAM, _) => self.author = field.read_zstring()?,
            (FormTag::SNAM, _) => self.description = field.read_zstring()?,
            (FormTag::MAST, _) => self.masters.push(MasterFile {
                name: field.read_zstring()?,
                size: None,
            }),
            (FormTag::DATA, 8) => {
                let low = field.read_u32()?;
                let high = field.read_u32()?;
                let size = u64::from(low) | (u64::from(high) << 32);
                match self.masters.last_mut() {
                    Some(master) => master.size = Some(size),
                    None => log::warn!("Master size without a preceding MAST field"),
                }
            }
            (FormTag::ONAM, _) => self.overrides.extend(field.read_form_ids()?),
            (FormTag::INTV, 4) => self.internal_version = Some(field.read_u32()?),
            (FormTag::INCC, 4) => self.incc = Some(field.read_u32()?),
            _ => return Ok(FieldOutcome::Unhandled),
        }
        Ok(FieldOutcome::Handled)
    }
}

impl RecordBody for PluginHeader {
    fn editor_id(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> Option<&LString> {
        None
    }
}
