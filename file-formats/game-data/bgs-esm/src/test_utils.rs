//! Builders for synthetic master/plugin files.
//!
//! Real game masters are large and not redistributable, so tests and
//! benchmarks assemble files chunk by chunk:
//!
//! ```ignore
//! use bgs_esm::header::GroupKind;
//! use bgs_esm::tag::FormTag;
//! use bgs_esm::test_utils::{PluginBuilder, field};
//! use bgs_esm::version::GameEdition;
//!
//! let mut builder = PluginBuilder::new(GameEdition::Skyrim);
//! let format = builder.format();
//! let mut globals = builder.group(FormTag::GLOB.0, GroupKind::Top);
//! globals.record(FormTag::GLOB, 0x800, &field(format, b"EDID", b"Answer\0"));
//! globals.finish();
//! let bytes = builder.into_bytes();
//! assert_eq!(&bytes[..4], b"TES4");
//! ```

use crate::compression::compress_record;
use crate::header::{GroupHeader, GroupKind, RecordFlags};
use crate::records::plugin::{LOCALIZED_FLAG, TES3_HEDR_SIZE};
use crate::tag::FormTag;
use crate::version::{FormatVersion, GameEdition};

/// `HEDR` version number each edition writes
pub fn hedr_version(edition: GameEdition) -> f32 {
    match edition {
        GameEdition::Morrowind => 1.3,
        GameEdition::Oblivion => 1.0,
        GameEdition::Fallout3 | GameEdition::Skyrim => 0.94,
        GameEdition::FalloutNV => 1.34,
        GameEdition::SkyrimSE => 1.71,
        GameEdition::Fallout4 => 1.0,
        GameEdition::Fallout76 => 68.0,
        GameEdition::Starfield => 0.96,
    }
}

/// Encode one field in the given schema.
///
/// Tes4/Tes5 payloads above 65535 bytes are preceded by an `XXXX` escape.
pub fn field(format: FormatVersion, tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 16);
    match format {
        FormatVersion::Tes3 => {
            out.extend_from_slice(tag);
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        }
        FormatVersion::Tes4 | FormatVersion::Tes5 => {
            if let Ok(size) = u16::try_from(data.len()) {
                out.extend_from_slice(tag);
                out.extend_from_slice(&size.to_le_bytes());
            } else {
                out.extend_from_slice(b"XXXX");
                out.extend_from_slice(&4u16.to_le_bytes());
                out.extend_from_slice(&(data.len() as u32).to_le_bytes());
                out.extend_from_slice(tag);
                out.extend_from_slice(&0u16.to_le_bytes());
            }
        }
    }
    out.extend_from_slice(data);
    out
}

/// Null-terminated string payload
pub fn zstring(s: &str) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.push(0);
    out
}

fn write_record(
    buf: &mut Vec<u8>,
    format: FormatVersion,
    tag: FormTag,
    flags: RecordFlags,
    form_id: u32,
    payload: &[u8],
) {
    buf.extend_from_slice(&tag.0.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    match format {
        FormatVersion::Tes3 => {
            buf.extend_from_slice(&0u32.to_le_bytes());
            buf.extend_from_slice(&flags.bits().to_le_bytes());
        }
        FormatVersion::Tes4 | FormatVersion::Tes5 => {
            buf.extend_from_slice(&flags.bits().to_le_bytes());
            buf.extend_from_slice(&form_id.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes());
            if format == FormatVersion::Tes5 {
                buf.extend_from_slice(&44u32.to_le_bytes());
            }
        }
    }
    buf.extend_from_slice(payload);
}

// Writing into a Vec cannot fail
fn compressed_payload(payload: &[u8]) -> Vec<u8> {
    compress_record(payload).unwrap_or_default()
}

/// Assembles a plugin file, root record first.
#[derive(Debug)]
pub struct PluginBuilder {
    edition: GameEdition,
    buf: Vec<u8>,
}

impl PluginBuilder {
    /// Start a file with a default root record
    pub fn new(edition: GameEdition) -> Self {
        Self::with_root(edition, RecordFlags::empty(), &[])
    }

    /// Start a localized file (root flag `0x80`)
    pub fn localized(edition: GameEdition) -> Self {
        Self::with_root(edition, RecordFlags::from_bits_retain(LOCALIZED_FLAG), &[])
    }

    /// Start a file whose root record lists `masters`
    pub fn with_masters(edition: GameEdition, masters: &[&str]) -> Self {
        Self::with_root(edition, RecordFlags::MASTER, masters)
    }

    fn with_root(edition: GameEdition, flags: RecordFlags, masters: &[&str]) -> Self {
        let format = edition.format();
        let mut payload = Vec::new();
        let version = hedr_version(edition).to_le_bytes();
        match format {
            FormatVersion::Tes3 => {
                let mut hedr = Vec::with_capacity(TES3_HEDR_SIZE);
                hedr.extend_from_slice(&version);
                hedr.extend_from_slice(&1u32.to_le_bytes());
                let mut company = b"bgs-esm".to_vec();
                company.resize(32, 0);
                hedr.extend_from_slice(&company);
                let mut description = b"Synthetic test master".to_vec();
                description.resize(256, 0);
                hedr.extend_from_slice(&description);
                hedr.extend_from_slice(&0u32.to_le_bytes());
                payload.extend(field(format, b"HEDR", &hedr));
            }
            FormatVersion::Tes4 | FormatVersion::Tes5 => {
                let mut hedr = Vec::with_capacity(12);
                hedr.extend_from_slice(&version);
                hedr.extend_from_slice(&0i32.to_le_bytes());
                hedr.extend_from_slice(&0x800u32.to_le_bytes());
                payload.extend(field(format, b"HEDR", &hedr));
                payload.extend(field(format, b"CNAM", &zstring("bgs-esm")));
            }
        }
        for master in masters {
            payload.extend(field(format, b"MAST", &zstring(master)));
            payload.extend(field(format, b"DATA", &0u64.to_le_bytes()));
        }

        let root = match format {
            FormatVersion::Tes3 => FormTag::TES3,
            _ => FormTag::TES4,
        };
        let mut buf = Vec::new();
        write_record(&mut buf, format, root, flags, 0, &payload);
        Self { edition, buf }
    }

    /// Edition the file is written for
    pub fn edition(&self) -> GameEdition {
        self.edition
    }

    /// Header schema of the file
    pub fn format(&self) -> FormatVersion {
        self.edition.format()
    }

    /// Current length in bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing was written; never true after construction
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a record outside of any group
    pub fn record(&mut self, tag: FormTag, form_id: u32, payload: &[u8]) -> &mut Self {
        let format = self.format();
        write_record(&mut self.buf, format, tag, RecordFlags::empty(), form_id, payload);
        self
    }

    /// Append raw bytes
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Open a top-level group
    pub fn group(&mut self, label: u32, kind: GroupKind) -> GroupWriter<'_> {
        GroupWriter::open(&mut self.buf, self.edition.format(), label, kind)
    }

    /// Finished file bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Writes the chunks of one group; [`GroupWriter::finish`] patches its size.
#[derive(Debug)]
pub struct GroupWriter<'a> {
    buf: &'a mut Vec<u8>,
    format: FormatVersion,
    start: usize,
    label: u32,
    kind: GroupKind,
}

impl<'a> GroupWriter<'a> {
    fn open(buf: &'a mut Vec<u8>, format: FormatVersion, label: u32, kind: GroupKind) -> Self {
        let start = buf.len();
        buf.extend_from_slice(b"GRUP");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&label.to_le_bytes());
        buf.extend_from_slice(&kind.to_raw().to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        if format == FormatVersion::Tes5 {
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
        Self {
            buf,
            format,
            start,
            label,
            kind,
        }
    }

    /// Append an uncompressed record
    pub fn record(&mut self, tag: FormTag, form_id: u32, payload: &[u8]) -> &mut Self {
        self.record_with_flags(tag, form_id, RecordFlags::empty(), payload)
    }

    /// Append a record with explicit header flags; the payload is stored as given
    pub fn record_with_flags(
        &mut self,
        tag: FormTag,
        form_id: u32,
        flags: RecordFlags,
        payload: &[u8],
    ) -> &mut Self {
        write_record(self.buf, self.format, tag, flags, form_id, payload);
        self
    }

    /// Append a record compressed with a size prefix
    pub fn compressed_record(&mut self, tag: FormTag, form_id: u32, payload: &[u8]) -> &mut Self {
        let data = compressed_payload(payload);
        self.record_with_flags(tag, form_id, RecordFlags::COMPRESSED, &data)
    }

    /// Open a nested group
    pub fn group(&mut self, label: u32, kind: GroupKind) -> GroupWriter<'_> {
        GroupWriter::open(self.buf, self.format, label, kind)
    }

    /// Patch the total size and return the header as the reader sees it
    pub fn finish(self) -> GroupHeader {
        let total = (self.buf.len() - self.start) as u32;
        self.buf[self.start + 4..self.start + 8].copy_from_slice(&total.to_le_bytes());
        let header_len = self.format.group_header_len();
        GroupHeader {
            label: self.label,
            kind: self.kind,
            data_size: total - header_len as u32,
            position: self.start as u64 + header_len,
        }
    }
}
