//! Field headers and the per-record field loop.
//!
//! A record payload is a flat run of fields:
//!
//! ```text
//! Tes3:      tag(4) size(u32) payload[size]
//! Tes4/Tes5: tag(4) size(u16) payload[size]
//! ```
//!
//! A field whose payload does not fit a `u16` is preceded by an `XXXX`
//! escape. The escape's own size must be 4 and its payload is the real `u32`
//! size of the field that follows.
//!
//! The loop hands each field to the record's [`FieldSink`] through a
//! [`FieldReader`] bounded to exactly that field's bytes. A sink that claims a
//! field must consume all of it; anything else is a [`EsmError::SizeMismatch`].

use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::{BinRead, Endian};
use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{EsmError, Result};
use crate::tag::FormTag;
use crate::types::FormId;
use crate::version::{FormatVersion, GameEdition};

/// Parse state shared by every field of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadContext {
    /// Header schema of the file
    pub format: FormatVersion,
    /// Active game edition
    pub edition: GameEdition,
    /// Whether text fields hold string table ids (root flag `0x80`)
    pub localized: bool,
}

impl ReadContext {
    /// Context for an edition, using that edition's schema
    #[must_use]
    pub const fn new(edition: GameEdition) -> Self {
        Self {
            format: edition.format(),
            edition,
            localized: false,
        }
    }

    /// Active tier
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.edition.tier()
    }
}

/// One field header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    /// Field type
    pub tag: FormTag,
    /// Declared payload size
    pub size: u32,
}

impl FieldHeader {
    /// Read a field header in the given schema
    pub fn read<R: Read>(reader: &mut R, format: FormatVersion) -> Result<Self> {
        let tag = FormTag(reader.read_u32::<LittleEndian>()?);
        let size = match format {
            FormatVersion::Tes3 => reader.read_u32::<LittleEndian>()?,
            FormatVersion::Tes4 | FormatVersion::Tes5 => u32::from(reader.read_u16::<LittleEndian>()?),
        };
        Ok(Self { tag, size })
    }
}

/// Result of offering a field to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    /// The record decoded the field and consumed every byte of it
    Handled,
    /// The record does not model this field; the loop skips it
    Unhandled,
}

/// Receives the fields of one record.
pub trait FieldSink {
    /// Decode `field` if its tag is modelled.
    ///
    /// Return [`FieldOutcome::Unhandled`] without reading anything otherwise.
    fn read_field(&mut self, field: &mut FieldReader<'_>) -> Result<FieldOutcome>;
}

/// Text that is either stored inline or as an id into a string table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LString {
    /// Inline text
    Text(String),
    /// String table id (localized plugins)
    Id(u32),
}

impl LString {
    /// Inline text, if any
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Id(_) => None,
        }
    }
}

impl Default for LString {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Reader bounded to a single field payload.
pub struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
    tag: FormTag,
    record: FormTag,
    offset: u64,
    ctx: ReadContext,
}

impl<'a> FieldReader<'a> {
    /// Wrap a field payload. `offset` is the payload's position, for diagnostics.
    #[must_use]
    pub fn new(data: &'a [u8], tag: FormTag, record: FormTag, offset: u64, ctx: ReadContext) -> Self {
        Self {
            cursor: Cursor::new(data),
            tag,
            record,
            offset,
            ctx,
        }
    }

    /// Field tag
    #[must_use]
    pub fn tag(&self) -> FormTag {
        self.tag
    }

    /// Tag of the record being decoded
    #[must_use]
    pub fn record_tag(&self) -> FormTag {
        self.record
    }

    /// Declared payload size
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes consumed so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left in the payload
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// Session context
    #[must_use]
    pub fn ctx(&self) -> ReadContext {
        self.ctx
    }

    /// Header schema of the file
    #[must_use]
    pub fn format(&self) -> FormatVersion {
        self.ctx.format
    }

    /// Active game edition
    #[must_use]
    pub fn edition(&self) -> GameEdition {
        self.ctx.edition
    }

    fn overrun(&self, wanted: usize) -> EsmError {
        EsmError::SizeMismatch {
            record: self.record,
            field: Some(self.tag),
            offset: self.offset,
            expected: self.len() as u64,
            actual: (self.position() + wanted) as u64,
        }
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(self.overrun(n));
        }
        Ok(())
    }

    /// Read a byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.cursor.read_u8()?)
    }

    /// Read a little-endian `u16`
    pub fn read_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.cursor.read_u16::<LittleEndian>()?)
    }

    /// Read a little-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16> {
        self.need(2)?;
        Ok(self.cursor.read_i16::<LittleEndian>()?)
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    /// Read a little-endian `f32`
    pub fn read_f32(&mut self) -> Result<f32> {
        self.need(4)?;
        Ok(self.cursor.read_f32::<LittleEndian>()?)
    }

    /// Read a form id
    pub fn read_form_id(&mut self) -> Result<FormId> {
        self.read_u32().map(FormId)
    }

    /// Read a four-byte tag
    pub fn read_tag(&mut self) -> Result<FormTag> {
        self.read_u32().map(FormTag)
    }

    /// Read `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.need(n)?;
        let mut buf = vec![0u8; n];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read every remaining byte
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        self.read_bytes(self.remaining())
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.cursor.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    /// Read a fixed-width string, trimmed at the first NUL
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(decode_text(&bytes))
    }

    /// Read the rest of the field as a (usually NUL-terminated) string
    pub fn read_zstring(&mut self) -> Result<String> {
        let bytes = self.read_to_end()?;
        Ok(decode_text(&bytes))
    }

    /// Read the rest of the field as text or a string table id
    pub fn read_lstring(&mut self) -> Result<LString> {
        if self.ctx.localized && self.remaining() == 4 {
            return self.read_u32().map(LString::Id);
        }
        self.read_zstring().map(LString::Text)
    }

    /// Read a binrw value
    pub fn read<T>(&mut self) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        let start = self.position();
        match T::read_options(&mut self.cursor, Endian::Little, ()) {
            Ok(value) => Ok(value),
            Err(err) if is_eof(&err) => {
                let wanted = self.len() + 1 - start;
                self.cursor.set_position(start as u64);
                Err(self.overrun(wanted))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Read binrw values until the field is exhausted
    pub fn read_all<T>(&mut self) -> Result<Vec<T>>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        let mut items = Vec::new();
        while self.remaining() > 0 {
            items.push(self.read()?);
        }
        Ok(items)
    }

    /// Read form ids until the field is exhausted
    pub fn read_form_ids(&mut self) -> Result<Vec<FormId>> {
        if self.remaining() % 4 != 0 {
            return Err(self.overrun(4 - self.remaining() % 4));
        }
        self.read_all()
    }
}

fn is_eof(err: &binrw::Error) -> bool {
    match err {
        binrw::Error::Io(io) => io.kind() == std::io::ErrorKind::UnexpectedEof,
        _ => false,
    }
}

/// Decode stored text: trim at the first NUL, replace invalid UTF-8.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Run the field loop over one record payload.
///
/// `data` is exactly the record's payload (already inflated if it was
/// compressed) and `base` the offset used in diagnostics for `data[0]`.
pub fn read_fields(
    data: &[u8],
    base: u64,
    record: FormTag,
    ctx: ReadContext,
    sink: &mut dyn FieldSink,
) -> Result<()> {
    let header_len = ctx.format.field_header_len();
    let end = data.len();
    let mut pos = 0usize;
    let mut size_override: Option<u32> = None;

    while end - pos >= header_len {
        let field_offset = base + pos as u64;
        let header = FieldHeader::read(&mut &data[pos..pos + header_len], ctx.format)?;
        pos += header_len;

        if header.tag == FormTag::XXXX {
            if header.size != 4 {
                return Err(EsmError::InvalidOversizeField {
                    offset: field_offset,
                    size: header.size,
                });
            }
            if end - pos < 4 {
                return Err(EsmError::SizeMismatch {
                    record,
                    field: Some(FormTag::XXXX),
                    offset: field_offset,
                    expected: 4,
                    actual: (end - pos) as u64,
                });
            }
            let real = (&data[pos..pos + 4]).read_u32::<LittleEndian>()?;
            log::trace!("{record}: oversize escape at {field_offset}, next field is {real} bytes");
            size_override = Some(real);
            pos += 4;
            continue;
        }

        let size = size_override.take().unwrap_or(header.size) as usize;

        if record == FormTag::WRLD && header.tag == FormTag::OFST {
            log::trace!("{record}: skipping offset table and the rest of the record at {field_offset}");
            pos = end;
            break;
        }

        if size > end - pos {
            return Err(EsmError::SizeMismatch {
                record,
                field: Some(header.tag),
                offset: field_offset,
                expected: size as u64,
                actual: (end - pos) as u64,
            });
        }

        let payload = &data[pos..pos + size];
        let mut reader = FieldReader::new(payload, header.tag, record, field_offset, ctx);
        match sink.read_field(&mut reader)? {
            FieldOutcome::Handled => {
                if reader.position() != size {
                    return Err(EsmError::SizeMismatch {
                        record,
                        field: Some(header.tag),
                        offset: field_offset,
                        expected: size as u64,
                        actual: reader.position() as u64,
                    });
                }
            }
            FieldOutcome::Unhandled => {
                log::trace!("{record}: skipping unhandled field {} ({size} bytes)", header.tag);
            }
        }
        pos += size;
    }

    if pos != end {
        return Err(EsmError::SizeMismatch {
            record,
            field: None,
            offset: base,
            expected: end as u64,
            actual: pos as u64,
        });
    }
    Ok(())
}
