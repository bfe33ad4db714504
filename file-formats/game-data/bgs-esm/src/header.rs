//! Record and group header parsing.
//!
//! Every chunk starts with a 4-byte tag. `GRUP` marks a group, anything else
//! is a record. Widths depend on the [`FormatVersion`]:
//!
//! # Binary Layout
//!
//! ```text
//! Record (Tes3, 16 bytes)   Record (Tes4, 20 bytes)   Record (Tes5, 24 bytes)
//! 0x00 tag                  0x00 tag                  0x00 tag
//! 0x04 data size            0x04 data size            0x04 data size
//! 0x08 unknown              0x08 flags                0x08 flags
//! 0x0C flags                0x0C form id              0x0C form id
//!                           0x10 version control      0x10 version control
//!                                                     0x14 form version/unknown
//!
//! Group (Tes4, 20 bytes)    Group (Tes5, 24 bytes)
//! 0x00 "GRUP"               0x00 "GRUP"
//! 0x04 total size           0x04 total size
//! 0x08 label                0x08 label
//! 0x0C group type (i32)     0x0C group type (i32)
//! 0x10 stamp                0x10 stamp
//!                           0x14 version/unknown
//! ```
//!
//! A group's total size includes its own header; [`GroupHeader::data_size`]
//! has the header length subtracted exactly once.

use std::io::{Read, Seek, SeekFrom};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{EsmError, Result};
use crate::group::GroupId;
use crate::tag::FormTag;
use crate::types::FormId;
use crate::version::FormatVersion;

bitflags! {
    /// Record header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RecordFlags: u32 {
        /// File is a master (root record only)
        const MASTER = 0x0000_0001;
        /// Record is deleted
        const DELETED = 0x0000_0020;
        /// Light master (root record only, Skyrim SE and later)
        const LIGHT_MASTER = 0x0000_0200;
        /// Reference is persistent
        const PERSISTENT = 0x0000_0400;
        /// Reference starts disabled
        const INITIALLY_DISABLED = 0x0000_0800;
        /// Record is ignored
        const IGNORED = 0x0000_1000;
        /// Morrowind: record is blocked
        const BLOCKED = 0x0000_2000;
        /// Reference is visible when distant
        const VISIBLE_DISTANT = 0x0000_8000;
        /// Payload is zlib compressed with a 4-byte inflated size prefix
        const COMPRESSED = 0x0004_0000;
        /// Cannot wait in this cell
        const CANT_WAIT = 0x0008_0000;
    }
}

/// Header of a record chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record type
    pub tag: FormTag,
    /// Payload size in bytes (excludes the header)
    pub data_size: u32,
    /// Header flags
    pub flags: RecordFlags,
    /// Form id (always zero for Morrowind)
    pub form_id: FormId,
    /// Stream offset of the first payload byte
    pub position: u64,
    /// Group that contains the record, if any
    pub parent: Option<GroupId>,
}

impl RecordHeader {
    /// Whether the payload is zlib compressed
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(RecordFlags::COMPRESSED)
    }

    /// Whether the record is flagged deleted
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(RecordFlags::DELETED)
    }

    /// Stream offset just past the payload
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.position + self.data_size as u64
    }
}

/// Group type stored in a group header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Top-level group; label is a record tag
    Top,
    /// Children of a worldspace; label is the worldspace form id
    WorldChildren,
    /// Interior cell block; label is the block number
    InteriorCellBlock,
    /// Interior cell sub-block; label is the sub-block number
    InteriorCellSubBlock,
    /// Exterior cell block; label packs the block grid as `(y << 16) | x`
    ExteriorCellBlock,
    /// Exterior cell sub-block; label packs the sub-block grid as `(y << 16) | x`
    ExteriorCellSubBlock,
    /// Children of a cell; label is the cell form id
    CellChildren,
    /// Children of a dialogue topic; label is the topic form id
    TopicChildren,
    /// Persistent references of a cell; label is the cell form id
    CellPersistentChildren,
    /// Temporary references of a cell; label is the cell form id
    CellTemporaryChildren,
    /// Visible-distant references of a cell; label is the cell form id
    CellVisibleDistantChildren,
}

impl GroupKind {
    /// Decode the signed group type
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => Self::Top,
            1 => Self::WorldChildren,
            2 => Self::InteriorCellBlock,
            3 => Self::InteriorCellSubBlock,
            4 => Self::ExteriorCellBlock,
            5 => Self::ExteriorCellSubBlock,
            6 => Self::CellChildren,
            7 => Self::TopicChildren,
            8 => Self::CellPersistentChildren,
            9 => Self::CellTemporaryChildren,
            10 => Self::CellVisibleDistantChildren,
            _ => return None,
        })
    }

    /// The signed group type as stored
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            Self::Top => 0,
            Self::WorldChildren => 1,
            Self::InteriorCellBlock => 2,
            Self::InteriorCellSubBlock => 3,
            Self::ExteriorCellBlock => 4,
            Self::ExteriorCellSubBlock => 5,
            Self::CellChildren => 6,
            Self::TopicChildren => 7,
            Self::CellPersistentChildren => 8,
            Self::CellTemporaryChildren => 9,
            Self::CellVisibleDistantChildren => 10,
        }
    }
}

/// Header of a group chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupHeader {
    /// Raw label; meaning depends on [`GroupHeader::kind`]
    pub label: u32,
    /// Group type
    pub kind: GroupKind,
    /// Payload size in bytes (total size minus the group header)
    pub data_size: u32,
    /// Stream offset of the first payload byte
    pub position: u64,
}

impl GroupHeader {
    /// Label as a record tag (top-level groups)
    #[must_use]
    pub const fn label_tag(&self) -> FormTag {
        FormTag(self.label)
    }

    /// Label as a form id (world, cell and topic children)
    #[must_use]
    pub const fn label_form_id(&self) -> FormId {
        FormId(self.label)
    }

    /// Label as a packed exterior grid `(x, y)`
    #[must_use]
    pub const fn label_grid(&self) -> (i16, i16) {
        ((self.label & 0xFFFF) as u16 as i16, (self.label >> 16) as u16 as i16)
    }

    /// Stream offset just past the payload
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.position + self.data_size as u64
    }
}

/// A parsed chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkHeader {
    /// A record chunk
    Record(RecordHeader),
    /// A group chunk
    Group(GroupHeader),
}

impl ChunkHeader {
    /// Stream offset just past the chunk payload
    #[must_use]
    pub const fn end(&self) -> u64 {
        match self {
            Self::Record(h) => h.end(),
            Self::Group(h) => h.end(),
        }
    }
}

/// Read one chunk header, leaving `reader` at the payload start.
///
/// `parent` is recorded on record headers as a back-reference only.
pub fn read_chunk_header<R: Read + Seek>(
    reader: &mut R,
    format: FormatVersion,
    parent: Option<GroupId>,
) -> Result<ChunkHeader> {
    let offset = reader.stream_position()?;
    let tag = FormTag(reader.read_u32::<LittleEndian>()?);

    if tag == FormTag::GRUP && format.has_groups() {
        let total = reader.read_u32::<LittleEndian>()?;
        let header_len = format.group_header_len();
        if u64::from(total) < header_len {
            return Err(EsmError::InvalidGroupSize {
                total,
                header_len,
                offset,
            });
        }
        let label = reader.read_u32::<LittleEndian>()?;
        let raw_kind = reader.read_i32::<LittleEndian>()?;
        let kind = GroupKind::from_raw(raw_kind).ok_or_else(|| {
            EsmError::UnsupportedVersion(format!(
                "unknown group type {raw_kind} at offset {offset}"
            ))
        })?;
        // stamp, then version/unknown for the 24-byte schema
        let skip = if format == FormatVersion::Tes5 { 8 } else { 4 };
        reader.seek(SeekFrom::Current(skip))?;

        return Ok(ChunkHeader::Group(GroupHeader {
            label,
            kind,
            data_size: total - header_len as u32,
            position: offset + header_len,
        }));
    }

    let data_size = reader.read_u32::<LittleEndian>()?;
    let (flags, form_id) = match format {
        FormatVersion::Tes3 => {
            let _unknown = reader.read_u32::<LittleEndian>()?;
            (reader.read_u32::<LittleEndian>()?, 0)
        }
        FormatVersion::Tes4 | FormatVersion::Tes5 => {
            let flags = reader.read_u32::<LittleEndian>()?;
            let form_id = reader.read_u32::<LittleEndian>()?;
            let _version_control = reader.read_u32::<LittleEndian>()?;
            if format == FormatVersion::Tes5 {
                let _form_version = reader.read_u32::<LittleEndian>()?;
            }
            (flags, form_id)
        }
    };

    Ok(ChunkHeader::Record(RecordHeader {
        tag,
        data_size,
        flags: RecordFlags::from_bits_retain(flags),
        form_id: FormId(form_id),
        position: offset + format.record_header_len(),
        parent,
    }))
}
