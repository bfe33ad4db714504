//! Game editions, tiers and header schemas.
//!
//! Three binary schemas cover every supported game:
//!
//! ```text
//! Schema | Record header | Group header | Field size | Games
//! -------|---------------|--------------|------------|------------------------------
//! Tes3   | 16 bytes      | (no groups)  | u32        | Morrowind
//! Tes4   | 20 bytes      | 20 bytes     | u16        | Oblivion
//! Tes5   | 24 bytes      | 24 bytes     | u16        | Fallout 3 .. Starfield
//! ```
//!
//! The edition decides which record and field tags are valid. Editions are
//! ordered, and each one's tier is a small integer that only grows.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{EsmError, Result};
use crate::tag::FormTag;

/// Header schema used by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatVersion {
    /// Morrowind: 16-byte record headers, 4-byte field sizes, no groups
    Tes3,
    /// Oblivion: 20-byte record and group headers
    Tes4,
    /// Fallout 3 and later: 24-byte record and group headers
    Tes5,
}

impl FormatVersion {
    /// Size of a record header in bytes
    #[must_use]
    pub const fn record_header_len(self) -> u64 {
        match self {
            Self::Tes3 => 16,
            Self::Tes4 => 20,
            Self::Tes5 => 24,
        }
    }

    /// Size of a group header in bytes. Tes3 has no groups.
    #[must_use]
    pub const fn group_header_len(self) -> u64 {
        match self {
            Self::Tes3 | Self::Tes4 => 20,
            Self::Tes5 => 24,
        }
    }

    /// Size of a field header in bytes
    #[must_use]
    pub const fn field_header_len(self) -> usize {
        match self {
            Self::Tes3 => 8,
            Self::Tes4 | Self::Tes5 => 6,
        }
    }

    /// Whether records are organised in groups
    #[must_use]
    pub const fn has_groups(self) -> bool {
        !matches!(self, Self::Tes3)
    }

    /// Detect the schema from the root record at the start of `reader`.
    ///
    /// `TES3` selects [`FormatVersion::Tes3`]. For `TES4` the first field tag
    /// (`HEDR`) sits right after the record header, so its offset reveals the
    /// header width. The reader is left at the start of the stream.
    pub fn detect<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let tag = FormTag(reader.read_u32::<LittleEndian>()?);

        let format = match tag {
            FormTag::TES3 => Self::Tes3,
            FormTag::TES4 => {
                let mut probe = [0u8; 28];
                reader.seek(SeekFrom::Start(0))?;
                let read = read_up_to(reader, &mut probe)?;
                if read >= 24 && probe[20..24] == *b"HEDR" {
                    Self::Tes4
                } else if read >= 28 && probe[24..28] == *b"HEDR" {
                    Self::Tes5
                } else {
                    return Err(EsmError::UnsupportedVersion(
                        "TES4 root record without a HEDR field".to_string(),
                    ));
                }
            }
            found => return Err(EsmError::InvalidMagic { found, offset: 0 }),
        };

        reader.seek(SeekFrom::Start(0))?;
        log::debug!("Detected {format} header schema");
        Ok(format)
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tes3 => "TES3",
            Self::Tes4 => "TES4",
            Self::Tes5 => "TES5",
        };
        f.write_str(s)
    }
}

/// Game edition that produced a file.
///
/// The discriminant is the edition's tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum GameEdition {
    /// The Elder Scrolls III: Morrowind
    Morrowind = 3,
    /// The Elder Scrolls IV: Oblivion
    Oblivion = 4,
    /// Fallout 3
    Fallout3 = 5,
    /// Fallout: New Vegas
    FalloutNV = 6,
    /// The Elder Scrolls V: Skyrim
    Skyrim = 7,
    /// Skyrim Special Edition
    SkyrimSE = 8,
    /// Fallout 4
    Fallout4 = 9,
    /// Fallout 76
    Fallout76 = 10,
    /// Starfield
    Starfield = 11,
}

impl GameEdition {
    /// All editions, in tier order
    pub const ALL: [Self; 9] = [
        Self::Morrowind,
        Self::Oblivion,
        Self::Fallout3,
        Self::FalloutNV,
        Self::Skyrim,
        Self::SkyrimSE,
        Self::Fallout4,
        Self::Fallout76,
        Self::Starfield,
    ];

    /// Tier ordinal of this edition
    #[must_use]
    pub const fn tier(self) -> u8 {
        self as u8
    }

    /// Header schema used by this edition
    #[must_use]
    pub const fn format(self) -> FormatVersion {
        match self {
            Self::Morrowind => FormatVersion::Tes3,
            Self::Oblivion => FormatVersion::Tes4,
            _ => FormatVersion::Tes5,
        }
    }

    /// Infer the edition from the schema and the root `HEDR` version number.
    ///
    /// Fallout 3 and Skyrim both write 0.94; that value resolves to Skyrim.
    /// Callers reading Fallout 3 data should force the edition.
    #[must_use]
    pub fn infer(format: FormatVersion, hedr_version: f32) -> Self {
        let near = |v: f32| (hedr_version - v).abs() < 0.005;
        match format {
            FormatVersion::Tes3 => Self::Morrowind,
            FormatVersion::Tes4 => Self::Oblivion,
            FormatVersion::Tes5 => {
                if near(0.94) {
                    Self::Skyrim
                } else if (1.3..1.35).contains(&hedr_version) {
                    Self::FalloutNV
                } else if (1.69..1.75).contains(&hedr_version) {
                    Self::SkyrimSE
                } else if near(0.95) || near(1.0) {
                    Self::Fallout4
                } else if near(0.96) {
                    Self::Starfield
                } else if hedr_version >= 60.0 {
                    Self::Fallout76
                } else {
                    log::warn!(
                        "Unrecognised HEDR version {hedr_version} for {format} header schema, assuming Skyrim"
                    );
                    Self::Skyrim
                }
            }
        }
    }
}

impl fmt::Display for GameEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Morrowind => "Morrowind",
            Self::Oblivion => "Oblivion",
            Self::Fallout3 => "Fallout 3",
            Self::FalloutNV => "Fallout: New Vegas",
            Self::Skyrim => "Skyrim",
            Self::SkyrimSE => "Skyrim Special Edition",
            Self::Fallout4 => "Fallout 4",
            Self::Fallout76 => "Fallout 76",
            Self::Starfield => "Starfield",
        };
        f.write_str(s)
    }
}
