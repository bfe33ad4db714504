//! Error types for master/plugin file reading.
//!
//! Reading follows a fail-fast strategy for anything that makes the stream
//! position untrustworthy. Once a size disagrees with what was consumed, every
//! later offset is suspect, so the whole file load is abandoned.
//!
//! # Error Categories
//!
//! ## Critical Errors (abort the file load)
//!
//! - [`EsmError::SizeMismatch`] - Declared field or record size differs from the bytes consumed
//! - [`EsmError::InvalidMagic`] - File does not start with a known root record
//! - [`EsmError::UnsupportedVersion`] - Root record layout is not recognised
//! - [`EsmError::EditionMismatch`] - Forced edition disagrees with the detected schema
//! - [`EsmError::DecompressionSizeMismatch`] - Inflated payload length differs from its prefix
//! - [`EsmError::Decompression`] - zlib stream is corrupt
//! - [`EsmError::InvalidGroupSize`] - Group total size smaller than its own header
//! - [`EsmError::GroupSizeMismatch`] - Group children do not add up to the group size
//! - [`EsmError::InvalidOversizeField`] - `XXXX` escape with a payload other than 4 bytes
//! - [`EsmError::MemoryLimitExceeded`] - Record claims a buffer above the configured limit
//! - [`EsmError::Io`] / [`EsmError::Binrw`] - Underlying read failures
//!
//! ## Warnings (logged, the chunk is skipped by its declared size)
//!
//! - [`EsmError::UnknownTag`] - Record tag missing from the registry
//! - [`EsmError::UnsupportedAtTier`] - Record tag not valid for the active edition

use thiserror::Error;

use crate::tag::FormTag;
use crate::types::FormId;
use crate::version::{FormatVersion, GameEdition};

/// Result type alias using [`EsmError`] as the error type.
pub type Result<T> = std::result::Result<T, EsmError>;

/// Errors that can occur while reading master/plugin files.
#[derive(Error, Debug)]
pub enum EsmError {
    /// Underlying I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing library error.
    #[error("binrw error: {0}")]
    Binrw(String),

    /// The file does not start with `TES3` or `TES4`.
    #[error("Invalid magic bytes: found {found} at offset {offset}")]
    InvalidMagic {
        /// Tag found where the root record was expected.
        found: FormTag,
        /// File offset of the tag.
        offset: u64,
    },

    /// The root record layout is not one of the known schemas.
    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(String),

    /// A forced edition uses a different header schema than the file.
    #[error("Edition {edition} expects {expected} headers but the file uses {detected}")]
    EditionMismatch {
        /// Edition requested by the caller.
        edition: GameEdition,
        /// Schema the edition implies.
        expected: FormatVersion,
        /// Schema detected from the file.
        detected: FormatVersion,
    },

    /// Declared size and consumed bytes disagree.
    ///
    /// `field` is `None` when the mismatch concerns the record as a whole.
    #[error(
        "Size mismatch in {record}{} at offset {offset}: declared {expected} bytes, consumed {actual}",
        .field.map(|f| format!("/{f}")).unwrap_or_default()
    )]
    SizeMismatch {
        /// Tag of the enclosing record.
        record: FormTag,
        /// Tag of the field being decoded, if any.
        field: Option<FormTag>,
        /// Offset of the offending field or record payload.
        offset: u64,
        /// Declared size.
        expected: u64,
        /// Bytes actually consumed.
        actual: u64,
    },

    /// Inflated record payload length disagrees with its 4-byte prefix.
    #[error("Decompressed size mismatch for record {form_id}: expected {expected}, got {actual}")]
    DecompressionSizeMismatch {
        /// Form id of the compressed record.
        form_id: FormId,
        /// Length announced by the prefix.
        expected: usize,
        /// Length produced by inflation.
        actual: usize,
    },

    /// The zlib stream could not be inflated.
    #[error("Decompression failed for record {form_id}: {message}")]
    Decompression {
        /// Form id of the compressed record.
        form_id: FormId,
        /// Underlying inflate error.
        message: String,
    },

    /// Group total size is smaller than the group header.
    #[error("Invalid group size {total} at offset {offset}: header alone is {header_len} bytes")]
    InvalidGroupSize {
        /// Total size declared by the group.
        total: u32,
        /// Group header length for the schema.
        header_len: u64,
        /// Offset of the group header.
        offset: u64,
    },

    /// Children of a group overran or underran the group's declared end.
    #[error("Group {label:#010x} at offset {offset} should end at {expected}, children end at {actual}")]
    GroupSizeMismatch {
        /// Raw group label.
        label: u32,
        /// Offset of the group payload.
        offset: u64,
        /// Declared end offset.
        expected: u64,
        /// Offset where the children ended.
        actual: u64,
    },

    /// Oversize escape (`XXXX`) whose own payload is not 4 bytes.
    #[error("Oversize field escape at offset {offset} declares {size} bytes, expected 4")]
    InvalidOversizeField {
        /// Offset of the escape field.
        offset: u64,
        /// Declared payload size.
        size: u32,
    },

    /// A record or inflate buffer exceeds the configured limit.
    #[error("Memory limit exceeded: attempted to allocate {requested} bytes, limit is {limit}")]
    MemoryLimitExceeded {
        /// Bytes requested.
        requested: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Unknown record tag (warning, the record is skipped).
    #[error("Unknown record tag {tag} at offset {offset} (skipping)")]
    UnknownTag {
        /// Tag not present in the registry.
        tag: FormTag,
        /// Offset of the record payload.
        offset: u64,
    },

    /// Record tag not valid for the active edition (warning, the record is skipped).
    #[error("Record tag {tag} is not supported by {edition} (skipping)")]
    UnsupportedAtTier {
        /// Registered tag.
        tag: FormTag,
        /// Active edition.
        edition: GameEdition,
    },
}

impl From<binrw::Error> for EsmError {
    fn from(err: binrw::Error) -> Self {
        EsmError::Binrw(format!("{err}"))
    }
}

impl EsmError {
    /// Whether the error aborts a file load. Warnings are only ever logged.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EsmError::UnknownTag { .. } | EsmError::UnsupportedAtTier { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_names_tags_and_offset() {
        let err = EsmError::SizeMismatch {
            record: FormTag::CELL,
            field: Some(FormTag::XCLC),
            offset: 0x40,
            expected: 12,
            actual: 8,
        };
        let display = format!("{err}");
        assert!(display.contains("CELL/XCLC"));
        assert!(display.contains("offset 64"));
        assert!(display.contains("declared 12"));
        assert!(display.contains("consumed 8"));
    }

    #[test]
    fn record_level_mismatch_has_no_field() {
        let err = EsmError::SizeMismatch {
            record: FormTag::WEAP,
            field: None,
            offset: 100,
            expected: 20,
            actual: 18,
        };
        assert_eq!(
            format!("{err}"),
            "Size mismatch in WEAP at offset 100: declared 20 bytes, consumed 18"
        );
    }

    #[test]
    fn warnings_are_not_fatal() {
        let warn = EsmError::UnknownTag {
            tag: FormTag::from_str("ZZZZ").unwrap(),
            offset: 0,
        };
        assert!(!warn.is_fatal());

        let fatal = EsmError::InvalidOversizeField { offset: 0, size: 2 };
        assert!(fatal.is_fatal());
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: EsmError = io_err.into();
        assert!(matches!(err, EsmError::Io(_)));
    }

    #[test]
    fn binrw_error_conversion() {
        let binrw_err = binrw::Error::AssertFail {
            pos: 0x10,
            message: "bad".into(),
        };
        let err: EsmError = binrw_err.into();
        assert!(matches!(err, EsmError::Binrw(_)));
    }
}
