//! Decoded records.

use std::borrow::Cow;
use std::sync::Arc;

use crate::compression::decompress_record;
use crate::error::Result;
use crate::field::{LString, ReadContext, read_fields};
use crate::header::RecordHeader;
use crate::records::{RecordData, RecordKind, RecordShape};
use crate::tag::FormTag;
use crate::types::FormId;

/// Shared handle to a decoded record.
pub type RecordRef = Arc<Record>;

/// A record header together with its decoded body.
///
/// Records are immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Header as read from the stream
    pub header: RecordHeader,
    /// Decoded body
    pub data: RecordData,
}

impl Record {
    /// Decode `payload` into `body`.
    ///
    /// Compressed payloads are inflated first and their fields are read with
    /// offsets relative to the start of the inflated buffer. `limit` bounds
    /// the inflated size.
    pub fn decode(
        header: RecordHeader,
        mut body: RecordData,
        payload: &[u8],
        ctx: ReadContext,
        limit: usize,
    ) -> Result<Self> {
        let (bytes, base) = if header.is_compressed() {
            let inflated = decompress_record(payload, header.form_id, limit)?;
            (Cow::Owned(inflated), 0)
        } else {
            (Cow::Borrowed(payload), header.position)
        };

        read_fields(&bytes, base, header.tag, ctx, &mut body)?;
        Ok(Self { header, data: body })
    }

    /// Record type
    pub fn tag(&self) -> FormTag {
        self.header.tag
    }

    /// Form id (zero for Morrowind records)
    pub fn form_id(&self) -> FormId {
        self.header.form_id
    }

    /// Editor id
    pub fn editor_id(&self) -> Option<&str> {
        self.data.editor_id()
    }

    /// Display name
    pub fn name(&self) -> Option<&LString> {
        self.data.name()
    }

    /// Borrow the body as a specific shape.
    ///
    /// ```no_run
    /// # use bgs_esm::{Record, records::Cell};
    /// # fn show(record: &Record) {
    /// if let Some(cell) = record.get::<Cell>() {
    ///     println!("{:?}", cell.grid);
    /// }
    /// # }
    /// ```
    pub fn get<T: RecordShape>(&self) -> Option<&T> {
        T::extract(&self.data)
    }
}

impl RecordKind for Record {
    fn matches(_data: &RecordData) -> bool {
        true
    }
}
