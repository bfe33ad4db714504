//! Decoding discovered records in bulk.
//!
//! After [`discover`](crate::discovery::discover) every record payload is
//! addressable by offset, so whole-file conversions can decode records
//! independently. With the `parallel` feature the work is spread over the
//! rayon pool; without it the same API decodes sequentially.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::discovery::{DiscoveryIndex, RecordEntry};
use crate::error::{EsmError, Result};
use crate::field::ReadContext;
use crate::record::Record;
use crate::session::ParseOptions;

/// Decode every registered record of an in-memory file.
///
/// `data` must be the bytes `index` was discovered from. Records whose tag
/// the registry does not know at `ctx.edition` are left out. Output keeps
/// stream order.
#[cfg(feature = "parallel")]
pub fn decode_records(
    data: &[u8],
    index: &DiscoveryIndex,
    ctx: ReadContext,
    options: &ParseOptions,
) -> Result<Vec<Record>> {
    let decoded: Vec<Option<Record>> = index
        .records
        .par_iter()
        .map(|entry| decode_one(data, entry, ctx, options))
        .collect::<Result<_>>()?;
    Ok(decoded.into_iter().flatten().collect())
}

/// Decode every registered record of an in-memory file.
///
/// `data` must be the bytes `index` was discovered from. Records whose tag
/// the registry does not know at `ctx.edition` are left out. Output keeps
/// stream order.
#[cfg(not(feature = "parallel"))]
pub fn decode_records(
    data: &[u8],
    index: &DiscoveryIndex,
    ctx: ReadContext,
    options: &ParseOptions,
) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(index.records.len());
    for entry in &index.records {
        if let Some(record) = decode_one(data, entry, ctx, options)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn decode_one(
    data: &[u8],
    entry: &RecordEntry,
    ctx: ReadContext,
    options: &ParseOptions,
) -> Result<Option<Record>> {
    let header = entry.header;
    let Some(body) = options
        .registry
        .create(header.tag, ctx.edition, header.position)
    else {
        return Ok(None);
    };
    if header.data_size as usize > options.max_record_size {
        return Err(EsmError::MemoryLimitExceeded {
            requested: header.data_size as usize,
            limit: options.max_record_size,
        });
    }

    let start = header.position as usize;
    let payload = data.get(start..header.end() as usize).ok_or_else(|| {
        EsmError::SizeMismatch {
            record: header.tag,
            field: None,
            offset: header.position,
            expected: u64::from(header.data_size),
            actual: (data.len().saturating_sub(start)) as u64,
        }
    })?;
    Record::decode(header, body, payload, ctx, options.max_record_size).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover;
    use crate::header::GroupKind;
    use crate::records::Global;
    use crate::tag::FormTag;
    use crate::test_utils::{PluginBuilder, field};
    use crate::version::GameEdition;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn decodes_in_stream_order() {
        let mut builder = PluginBuilder::new(GameEdition::Oblivion);
        let format = builder.format();
        let mut globals = builder.group(FormTag::GLOB.0, GroupKind::Top);
        for (i, name) in ["First", "Second", "Third"].iter().enumerate() {
            let mut payload = field(format, b"EDID", format!("{name}\0").as_bytes());
            payload.extend(field(format, b"FNAM", b"s"));
            payload.extend(field(format, b"FLTV", &(i as f32).to_le_bytes()));
            globals.compressed_record(FormTag::GLOB, 0x100 + i as u32, &payload);
        }
        globals.finish();
        let bytes = builder.into_bytes();

        let index = discover(&mut Cursor::new(&bytes)).unwrap();
        let records = decode_records(
            &bytes,
            &index,
            ReadContext::new(GameEdition::Oblivion),
            &ParseOptions::default(),
        )
        .unwrap();

        let names: Vec<_> = records
            .iter()
            .filter(|r| r.tag() == FormTag::GLOB)
            .map(|r| r.editor_id().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, ["First", "Second", "Third"]);
        assert!(records[2].get::<Global>().is_some());
    }
}
