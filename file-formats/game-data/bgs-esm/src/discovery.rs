//! Header-only walk of a whole file.
//!
//! Discovery reads every record and group header without decoding a single
//! field. The resulting index shows the file's shape and lets payloads be
//! decoded later in any order (see [`crate::parallel`]).

use std::io::{Read, Seek, SeekFrom};

use crate::error::{EsmError, Result};
use crate::header::{ChunkHeader, GroupHeader, RecordHeader, read_chunk_header};
use crate::tag::FormTag;
use crate::version::FormatVersion;

/// A record found during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEntry {
    /// Record header
    pub header: RecordHeader,
    /// Index into [`DiscoveryIndex::groups`] of the enclosing group
    pub group: Option<usize>,
}

/// A group found during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEntry {
    /// Group header
    pub header: GroupHeader,
    /// Index of the enclosing group
    pub parent: Option<usize>,
}

/// Every chunk header of a file, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryIndex {
    /// Header schema of the file
    pub format: FormatVersion,
    /// Stream length
    pub length: u64,
    /// Records, root record first
    pub records: Vec<RecordEntry>,
    /// Groups, parents before children
    pub groups: Vec<GroupEntry>,
}

impl DiscoveryIndex {
    /// Number of records with `tag`
    pub fn count(&self, tag: FormTag) -> usize {
        self.records.iter().filter(|r| r.header.tag == tag).count()
    }

    /// Records directly inside group `index`
    pub fn records_in(&self, index: usize) -> impl Iterator<Item = &RecordEntry> {
        self.records.iter().filter(move |r| r.group == Some(index))
    }

    /// Record tags with their counts, most frequent first
    pub fn tag_histogram(&self) -> Vec<(FormTag, usize)> {
        let mut counts = std::collections::HashMap::new();
        for record in &self.records {
            *counts.entry(record.header.tag).or_insert(0usize) += 1;
        }
        let mut histogram: Vec<_> = counts.into_iter().collect();
        histogram.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        histogram
    }

    /// Number of records flagged compressed
    pub fn compressed_records(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.header.is_compressed())
            .count()
    }
}

/// Walk every chunk header in `reader`.
///
/// Group sizes are checked against the chunks they contain; any disagreement
/// is a [`EsmError::GroupSizeMismatch`].
pub fn discover<R: Read + Seek>(reader: &mut R) -> Result<DiscoveryIndex> {
    let format = FormatVersion::detect(reader)?;
    let length = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut index = DiscoveryIndex {
        format,
        length,
        records: Vec::new(),
        groups: Vec::new(),
    };
    walk(reader, format, 0, length, None, &mut index)?;

    log::debug!(
        "Discovered {} records in {} groups ({format})",
        index.records.len(),
        index.groups.len()
    );
    Ok(index)
}

fn walk<R: Read + Seek>(
    reader: &mut R,
    format: FormatVersion,
    start: u64,
    end: u64,
    parent: Option<usize>,
    index: &mut DiscoveryIndex,
) -> Result<()> {
    let mut pos = reader.seek(SeekFrom::Start(start))?;
    while pos < end {
        match read_chunk_header(reader, format, None)? {
            ChunkHeader::Record(header) => {
                index.records.push(RecordEntry {
                    header,
                    group: parent,
                });
                pos = header.end();
            }
            ChunkHeader::Group(header) => {
                if header.end() > end {
                    return Err(overrun(parent.map(|p| index.groups[p].header), header, end));
                }
                let id = index.groups.len();
                index.groups.push(GroupEntry { header, parent });
                walk(reader, format, header.position, header.end(), Some(id), index)?;
                pos = header.end();
            }
        }
        reader.seek(SeekFrom::Start(pos))?;
    }

    if pos != end {
        return Err(match parent {
            Some(p) => {
                let header = index.groups[p].header;
                EsmError::GroupSizeMismatch {
                    label: header.label,
                    offset: header.position,
                    expected: end,
                    actual: pos,
                }
            }
            None => EsmError::SizeMismatch {
                record: FormTag::GRUP,
                field: None,
                offset: start,
                expected: end,
                actual: pos,
            },
        });
    }
    Ok(())
}

fn overrun(parent: Option<GroupHeader>, child: GroupHeader, end: u64) -> EsmError {
    let group = parent.unwrap_or(child);
    EsmError::GroupSizeMismatch {
        label: group.label,
        offset: group.position,
        expected: end,
        actual: child.end(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::GroupKind;
    use crate::test_utils::{PluginBuilder, field};
    use crate::version::GameEdition;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sample(edition: GameEdition) -> Vec<u8> {
        let mut builder = PluginBuilder::new(edition);
        let format = builder.format();
        let mut globals = builder.group(FormTag::GLOB.0, GroupKind::Top);
        globals.record(FormTag::GLOB, 0x10, &field(format, b"EDID", b"A\0"));
        globals.compressed_record(FormTag::GLOB, 0x11, &field(format, b"EDID", b"B\0"));
        let mut topic = globals.group(0x10, GroupKind::TopicChildren);
        topic.record(FormTag::INFO, 0x12, &[]);
        topic.finish();
        globals.finish();
        builder.into_bytes()
    }

    #[test]
    fn walks_nested_groups() {
        let index = discover(&mut Cursor::new(sample(GameEdition::Skyrim))).unwrap();
        assert_eq!(index.format, FormatVersion::Tes5);
        assert_eq!(index.groups.len(), 2);
        assert_eq!(index.groups[1].parent, Some(0));
        assert_eq!(index.records.len(), 4);
        assert_eq!(index.records[0].header.tag, FormTag::TES4);
        assert_eq!(index.records[0].group, None);
        assert_eq!(index.count(FormTag::GLOB), 2);
        assert_eq!(index.records_in(1).count(), 1);
        assert_eq!(index.compressed_records(), 1);
        assert_eq!(index.tag_histogram()[0], (FormTag::GLOB, 2));
    }

    #[test]
    fn group_sum_must_match_declared_size() {
        let mut bytes = sample(GameEdition::Oblivion);
        // Shrink the outer group by 2 so its last child overruns it
        let root_len = 20 + u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let total_at = root_len + 4;
        let total = u32::from_le_bytes([
            bytes[total_at],
            bytes[total_at + 1],
            bytes[total_at + 2],
            bytes[total_at + 3],
        ]);
        bytes[total_at..total_at + 4].copy_from_slice(&(total - 2).to_le_bytes());

        let err = discover(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, EsmError::GroupSizeMismatch { .. }));
    }
}
