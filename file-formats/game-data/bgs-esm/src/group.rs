//! Lazily loaded group trees.
//!
//! Every group chunk becomes a [`GroupTree`] node stored in the session's
//! arena and addressed by [`GroupId`]. A node starts with only its header(s);
//! [`GroupTree::load`] reads the payload once, decoding the direct records
//! and registering nested groups as children without reading their bodies.
//!
//! A node may be given further sibling headers with the same label and kind
//! after it was loaded. The next `load` processes only the new ones.
//!
//! # Locking
//!
//! A node's spatial cache lock is taken before its contents lock, which is
//! taken before the session's reader lock. A contents lock is never held
//! while another node is loaded.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{EsmError, Result};
use crate::header::{ChunkHeader, GroupHeader, GroupKind, read_chunk_header};
use crate::record::RecordRef;
use crate::session::{ParseSession, ReadSeek};
use crate::spatial::SpatialCache;
use crate::tag::FormTag;

/// Index of a group in the session arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

#[derive(Debug, Default)]
struct GroupContents {
    records: Vec<RecordRef>,
    children: Vec<GroupId>,
    children_by_label: HashMap<u32, Vec<GroupId>>,
}

/// A group node and everything materialized from it so far.
#[derive(Debug)]
pub struct GroupTree {
    id: GroupId,
    parent: Option<GroupId>,
    label: u32,
    kind: GroupKind,
    headers: RwLock<Vec<GroupHeader>>,
    loaded: AtomicUsize,
    contents: Mutex<GroupContents>,
    pub(crate) spatial: Mutex<SpatialCache>,
    materializations: AtomicUsize,
}

/// Everything one pass over a group's headers found, committed together.
#[derive(Default)]
struct Staging {
    records: Vec<RecordRef>,
    groups: Vec<GroupHeader>,
}

impl GroupTree {
    pub(crate) fn new(id: GroupId, parent: Option<GroupId>, label: u32, kind: GroupKind) -> Self {
        Self {
            id,
            parent,
            label,
            kind,
            headers: RwLock::new(Vec::new()),
            loaded: AtomicUsize::new(0),
            contents: Mutex::new(GroupContents::default()),
            spatial: Mutex::new(SpatialCache::default()),
            materializations: AtomicUsize::new(0),
        }
    }

    /// Arena index
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Enclosing group, `None` for top-level groups
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Raw label shared by all headers of this node
    pub fn label(&self) -> u32 {
        self.label
    }

    /// Label as a record tag; meaningful for top-level groups
    pub fn label_tag(&self) -> FormTag {
        FormTag(self.label)
    }

    /// Group type
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Headers registered so far
    pub fn headers(&self) -> Vec<GroupHeader> {
        self.headers.read().clone()
    }

    /// Total payload bytes over all headers
    pub fn data_size(&self) -> u64 {
        self.headers.read().iter().map(|h| u64::from(h.data_size)).sum()
    }

    /// Whether every registered header has been processed
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire) == self.headers.read().len()
    }

    /// How many times a load pass actually read from the stream
    pub fn materializations(&self) -> usize {
        self.materializations.load(Ordering::Acquire)
    }

    /// Records materialized so far
    pub fn records(&self) -> Vec<RecordRef> {
        self.contents.lock().records.clone()
    }

    /// Child groups registered so far, in stream order
    pub fn children(&self) -> Vec<GroupId> {
        self.contents.lock().children.clone()
    }

    /// Child groups with `label`, in stream order
    pub fn children_with_label(&self, label: u32) -> Vec<GroupId> {
        self.contents
            .lock()
            .children_by_label
            .get(&label)
            .cloned()
            .unwrap_or_default()
    }

    /// Register another header for this node.
    ///
    /// Top-level `CELL` and `WRLD` groups are loaded straight away when
    /// `eager` is set, so later coordinate lookups find their blocks ready.
    pub fn add_header(
        &self,
        session: &ParseSession,
        header: GroupHeader,
        eager: bool,
    ) -> Result<()> {
        self.push_header(header);
        if eager
            && header.label != 0
            && header.kind == GroupKind::Top
            && matches!(header.label_tag(), FormTag::CELL | FormTag::WRLD)
        {
            log::debug!("Eagerly loading top-level {} group", header.label_tag());
            self.load(session, false)?;
        }
        Ok(())
    }

    pub(crate) fn push_header(&self, header: GroupHeader) {
        self.headers.write().push(header);
    }

    /// Materialize this group, returning its records.
    ///
    /// Only headers not processed by an earlier call are read, so repeat and
    /// concurrent calls observe a single materialization. With `load_all`,
    /// every descendant group is loaded as well.
    ///
    /// A failed pass commits nothing; the error leaves the node as it was.
    pub fn load(&self, session: &ParseSession, load_all: bool) -> Result<Vec<RecordRef>> {
        if !self.is_loaded() {
            let mut contents = self.contents.lock();
            // another thread may have finished the pass while we waited
            let headers = self.headers.read().clone();
            let done = self.loaded.load(Ordering::Acquire);
            if done < headers.len() {
                let staged = {
                    let mut source = session.source();
                    let mut staging = Staging::default();
                    for header in &headers[done..] {
                        self.scan(session, &mut **source, header, &mut staging)?;
                    }
                    staging
                };
                self.commit(session, &mut contents, staged);
                self.loaded.store(headers.len(), Ordering::Release);
                self.materializations.fetch_add(1, Ordering::AcqRel);
                log::debug!(
                    "Loaded group {:#010x} ({:?}): {} records, {} children",
                    self.label,
                    self.kind,
                    contents.records.len(),
                    contents.children.len()
                );
            }
        }

        if load_all {
            for child in self.children() {
                if let Some(child) = session.group(child) {
                    child.load(session, true)?;
                }
            }
        }
        Ok(self.records())
    }

    fn scan(
        &self,
        session: &ParseSession,
        mut reader: &mut dyn ReadSeek,
        header: &GroupHeader,
        staging: &mut Staging,
    ) -> Result<()> {
        let format = session.ctx().format;
        let end = header.end();
        let mut pos = reader.seek(SeekFrom::Start(header.position))?;

        while pos < end {
            let chunk = read_chunk_header(&mut reader, format, Some(self.id))?;
            match chunk {
                ChunkHeader::Group(group) => staging.groups.push(group),
                ChunkHeader::Record(record) => {
                    if let Some(record) = session.read_record(reader, record)? {
                        staging.records.push(Arc::new(record));
                    }
                }
            }
            pos = reader.seek(SeekFrom::Start(chunk.end()))?;
        }

        if pos != end {
            return Err(EsmError::GroupSizeMismatch {
                label: header.label,
                offset: header.position,
                expected: end,
                actual: pos,
            });
        }
        Ok(())
    }

    fn commit(&self, session: &ParseSession, contents: &mut GroupContents, staged: Staging) {
        session.index_records(&staged.records);
        contents.records.extend(staged.records);

        for header in staged.groups {
            let existing = contents.children.iter().copied().find(|&id| {
                session
                    .group(id)
                    .is_some_and(|g| g.label == header.label && g.kind == header.kind)
            });
            match existing.and_then(|id| session.group(id)) {
                Some(child) => child.push_header(header),
                None => {
                    let id = session.add_group(Some(self.id), header);
                    contents.children.push(id);
                }
            }
        }

        contents.children_by_label.clear();
        for &id in &contents.children {
            if let Some(child) = session.group(id) {
                contents
                    .children_by_label
                    .entry(child.label)
                    .or_default()
                    .push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ReadContext;
    use crate::session::ParseOptions;
    use crate::test_utils::{PluginBuilder, field};
    use crate::version::GameEdition;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn session_for(bytes: Vec<u8>, edition: GameEdition) -> ParseSession {
        ParseSession::new(
            Box::new(Cursor::new(bytes)),
            ReadContext::new(edition),
            ParseOptions::default(),
        )
    }

    fn glob_group(builder: &mut PluginBuilder) -> GroupHeader {
        let format = builder.format();
        let mut glob = builder.group(FormTag::GLOB.0, GroupKind::Top);
        glob.record(FormTag::GLOB, 0x10, &field(format, b"EDID", b"Alpha\0"));
        glob.record(FormTag::GLOB, 0x11, &field(format, b"EDID", b"Beta\0"));
        let mut nested = glob.group(7, GroupKind::TopicChildren);
        nested.record(FormTag::GLOB, 0x12, &field(format, b"EDID", b"Gamma\0"));
        nested.finish();
        glob.finish()
    }

    #[test]
    fn load_reads_direct_records_and_registers_children() {
        let mut builder = PluginBuilder::new(GameEdition::Skyrim);
        let header = glob_group(&mut builder);
        let session = session_for(builder.into_bytes(), GameEdition::Skyrim);
        let id = session.add_group(None, header);
        let group = session.group(id).unwrap();

        let records = group.load(&session, false).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].editor_id(), Some("Beta"));
        assert_eq!(group.children().len(), 1);

        let child = session.group(group.children_with_label(7)[0]).unwrap();
        assert!(!child.is_loaded());
        assert_eq!(child.load(&session, false).unwrap()[0].editor_id(), Some("Gamma"));
    }

    #[test]
    fn repeat_loads_materialize_once() {
        let mut builder = PluginBuilder::new(GameEdition::Oblivion);
        let header = glob_group(&mut builder);
        let session = session_for(builder.into_bytes(), GameEdition::Oblivion);
        let group = session.group(session.add_group(None, header)).unwrap();

        let first = group.load(&session, false).unwrap();
        let second = group.load(&session, true).unwrap();
        assert_eq!(group.materializations(), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
    }

    #[test]
    fn concurrent_loads_materialize_once() {
        let mut builder = PluginBuilder::new(GameEdition::Skyrim);
        let header = glob_group(&mut builder);
        let session = session_for(builder.into_bytes(), GameEdition::Skyrim);
        let group = session.group(session.add_group(None, header)).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let records = group.load(&session, false).unwrap();
                    assert_eq!(records.len(), 2);
                });
            }
        });
        assert_eq!(group.materializations(), 1);
    }

    #[test]
    fn overrunning_child_is_a_size_mismatch() {
        let mut builder = PluginBuilder::new(GameEdition::Skyrim);
        let header = glob_group(&mut builder);
        let session = session_for(builder.into_bytes(), GameEdition::Skyrim);
        let truncated = GroupHeader {
            data_size: header.data_size - 3,
            ..header
        };
        let group = session.group(session.add_group(None, truncated)).unwrap();

        let err = group.load(&session, false).unwrap_err();
        assert!(matches!(err, EsmError::GroupSizeMismatch { .. }));
        assert!(!group.is_loaded());
        assert!(group.records().is_empty());
    }
}
