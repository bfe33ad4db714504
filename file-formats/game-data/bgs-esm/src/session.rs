//! Parse sessions: the shared reader, options and group arena of one file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::error::{EsmError, Result};
use crate::field::ReadContext;
use crate::group::{GroupId, GroupTree};
use crate::header::{GroupHeader, GroupKind, RecordHeader};
use crate::record::{Record, RecordRef};
use crate::registry::RecordRegistry;
use crate::types::FormId;
use crate::version::GameEdition;

/// Default upper bound for a single record payload or inflated buffer (256 MiB)
pub const DEFAULT_MAX_RECORD_SIZE: usize = 256 * 1024 * 1024;

/// Seekable byte source.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// A reader over one plugin file plus its uncompressed length, when the
/// supplier knows it.
pub struct SourceReader {
    /// Reader positioned anywhere; reads always seek first
    pub reader: Box<dyn ReadSeek + Send>,
    /// Uncompressed length, if known up front
    pub length: Option<u64>,
}

/// Anything that can supply the bytes of one plugin file.
///
/// Archive containers implement this for their members; the crate implements
/// it for paths and in-memory buffers.
pub trait PluginSource {
    /// Open the source for reading
    fn open_source(self) -> Result<SourceReader>;
}

impl PluginSource for &Path {
    fn open_source(self) -> Result<SourceReader> {
        let file = File::open(self)?;
        let length = file.metadata()?.len();
        Ok(SourceReader {
            reader: Box::new(BufReader::new(file)),
            length: Some(length),
        })
    }
}

impl PluginSource for PathBuf {
    fn open_source(self) -> Result<SourceReader> {
        self.as_path().open_source()
    }
}

impl PluginSource for Vec<u8> {
    fn open_source(self) -> Result<SourceReader> {
        let length = self.len() as u64;
        Ok(SourceReader {
            reader: Box::new(Cursor::new(self)),
            length: Some(length),
        })
    }
}

impl PluginSource for Arc<[u8]> {
    fn open_source(self) -> Result<SourceReader> {
        let length = self.len() as u64;
        Ok(SourceReader {
            reader: Box::new(Cursor::new(self)),
            length: Some(length),
        })
    }
}

impl PluginSource for SourceReader {
    fn open_source(self) -> Result<SourceReader> {
        Ok(self)
    }
}

/// Options scoped to one parse session.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Force the game edition instead of inferring it from the root record
    pub edition: Option<GameEdition>,
    /// Upper bound for a record payload or inflated buffer
    pub max_record_size: usize,
    /// Maximum number of exterior sub-blocks resolved per session; `None`
    /// means unlimited
    pub sub_block_load_limit: Option<usize>,
    /// Load top-level `CELL` and `WRLD` groups as soon as they are found
    pub eager_spatial_groups: bool,
    /// Record types known to the session
    pub registry: Arc<RecordRegistry>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            edition: None,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            sub_block_load_limit: None,
            eager_spatial_groups: true,
            registry: Arc::new(RecordRegistry::standard()),
        }
    }
}

impl ParseOptions {
    /// Force a game edition
    #[must_use]
    pub fn with_edition(mut self, edition: GameEdition) -> Self {
        self.edition = Some(edition);
        self
    }

    /// Set the record size limit
    #[must_use]
    pub fn with_max_record_size(mut self, limit: usize) -> Self {
        self.max_record_size = limit;
        self
    }

    /// Cap the number of sub-blocks resolved per session
    #[must_use]
    pub fn with_sub_block_load_limit(mut self, limit: usize) -> Self {
        self.sub_block_load_limit = Some(limit);
        self
    }

    /// Enable or disable eager loading of top-level `CELL`/`WRLD` groups
    #[must_use]
    pub fn with_eager_spatial_groups(mut self, eager: bool) -> Self {
        self.eager_spatial_groups = eager;
        self
    }

    /// Use a custom record registry
    #[must_use]
    pub fn with_registry(mut self, registry: RecordRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }
}

/// Read and decode one record whose header was just read.
///
/// Returns `None` when the registry has no shape for the tag at this edition;
/// the reader is then left at the end of the record.
pub(crate) fn read_record(
    reader: &mut dyn ReadSeek,
    header: RecordHeader,
    ctx: ReadContext,
    options: &ParseOptions,
) -> Result<Option<Record>> {
    let Some(body) = options
        .registry
        .create(header.tag, ctx.edition, header.position)
    else {
        reader.seek(SeekFrom::Start(header.end()))?;
        return Ok(None);
    };

    let size = header.data_size as usize;
    if size > options.max_record_size {
        return Err(EsmError::MemoryLimitExceeded {
            requested: size,
            limit: options.max_record_size,
        });
    }
    let mut payload = vec![0u8; size];
    reader.seek(SeekFrom::Start(header.position))?;
    reader.read_exact(&mut payload)?;

    let record = Record::decode(header, body, &payload, ctx, options.max_record_size)?;
    log::trace!(
        "Decoded {} {} at offset {}",
        header.tag,
        header.form_id,
        header.position
    );
    Ok(Some(record))
}

/// Records materialized so far, keyed for reference resolution.
#[derive(Debug, Default)]
pub(crate) struct LoadedIndex {
    pub by_form_id: HashMap<FormId, RecordRef>,
    pub by_editor_id: HashMap<String, RecordRef>,
}

/// State shared by every load of one file.
///
/// All chunk reads go through a single reader, so they are serialized by the
/// session's reader lock.
pub struct ParseSession {
    source: Mutex<Box<dyn ReadSeek + Send>>,
    length: Option<u64>,
    ctx: ReadContext,
    options: ParseOptions,
    groups: RwLock<Vec<Arc<GroupTree>>>,
    index: RwLock<LoadedIndex>,
    sub_blocks_loaded: AtomicUsize,
}

impl std::fmt::Debug for ParseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseSession")
            .field("length", &self.length)
            .field("ctx", &self.ctx)
            .field("groups", &self.groups.read().len())
            .finish_non_exhaustive()
    }
}

impl ParseSession {
    /// Create a session over `reader`
    pub fn new(reader: Box<dyn ReadSeek + Send>, ctx: ReadContext, options: ParseOptions) -> Self {
        Self {
            source: Mutex::new(reader),
            length: None,
            ctx,
            options,
            groups: RwLock::new(Vec::new()),
            index: RwLock::new(LoadedIndex::default()),
            sub_blocks_loaded: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_length(mut self, length: Option<u64>) -> Self {
        self.length = length;
        self
    }

    /// Parse context
    pub fn ctx(&self) -> ReadContext {
        self.ctx
    }

    /// Session options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Stream length, when the source knew it
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Lock the shared reader
    pub(crate) fn source(&self) -> MutexGuard<'_, Box<dyn ReadSeek + Send>> {
        self.source.lock()
    }

    /// Read one record with this session's context and options
    pub(crate) fn read_record(
        &self,
        reader: &mut dyn ReadSeek,
        header: RecordHeader,
    ) -> Result<Option<Record>> {
        read_record(reader, header, self.ctx, &self.options)
    }

    /// Create a group node without headers
    pub fn create_group(&self, parent: Option<GroupId>, label: u32, kind: GroupKind) -> GroupId {
        let mut groups = self.groups.write();
        let id = GroupId(groups.len());
        groups.push(Arc::new(GroupTree::new(id, parent, label, kind)));
        id
    }

    /// Create a group node holding `header`
    pub fn add_group(&self, parent: Option<GroupId>, header: GroupHeader) -> GroupId {
        let id = self.create_group(parent, header.label, header.kind);
        if let Some(group) = self.group(id) {
            group.push_header(header);
        }
        id
    }

    /// Look up a group node
    pub fn group(&self, id: GroupId) -> Option<Arc<GroupTree>> {
        self.groups.read().get(id.0).cloned()
    }

    /// Number of group nodes created so far
    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }

    pub(crate) fn index_records(&self, records: &[RecordRef]) {
        if records.is_empty() {
            return;
        }
        let mut index = self.index.write();
        for record in records {
            if !record.form_id().is_none() {
                index.by_form_id.insert(record.form_id(), Arc::clone(record));
            }
            if let Some(editor_id) = record.editor_id() {
                index
                    .by_editor_id
                    .insert(editor_id.to_ascii_lowercase(), Arc::clone(record));
            }
        }
    }

    /// Loaded record with form id `id`
    pub fn loaded_by_form_id(&self, id: FormId) -> Option<RecordRef> {
        self.index.read().by_form_id.get(&id).cloned()
    }

    /// Loaded record with editor id `editor_id` (case-insensitive)
    pub fn loaded_by_editor_id(&self, editor_id: &str) -> Option<RecordRef> {
        self.index
            .read()
            .by_editor_id
            .get(&editor_id.to_ascii_lowercase())
            .cloned()
    }

    /// Reserve one sub-block resolution against the configured limit.
    ///
    /// Returns `false` once the limit is reached.
    pub(crate) fn take_sub_block_budget(&self) -> bool {
        let taken = self.sub_blocks_loaded.fetch_add(1, Ordering::AcqRel);
        match self.options.sub_block_load_limit {
            Some(limit) if taken >= limit => {
                self.sub_blocks_loaded.fetch_sub(1, Ordering::AcqRel);
                false
            }
            _ => true,
        }
    }

    /// Sub-blocks resolved so far
    pub fn sub_blocks_loaded(&self) -> usize {
        self.sub_blocks_loaded.load(Ordering::Acquire)
    }
}
