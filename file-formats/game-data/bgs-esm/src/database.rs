//! The database facade: opening a plugin file and looking things up in it.

use std::collections::HashMap;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::error::{EsmError, Result};
use crate::field::ReadContext;
use crate::group::{GroupId, GroupTree};
use crate::header::{ChunkHeader, GroupHeader, GroupKind, read_chunk_header};
use crate::record::RecordRef;
use crate::records::plugin::LOCALIZED_FLAG;
use crate::records::{Cell, Land, PluginHeader, RecordKind};
use crate::session::{ParseOptions, ParseSession, PluginSource, ReadSeek, SourceReader, read_record};
use crate::spatial::GridId;
use crate::tag::FormTag;
use crate::types::{FormId, FormKey, FormRef};
use crate::version::{FormatVersion, GameEdition};

/// Lookup selector for [`Database::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    /// Record by editor id, case-insensitive
    EditorId(&'a str),
    /// Cell at a grid position
    Grid(GridId),
    /// Interior cell by name
    CellName(&'a str),
    /// Land of the cell at a grid position
    Land(GridId),
}

/// Flat per-type tables for Morrowind files, which have no groups.
#[derive(Debug, Default)]
struct Tes3Index {
    by_tag: HashMap<FormTag, Vec<RecordRef>>,
    by_editor_id: HashMap<String, RecordRef>,
    cells_by_name: HashMap<String, RecordRef>,
    cells_by_grid: HashMap<(i32, i32), RecordRef>,
    lands_by_grid: HashMap<(i32, i32), RecordRef>,
}

impl Tes3Index {
    fn insert(&mut self, record: RecordRef) {
        if let Some(editor_id) = record.editor_id().filter(|id| !id.is_empty()) {
            self.by_editor_id
                .insert(editor_id.to_ascii_lowercase(), Arc::clone(&record));
        }
        if let Some(cell) = record.get::<Cell>() {
            if cell.is_interior() {
                if let Some(name) = record.editor_id() {
                    self.cells_by_name
                        .insert(name.to_ascii_lowercase(), Arc::clone(&record));
                }
            } else {
                self.cells_by_grid
                    .insert(cell.grid_position(), Arc::clone(&record));
            }
        }
        if let Some(grid) = record.get::<Land>().and_then(|land| land.grid) {
            self.lands_by_grid.insert(grid, Arc::clone(&record));
        }
        self.by_tag.entry(record.tag()).or_default().push(record);
    }
}

/// An open master or plugin file.
///
/// Opening reads the root record and registers the top-level groups; group
/// contents are read on demand. Morrowind files have no groups and are read
/// in full into flat tables instead.
///
/// ```no_run
/// use bgs_esm::{Database, GridId, Query, types::FormId};
///
/// let db = Database::open("Skyrim.esm")?;
/// println!("{} ({})", db.edition(), db.header().version);
///
/// let grid = GridId::exterior(FormId(0x3C), 4, -2);
/// if let Some(cell) = db.query(&Query::Grid(grid))? {
///     println!("{:?}", cell.editor_id());
/// }
/// # Ok::<(), bgs_esm::EsmError>(())
/// ```
#[derive(Debug)]
pub struct Database {
    session: ParseSession,
    root: RecordRef,
    header: PluginHeader,
    top_groups: Vec<GroupId>,
    top_by_label: HashMap<FormTag, GroupId>,
    tes3: Option<Tes3Index>,
}

impl Database {
    /// Open a file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a file
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        Self::from_source(path.as_ref(), options)
    }

    /// Open an in-memory file with default options
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_source(data, ParseOptions::default())
    }

    /// Open any seekable reader
    pub fn from_reader<R: ReadSeek + Send + 'static>(reader: R, options: ParseOptions) -> Result<Self> {
        Self::from_source(
            SourceReader {
                reader: Box::new(reader),
                length: None,
            },
            options,
        )
    }

    /// Open a memory-mapped file
    #[cfg(feature = "mmap")]
    #[allow(unsafe_code)]
    pub fn open_mmap<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        use memmap2::Mmap;
        use std::fs::File;
        use std::io::Cursor;

        let file = File::open(path)?;
        // The map is read-only; the file must not be truncated while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        let length = mmap.len() as u64;
        Self::from_source(
            SourceReader {
                reader: Box::new(Cursor::new(mmap)),
                length: Some(length),
            },
            options,
        )
    }

    /// Open a file from any [`PluginSource`]
    pub fn from_source<S: PluginSource>(source: S, options: ParseOptions) -> Result<Self> {
        let SourceReader { mut reader, length } = source.open_source()?;

        let format = FormatVersion::detect(&mut reader)?;
        if let Some(edition) = options.edition {
            if edition.format() != format {
                return Err(EsmError::EditionMismatch {
                    edition,
                    expected: edition.format(),
                    detected: format,
                });
            }
        }
        let length = match length {
            Some(length) => length,
            None => reader.seek(SeekFrom::End(0))?,
        };

        reader.seek(SeekFrom::Start(0))?;
        let ChunkHeader::Record(root_header) = read_chunk_header(&mut reader, format, None)? else {
            return Err(EsmError::InvalidMagic {
                found: FormTag::GRUP,
                offset: 0,
            });
        };
        let provisional = ReadContext {
            format,
            edition: options.edition.unwrap_or(match format {
                FormatVersion::Tes3 => GameEdition::Morrowind,
                FormatVersion::Tes4 => GameEdition::Oblivion,
                FormatVersion::Tes5 => GameEdition::Skyrim,
            }),
            localized: root_header.flags.bits() & LOCALIZED_FLAG != 0,
        };

        let root = read_record(&mut *reader, root_header, provisional, &options)?
            .ok_or_else(|| {
                EsmError::UnsupportedVersion(format!(
                    "no root record shape registered for {}",
                    root_header.tag
                ))
            })?;
        let header = root
            .get::<PluginHeader>()
            .cloned()
            .ok_or_else(|| {
                EsmError::UnsupportedVersion(format!("{} is not a plugin header", root_header.tag))
            })?;

        let edition = options
            .edition
            .unwrap_or_else(|| GameEdition::infer(format, header.version));
        let ctx = ReadContext {
            edition,
            ..provisional
        };
        log::debug!(
            "Opened {format} plugin: {edition}, HEDR version {}, {} records, localized: {}",
            header.version,
            header.num_records,
            ctx.localized
        );

        let start = root_header.end();
        let eager = options.eager_spatial_groups;
        let session = ParseSession::new(reader, ctx, options).with_length(Some(length));
        let mut db = Self {
            session,
            root: Arc::new(root),
            header,
            top_groups: Vec::new(),
            top_by_label: HashMap::new(),
            tes3: None,
        };

        if format.has_groups() {
            let headers = db.scan_top_level(start, length)?;
            for header in headers {
                db.register_top_group(header, eager)?;
            }
        } else {
            db.read_flat(start, length)?;
        }
        Ok(db)
    }

    /// Collect top-level group headers without reading their contents.
    fn scan_top_level(&self, start: u64, length: u64) -> Result<Vec<GroupHeader>> {
        let mut source = self.session.source();
        let mut reader: &mut dyn ReadSeek = &mut **source;
        let format = self.format();
        let mut headers = Vec::new();
        let mut pos = reader.seek(SeekFrom::Start(start))?;

        while pos < length {
            match read_chunk_header(&mut reader, format, None)? {
                ChunkHeader::Group(group) => {
                    if group.end() > length {
                        return Err(EsmError::GroupSizeMismatch {
                            label: group.label,
                            offset: group.position,
                            expected: group.end(),
                            actual: length,
                        });
                    }
                    pos = group.end();
                    headers.push(group);
                }
                ChunkHeader::Record(record) => {
                    log::warn!(
                        "Skipping {} record outside of any group at offset {}",
                        record.tag,
                        record.position
                    );
                    pos = record.end();
                }
            }
            reader.seek(SeekFrom::Start(pos))?;
        }
        Ok(headers)
    }

    fn register_top_group(&mut self, header: GroupHeader, eager: bool) -> Result<()> {
        let tag = header.label_tag();
        let id = match self.top_by_label.get(&tag) {
            Some(&id) => id,
            None => {
                let id = self.session.create_group(None, header.label, header.kind);
                self.top_by_label.insert(tag, id);
                self.top_groups.push(id);
                id
            }
        };
        if let Some(group) = self.session.group(id) {
            group.add_header(&self.session, header, eager)?;
        }
        Ok(())
    }

    /// Read every record of a Morrowind file.
    fn read_flat(&mut self, start: u64, length: u64) -> Result<()> {
        let mut index = Tes3Index::default();
        let mut records = Vec::new();
        {
            let mut source = self.session.source();
            let mut reader: &mut dyn ReadSeek = &mut **source;
            let mut pos = reader.seek(SeekFrom::Start(start))?;
            while pos < length {
                let chunk = read_chunk_header(&mut reader, FormatVersion::Tes3, None)?;
                if let ChunkHeader::Record(header) = chunk {
                    if let Some(record) = self.session.read_record(reader, header)? {
                        records.push(Arc::new(record));
                    }
                }
                pos = reader.seek(SeekFrom::Start(chunk.end()))?;
            }
        }

        self.session.index_records(&records);
        for record in records {
            index.insert(record);
        }
        log::debug!(
            "Indexed {} record types, {} named cells, {} exterior cells",
            index.by_tag.len(),
            index.cells_by_name.len(),
            index.cells_by_grid.len()
        );
        self.tes3 = Some(index);
        Ok(())
    }

    /// Header schema
    pub fn format(&self) -> FormatVersion {
        self.session.ctx().format
    }

    /// Game edition, forced or inferred
    pub fn edition(&self) -> GameEdition {
        self.session.ctx().edition
    }

    /// Whether text fields hold string table ids
    pub fn is_localized(&self) -> bool {
        self.session.ctx().localized
    }

    /// File-level metadata
    pub fn header(&self) -> &PluginHeader {
        &self.header
    }

    /// The root record itself
    pub fn root(&self) -> &RecordRef {
        &self.root
    }

    /// Underlying parse session
    pub fn session(&self) -> &ParseSession {
        &self.session
    }

    /// Top-level groups in file order
    pub fn top_groups(&self) -> Vec<Arc<GroupTree>> {
        self.top_groups
            .iter()
            .filter_map(|&id| self.session.group(id))
            .collect()
    }

    /// Top-level group holding records of type `tag`
    pub fn top_group(&self, tag: FormTag) -> Option<Arc<GroupTree>> {
        self.top_by_label
            .get(&tag)
            .and_then(|&id| self.session.group(id))
    }

    /// Any group by id
    pub fn group(&self, id: GroupId) -> Option<Arc<GroupTree>> {
        self.session.group(id)
    }

    /// Materialize a group ahead of time, optionally with all descendants
    pub fn load(&self, group: GroupId, recursive: bool) -> Result<Vec<RecordRef>> {
        match self.session.group(group) {
            Some(group) => group.load(&self.session, recursive),
            None => Ok(Vec::new()),
        }
    }

    /// Materialize every group in the file
    pub fn load_all(&self) -> Result<()> {
        for group in self.top_groups() {
            group.load(&self.session, true)?;
        }
        Ok(())
    }

    /// Records of type `tag` stored directly in its top-level group.
    ///
    /// Cells and worldspace contents live in nested groups; use
    /// [`Database::query`] or [`Database::load`] for those.
    pub fn records(&self, tag: FormTag) -> Result<Vec<RecordRef>> {
        if let Some(index) = &self.tes3 {
            return Ok(index.by_tag.get(&tag).cloned().unwrap_or_default());
        }
        let Some(group) = self.top_group(tag) else {
            return Ok(Vec::new());
        };
        let records = group.load(&self.session, false)?;
        Ok(records.into_iter().filter(|r| r.tag() == tag).collect())
    }

    /// Resolve a typed reference among the records read so far.
    ///
    /// Returns `None` when the target is not loaded, does not exist, or has a
    /// different shape than `T`.
    pub fn resolve<T: RecordKind>(&self, reference: &FormRef<T>) -> Option<RecordRef> {
        let record = match reference.key() {
            FormKey::Id(id) if id.is_none() => None,
            FormKey::Id(id) => self.session.loaded_by_form_id(*id),
            FormKey::EditorId(name) => match &self.tes3 {
                Some(index) => index.by_editor_id.get(&name.to_ascii_lowercase()).cloned(),
                None => self.session.loaded_by_editor_id(name),
            },
        }?;
        T::matches(&record.data).then_some(record)
    }

    /// Look up a single record.
    pub fn query(&self, query: &Query<'_>) -> Result<Option<RecordRef>> {
        if let Some(index) = &self.tes3 {
            return Ok(match *query {
                Query::EditorId(name) => index.by_editor_id.get(&name.to_ascii_lowercase()).cloned(),
                Query::CellName(name) => index.cells_by_name.get(&name.to_ascii_lowercase()).cloned(),
                Query::Grid(grid) => index.cells_by_grid.get(&(grid.x, grid.y)).cloned(),
                Query::Land(grid) => index.lands_by_grid.get(&(grid.x, grid.y)).cloned(),
            });
        }

        match *query {
            Query::EditorId(name) => Ok(self.session.loaded_by_editor_id(name)),
            Query::CellName(name) => {
                if let Some(cells) = self.top_group(FormTag::CELL) {
                    cells.load(&self.session, true)?;
                }
                Ok(self
                    .session
                    .loaded_by_editor_id(name)
                    .filter(|r| r.tag() == FormTag::CELL))
            }
            Query::Grid(grid) => self.spatial_lookup(grid, GroupTree::cell_at),
            Query::Land(grid) => self.spatial_lookup(grid, GroupTree::land_at),
        }
    }

    fn spatial_lookup(
        &self,
        grid: GridId,
        lookup: fn(&GroupTree, GridId) -> Option<RecordRef>,
    ) -> Result<Option<RecordRef>> {
        if grid.is_interior() {
            return Ok(None);
        }
        let Some(world) = self.world_children(FormId(grid.world as u32))? else {
            log::debug!("No worldspace children group for {grid}");
            return Ok(None);
        };
        for block in world.resolve_block_chain(&self.session, grid)? {
            if let Some(record) = lookup(&block, grid) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// The children group of worldspace `world`
    pub fn world_children(&self, world: FormId) -> Result<Option<Arc<GroupTree>>> {
        let Some(worlds) = self.top_group(FormTag::WRLD) else {
            return Ok(None);
        };
        worlds.load(&self.session, false)?;
        Ok(worlds
            .children_with_label(world.0)
            .into_iter()
            .filter_map(|id| self.session.group(id))
            .find(|g| g.kind() == GroupKind::WorldChildren))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Global;
    use crate::test_utils::{PluginBuilder, field, zstring};
    use crate::version::FormatVersion;
    use pretty_assertions::assert_eq;

    const TAMRIEL: FormId = FormId(0x3C);

    fn exterior_cell(format: FormatVersion, name: &str, x: i32, y: i32) -> Vec<u8> {
        let mut payload = field(format, b"EDID", &zstring(name));
        payload.extend(field(format, b"DATA", &0x0002u16.to_le_bytes()));
        let mut xclc = Vec::new();
        xclc.extend_from_slice(&x.to_le_bytes());
        xclc.extend_from_slice(&y.to_le_bytes());
        xclc.extend_from_slice(&0u32.to_le_bytes());
        payload.extend(field(format, b"XCLC", &xclc));
        payload
    }

    fn skyrim_file() -> Vec<u8> {
        let mut builder = PluginBuilder::new(GameEdition::Skyrim);
        let format = builder.format();
        let grid = GridId::exterior(TAMRIEL, 4, -2);

        let mut globals = builder.group(FormTag::GLOB.0, GroupKind::Top);
        let mut global = field(format, b"EDID", &zstring("GameHour"));
        global.extend(field(format, b"FNAM", b"f"));
        global.extend(field(format, b"FLTV", &8.5f32.to_le_bytes()));
        globals.record(FormTag::GLOB, 0x38, &global);
        globals.finish();

        let mut cells = builder.group(FormTag::CELL.0, GroupKind::Top);
        let mut block = cells.group(0, GroupKind::InteriorCellBlock);
        let mut sub_block = block.group(0, GroupKind::InteriorCellSubBlock);
        let mut interior = field(format, b"EDID", &zstring("WhiterunDragonsreach"));
        interior.extend(field(format, b"DATA", &0x0001u16.to_le_bytes()));
        sub_block.record(FormTag::CELL, 0x165A7, &interior);
        sub_block.finish();
        block.finish();
        cells.finish();

        let mut worlds = builder.group(FormTag::WRLD.0, GroupKind::Top);
        worlds.record(FormTag::WRLD, TAMRIEL.0, &field(format, b"EDID", &zstring("Tamriel")));
        let mut children = worlds.group(TAMRIEL.0, GroupKind::WorldChildren);
        let mut block = children.group(grid.block_key(), GroupKind::ExteriorCellBlock);
        let mut sub_block = block.group(grid.sub_block_key(), GroupKind::ExteriorCellSubBlock);
        sub_block.record(FormTag::CELL, 0x9732, &exterior_cell(format, "Riverwood", 4, -2));
        sub_block.record(FormTag::CELL, 0x9733, &exterior_cell(format, "", 5, -2));
        let mut cell_children = sub_block.group(0x9732, GroupKind::CellChildren);
        let mut temporary = cell_children.group(0x9732, GroupKind::CellTemporaryChildren);
        temporary.record(FormTag::LAND, 0x9740, &field(format, b"DATA", &1u32.to_le_bytes()));
        temporary.finish();
        cell_children.finish();
        sub_block.finish();
        block.finish();
        children.finish();
        worlds.finish();

        builder.into_bytes()
    }

    fn morrowind_file() -> Vec<u8> {
        let mut builder = PluginBuilder::new(GameEdition::Morrowind);
        let format = builder.format();

        let mut exterior = field(format, b"NAME", b"\0");
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(-3i32).to_le_bytes());
        data.extend_from_slice(&7i32.to_le_bytes());
        exterior.extend(field(format, b"DATA", &data));
        exterior.extend(field(format, b"RGNN", &zstring("Bitter Coast Region")));

        let mut interior = field(format, b"NAME", &zstring("Balmora, Guild of Mages"));
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        interior.extend(field(format, b"DATA", &data));

        let mut land_grid = Vec::new();
        land_grid.extend_from_slice(&(-3i32).to_le_bytes());
        land_grid.extend_from_slice(&7i32.to_le_bytes());

        builder
            .record(FormTag::CELL, 0, &exterior)
            .record(FormTag::CELL, 0, &interior)
            .record(FormTag::LAND, 0, &field(format, b"INTV", &land_grid));
        builder.into_bytes()
    }

    #[test]
    fn open_infers_edition_and_registers_top_groups() {
        let db = Database::from_bytes(skyrim_file()).unwrap();
        assert_eq!(db.format(), FormatVersion::Tes5);
        assert_eq!(db.edition(), GameEdition::Skyrim);
        assert_eq!(db.header().author, "bgs-esm");
        assert!(!db.is_localized());
        assert_eq!(db.top_groups().len(), 3);

        // CELL and WRLD are loaded eagerly; GLOB waits for first access
        assert!(db.top_group(FormTag::CELL).unwrap().is_loaded());
        assert!(db.top_group(FormTag::WRLD).unwrap().is_loaded());
        assert!(!db.top_group(FormTag::GLOB).unwrap().is_loaded());

        let globals = db.records(FormTag::GLOB).unwrap();
        assert_eq!(globals.len(), 1);
        assert_eq!(globals[0].get::<Global>().map(|g| g.value), Some(8.5));
    }

    #[test]
    fn grid_queries_resolve_each_sub_block_once() {
        let db = Database::from_bytes(skyrim_file()).unwrap();
        let riverwood = GridId::exterior(TAMRIEL, 4, -2);

        let cell = db.query(&Query::Grid(riverwood)).unwrap().unwrap();
        assert_eq!(cell.editor_id(), Some("Riverwood"));
        let neighbour = db
            .query(&Query::Grid(GridId::exterior(TAMRIEL, 5, -2)))
            .unwrap()
            .unwrap();
        assert_eq!(neighbour.form_id(), FormId(0x9733));
        let land = db.query(&Query::Land(riverwood)).unwrap().unwrap();
        assert_eq!(land.form_id(), FormId(0x9740));
        assert_eq!(db.query(&Query::Land(GridId::exterior(TAMRIEL, 5, -2))).unwrap(), None);

        let world = db.world_children(TAMRIEL).unwrap().unwrap();
        let block = db
            .group(world.children_with_label(riverwood.block_key())[0])
            .unwrap();
        assert_eq!(block.spatial_loads(), 1);
        assert_eq!(db.session().sub_blocks_loaded(), 1);
    }

    #[test]
    fn missing_cells_and_worlds_are_none() {
        let db = Database::from_bytes(skyrim_file()).unwrap();
        let far = GridId::exterior(TAMRIEL, 200, 200);
        assert_eq!(db.query(&Query::Grid(far)).unwrap(), None);
        let elsewhere = GridId::exterior(FormId(0x1234), 4, -2);
        assert_eq!(db.query(&Query::Grid(elsewhere)).unwrap(), None);
        assert_eq!(db.query(&Query::Grid(GridId::interior(0, 0))).unwrap(), None);
    }

    #[test]
    fn sub_block_limit_stops_resolution() {
        let options = ParseOptions::default().with_sub_block_load_limit(0);
        let db = Database::from_source(skyrim_file(), options).unwrap();
        let riverwood = GridId::exterior(TAMRIEL, 4, -2);
        assert_eq!(db.query(&Query::Grid(riverwood)).unwrap(), None);
        assert_eq!(db.session().sub_blocks_loaded(), 0);
    }

    #[test]
    fn cell_name_and_typed_resolution() {
        let db = Database::from_bytes(skyrim_file()).unwrap();
        let cell = db
            .query(&Query::CellName("whiterundragonsreach"))
            .unwrap()
            .unwrap();
        assert_eq!(cell.form_id(), FormId(0x165A7));
        assert!(cell.get::<Cell>().unwrap().is_interior());

        assert!(db.resolve(&FormRef::<Cell>::id(FormId(0x165A7))).is_some());
        assert!(db.resolve(&FormRef::<Global>::id(FormId(0x165A7))).is_none());
        assert!(db.resolve(&FormRef::<Cell>::id(FormId::NONE)).is_none());
    }

    #[test]
    fn editor_id_query_only_sees_loaded_records() {
        let db = Database::from_bytes(skyrim_file()).unwrap();
        assert_eq!(db.query(&Query::EditorId("GameHour")).unwrap(), None);
        db.records(FormTag::GLOB).unwrap();
        let global = db.query(&Query::EditorId("gamehour")).unwrap().unwrap();
        assert_eq!(global.form_id(), FormId(0x38));
    }

    #[test]
    fn morrowind_files_are_indexed_flat() {
        let db = Database::from_bytes(morrowind_file()).unwrap();
        assert_eq!(db.format(), FormatVersion::Tes3);
        assert_eq!(db.edition(), GameEdition::Morrowind);
        assert_eq!(db.header().file_type, Some(1));
        assert_eq!(db.header().description, "Synthetic test master");
        assert!(db.top_groups().is_empty());

        let grid = GridId::exterior(FormId::NONE, -3, 7);
        let cell = db.query(&Query::Grid(grid)).unwrap().unwrap();
        assert_eq!(
            cell.get::<Cell>().and_then(|c| c.region.as_deref()),
            Some("Bitter Coast Region")
        );
        assert!(db.query(&Query::Land(grid)).unwrap().is_some());

        let guild = db
            .query(&Query::CellName("balmora, guild of mages"))
            .unwrap()
            .unwrap();
        assert!(guild.get::<Cell>().unwrap().is_interior());
        assert!(
            db.resolve(&FormRef::<Cell>::editor_id("Balmora, Guild of Mages"))
                .is_some()
        );
        assert_eq!(db.records(FormTag::CELL).unwrap().len(), 2);
    }

    #[test]
    fn forced_edition_must_match_schema() {
        let options = ParseOptions::default().with_edition(GameEdition::Oblivion);
        let err = Database::from_source(skyrim_file(), options).unwrap_err();
        assert!(matches!(
            err,
            EsmError::EditionMismatch {
                detected: FormatVersion::Tes5,
                ..
            }
        ));
    }

    #[test]
    fn forced_edition_overrides_inference() {
        let options = ParseOptions::default().with_edition(GameEdition::Fallout3);
        let db = Database::from_source(skyrim_file(), options).unwrap();
        assert_eq!(db.edition(), GameEdition::Fallout3);
    }

    #[test]
    fn rejects_unknown_magic() {
        let err = Database::from_bytes(b"GRUP\0\0\0\0\0\0\0\0\0\0\0\0".to_vec()).unwrap_err();
        assert!(matches!(err, EsmError::InvalidMagic { .. }));
    }
}
