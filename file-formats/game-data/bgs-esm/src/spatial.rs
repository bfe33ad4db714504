//! Exterior cell lookup by grid coordinate.
//!
//! Exterior cells of a worldspace are grouped twice: blocks of 32×32 cells,
//! then sub-blocks of 8×8 cells. Both group labels pack their coordinate as
//! `(y << 16) | x` with 16-bit signed halves:
//!
//! ```text
//! block     = pack(x >> 5, y >> 5)
//! sub-block = pack(x >> 3, y >> 3)
//! ```
//!
//! Resolving a coordinate loads only the owning block and sub-block. Each
//! block node caches the cells and land it has seen and remembers which of
//! its sub-blocks were already resolved.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::group::GroupTree;
use crate::header::GroupKind;
use crate::record::RecordRef;
use crate::records::{Cell, Land};
use crate::session::ParseSession;
use crate::tag::FormTag;
use crate::types::FormId;

/// World value used for interior cells
pub const INTERIOR_WORLD: i32 = -1;

/// Cells per block side
pub const BLOCK_SHIFT: u32 = 5;

/// Cells per sub-block side
pub const SUB_BLOCK_SHIFT: u32 = 3;

/// Position of a cell: grid coordinates plus the owning worldspace.
///
/// Exterior cells carry their worldspace form id; interior cells use
/// [`INTERIOR_WORLD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId {
    /// Grid x
    pub x: i32,
    /// Grid y
    pub y: i32,
    /// Worldspace form id as stored, or [`INTERIOR_WORLD`]
    pub world: i32,
}

impl GridId {
    /// Exterior cell of `world`
    #[must_use]
    pub const fn exterior(world: FormId, x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            world: world.0 as i32,
        }
    }

    /// Interior cell
    #[must_use]
    pub const fn interior(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            world: INTERIOR_WORLD,
        }
    }

    /// Grid id of a decoded cell inside `world`
    #[must_use]
    pub fn of_cell(cell: &Cell, world: FormId) -> Self {
        let (x, y) = cell.grid_position();
        if cell.is_interior() {
            Self::interior(x, y)
        } else {
            Self::exterior(world, x, y)
        }
    }

    /// Whether this is an interior position
    #[must_use]
    pub const fn is_interior(&self) -> bool {
        self.world == INTERIOR_WORLD
    }

    /// Label of the block group containing this cell
    #[must_use]
    pub const fn block_key(&self) -> u32 {
        pack(self.x >> BLOCK_SHIFT, self.y >> BLOCK_SHIFT)
    }

    /// Label of the sub-block group containing this cell
    #[must_use]
    pub const fn sub_block_key(&self) -> u32 {
        pack(self.x >> SUB_BLOCK_SHIFT, self.y >> SUB_BLOCK_SHIFT)
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_interior() {
            write!(f, "({}, {}) interior", self.x, self.y)
        } else {
            write!(f, "({}, {}) in {:08X}", self.x, self.y, self.world as u32)
        }
    }
}

/// Pack a block coordinate into a group label, `(y << 16) | x`
#[must_use]
pub const fn pack(x: i32, y: i32) -> u32 {
    ((y as u16 as u32) << 16) | (x as u16 as u32)
}

/// Cells and land already extracted from a block's sub-blocks.
#[derive(Debug, Default)]
pub struct SpatialCache {
    cells: HashMap<GridId, RecordRef>,
    land: HashMap<GridId, RecordRef>,
    resolved: HashSet<u32>,
    loads: usize,
}

impl GroupTree {
    /// Resolve the blocks of this worldspace children group that own `grid`.
    ///
    /// Returns the block nodes whose matching sub-block was found and
    /// indexed. Usually there is exactly one.
    pub fn resolve_block_chain(
        &self,
        session: &ParseSession,
        grid: GridId,
    ) -> Result<Vec<Arc<GroupTree>>> {
        self.load(session, false)?;
        let mut resolved = Vec::new();
        for id in self.children_with_label(grid.block_key()) {
            let Some(block) = session.group(id) else {
                continue;
            };
            if block.kind() != GroupKind::ExteriorCellBlock {
                continue;
            }
            if block.resolve_sub_block(session, grid)?.is_some() {
                resolved.push(block);
            }
        }
        Ok(resolved)
    }

    /// Index the sub-block of this block that owns `grid`.
    ///
    /// The sub-block is loaded with all its descendants once; later calls
    /// for any coordinate in the same sub-block return immediately. Returns
    /// `None` when the block has no such sub-block or the session's
    /// sub-block limit is exhausted.
    pub fn resolve_sub_block(&self, session: &ParseSession, grid: GridId) -> Result<Option<&Self>> {
        let key = grid.sub_block_key();
        let mut spatial = self.spatial.lock();
        if spatial.resolved.contains(&key) {
            return Ok(Some(self));
        }

        self.load(session, false)?;
        let sub_blocks: Vec<_> = self
            .children_with_label(key)
            .into_iter()
            .filter_map(|id| session.group(id))
            .filter(|g| g.kind() == GroupKind::ExteriorCellSubBlock)
            .collect();
        if sub_blocks.is_empty() {
            log::debug!("No sub-block {key:#010x} for cell {grid}");
            return Ok(None);
        }
        if !session.take_sub_block_budget() {
            log::warn!("Sub-block load limit reached, not resolving cell {grid}");
            return Ok(None);
        }

        let world = FormId(grid.world as u32);
        for sub_block in sub_blocks {
            let records = sub_block.load(session, true)?;
            spatial.loads += 1;
            for record in records.iter().filter(|r| r.tag() == FormTag::CELL) {
                let Some(cell) = record.get::<Cell>() else {
                    continue;
                };
                let id = GridId::of_cell(cell, world);
                spatial.cells.insert(id, Arc::clone(record));
                if let Some(land) = cell_land(session, &sub_block, record) {
                    spatial.land.insert(id, land);
                }
            }
        }

        spatial.resolved.insert(key);
        log::debug!(
            "Resolved sub-block {key:#010x}: {} cells indexed",
            spatial.cells.len()
        );
        Ok(Some(self))
    }

    /// Cached cell at `grid`, if its sub-block was resolved
    pub fn cell_at(&self, grid: GridId) -> Option<RecordRef> {
        self.spatial.lock().cells.get(&grid).cloned()
    }

    /// Cached land at `grid`, if its sub-block was resolved
    pub fn land_at(&self, grid: GridId) -> Option<RecordRef> {
        self.spatial.lock().land.get(&grid).cloned()
    }

    /// Number of sub-block loads performed by this block
    pub fn spatial_loads(&self) -> usize {
        self.spatial.lock().loads
    }
}

/// First `LAND` record in the temporary children of `cell`.
fn cell_land(session: &ParseSession, sub_block: &GroupTree, cell: &RecordRef) -> Option<RecordRef> {
    let label = cell.form_id().0;
    sub_block
        .children_with_label(label)
        .into_iter()
        .filter_map(|id| session.group(id))
        .filter(|g| g.kind() == GroupKind::CellChildren)
        .flat_map(|children| children.children_with_label(label))
        .filter_map(|id| session.group(id))
        .filter(|g| g.kind() == GroupKind::CellTemporaryChildren)
        .flat_map(|temporary| temporary.records())
        .find(|record| record.get::<Land>().is_some())
}
