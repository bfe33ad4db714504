//! # bgs_esm - Bethesda master/plugin reader
//!
//! Lazy reader for the ESM/ESP/ESL files of Bethesda Game Studios games, from
//! Morrowind to Starfield.
//!
//! ## Features
//!
//! - All three header schemas (Tes3, Tes4, Tes5), detected from the root record
//! - Game edition inferred from the root `HEDR` version, or forced by the caller
//! - Groups read on first access and cached, safe to share across threads
//! - Exterior cells located by grid coordinate through block/sub-block labels
//! - Per-record zlib decompression with strict size checks
//! - Oversize (`XXXX`) fields and localized string ids
//! - Extensible record registry with per-edition support ranges
//!
//! ## Examples
//!
//! ### Opening a master
//!
//! ```no_run
//! use bgs_esm::{Database, tag::FormTag};
//!
//! # fn main() -> Result<(), bgs_esm::EsmError> {
//! let db = Database::open("Oblivion.esm")?;
//! println!("{} with {} masters", db.edition(), db.header().masters.len());
//!
//! for weapon in db.records(FormTag::WEAP)? {
//!     println!("{:?} {:?}", weapon.form_id(), weapon.editor_id());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Finding a cell
//!
//! ```no_run
//! use bgs_esm::{Database, GridId, Query, types::FormId};
//!
//! # fn main() -> Result<(), bgs_esm::EsmError> {
//! let db = Database::open("Skyrim.esm")?;
//! let tamriel = FormId(0x3C);
//!
//! if let Some(land) = db.query(&Query::Land(GridId::exterior(tamriel, 0, 0)))? {
//!     println!("land record {}", land.form_id());
//! }
//! if let Some(cell) = db.query(&Query::CellName("WhiterunDragonsreach"))? {
//!     println!("interior {:?}", cell.editor_id());
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod compression;
pub mod database;
pub mod discovery;
pub mod error;
pub mod field;
pub mod group;
pub mod header;
pub mod parallel;
pub mod record;
pub mod records;
pub mod registry;
pub mod session;
pub mod spatial;
pub mod tag;
pub mod types;
pub mod version;

#[cfg(any(test, feature = "test-utils", doc))]
pub mod test_utils;

pub use database::{Database, Query};
pub use discovery::{DiscoveryIndex, discover};
pub use error::{EsmError, Result};
pub use field::{LString, ReadContext};
pub use group::{GroupId, GroupTree};
pub use header::{GroupHeader, GroupKind, RecordFlags, RecordHeader};
pub use record::{Record, RecordRef};
pub use records::RecordData;
pub use registry::{RecordRegistry, RecordType, Support};
pub use session::{ParseOptions, ParseSession, PluginSource, SourceReader};
pub use spatial::GridId;
pub use tag::FormTag;
pub use types::{FormId, FormKey, FormRef};
pub use version::{FormatVersion, GameEdition};
