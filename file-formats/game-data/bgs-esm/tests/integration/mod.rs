//! Feature integration tests
//!
//! These tests open complete files and check behaviour end to end.

pub mod cell_lookup;
pub mod discovery;
pub mod open_files;
pub mod record_decoding;
