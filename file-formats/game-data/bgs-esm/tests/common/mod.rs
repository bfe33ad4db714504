//! Common test utilities and fixtures
//!
//! Chunks are written independently of the crate's own builders so that the
//! reader is checked against the documented layouts.

#![allow(dead_code)]

use bgs_esm::FormatVersion;
use std::path::PathBuf;
use tempfile::TempDir;

/// Group types as stored on disk
pub mod kind {
    pub const TOP: i32 = 0;
    pub const WORLD_CHILDREN: i32 = 1;
    pub const INTERIOR_BLOCK: i32 = 2;
    pub const INTERIOR_SUB_BLOCK: i32 = 3;
    pub const EXTERIOR_BLOCK: i32 = 4;
    pub const EXTERIOR_SUB_BLOCK: i32 = 5;
    pub const CELL_CHILDREN: i32 = 6;
    pub const CELL_TEMPORARY: i32 = 9;
}

/// Compressed record flag
pub const COMPRESSED: u32 = 0x0004_0000;

/// Null-terminated string
pub fn zstring(s: &str) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.push(0);
    out
}

/// Little-endian concatenation of i32 values
pub fn i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// One field; Tes4/Tes5 sizes are written as u16 and must fit
pub fn field(format: FormatVersion, tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    match format {
        FormatVersion::Tes3 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
        _ => {
            let size = u16::try_from(data.len()).expect("field too large for a u16 size");
            out.extend_from_slice(&size.to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// A field above 65535 bytes, preceded by its `XXXX` escape
pub fn oversize_field(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = b"XXXX".to_vec();
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// Record header length for a schema
pub fn record_header_len(format: FormatVersion) -> usize {
    match format {
        FormatVersion::Tes3 => 16,
        FormatVersion::Tes4 => 20,
        FormatVersion::Tes5 => 24,
    }
}

/// One record chunk
pub fn record(format: FormatVersion, tag: &[u8; 4], flags: u32, form_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    match format {
        FormatVersion::Tes3 => {
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&flags.to_le_bytes());
        }
        _ => {
            out.extend_from_slice(&flags.to_le_bytes());
            out.extend_from_slice(&form_id.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            if format == FormatVersion::Tes5 {
                out.extend_from_slice(&43u32.to_le_bytes());
            }
        }
    }
    out.extend_from_slice(payload);
    out
}

/// A compressed record: size prefix plus zlib stream
pub fn compressed_record(format: FormatVersion, tag: &[u8; 4], form_id: u32, payload: &[u8]) -> Vec<u8> {
    let data = bgs_esm::compression::compress_record(payload).expect("compress");
    record(format, tag, COMPRESSED, form_id, &data)
}

/// One group chunk wrapping `children`
pub fn group(format: FormatVersion, label: u32, kind: i32, children: &[Vec<u8>]) -> Vec<u8> {
    let header_len = if format == FormatVersion::Tes5 { 24 } else { 20 };
    let body: Vec<u8> = children.concat();
    let mut out = b"GRUP".to_vec();
    out.extend_from_slice(&((header_len + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(&label.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    if format == FormatVersion::Tes5 {
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    out.extend_from_slice(&body);
    out
}

/// Top-level group of records with `tag`
pub fn top_group(format: FormatVersion, tag: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    group(format, u32::from_le_bytes(*tag), kind::TOP, children)
}

/// Tes4/Tes5 root record with a 12-byte `HEDR`
pub fn tes4_root(format: FormatVersion, version: f32, flags: u32, extra: &[Vec<u8>]) -> Vec<u8> {
    let mut hedr = version.to_le_bytes().to_vec();
    hedr.extend_from_slice(&10i32.to_le_bytes());
    hedr.extend_from_slice(&0x0100_0800u32.to_le_bytes());
    let mut payload = field(format, b"HEDR", &hedr);
    payload.extend(extra.concat());
    record(format, b"TES4", flags, 0, &payload)
}

/// Morrowind root record with a 300-byte `HEDR`
pub fn tes3_root(version: f32, file_type: u32, company: &str, description: &str, num_records: u32) -> Vec<u8> {
    let mut hedr = version.to_le_bytes().to_vec();
    hedr.extend_from_slice(&file_type.to_le_bytes());
    let mut company = company.as_bytes().to_vec();
    company.resize(32, 0);
    hedr.extend_from_slice(&company);
    let mut description = description.as_bytes().to_vec();
    description.resize(256, 0);
    hedr.extend_from_slice(&description);
    hedr.extend_from_slice(&num_records.to_le_bytes());
    assert_eq!(hedr.len(), 300);
    record(FormatVersion::Tes3, b"TES3", 0, 0, &field(FormatVersion::Tes3, b"HEDR", &hedr))
}

/// Write `bytes` to a file in a fresh temporary directory
pub fn write_plugin(name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).expect("Failed to write test plugin");
    (dir, path)
}
