//! Test organization for bgs_esm
//!
//! - Unit tests live next to the code in src/
//! - Integration tests here build plugin files byte by byte and read them
//!   back through the public API

// Common test utilities
mod common;

// Feature integration tests
mod integration;
