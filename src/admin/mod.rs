#![forbid(unsafe_code)]

//! Flower administration utilities.
//!
//! This module provides whole-flower persistence, loading contexts described
//! in JSON, and verification tools used by the `cactus-link` command line.

mod context;
mod disk;
mod error;
mod util;
mod verify;

/// JSON description of a flower's Groups, Ends, and chains.
pub use context::{ChainSpec, EndSpec, FlowerContext};

/// Framed persistence of every chain in a flower.
///
/// Loading is all-or-nothing and rolls back on any failure.
pub use disk::{
    inspect_flower_bytes, load_flower_chains, write_flower, ChainDump, FlowerFileDump,
    FlowerFileHeader, FlowerLoadSummary, FlowerWriteSummary, FLOWER_FILE_MAGIC,
    FLOWER_FILE_VERSION,
};

/// Error types for administrative operations.
pub use error::{AdminError, Result};

/// File-backed wrappers around the flower codec.
pub use util::{load_flower_file, write_flower_file};

/// Flower integrity verification.
///
/// Verifies chain invariants and entity resolution and reports any issues found.
pub use verify::{
    verify_file, verify_flower, VerifyCounts, VerifyFinding, VerifyReport, VerifySeverity,
};
