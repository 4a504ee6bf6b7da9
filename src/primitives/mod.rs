//! Low-level primitives shared by the storage layer.
//!
//! Includes fixed-width field encoding and the abstract byte transport the
//! codec is written against.

/// Byte-level field encoding and decoding.
pub mod bytes;

/// Abstract byte sinks and sources.
///
/// Interfaces for writing/reading raw bytes plus adapters for buffers and `std::io`.
pub mod io;
