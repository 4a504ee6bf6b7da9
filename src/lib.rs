//! Links of a hierarchical alignment graph: ordered, doubly-linked chain
//! elements with cascading destruction and a binary wire format.

#![warn(missing_docs)]

pub mod admin;
pub mod primitives;
pub mod storage;
pub mod types;

pub use storage::{Chain, CodecOptions, Flower, Link, LinkStore};
pub use types::{CactusError, ChainId, EndId, FlowerName, GroupId, LinkId, Result};
