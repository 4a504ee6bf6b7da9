//! Link storage: the link entity, its arena, the chain container, cascading
//! destruction, and the binary codec.
//!
//! A [`Flower`] owns one [`LinkStore`] and any number of [`Chain`]s whose
//! links live in that store. Ends and Groups are referenced by identifier and
//! resolved through the flower's [`Catalog`].

mod chain;
mod codec;
mod destroy;
mod flower;
mod link;
mod options;
mod store;


/// Chain container and its iterator.
pub use chain::{Chain, ChainIter};

/// Binary link stream encoding and decoding.
pub use codec::{
    load_link_chain, read_link_records, write_link_chain, LinkRecord, END_SENTINEL,
    LINK_RECORD_LEN,
};

/// Cascading destruction along `next`.
pub use destroy::destroy_cascade;

/// Flower context, End/Group tables, and identifier resolution.
pub use flower::{Catalog, End, Flower, Group, Resolver};

/// The link entity.
pub use link::Link;

/// Codec configuration.
pub use options::CodecOptions;

/// Link arena.
pub use store::LinkStore;
