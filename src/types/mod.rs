//! Identifier newtypes, the crate error type, and the shared `Result` alias.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod checksum;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CactusError>;

/// Reserved identifier value. Never a legal End, Group, or Chain identifier;
/// on the wire it terminates a link stream.
pub const NULL_NAME: u64 = u64::MAX;

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns true when the identifier is the reserved null name.
            pub const fn is_null(self) -> bool {
                self.0 == NULL_NAME
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, ":{}"), self.0)
            }
        }
    };
}

name_type!(
    /// Identifier of an End (a boundary node of a link segment).
    EndId,
    "end"
);
name_type!(
    /// Identifier of a Group (a sub-region of a flower).
    GroupId,
    "group"
);
name_type!(
    /// Identifier of a Chain within a flower.
    ChainId,
    "chain"
);
name_type!(
    /// Identifier of a Flower.
    FlowerName,
    "flower"
);

/// Stable handle to a link stored in a [`crate::storage::LinkStore`].
///
/// The generation distinguishes a live link from an earlier occupant of the
/// same slot, so handles left behind by a destroyed link never resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl LinkId {
    /// Slot position inside the owning store.
    pub const fn slot(self) -> u32 {
        self.slot
    }

    /// Generation of the slot at the time the link was created.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link:{}v{}", self.slot, self.generation)
    }
}

/// Kind of entity a decoded identifier failed to resolve to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An End of the flower being loaded.
    End,
    /// A Group of the flower being loaded.
    Group,
    /// The flower a persisted file was written for.
    Flower,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::End => "end",
            EntityKind::Group => "group",
            EntityKind::Flower => "flower",
        };
        f.write_str(label)
    }
}

/// Errors produced by link storage, splicing, and the binary codec.
#[derive(Debug, Error)]
pub enum CactusError {
    /// Underlying transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Malformed or truncated byte stream.
    #[error("format error: {0}")]
    Format(String),
    /// A decoded identifier does not name a live entity of the flower.
    #[error("{kind} {id} does not resolve in the loading context")]
    Resolution {
        /// Kind of entity that was looked up.
        kind: EntityKind,
        /// Raw identifier that failed to resolve.
        id: u64,
    },
    /// Doubly-linked or index consistency is broken.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The handle refers to a link that has been destroyed.
    #[error("{0} has been destroyed")]
    StaleLink(LinkId),
    /// A named entity is missing.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Caller supplied an argument that cannot be honoured.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

impl CactusError {
    pub(crate) fn unresolved(kind: EntityKind, id: u64) -> Self {
        CactusError::Resolution { kind, id }
    }

    /// Prefixes a format error with the field being decoded; other variants pass through.
    pub(crate) fn in_field(self, field: &str) -> Self {
        match self {
            CactusError::Format(msg) => CactusError::Format(format!("{field}: {msg}")),
            other => other,
        }
    }
}
