// Licensed under the Apache-2.0 license

use thiserror::Error;

use crate::tree::NodeIdx;

/// Errors that can occur while building a register tree or flattening it
/// into offset tables.
#[derive(Error, Debug)]
pub enum OffsetError {
    /// The alignment unit must be a positive integer.
    #[error("alignment must be a positive integer")]
    ZeroAlignment,

    /// An address is not an exact multiple of the alignment unit.
    #[error("{name}: offset {offset:#x} is not a multiple of the alignment {alignment}")]
    Misaligned {
        name: String,
        offset: u64,
        alignment: u64,
    },

    /// An address overflowed `u64`, or applying the scope bias made it negative.
    #[error("{name}: address is out of range")]
    AddressOutOfRange { name: String },

    /// A normalized value does not fit the signed 32-bit slots of the
    /// generated artifacts.
    #[error("{name}: normalized value {value:#x} exceeds the largest emittable offset {max:#x}")]
    OffsetTooWide { name: String, value: u64, max: u64 },

    /// An arrayed node without any array dimension.
    #[error("{name}: arrayed node has no array dimensions")]
    MissingArrayDimension { name: String },

    /// An arrayed node whose first dimension is zero.
    #[error("{name}: array has no instances")]
    EmptyArray { name: String },

    /// A node index that is not part of the tree.
    #[error("node index {idx} is not part of the tree")]
    UnknownNode { idx: NodeIdx },

    /// A register index that is not part of the tree.
    #[error("register index {idx} is not part of the tree")]
    UnknownRegister { idx: usize },

    /// A description aliases an id that was not declared before it.
    #[error("alias {alias:?} does not name a previously declared node")]
    UnknownAlias { alias: String },

    /// Two nodes in a description share the same id.
    #[error("node id {id:?} is declared more than once")]
    DuplicateId { id: String },

    /// A dialect name that no backend answers to.
    #[error("unknown output dialect {0:?}")]
    UnknownDialect(String),

    #[error("invalid JSON tree description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid Hjson tree description: {0}")]
    Hjson(#[from] serde_hjson::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("formatting error")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type for register offset operations
pub type OffsetResult<T> = std::result::Result<T, OffsetError>;
