// Licensed under the Apache-2.0 license

//! Flat register offset tables from an elaborated SystemRDL address map.
//!
//! This crate walks a tree of register containers (possibly nested, possibly
//! arrayed) once, computes every register's offset relative to its scope,
//! divides it by the alignment unit, and renders the result as a C++ header,
//! a Python module, a SystemVerilog include or a VHDL package.
//!
//! ## Usage
//!
//! ```
//! use mcu_registers_offsets::{flatten_tree, emit, AddrTree, Dialect, FilterConfig, NameConfig};
//!
//! let mut tree = AddrTree::new("top").with_alignment(4);
//! let root = tree.root();
//! tree.add_register(root, "CTRL", 0x0).unwrap();
//! tree.add_register(root, "STATUS", 0x4).unwrap();
//! let ch = tree.add_array(root, "CH", 0x10, &[2], 0x8).unwrap();
//! tree.add_register(ch, "DATA", 0x0).unwrap();
//!
//! let map = flatten_tree(&tree, &FilterConfig::new()).unwrap();
//! assert_eq!(map.root.registers.get("STATUS"), Some(1));
//! assert_eq!(map.root.arrays[0].instance_offset(1), 6);
//!
//! let header = emit(&map, Dialect::Cc, &NameConfig::none()).unwrap();
//! assert!(header.contains("constexpr auto STATUS{1};"));
//! ```
//!
//! ## Module Organization
//!
//! - [`tree`]: the input node tree and its JSON/Hjson description format
//! - [`flatten`]: the single-pass flattener ([`Flattener`])
//! - [`output`]: the dialect-neutral tables it produces
//! - [`emit`]: the renderer abstraction ([`Backend`]) and the four dialects
//! - [`config`]: name transformations ([`NameConfig`]) and register filtering ([`FilterConfig`])
//! - [`error`]: [`OffsetError`]

pub mod config;
pub mod emit;
pub mod error;
pub mod flatten;
pub mod output;
pub mod tree;

pub use config::{FilterConfig, NameConfig, RESERVED_NAME};
pub use emit::{emit, render, Backend, Dialect};
pub use error::{OffsetError, OffsetResult};
pub use flatten::{flatten_tree, Flattener};
pub use output::{ArrayDescriptor, FlatMap, RegisterTable, Scope, MAX_OFFSET};
pub use tree::{AddrTree, TreeDesc};
