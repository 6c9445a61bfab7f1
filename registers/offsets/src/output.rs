// Licensed under the Apache-2.0 license

//! Dialect-neutral output of the flattener.
//!
//! ```text
//! FlatMap
//! └── root: Scope
//!     ├── registers: RegisterTable      # name → normalized offset
//!     └── arrays: Vec<ArrayDescriptor>
//!         └── scope: Scope              # one instance, offsets from its start
//! ```
//!
//! Every value in here is already divided by the alignment unit. Backends
//! only render these numbers; the one exception is the per-instance offset
//! list, which [`ArrayDescriptor::instance_offsets_msb_first`] derives from
//! the normalized start and stride.

use std::collections::BTreeMap;

/// Mapping from register name to normalized offset for one scope.
///
/// Names are unique; inserting an existing name replaces its offset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegisterTable {
    entries: BTreeMap<String, u64>,
}

impl RegisterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a register, replacing any earlier register of the same name.
    pub fn insert(&mut self, name: &str, offset: u64) {
        self.entries.insert(name.to_string(), offset);
    }

    /// Merge another table into this one. Entries of `other` win.
    pub fn merge(&mut self, other: RegisterTable) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending offset order; equal offsets are ordered by name.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut sorted: Vec<_> = self
            .entries
            .iter()
            .map(|(name, offset)| (name.as_str(), *offset))
            .collect();
        sorted.sort_by_key(|&(name, offset)| (offset, name));
        sorted
    }
}

impl<'a> FromIterator<(&'a str, u64)> for RegisterTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        let mut table = RegisterTable::new();
        for (name, offset) in iter {
            table.insert(name, offset);
        }
        table
    }
}

/// Registers and arrays of one traversal scope.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Scope {
    pub registers: RegisterTable,
    /// Arrays found in this scope, in the order they were discovered.
    pub arrays: Vec<ArrayDescriptor>,
}

impl Scope {
    /// Look up a directly nested array by name.
    pub fn array(&self, name: &str) -> Option<&ArrayDescriptor> {
        self.arrays.iter().find(|array| array.name == name)
    }

    /// Number of named registers in this scope and every nested array scope.
    pub fn register_count(&self) -> usize {
        self.registers.len()
            + self
                .arrays
                .iter()
                .map(|array| array.scope.register_count())
                .sum::<usize>()
    }
}

/// Largest normalized value any dialect can carry.
///
/// VHDL `natural` and C++ `int` are signed 32-bit.
pub const MAX_OFFSET: u64 = i32::MAX as u64;

/// A repeated container found in a scope.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ArrayDescriptor {
    pub name: String,
    /// Normalized offset of instance 0, relative to the enclosing scope.
    pub start: u64,
    /// Number of instances.
    pub repeat: u64,
    /// Normalized distance between successive instances.
    pub stride: u64,
    /// Contents of a single instance, offsets relative to its start.
    pub scope: Scope,
}

impl ArrayDescriptor {
    /// Normalized offset of instance `index`, saturating at `u64::MAX`.
    pub fn instance_offset(&self, index: u64) -> u64 {
        index
            .saturating_mul(self.stride)
            .saturating_add(self.start)
    }

    /// Offsets of every instance, last instance first.
    pub fn instance_offsets_msb_first(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.repeat)
            .rev()
            .map(move |index| self.instance_offset(index))
    }
}

/// The complete flattened address map of one tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlatMap {
    /// Display name of the root node.
    pub name: String,
    /// Alignment unit the offsets were divided by.
    pub alignment: u64,
    pub root: Scope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_offset() {
        let table: RegisterTable = [("STATUS", 1), ("CTRL", 0), ("IRQ", 8), ("ALT", 1)]
            .into_iter()
            .collect();
        assert_eq!(
            table.sorted(),
            vec![("CTRL", 0), ("ALT", 1), ("STATUS", 1), ("IRQ", 8)]
        );
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = RegisterTable::new();
        table.insert("CTRL", 0);
        table.insert("CTRL", 4);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("CTRL"), Some(4));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut table: RegisterTable = [("CTRL", 0), ("STATUS", 1)].into_iter().collect();
        let other: RegisterTable = [("STATUS", 9), ("DATA", 2)].into_iter().collect();
        table.merge(other);
        assert_eq!(table.get("CTRL"), Some(0));
        assert_eq!(table.get("STATUS"), Some(9));
        assert_eq!(table.get("DATA"), Some(2));
        assert!(!table.contains("RFU"));
    }

    #[test]
    fn test_instance_offsets() {
        let array = ArrayDescriptor {
            name: "CH".to_string(),
            start: 4,
            repeat: 3,
            stride: 2,
            scope: Scope::default(),
        };
        assert_eq!(array.instance_offset(0), 4);
        assert_eq!(array.instance_offset(2), 8);
        assert_eq!(
            array.instance_offsets_msb_first().collect::<Vec<_>>(),
            vec![8, 6, 4]
        );
    }

    #[test]
    fn test_instance_offset_saturates() {
        let array = ArrayDescriptor {
            name: "CH".to_string(),
            start: 1 << 62,
            repeat: 4,
            stride: 1 << 62,
            scope: Scope::default(),
        };
        assert_eq!(array.instance_offset(1), 1 << 63);
        assert_eq!(array.instance_offset(3), u64::MAX);
    }

    #[test]
    fn test_scope_register_count() {
        let scope = Scope {
            registers: [("CTRL", 0)].into_iter().collect(),
            arrays: vec![ArrayDescriptor {
                name: "CH".to_string(),
                repeat: 2,
                scope: Scope {
                    registers: [("DATA", 0), ("MASK", 1)].into_iter().collect(),
                    arrays: vec![],
                },
                ..Default::default()
            }],
        };
        assert_eq!(scope.register_count(), 3);
        assert_eq!(scope.array("CH").map(|a| a.repeat), Some(2));
        assert!(scope.array("DATA").is_none());
    }
}
