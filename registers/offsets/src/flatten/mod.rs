// Licensed under the Apache-2.0 license

//! Flattening of a register tree into per-scope offset tables.
//!
//! A [`Flattener`] owns the visited set for exactly one generation run. It is
//! consumed by [`Flattener::run`], so the same visited set can never leak into
//! a second traversal.
//!
//! For every scope (the root, then every array instance) the flattener:
//! 1. folds the scope node's registers and all non-arrayed descendants into
//!    one [`RegisterTable`], each offset relative to the scope start and
//!    divided by the alignment unit;
//! 2. records, but does not enter, every arrayed container it meets;
//! 3. turns each recorded array into an [`ArrayDescriptor`] whose own scope
//!    is flattened with a bias of `-start`, so its registers are relative to
//!    instance 0.
//!
//! Nodes and registers reachable through more than one path are folded in
//! once, on their first visit.

use std::collections::HashSet;

use log::{debug, trace};

use crate::config::FilterConfig;
use crate::error::{OffsetError, OffsetResult};
use crate::output::{ArrayDescriptor, FlatMap, RegisterTable, Scope, MAX_OFFSET};
use crate::tree::{AddrTree, NodeIdx, RegisterIdx};

/// An arrayed container met while flattening, waiting for discovery.
#[derive(Clone, Copy, Debug)]
struct PendingArray {
    node: NodeIdx,
    /// Raw offset of instance 0 relative to the scope being flattened.
    start: u64,
}

pub struct Flattener<'a> {
    tree: &'a AddrTree,
    filter: &'a FilterConfig,
    alignment: u64,
    visited_nodes: HashSet<NodeIdx>,
    visited_registers: HashSet<RegisterIdx>,
    pending: Vec<PendingArray>,
}

impl<'a> Flattener<'a> {
    pub fn new(tree: &'a AddrTree, filter: &'a FilterConfig) -> OffsetResult<Self> {
        let alignment = tree.alignment();
        if alignment == 0 {
            return Err(OffsetError::ZeroAlignment);
        }
        Ok(Self {
            tree,
            filter,
            alignment,
            visited_nodes: HashSet::new(),
            visited_registers: HashSet::new(),
            pending: vec![],
        })
    }

    /// Flatten the whole tree, starting at its root.
    pub fn run(mut self) -> OffsetResult<FlatMap> {
        let root = self.tree.root();
        self.visited_nodes.insert(root);
        let scope = self.scope(root, 0)?;
        debug!(
            "Flattened {}: {} registers, {} arrays",
            self.tree.name(),
            scope.registers.len(),
            scope.arrays.len()
        );
        Ok(FlatMap {
            name: self.tree.name().to_string(),
            alignment: self.alignment,
            root: scope,
        })
    }

    fn scope(&mut self, node: NodeIdx, bias: i64) -> OffsetResult<Scope> {
        let registers = self.flatten(node, bias)?;
        let arrays = self.discover_arrays()?;
        Ok(Scope { registers, arrays })
    }

    /// Collect the registers of `node` and of its non-arrayed descendants.
    ///
    /// A register at raw offset `r` in `node` lands at
    /// `(bias + node.offset + r) / alignment`. Arrayed children are queued for
    /// [`Flattener::discover_arrays`] instead of being entered.
    pub fn flatten(&mut self, node_idx: NodeIdx, bias: i64) -> OffsetResult<RegisterTable> {
        let node = self.tree.node(node_idx)?;
        let mut registers = RegisterTable::new();

        for reg_idx in node.registers.iter().copied() {
            if !self.visited_registers.insert(reg_idx) {
                trace!("Register {} already emitted", reg_idx);
                continue;
            }
            let reg = self.tree.register(reg_idx)?;
            if self.filter.is_excluded(&reg.name) {
                trace!("Skipping reserved register {}", reg.name);
                continue;
            }
            let raw = node
                .offset
                .checked_add(reg.offset)
                .ok_or_else(|| out_of_range(&reg.name))?;
            let addr = rebase(raw, bias, &reg.name)?;
            let offset = fits(&reg.name, self.normalize(&reg.name, addr)?)?;
            registers.insert(&reg.name, offset);
        }

        // Children sit at node.offset within this scope
        let child_bias = bias
            .checked_add(to_signed(node.offset, &node.name)?)
            .ok_or_else(|| out_of_range(&node.name))?;

        for child_idx in node.children.iter().copied() {
            if self.visited_nodes.contains(&child_idx) {
                trace!("Node {} already flattened", child_idx);
                continue;
            }
            let child = self.tree.node(child_idx)?;
            if child.is_array() {
                let start = rebase(child.offset, child_bias, &child.name)?;
                self.pending.push(PendingArray {
                    node: child_idx,
                    start,
                });
                continue;
            }
            self.visited_nodes.insert(child_idx);
            let nested = self.flatten(child_idx, child_bias)?;
            registers.merge(nested);
        }

        Ok(registers)
    }

    /// Turn every array queued by the last [`Flattener::flatten`] call into a
    /// descriptor, flattening each array's own scope.
    pub fn discover_arrays(&mut self) -> OffsetResult<Vec<ArrayDescriptor>> {
        let pending = std::mem::take(&mut self.pending);
        let mut arrays = vec![];

        for PendingArray { node: idx, start } in pending {
            // Queued more than once through aliasing
            if !self.visited_nodes.insert(idx) {
                continue;
            }
            let node = self.tree.node(idx)?;
            let Some(array) = &node.array else {
                continue;
            };
            let repeat = *array.dimensions.first().ok_or_else(|| {
                OffsetError::MissingArrayDimension {
                    name: node.name.clone(),
                }
            })?;
            if repeat == 0 {
                return Err(OffsetError::EmptyArray {
                    name: node.name.clone(),
                });
            }
            let stride = array.stride;

            let start_norm = self.normalize(&node.name, start)?;
            let stride_norm = self.normalize(&node.name, stride)?;
            // Every instance offset lies between start and the last instance
            let last = (repeat - 1)
                .checked_mul(stride_norm)
                .and_then(|span| span.checked_add(start_norm))
                .ok_or_else(|| out_of_range(&node.name))?;
            for value in [start_norm, stride_norm, repeat, last] {
                fits(&node.name, value)?;
            }
            debug!(
                "Array {}: start {:#x}, repeat {}, stride {:#x}",
                node.name, start, repeat, stride
            );

            let bias = to_signed(node.offset, &node.name)?
                .checked_neg()
                .ok_or_else(|| out_of_range(&node.name))?;
            let scope = self.scope(idx, bias)?;

            arrays.push(ArrayDescriptor {
                name: node.name.clone(),
                start: start_norm,
                repeat,
                stride: stride_norm,
                scope,
            });
        }

        Ok(arrays)
    }

    /// Divide a raw byte offset by the alignment unit.
    fn normalize(&self, name: &str, offset: u64) -> OffsetResult<u64> {
        if offset % self.alignment != 0 {
            return Err(OffsetError::Misaligned {
                name: name.to_string(),
                offset,
                alignment: self.alignment,
            });
        }
        Ok(offset / self.alignment)
    }
}

/// Flatten `tree` with a fresh visited set.
pub fn flatten_tree(tree: &AddrTree, filter: &FilterConfig) -> OffsetResult<FlatMap> {
    Flattener::new(tree, filter)?.run()
}

fn rebase(offset: u64, bias: i64, name: &str) -> OffsetResult<u64> {
    offset
        .checked_add_signed(bias)
        .ok_or_else(|| out_of_range(name))
}

fn to_signed(offset: u64, name: &str) -> OffsetResult<i64> {
    i64::try_from(offset).map_err(|_| out_of_range(name))
}

/// Reject normalized values wider than the generated artifacts can hold.
fn fits(name: &str, value: u64) -> OffsetResult<u64> {
    if value > MAX_OFFSET {
        return Err(OffsetError::OffsetTooWide {
            name: name.to_string(),
            value,
            max: MAX_OFFSET,
        });
    }
    Ok(value)
}

fn out_of_range(name: &str) -> OffsetError {
    OffsetError::AddressOutOfRange {
        name: name.to_string(),
    }
}
