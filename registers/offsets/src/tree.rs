// Licensed under the Apache-2.0 license

//! The elaborated register tree consumed by the flattener.
//!
//! [`AddrTree`] stores nodes and registers in arenas and links them by index,
//! so the same node (or register) can be reachable from more than one parent.
//! That is how shared sub-trees are represented, and it is what the
//! flattener's visited set keys on.
//!
//! ```text
//! AddrTree
//! ├── node_arena: Vec<Node>          # containers, plain or arrayed
//! │   ├── children: Vec<NodeIdx>
//! │   └── registers: Vec<RegisterIdx>
//! └── register_arena: Vec<Register>  # named leaves
//! ```
//!
//! Trees are either built directly with [`AddrTree::add_node`] and friends, or
//! loaded from a [`TreeDesc`] document (JSON or Hjson).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OffsetError, OffsetResult};

/// Index into the node arena.
pub type NodeIdx = usize;

/// Index into the register arena.
pub type RegisterIdx = usize;

/// Repetition of an arrayed node.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArrayInfo {
    /// Array dimensions. Only the first one is used.
    pub dimensions: Vec<u64>,
    /// Address distance between successive instances.
    pub stride: u64,
}

/// A container in the address map.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: String,
    /// Raw address offset relative to the parent node.
    pub offset: u64,
    /// Set when the node stands for several identical instances.
    pub array: Option<ArrayInfo>,
    pub children: Vec<NodeIdx>,
    pub registers: Vec<RegisterIdx>,
}

impl Node {
    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }
}

/// A named register.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Register {
    pub name: String,
    /// Raw address offset relative to the owning node.
    pub offset: u64,
}

/// An elaborated address map: root display name, alignment unit and the
/// node tree.
#[derive(Clone, Debug)]
pub struct AddrTree {
    name: String,
    alignment: u64,
    root: NodeIdx,
    node_arena: Vec<Node>,
    register_arena: Vec<Register>,
}

impl AddrTree {
    /// Create a tree with an empty root node at offset 0 and alignment 1.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alignment: 1,
            root: 0,
            node_arena: vec![Node {
                name: name.to_string(),
                ..Default::default()
            }],
            register_arena: vec![],
        }
    }

    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn set_alignment(&mut self, alignment: u64) {
        self.alignment = alignment;
    }

    /// Display name of the root node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alignment unit every emitted offset is divided by.
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    pub fn node(&self, idx: NodeIdx) -> OffsetResult<&Node> {
        self.node_arena
            .get(idx)
            .ok_or(OffsetError::UnknownNode { idx })
    }

    pub fn register(&self, idx: RegisterIdx) -> OffsetResult<&Register> {
        self.register_arena
            .get(idx)
            .ok_or(OffsetError::UnknownRegister { idx })
    }

    pub fn node_count(&self) -> usize {
        self.node_arena.len()
    }

    pub fn register_count(&self) -> usize {
        self.register_arena.len()
    }

    fn node_mut(&mut self, idx: NodeIdx) -> OffsetResult<&mut Node> {
        self.node_arena
            .get_mut(idx)
            .ok_or(OffsetError::UnknownNode { idx })
    }

    /// Add a plain container under `parent`.
    pub fn add_node(&mut self, parent: NodeIdx, name: &str, offset: u64) -> OffsetResult<NodeIdx> {
        self.push_node(
            parent,
            Node {
                name: name.to_string(),
                offset,
                ..Default::default()
            },
        )
    }

    /// Add an arrayed container under `parent`. `offset` is the start of the
    /// first instance.
    pub fn add_array(
        &mut self,
        parent: NodeIdx,
        name: &str,
        offset: u64,
        dimensions: &[u64],
        stride: u64,
    ) -> OffsetResult<NodeIdx> {
        self.push_node(
            parent,
            Node {
                name: name.to_string(),
                offset,
                array: Some(ArrayInfo {
                    dimensions: dimensions.to_vec(),
                    stride,
                }),
                ..Default::default()
            },
        )
    }

    fn push_node(&mut self, parent: NodeIdx, node: Node) -> OffsetResult<NodeIdx> {
        self.node(parent)?;
        let idx = self.node_arena.len();
        self.node_arena.push(node);
        self.node_mut(parent)?.children.push(idx);
        Ok(idx)
    }

    /// Add a register owned by `parent`.
    pub fn add_register(
        &mut self,
        parent: NodeIdx,
        name: &str,
        offset: u64,
    ) -> OffsetResult<RegisterIdx> {
        self.node(parent)?;
        let idx = self.register_arena.len();
        self.register_arena.push(Register {
            name: name.to_string(),
            offset,
        });
        self.node_mut(parent)?.registers.push(idx);
        Ok(idx)
    }

    /// Make an existing node reachable from another parent as well.
    pub fn link_node(&mut self, parent: NodeIdx, child: NodeIdx) -> OffsetResult<()> {
        self.node(child)?;
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Make an existing register owned by another node as well.
    pub fn link_register(&mut self, parent: NodeIdx, register: RegisterIdx) -> OffsetResult<()> {
        self.register(register)?;
        self.node_mut(parent)?.registers.push(register);
        Ok(())
    }

    /// Load a tree description from a `.json` or `.hjson` file.
    pub fn from_file(path: &Path) -> OffsetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("hjson") => Self::from_hjson(&text),
            _ => Self::from_json(&text),
        }
    }

    pub fn from_json(text: &str) -> OffsetResult<Self> {
        let desc: TreeDesc = serde_json::from_str(text)?;
        Self::from_desc(&desc)
    }

    pub fn from_hjson(text: &str) -> OffsetResult<Self> {
        let desc: TreeDesc = serde_hjson::from_str(text)?;
        Self::from_desc(&desc)
    }

    /// Lower a nested description into the arena.
    ///
    /// Aliases must name an id declared earlier in document order.
    pub fn from_desc(desc: &TreeDesc) -> OffsetResult<Self> {
        let mut tree = AddrTree::new(&desc.name).with_alignment(desc.alignment);
        let root = tree.root();
        tree.node_mut(root)?.offset = desc.offset;

        let mut ids = HashMap::new();
        tree.lower_body(root, &desc.registers, &desc.children, &mut ids)?;
        Ok(tree)
    }

    fn lower_body(
        &mut self,
        parent: NodeIdx,
        registers: &[RegisterDesc],
        children: &[ChildDesc],
        ids: &mut HashMap<String, NodeIdx>,
    ) -> OffsetResult<()> {
        for reg in registers {
            self.add_register(parent, &reg.name, reg.offset)?;
        }
        for child in children {
            match child {
                ChildDesc::Alias { alias } => {
                    let target = *ids.get(alias).ok_or_else(|| OffsetError::UnknownAlias {
                        alias: alias.clone(),
                    })?;
                    self.link_node(parent, target)?;
                }
                ChildDesc::Node(node) => {
                    let idx = self.push_node(
                        parent,
                        Node {
                            name: node.name.clone(),
                            offset: node.offset,
                            array: node.array.clone(),
                            ..Default::default()
                        },
                    )?;
                    if let Some(id) = &node.id {
                        if ids.insert(id.clone(), idx).is_some() {
                            return Err(OffsetError::DuplicateId { id: id.clone() });
                        }
                    }
                    self.lower_body(idx, &node.registers, &node.children, ids)?;
                }
            }
        }
        Ok(())
    }
}

//=============================================================================
// Description format
//=============================================================================

fn default_alignment() -> u64 {
    1
}

/// Root of a tree description document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeDesc {
    pub name: String,
    #[serde(default = "default_alignment")]
    pub alignment: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub registers: Vec<RegisterDesc>,
    #[serde(default)]
    pub children: Vec<ChildDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterDesc {
    pub name: String,
    pub offset: u64,
}

/// A child entry: either a new node or a reference to an earlier one.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildDesc {
    Alias { alias: String },
    Node(NodeDesc),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDesc {
    /// Optional handle that later `alias` entries can refer to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<ArrayInfo>,
    #[serde(default)]
    pub registers: Vec<RegisterDesc>,
    #[serde(default)]
    pub children: Vec<ChildDesc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: &str = r#"
{
    "name": "top",
    "alignment": 4,
    "registers": [
        { "name": "CTRL", "offset": 0 },
        { "name": "STATUS", "offset": 4 }
    ],
    "children": [
        {
            "id": "shared",
            "name": "common",
            "offset": 32,
            "registers": [ { "name": "VERSION", "offset": 0 } ]
        },
        {
            "name": "CH",
            "offset": 16,
            "array": { "dimensions": [2], "stride": 8 },
            "registers": [ { "name": "DATA", "offset": 0 } ]
        },
        { "alias": "shared" }
    ]
}
"#;

    #[test]
    fn test_new_tree() {
        let tree = AddrTree::new("top");
        assert_eq!(tree.name(), "top");
        assert_eq!(tree.alignment(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.register_count(), 0);
        assert_eq!(tree.node(tree.root()).unwrap().name, "top");
    }

    #[test]
    fn test_builder() {
        let mut tree = AddrTree::new("top").with_alignment(4);
        let root = tree.root();
        let regs = tree.add_node(root, "regs", 0x100).unwrap();
        let ctrl = tree.add_register(regs, "CTRL", 0x4).unwrap();
        let ch = tree.add_array(root, "CH", 0x200, &[4], 0x10).unwrap();
        tree.link_node(root, regs).unwrap();
        tree.link_register(ch, ctrl).unwrap();

        let root_node = tree.node(root).unwrap();
        assert_eq!(root_node.children, vec![regs, ch, regs]);
        assert!(!tree.node(regs).unwrap().is_array());
        assert_eq!(
            tree.node(ch).unwrap().array,
            Some(ArrayInfo {
                dimensions: vec![4],
                stride: 0x10
            })
        );
        assert_eq!(tree.node(ch).unwrap().registers, vec![ctrl]);
        assert_eq!(tree.register(ctrl).unwrap().offset, 0x4);
    }

    #[test]
    fn test_builder_rejects_unknown_indices() {
        let mut tree = AddrTree::new("top");
        assert!(matches!(
            tree.add_node(7, "x", 0),
            Err(OffsetError::UnknownNode { idx: 7 })
        ));
        assert!(matches!(
            tree.add_register(3, "x", 0),
            Err(OffsetError::UnknownNode { idx: 3 })
        ));
        let root = tree.root();
        assert!(matches!(
            tree.link_register(root, 0),
            Err(OffsetError::UnknownRegister { idx: 0 })
        ));
        // a failed add leaves the arena untouched
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_from_json() {
        let tree = AddrTree::from_json(DESC).unwrap();
        assert_eq!(tree.name(), "top");
        assert_eq!(tree.alignment(), 4);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.register_count(), 4);

        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.registers.len(), 2);
        // the alias points at the same node, not a copy
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0], root.children[2]);

        let ch = tree.node(root.children[1]).unwrap();
        assert_eq!(ch.name, "CH");
        assert_eq!(ch.offset, 16);
        assert!(ch.is_array());
    }

    #[test]
    fn test_from_hjson() {
        let tree = AddrTree::from_hjson(
            r#"
{
  name: top
  registers: [
    {
      name: CTRL
      offset: 0
    }
  ]
}
"#,
        )
        .unwrap();
        assert_eq!(tree.name(), "top");
        assert_eq!(tree.alignment(), 1);
        assert_eq!(tree.register_count(), 1);
    }

    #[test]
    fn test_unknown_alias() {
        let err = AddrTree::from_json(
            r#"{ "name": "top", "children": [ { "alias": "missing" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, OffsetError::UnknownAlias { alias } if alias == "missing"));
    }

    #[test]
    fn test_duplicate_id() {
        let err = AddrTree::from_json(
            r#"{ "name": "top", "children": [
                { "id": "a", "name": "x" },
                { "id": "a", "name": "y" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, OffsetError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            AddrTree::from_json("{ \"registers\": [] }"),
            Err(OffsetError::Json(_))
        ));
    }
}
