//! Node tree of one root
//!
//! A document owns every node below a single root. Nodes live in an arena and
//! children are only ever appended to existing nodes, so the tree cannot
//! contain cycles. Separate documents share no buffers and can be processed on
//! different threads.

use crate::buffer::{self, ConfigRef};
use crate::builder::NodeConfig;
use crate::error::{LayoutError, Result};
use crate::types::{Constraints, TypeHash, Vec2};

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct UiNode {
    pub name: Option<String>,
    pub config: Vec<u8>,
    pub extra: Vec<u8>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Filled by the quad count pass.
    pub render_quad_count: usize,
}

impl UiNode {
    fn from_config(node: NodeConfig, parent: Option<NodeId>) -> Self {
        Self {
            name: node.name,
            config: node.config,
            extra: node.extra,
            children: Vec::new(),
            parent,
            render_quad_count: 0,
        }
    }

    pub fn element(&self) -> TypeHash {
        buffer::element(&self.config)
    }

    pub fn size(&self) -> Vec2 {
        buffer::size(&self.config)
    }

    pub fn position(&self) -> Vec2 {
        buffer::position(&self.config)
    }

    pub fn constraints(&self) -> Constraints {
        buffer::constraints(&self.config)
    }
}

#[derive(Debug, Clone)]
pub struct UiDocument {
    nodes: Vec<UiNode>,
    root_constraints: Constraints,
    total_render_quad_count: usize,
}

impl UiDocument {
    pub const ROOT: NodeId = 0;

    pub fn new(root: NodeConfig) -> Self {
        Self {
            nodes: vec![UiNode::from_config(root, None)],
            root_constraints: Constraints::unbounded(),
            total_render_quad_count: 0,
        }
    }

    pub fn add_child(&mut self, parent: NodeId, node: NodeConfig) -> Result<NodeId> {
        if parent >= self.nodes.len() {
            return Err(LayoutError::invalid_format(format!(
                "parent node {} does not exist",
                parent
            )));
        }
        let id = self.nodes.len();
        self.nodes.push(UiNode::from_config(node, Some(parent)));
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&UiNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut UiNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[UiNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [UiNode] {
        &mut self.nodes
    }

    pub fn config(&self, id: NodeId) -> ConfigRef<'_> {
        ConfigRef::new(&self.nodes[id].config)
    }

    /// First node with the given name, in creation order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
    }

    pub fn root_constraints(&self) -> Constraints {
        self.root_constraints
    }

    pub fn set_root_constraints(&mut self, constraints: Constraints) {
        self.root_constraints = constraints;
    }

    pub fn total_node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn total_render_quad_count(&self) -> usize {
        self.total_render_quad_count
    }

    pub(crate) fn set_total_render_quad_count(&mut self, count: usize) {
        self.total_render_quad_count = count;
    }

    /// Absolute position of a node: the sum of positions up to the root.
    pub fn absolute_position(&self, id: NodeId) -> Vec2 {
        let mut position = Vec2::ZERO;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            position = position.add(node.position());
            current = node.parent;
        }
        position
    }

    /// Node ids in depth-first pre-order, the order the render pass uses.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NodeConfig {
        NodeConfig {
            name: Some(name.to_string()),
            config: buffer::tests::assemble(1, &[]),
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_tree_structure() {
        let mut doc = UiDocument::new(node("root"));
        let a = doc.add_child(UiDocument::ROOT, node("a")).unwrap();
        let b = doc.add_child(UiDocument::ROOT, node("b")).unwrap();
        let a1 = doc.add_child(a, node("a1")).unwrap();

        assert_eq!(doc.total_node_count(), 4);
        assert_eq!(doc.node(UiDocument::ROOT).unwrap().children, vec![a, b]);
        assert_eq!(doc.node(a1).unwrap().parent, Some(a));
        assert_eq!(doc.pre_order(), vec![0, a, a1, b]);
        assert_eq!(doc.depth(a1), 2);
        assert_eq!(doc.find("b"), Some(b));
        assert!(doc.add_child(42, node("x")).is_err());
    }

    #[test]
    fn test_absolute_position() {
        let mut doc = UiDocument::new(node("root"));
        let a = doc.add_child(UiDocument::ROOT, node("a")).unwrap();
        let a1 = doc.add_child(a, node("a1")).unwrap();
        buffer::set_position(&mut doc.node_mut(UiDocument::ROOT).unwrap().config, Vec2::new(1.0, 1.0));
        buffer::set_position(&mut doc.node_mut(a).unwrap().config, Vec2::new(2.0, 3.0));
        buffer::set_position(&mut doc.node_mut(a1).unwrap().config, Vec2::new(4.0, 5.0));
        assert_eq!(doc.absolute_position(a1), Vec2::new(7.0, 9.0));
    }
}
