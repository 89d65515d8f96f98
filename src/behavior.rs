//! Element behavior table
//!
//! The buffer layout is the same for every element kind; what differs is the
//! layout math. Each element type implements [`Element`] (and [`Container`]
//! when it arranges children) and is registered under its type id. The
//! traversal passes resolve the behavior through [`ElementTable::get`].
//!
//! Behaviors receive borrowed views of the buffers for the duration of one
//! call. They must not allocate and cannot keep the views past the call.

use crate::buffer::ConfigRef;
use crate::error::{LayoutError, Result};
use crate::mesh::Vertex;
use crate::tree::{NodeId, UiNode};
use crate::types::{Constraints, LayoutRect, TypeHash, Vec2};
use std::collections::HashMap;

/// Ordered child configs of the node being processed.
#[derive(Clone, Copy)]
pub struct Children<'a> {
    source: ChildSource<'a>,
}

#[derive(Clone, Copy)]
enum ChildSource<'a> {
    Empty,
    Tree { nodes: &'a [UiNode], ids: &'a [NodeId] },
    Buffers(&'a [&'a [u8]]),
}

impl<'a> Children<'a> {
    pub fn empty() -> Self {
        Self {
            source: ChildSource::Empty,
        }
    }

    pub fn from_tree(nodes: &'a [UiNode], ids: &'a [NodeId]) -> Self {
        Self {
            source: ChildSource::Tree { nodes, ids },
        }
    }

    pub fn from_buffers(buffers: &'a [&'a [u8]]) -> Self {
        Self {
            source: ChildSource::Buffers(buffers),
        }
    }

    pub fn len(&self) -> usize {
        match self.source {
            ChildSource::Empty => 0,
            ChildSource::Tree { ids, .. } => ids.len(),
            ChildSource::Buffers(buffers) => buffers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<ConfigRef<'a>> {
        match self.source {
            ChildSource::Empty => None,
            ChildSource::Tree { nodes, ids } => ids
                .get(index)
                .and_then(|id| nodes.get(*id))
                .map(|node| ConfigRef::new(&node.config)),
            ChildSource::Buffers(buffers) => buffers.get(index).map(|b| ConfigRef::new(b)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ConfigRef<'a>> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }
}

/// Behavior of one element type.
pub trait Element: Send + Sync {
    fn name(&self) -> &str;

    /// Arranging behavior. Terminal elements return `None`.
    fn container(&self) -> Option<&dyn Container> {
        None
    }

    /// Final size of the node, computed after its children were laid out.
    fn size(&self, config: ConfigRef<'_>, children: Children<'_>, extra: &[u8]) -> Vec2;

    /// Quads this node occupies in the mesh, reserved even while hidden.
    fn render_quad_count(&self, _config: ConfigRef<'_>, _extra: &[u8]) -> usize {
        1
    }

    /// Fills `vertices` (exactly `render_quad_count * 4` long) for the node
    /// placed at `rect`.
    fn generate_mesh_data(
        &self,
        config: ConfigRef<'_>,
        rect: LayoutRect,
        vertices: &mut [Vertex],
        extra: &[u8],
    );
}

/// Behavior of elements that arrange children.
pub trait Container: Send + Sync {
    /// Constraints for child `index`. Children before `index` already have
    /// their final size.
    fn constrain(&self, config: ConfigRef<'_>, children: Children<'_>, index: usize) -> Constraints;

    /// Positions of all children relative to this node, one per child.
    fn layout(&self, config: ConfigRef<'_>, children: Children<'_>, positions: &mut [Vec2]);
}

#[derive(Default)]
pub struct ElementTable {
    entries: HashMap<TypeHash, Box<dyn Element>>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, id: TypeHash, element: Box<dyn Element>) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(LayoutError::registry(format!(
                "behavior for element {} ('{}') already registered",
                id,
                element.name()
            )));
        }
        log::debug!(
            "Element behavior '{}' ({}) {}",
            element.name(),
            id,
            if element.container().is_some() { "container" } else { "terminal" }
        );
        self.entries.insert(id, element);
        Ok(())
    }

    pub fn get(&self, id: TypeHash) -> Option<&dyn Element> {
        self.entries.get(&id).map(|e| e.as_ref())
    }

    pub fn require(&self, id: TypeHash) -> Result<&dyn Element> {
        self.get(id).ok_or(LayoutError::MissingBehavior { id: id.0 })
    }

    pub fn is_terminal(&self, id: TypeHash) -> Option<bool> {
        self.get(id).map(|e| e.container().is_none())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer;

    struct Fixed;

    impl Element for Fixed {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn size(&self, _config: ConfigRef<'_>, _children: Children<'_>, _extra: &[u8]) -> Vec2 {
            Vec2::new(1.0, 2.0)
        }

        fn generate_mesh_data(&self, _: ConfigRef<'_>, _: LayoutRect, _: &mut [Vertex], _: &[u8]) {}
    }

    #[test]
    fn test_table_lookup() {
        let mut table = ElementTable::new();
        table.build(TypeHash(7), Box::new(Fixed)).unwrap();
        assert!(table.build(TypeHash(7), Box::new(Fixed)).is_err());

        assert_eq!(table.is_terminal(TypeHash(7)), Some(true));
        assert!(table.get(TypeHash(8)).is_none());
        assert!(matches!(
            table.require(TypeHash(8)),
            Err(LayoutError::MissingBehavior { id: 8 })
        ));
        assert_eq!(table.get(TypeHash(7)).unwrap().render_quad_count(ConfigRef::new(&[]), &[]), 1);
    }

    #[test]
    fn test_children_from_buffers() {
        let mut a = buffer::tests::assemble(1, &[]);
        let b = buffer::tests::assemble(2, &[]);
        buffer::set_size(&mut a, Vec2::new(4.0, 5.0));
        let buffers: [&[u8]; 2] = [&a, &b];

        let children = Children::from_buffers(&buffers);
        assert_eq!(children.len(), 2);
        assert_eq!(children.get(0).unwrap().size(), Vec2::new(4.0, 5.0));
        assert_eq!(children.get(1).unwrap().element(), TypeHash(2));
        assert!(children.get(2).is_none());
        assert_eq!(children.iter().count(), 2);
        assert!(Children::empty().is_empty());
    }
}
