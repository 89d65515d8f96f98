//! Constrain, layout and size traversal
//!
//! One recursive walk per document. A container hands each child its
//! constraints in order, recurses into it, then positions all children and
//! finally sizes itself from their finished sizes. Hidden subtrees are
//! cleared to zero size and position instead.

use crate::behavior::{Children, ElementTable};
use crate::buffer::{self, ConfigRef};
use crate::error::Result;
use crate::properties::BuiltinBlocks;
use crate::tree::{NodeId, UiDocument};
use crate::types::Vec2;

pub struct LayoutPass<'a> {
    elements: &'a ElementTable,
    blocks: &'a BuiltinBlocks,
}

impl<'a> LayoutPass<'a> {
    pub fn new(elements: &'a ElementTable, blocks: &'a BuiltinBlocks) -> Self {
        Self { elements, blocks }
    }

    /// Seeds the root with the document's constraints and lays out the tree.
    /// Returns the number of nodes that were laid out rather than cleared.
    pub fn run(&self, doc: &mut UiDocument) -> Result<usize> {
        let root = UiDocument::ROOT;
        let constraints = doc.root_constraints();
        let config = &mut doc.nodes_mut()[root].config;
        buffer::set_constraints(config, constraints);
        buffer::set_position(config, Vec2::ZERO);

        if !self.blocks.is_displayed(config) {
            self.clear(doc, root);
            return Ok(0);
        }
        let mut positions = Vec::new();
        self.layout(doc, root, &mut positions)
    }

    fn layout(&self, doc: &mut UiDocument, id: NodeId, positions: &mut Vec<Vec2>) -> Result<usize> {
        let element = self.elements.require(doc.nodes()[id].element())?;
        let child_count = doc.nodes()[id].children.len();
        let mut laid_out = 1;

        if let Some(container) = element.container() {
            for index in 0..child_count {
                let nodes = doc.nodes();
                let node = &nodes[id];
                let child_id = node.children[index];
                let constraints = container.constrain(
                    ConfigRef::new(&node.config),
                    Children::from_tree(nodes, &node.children),
                    index,
                );

                let child = &mut doc.nodes_mut()[child_id];
                buffer::set_constraints(&mut child.config, constraints);
                if self.blocks.is_displayed(&child.config) {
                    laid_out += self.layout(doc, child_id, positions)?;
                } else {
                    self.clear(doc, child_id);
                }
            }

            if child_count > 0 {
                positions.clear();
                positions.resize(child_count, Vec2::ZERO);
                let nodes = doc.nodes();
                let node = &nodes[id];
                container.layout(
                    ConfigRef::new(&node.config),
                    Children::from_tree(nodes, &node.children),
                    positions,
                );

                for (index, position) in positions.iter().enumerate() {
                    let child_id = doc.nodes()[id].children[index];
                    let child = &mut doc.nodes_mut()[child_id];
                    if self.blocks.is_displayed(&child.config) {
                        buffer::set_position(&mut child.config, *position);
                    }
                }
            }

            let nodes = doc.nodes();
            let node = &nodes[id];
            let size = element.size(
                ConfigRef::new(&node.config),
                Children::from_tree(nodes, &node.children),
                &node.extra,
            );
            buffer::set_size(&mut doc.nodes_mut()[id].config, size);
        } else {
            let node = &doc.nodes()[id];
            let size = element.size(ConfigRef::new(&node.config), Children::empty(), &node.extra);
            buffer::set_size(&mut doc.nodes_mut()[id].config, size);
        }

        Ok(laid_out)
    }

    /// Zeroes size and position of a node and everything below it.
    fn clear(&self, doc: &mut UiDocument, id: NodeId) {
        let node = &mut doc.nodes_mut()[id];
        buffer::set_size(&mut node.config, Vec2::ZERO);
        buffer::set_position(&mut node.config, Vec2::ZERO);
        let child_count = node.children.len();
        for index in 0..child_count {
            let child = doc.nodes()[id].children[index];
            self.clear(doc, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UiContext;
    use crate::length::LengthContext;
    use crate::normalize::NormalizePass;
    use crate::types::Constraints;

    fn run(context: &UiContext, doc: &mut UiDocument) -> usize {
        NormalizePass::new(context.registry(), LengthContext::default()).run(doc);
        LayoutPass::new(context.elements(), context.blocks()).run(doc).unwrap()
    }

    #[test]
    fn test_hbox_places_children_with_spacing() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("HBox", &[("spacing", "5px")]).unwrap());
        let a = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("Box", &[("min-width", "10px"), ("min-height", "10px")]).unwrap(),
            )
            .unwrap();
        let b = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("Box", &[("min-width", "20px"), ("min-height", "10px")]).unwrap(),
            )
            .unwrap();

        assert_eq!(run(&context, &mut doc), 3);
        let nodes = doc.nodes();
        assert_eq!(nodes[UiDocument::ROOT].size(), Vec2::new(35.0, 10.0));
        assert_eq!(nodes[a].position(), Vec2::new(0.0, 0.0));
        assert_eq!(nodes[b].position(), Vec2::new(15.0, 0.0));
        assert_eq!(nodes[b].size(), Vec2::new(20.0, 10.0));
    }

    #[test]
    fn test_shelf_constraints_shrink() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("HBox", &[("padding", "2px")]).unwrap());
        doc.set_root_constraints(Constraints::new(0.0, 0.0, 100.0, 50.0));
        doc.add_child(UiDocument::ROOT, builder.build("Box", &[("min-width", "30px")]).unwrap())
            .unwrap();
        let second = doc
            .add_child(UiDocument::ROOT, builder.build("Box", &[("min-width", "90px")]).unwrap())
            .unwrap();

        run(&context, &mut doc);
        let constraints = doc.nodes()[second].constraints();
        assert_eq!(constraints.max_width, 100.0 - 4.0 - 30.0);
        assert_eq!(constraints.max_height, 50.0 - 4.0);
        assert_eq!(doc.nodes()[second].size().x, 66.0);
        assert_eq!(doc.nodes()[second].position(), Vec2::new(32.0, 2.0));
    }

    #[test]
    fn test_vbox_stacks_vertically_with_alignment() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(
            builder
                .build("VBox", &[("spacing", "4px"), ("alignment", "center")])
                .unwrap(),
        );
        let wide = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("Box", &[("min-width", "40px"), ("min-height", "10px")]).unwrap(),
            )
            .unwrap();
        let narrow = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("Box", &[("min-width", "20px"), ("min-height", "6px")]).unwrap(),
            )
            .unwrap();

        run(&context, &mut doc);
        assert_eq!(doc.nodes()[UiDocument::ROOT].size(), Vec2::new(40.0, 20.0));
        assert_eq!(doc.nodes()[wide].position(), Vec2::new(0.0, 0.0));
        assert_eq!(doc.nodes()[narrow].position(), Vec2::new(10.0, 14.0));
    }

    #[test]
    fn test_hidden_subtree_is_cleared() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("HBox", &[("spacing", "5px")]).unwrap());
        let hidden = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("VBox", &[("display", "false"), ("min-width", "50px")]).unwrap(),
            )
            .unwrap();
        let inner = doc
            .add_child(hidden, builder.build("Box", &[("min-width", "10px")]).unwrap())
            .unwrap();
        let shown = doc
            .add_child(UiDocument::ROOT, builder.build("Box", &[("min-width", "10px")]).unwrap())
            .unwrap();

        // Stale values from an earlier frame must be wiped.
        buffer::set_size(&mut doc.node_mut(inner).unwrap().config, Vec2::new(9.0, 9.0));

        assert_eq!(run(&context, &mut doc), 2);
        assert_eq!(doc.nodes()[hidden].size(), Vec2::ZERO);
        assert_eq!(doc.nodes()[inner].size(), Vec2::ZERO);
        assert_eq!(doc.nodes()[inner].position(), Vec2::ZERO);
        assert_eq!(doc.nodes()[shown].position(), Vec2::ZERO);
        assert_eq!(doc.nodes()[UiDocument::ROOT].size().x, 10.0);
    }
}
