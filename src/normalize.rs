//! Per-frame length normalization
//!
//! Walks a document pre-order and recomputes the cached pixel value of every
//! registered length field from its raw value and unit. Parents are finished
//! before their children, so percentages that reference the parent read this
//! frame's value.

use crate::buffer;
use crate::length::{Length, LengthContext};
use crate::registry::{LengthInfo, ReferenceTarget, TypeRegistry};
use crate::tree::{NodeId, UiDocument, UiNode};
use crate::types::{BLOCK_SECTION_OFFSET, LENGTH_VALUE_SIZE};

/// Resolution order when a field allows more than one reference target.
const TARGET_PRIORITY: [ReferenceTarget; 3] =
    [ReferenceTarget::SELF, ReferenceTarget::PARENT, ReferenceTarget::ROOT];

pub struct NormalizePass<'a> {
    registry: &'a TypeRegistry,
    context: LengthContext,
}

impl<'a> NormalizePass<'a> {
    pub fn new(registry: &'a TypeRegistry, context: LengthContext) -> Self {
        Self { registry, context }
    }

    /// Normalizes the whole document and returns how many length fields
    /// were written.
    pub fn run(&self, doc: &mut UiDocument) -> usize {
        self.visit(doc, UiDocument::ROOT)
    }

    fn visit(&self, doc: &mut UiDocument, id: NodeId) -> usize {
        let mut count = self.normalize_node(doc, id);
        let child_count = doc.nodes()[id].children.len();
        for index in 0..child_count {
            let child = doc.nodes()[id].children[index];
            count += self.visit(doc, child);
        }
        count
    }

    fn normalize_node(&self, doc: &mut UiDocument, id: NodeId) -> usize {
        let parent = doc.nodes()[id].parent;
        let supported = match parent {
            Some(_) => ReferenceTarget::SELF | ReferenceTarget::PARENT | ReferenceTarget::ROOT,
            None => ReferenceTarget::SELF | ReferenceTarget::ROOT,
        };

        // Taken out so the rest of the tree stays readable while this buffer
        // is written.
        let mut config = std::mem::take(&mut doc.nodes_mut()[id].config);
        let nodes = doc.nodes();
        let mut count = 0;

        let mut offset = BLOCK_SECTION_OFFSET;
        for _ in 0..buffer::block_count(&config) {
            if offset + crate::types::BLOCK_HEADER_SIZE > config.len() {
                break;
            }
            let header = buffer::read_block_header(&config, offset);
            let payload_end = header.payload_offset() + header.payload_len();

            for info in self.registry.length_infos(header.hash) {
                let start = header.payload_offset() + info.property.offset;
                if start + LENGTH_VALUE_SIZE > payload_end || payload_end > config.len() {
                    continue;
                }
                let relative_to = self.relative_to(info, supported, &config, nodes, parent);
                let length = Length::read(&config[start..]);
                let real_value = length.normalize(&self.context.with_relative_to(relative_to));
                Length::write_real_value(&mut config[start..], real_value);
                count += 1;
            }
            offset = header.next_offset();
        }

        doc.nodes_mut()[id].config = config;
        count
    }

    /// Cached value of the field's reference property on the first permitted
    /// target node. Zero when there is no reference or no permitted target.
    fn relative_to(
        &self,
        info: &LengthInfo,
        supported: ReferenceTarget,
        own: &[u8],
        nodes: &[UiNode],
        parent: Option<NodeId>,
    ) -> f32 {
        let Some(reference) = info.reference else {
            return 0.0;
        };
        let Some(target) = TARGET_PRIORITY
            .into_iter()
            .find(|target| info.target.contains(*target) && supported.contains(*target))
        else {
            return 0.0;
        };

        let source = if target == ReferenceTarget::SELF {
            Some(own)
        } else if target == ReferenceTarget::PARENT {
            parent.and_then(|p| nodes.get(p)).map(|n| n.config.as_slice())
        } else if parent.is_none() {
            // The root is its own root.
            Some(own)
        } else {
            nodes.get(UiDocument::ROOT).map(|n| n.config.as_slice())
        };

        source
            .and_then(|bytes| buffer::get_property_unchecked(bytes, &reference))
            .map(Length::read_real_value)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UiContext;
    use crate::types::Vec2;

    fn real(doc: &UiDocument, context: &UiContext, id: NodeId, name: &str) -> f32 {
        let property = context.registry().lookup_property(name).unwrap();
        let bytes = buffer::get_property_unchecked(&doc.nodes()[id].config, &property).unwrap();
        Length::read_real_value(bytes)
    }

    #[test]
    fn test_percent_resolves_against_parent() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("HBox", &[("max-width", "200px")]).unwrap());
        let child = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("Box", &[("min-width", "50%"), ("max-width", "25%")]).unwrap(),
            )
            .unwrap();

        let pass = NormalizePass::new(context.registry(), LengthContext::default());
        assert!(pass.run(&mut doc) > 0);
        assert_eq!(real(&doc, &context, child, "min-width"), 100.0);
        assert_eq!(real(&doc, &context, child, "max-width"), 50.0);
    }

    #[test]
    fn test_percent_at_root_is_zero() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("Box", &[("min-width", "50%")]).unwrap());

        NormalizePass::new(context.registry(), LengthContext::default()).run(&mut doc);
        assert_eq!(real(&doc, &context, UiDocument::ROOT, "min-width"), 0.0);
        assert!(real(&doc, &context, UiDocument::ROOT, "max-width").is_infinite());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("VBox", &[("padding", "1in 10vw")]).unwrap());
        doc.add_child(UiDocument::ROOT, builder.build("Box", &[("margin", "2pt")]).unwrap())
            .unwrap();

        let settings = LengthContext {
            pixel_scale: 2.0,
            viewport_size: Vec2::new(1000.0, 500.0),
            ..LengthContext::default()
        };
        let pass = NormalizePass::new(context.registry(), settings);
        pass.run(&mut doc);
        let first: Vec<Vec<u8>> = doc.nodes().iter().map(|n| n.config.clone()).collect();
        pass.run(&mut doc);
        let second: Vec<Vec<u8>> = doc.nodes().iter().map(|n| n.config.clone()).collect();
        assert_eq!(first, second);

        assert_eq!(real(&doc, &context, UiDocument::ROOT, "padding-top"), 192.0);
        assert_eq!(real(&doc, &context, UiDocument::ROOT, "padding-right"), 200.0);
    }
}
