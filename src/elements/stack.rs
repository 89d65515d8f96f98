//! Horizontal and vertical box containers
//!
//! Children are placed one after another along the main axis with the
//! layout block's spacing between them. Constraints shrink along the main
//! axis as earlier siblings take their space. Hidden children take neither
//! space nor spacing.

use crate::behavior::{Children, Container, Element};
use crate::buffer::ConfigRef;
use crate::mesh::Vertex;
use crate::properties::BuiltinBlocks;
use crate::types::{Constraints, LayoutRect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn main(self, v: Vec2) -> f32 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    fn cross(self, v: Vec2) -> f32 {
        match self {
            Axis::Horizontal => v.y,
            Axis::Vertical => v.x,
        }
    }

    fn compose(self, main: f32, cross: f32) -> Vec2 {
        match self {
            Axis::Horizontal => Vec2::new(main, cross),
            Axis::Vertical => Vec2::new(cross, main),
        }
    }
}

pub struct Stack {
    name: String,
    axis: Axis,
    blocks: BuiltinBlocks,
}

impl Stack {
    pub fn new(name: &str, axis: Axis, blocks: BuiltinBlocks) -> Self {
        Self {
            name: name.to_string(),
            axis,
            blocks,
        }
    }

    fn spacing(&self, config: &ConfigRef<'_>) -> f32 {
        self.blocks.layout_box_block(config).spacing.real_value
    }

    fn displayed<'c>(&self, children: Children<'c>) -> impl Iterator<Item = ConfigRef<'c>> + 'c {
        let blocks = self.blocks;
        (0..children.len())
            .filter_map(move |index| children.get(index))
            .filter(move |child| blocks.is_displayed(child.bytes()))
    }

    /// Summed main-axis extent of the displayed children, with spacing, and
    /// the largest cross-axis extent.
    fn used_space(&self, config: &ConfigRef<'_>, children: Children<'_>) -> Vec2 {
        let spacing = self.spacing(config);
        let mut main = 0.0;
        let mut cross: f32 = 0.0;
        let mut count = 0;
        for child in self.displayed(children) {
            let size = child.size();
            main += self.axis.main(size);
            cross = cross.max(self.axis.cross(size));
            count += 1;
        }
        if count > 1 {
            main += spacing * (count - 1) as f32;
        }
        self.axis.compose(main, cross)
    }

    fn content_size(&self, config: &ConfigRef<'_>, children: Children<'_>) -> Vec2 {
        self.blocks
            .size_block(config)
            .clamp(self.used_space(config, children))
    }
}

impl Element for Stack {
    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn size(&self, config: ConfigRef<'_>, children: Children<'_>, _extra: &[u8]) -> Vec2 {
        let insets = self.blocks.box_model(&config).insets();
        self.content_size(&config, children).add(insets)
    }

    fn generate_mesh_data(
        &self,
        config: ConfigRef<'_>,
        rect: LayoutRect,
        vertices: &mut [Vertex],
        _extra: &[u8],
    ) {
        super::generate_box_mesh(&self.blocks, config, rect, vertices);
    }
}

impl Container for Stack {
    fn constrain(&self, config: ConfigRef<'_>, children: Children<'_>, index: usize) -> Constraints {
        let constraints = config.constraints();
        let max = Vec2::new(constraints.max_width, constraints.max_height);
        let insets = self.blocks.box_model(&config).insets();
        let spacing = self.spacing(&config);

        let mut main = self.axis.main(max) - self.axis.main(insets);
        let cross = self.axis.cross(max) - self.axis.cross(insets);
        for position in 0..index.min(children.len()) {
            let Some(sibling) = children.get(position) else {
                continue;
            };
            if !self.blocks.is_displayed(sibling.bytes()) {
                continue;
            }
            main = (main - (self.axis.main(sibling.size()) + spacing)).max(0.0);
        }

        let available = self.axis.compose(main.max(0.0), cross.max(0.0));
        Constraints::new(0.0, 0.0, available.x, available.y)
    }

    fn layout(&self, config: ConfigRef<'_>, children: Children<'_>, positions: &mut [Vec2]) {
        let model = self.blocks.box_model(&config);
        let layout = self.blocks.layout_box_block(&config);
        let spacing = layout.spacing.real_value;
        let origin = model.content_origin();

        let used = self.used_space(&config, children);
        let content = self.blocks.size_block(&config).clamp(used);
        let (main_offset, cross_extent) = match self.axis {
            Axis::Horizontal => (
                layout.alignment.horizontal_offset(content.x, used.x),
                content.y,
            ),
            Axis::Vertical => (
                layout.alignment.vertical_offset(content.y, used.y),
                content.x,
            ),
        };

        let mut cursor = main_offset;
        for (index, slot) in positions.iter_mut().enumerate() {
            let Some(child) = children.get(index) else {
                break;
            };
            if !self.blocks.is_displayed(child.bytes()) {
                *slot = origin;
                continue;
            }
            let size = child.size();
            let cross_offset = match self.axis {
                Axis::Horizontal => layout.alignment.vertical_offset(cross_extent, size.y),
                Axis::Vertical => layout.alignment.horizontal_offset(cross_extent, size.x),
            };
            *slot = origin.add(self.axis.compose(cursor, cross_offset));
            cursor += self.axis.main(size) + spacing;
        }
    }
}
