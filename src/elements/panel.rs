use crate::behavior::{Children, Element};
use crate::buffer::ConfigRef;
use crate::mesh::Vertex;
use crate::properties::BuiltinBlocks;
use crate::types::{LayoutRect, Vec2};

/// Terminal rectangle sized by its size block and box model.
pub struct Panel {
    blocks: BuiltinBlocks,
}

impl Panel {
    pub fn new(blocks: BuiltinBlocks) -> Self {
        Self { blocks }
    }
}

impl Element for Panel {
    fn name(&self) -> &str {
        super::BOX
    }

    fn size(&self, config: ConfigRef<'_>, _children: Children<'_>, _extra: &[u8]) -> Vec2 {
        let content = self.blocks.size_block(&config).clamp(Vec2::ZERO);
        let outer = content.add(self.blocks.box_model(&config).insets());
        let constraints = config.constraints();
        Vec2::new(
            outer.x.min(constraints.max_width).max(constraints.min_width),
            outer.y.min(constraints.max_height).max(constraints.min_height),
        )
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
