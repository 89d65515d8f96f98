//! Built-in elements

mod panel;
mod stack;
mod text;

pub use panel::Panel;
pub use stack::{Axis, Stack};
pub use text::TextElement;

use crate::behavior::ElementTable;
use crate::buffer::ConfigRef;
use crate::error::Result;
use crate::fonts::FontLibrary;
use crate::mesh::{self, UvChannel, Vertex};
use crate::properties::BuiltinBlocks;
use crate::registry::TypeRegistry;
use crate::types::{Color, LayoutRect, TypeHash};
use std::sync::Arc;

pub const HBOX: &str = "HBox";
pub const VBOX: &str = "VBox";
pub const BOX: &str = "Box";
pub const TEXT: &str = "Text";

pub fn register_builtin_elements(
    registry: &mut TypeRegistry,
    table: &mut ElementTable,
    blocks: BuiltinBlocks,
    fonts: Arc<FontLibrary>,
) -> Result<()> {
    let container_blocks = [
        (blocks.box_model, true),
        (blocks.border, true),
        (blocks.layout_box, true),
        (blocks.size, true),
        (blocks.background, false),
    ];
    for (name, axis) in [(HBOX, Axis::Horizontal), (VBOX, Axis::Vertical)] {
        let id = TypeHash::of(name);
        registry.register_element(id, name, &container_blocks)?;
        table.build(id, Box::new(Stack::new(name, axis, blocks)))?;
    }

    let id = TypeHash::of(BOX);
    registry.register_element(
        id,
        BOX,
        &[
            (blocks.box_model, true),
            (blocks.border, true),
            (blocks.size, true),
            (blocks.background, false),
        ],
    )?;
    table.build(id, Box::new(Panel::new(blocks)))?;

    let id = TypeHash::of(TEXT);
    registry.register_element(
        id,
        TEXT,
        &[(blocks.text, true), (blocks.font, true), (blocks.background, false)],
    )?;
    table.build(id, Box::new(TextElement::new(blocks, fonts)))?;
    Ok(())
}

/// One quad over the node's rect inside its margins, painted with the
/// background block when it is enabled.
pub(crate) fn generate_box_mesh(
    blocks: &BuiltinBlocks,
    config: ConfigRef<'_>,
    rect: LayoutRect,
    vertices: &mut [Vertex],
) {
    let model = blocks.box_model(&config);
    let inner = model.inside_margin(rect);
    match blocks.background_block(&config) {
        Some(background) => mesh::write_quad(
            vertices,
            inner,
            background.image,
            UvChannel::Background,
            background.color,
        ),
        None => mesh::write_quad(vertices, inner, [0.0; 4], UvChannel::Background, Color::TRANSPARENT),
    }
}
