//! Single-line text
//!
//! Width is the advance-width sum of the glyphs at the font size, height the
//! font size. The mesh is one background quad followed by one quad per
//! character.

use crate::behavior::{Children, Element};
use crate::buffer::ConfigRef;
use crate::extra_data::{self, TextRef};
use crate::fonts::FontLibrary;
use crate::mesh::{self, UvChannel, Vertex};
use crate::properties::BuiltinBlocks;
use crate::types::{Color, LayoutRect, Vec2, VERTICES_PER_QUAD};
use std::sync::Arc;

pub struct TextElement {
    blocks: BuiltinBlocks,
    fonts: Arc<FontLibrary>,
}

impl TextElement {
    pub fn new(blocks: BuiltinBlocks, fonts: Arc<FontLibrary>) -> Self {
        Self { blocks, fonts }
    }

    fn text<'e>(&self, config: &ConfigRef<'_>, extra: &'e [u8]) -> Option<TextRef<'e>> {
        let block = self.blocks.text_block(config)?;
        extra_data::read_text(extra, block.extra_data_offset)
    }
}

impl Element for TextElement {
    fn name(&self) -> &str {
        super::TEXT
    }

    fn size(&self, config: ConfigRef<'_>, _children: Children<'_>, extra: &[u8]) -> Vec2 {
        let font = self.blocks.font_block(&config);
        let font_size = font.size.real_value;
        let width = match (self.text(&config, extra), self.fonts.face(font.face)) {
            (Some(text), Some(face)) => face.measure(text.as_str(), font_size),
            _ => 0.0,
        };
        Vec2::new(width, font_size)
    }

    fn render_quad_count(&self, config: ConfigRef<'_>, extra: &[u8]) -> usize {
        match self.text(&config, extra) {
            Some(text) if !text.as_str().is_empty() => text.chars().count() + 1,
            _ => 0,
        }
    }

    fn generate_mesh_data(
        &self,
        config: ConfigRef<'_>,
        rect: LayoutRect,
        vertices: &mut [Vertex],
        extra: &[u8],
    ) {
        let Some(text) = self.text(&config, extra) else {
            mesh::clear_vertices(vertices);
            return;
        };
        let Some((background, glyphs)) = vertices.split_first_chunk_mut::<VERTICES_PER_QUAD>() else {
            return;
        };

        match self.blocks.background_block(&config) {
            Some(block) => {
                mesh::write_quad(background, rect, block.image, UvChannel::Background, block.color)
            }
            None => mesh::write_quad(background, rect, [0.0; 4], UvChannel::Background, Color::TRANSPARENT),
        }

        let font = self.blocks.font_block(&config);
        let Some(face) = self.fonts.face(font.face) else {
            mesh::clear_vertices(glyphs);
            return;
        };
        let scale = face.scale_for(font.size.real_value);
        let baseline = rect.min.y + face.ascent * scale;
        let mut cursor = rect.min.x;

        for (ch, quad) in text.chars().zip(glyphs.chunks_exact_mut(VERTICES_PER_QUAD)) {
            let glyph = face.glyph(ch);
            let min = Vec2::new(cursor + glyph.bearing.x * scale, baseline - glyph.bearing.y * scale);
            let max = Vec2::new(min.x + glyph.size.x * scale, min.y + glyph.size.y * scale);
            mesh::write_quad(
                quad,
                LayoutRect::new(min, max),
                face.glyph_uv(&glyph),
                UvChannel::Foreground,
                font.color,
            );
            cursor += (glyph.bearing.x + glyph.advance) * scale;
        }
    }
}
