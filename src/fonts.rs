//! Glyph metrics for advance-width text layout

use crate::types::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Glyph {
    pub advance: f32,
    pub bearing: Vec2,
    pub size: Vec2,
    /// Atlas rectangle in pixels: x, y, width, height.
    pub atlas_rect: [f32; 4],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontFace {
    pub name: String,
    pub line_height: f32,
    pub ascent: f32,
    /// Extra face-wide scale applied on top of font-size / line-height.
    pub scale: f32,
    pub atlas_size: Vec2,
    pub glyphs: HashMap<char, Glyph>,
}

impl FontFace {
    /// Every printable ASCII glyph with the same advance, laid out in a
    /// 16-column atlas. Useful as a stand-in when no baked font is present.
    pub fn monospace(name: &str, advance: f32, line_height: f32) -> Self {
        let mut glyphs = HashMap::new();
        for (index, ch) in (' '..='~').enumerate() {
            let column = (index % 16) as f32;
            let row = (index / 16) as f32;
            glyphs.insert(
                ch,
                Glyph {
                    advance,
                    bearing: Vec2::new(0.0, line_height * 0.8),
                    size: Vec2::new(advance, line_height),
                    atlas_rect: [column * advance, row * line_height, advance, line_height],
                },
            );
        }
        Self {
            name: name.to_string(),
            line_height,
            ascent: line_height * 0.8,
            scale: 1.0,
            atlas_size: Vec2::new(advance * 16.0, line_height * 6.0),
            glyphs,
        }
    }

    /// Unknown characters lay out as an empty glyph.
    pub fn glyph(&self, ch: char) -> Glyph {
        self.glyphs.get(&ch).copied().unwrap_or_default()
    }

    /// Pixels per font unit at the given font size.
    pub fn scale_for(&self, font_size: f32) -> f32 {
        if self.line_height <= 0.0 {
            return 0.0;
        }
        font_size / self.line_height * self.scale
    }

    /// Width of a run of text: sum of bearing plus advance, scaled.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        let scale = self.scale_for(font_size);
        text.chars()
            .map(|ch| {
                let glyph = self.glyph(ch);
                (glyph.bearing.x + glyph.advance) * scale
            })
            .sum()
    }

    /// Normalized atlas coordinates `(u0, v0, u1, v1)` of a glyph.
    pub fn glyph_uv(&self, glyph: &Glyph) -> [f32; 4] {
        if self.atlas_size.x <= 0.0 || self.atlas_size.y <= 0.0 {
            return [0.0; 4];
        }
        let [x, y, w, h] = glyph.atlas_rect;
        [
            x / self.atlas_size.x,
            y / self.atlas_size.y,
            (x + w) / self.atlas_size.x,
            (y + h) / self.atlas_size.y,
        ]
    }
}

/// Font faces addressed by the id stored in the font block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontLibrary {
    faces: HashMap<u32, FontFace>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with face 0 set to an 8x16 monospace face.
    pub fn with_default_face() -> Self {
        let mut library = Self::new();
        library.insert(0, FontFace::monospace("monospace", 8.0, 16.0));
        library
    }

    pub fn insert(&mut self, id: u32, face: FontFace) -> Option<FontFace> {
        self.faces.insert(id, face)
    }

    pub fn face(&self, id: u32) -> Option<&FontFace> {
        self.faces.get(&id)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}
