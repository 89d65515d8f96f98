//! Built-in property blocks
//!
//! Each block is a packed struct inside a node's config buffer. The
//! definitions below name the fields for the builder and the registry; the
//! decoders read a block payload back into plain values for the elements.

use crate::buffer::ConfigRef;
use crate::error::Result;
use crate::length::Length;
use crate::registry::{
    BlockDefinition, FieldDefinition, Property, ReferenceTarget, TypeRegistry, ValueKind,
};
use crate::types::*;
use byteorder::{ByteOrder, NativeEndian};

pub const DISPLAY_BLOCK: &str = "DisplayConfigBlock";
pub const BOX_BLOCK: &str = "BoxConfigBlock";
pub const BORDER_BLOCK: &str = "BorderConfigBlock";
pub const LAYOUT_BOX_BLOCK: &str = "LayoutBoxConfigBlock";
pub const SIZE_BLOCK: &str = "SizeConfigBlock";
pub const BACKGROUND_BLOCK: &str = "BackgroundConfigBlock";
pub const TEXT_BLOCK: &str = "TextConfigBlock";
pub const FONT_BLOCK: &str = "FontConfigBlock";

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];
const CORNERS: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];
const QUAD: usize = LENGTH_VALUE_SIZE * 4;
const PAIR: usize = LENGTH_VALUE_SIZE * 2;

pub const DISPLAY_VISIBLE_BIT: u8 = 1 << 0;
pub const DISPLAY_DISPLAY_BIT: u8 = 1 << 1;

pub fn display_definition() -> BlockDefinition {
    BlockDefinition::new(DISPLAY_BLOCK, 1).global().field(
        FieldDefinition::new("flags", 0, ValueKind::Flags)
            .parts(&["visible", "display"], false)
            .default_value("true"),
    )
}

pub fn box_definition() -> BlockDefinition {
    BlockDefinition::new(BOX_BLOCK, QUAD * 2)
        .field(
            FieldDefinition::new("margin", 0, ValueKind::LengthQuad)
                .parts(&SIDES, false)
                .default_value("0px"),
        )
        .field(
            FieldDefinition::new("padding", QUAD, ValueKind::LengthQuad)
                .parts(&SIDES, false)
                .default_value("0px"),
        )
}

pub fn border_definition() -> BlockDefinition {
    BlockDefinition::new(BORDER_BLOCK, QUAD * 2 + COLOR_VALUE_SIZE * 4 + 4)
        .prefix("border")
        .field(
            FieldDefinition::new("width", 0, ValueKind::LengthQuad)
                .parts(&SIDES, true)
                .default_value("0px"),
        )
        .field(
            FieldDefinition::new("radius", QUAD, ValueKind::LengthQuad)
                .parts(&CORNERS, true)
                .default_value("0px"),
        )
        .field(
            FieldDefinition::new("color", QUAD * 2, ValueKind::ColorQuad)
                .parts(&SIDES, true)
                .default_value("transparent"),
        )
        .field(
            FieldDefinition::new("radius-factor", QUAD * 2 + COLOR_VALUE_SIZE * 4, ValueKind::Float)
                .default_value("1"),
        )
}

pub fn layout_box_definition() -> BlockDefinition {
    BlockDefinition::new(LAYOUT_BOX_BLOCK, LENGTH_VALUE_SIZE + 1)
        .field(FieldDefinition::new("spacing", 0, ValueKind::Length).default_value("0px"))
        .field(
            FieldDefinition::new("alignment", LENGTH_VALUE_SIZE, ValueKind::Alignment)
                .default_value("top-left"),
        )
}

pub fn size_definition() -> BlockDefinition {
    BlockDefinition::new(SIZE_BLOCK, PAIR * 2)
        .field(
            FieldDefinition::new("width", 0, ValueKind::LengthPair)
                .parts(&["min", "max"], true)
                .default_value("0px Infinity")
                .reference("max-width", ReferenceTarget::PARENT),
        )
        .field(
            FieldDefinition::new("height", PAIR, ValueKind::LengthPair)
                .parts(&["min", "max"], true)
                .default_value("0px Infinity")
                .reference("max-height", ReferenceTarget::PARENT),
        )
}

pub fn background_definition() -> BlockDefinition {
    BlockDefinition::new(BACKGROUND_BLOCK, 16 + COLOR_VALUE_SIZE)
        .prefix("background")
        .field(FieldDefinition::new("image", 0, ValueKind::Float4).default_value("0 0 0 0"))
        .field(FieldDefinition::new("color", 16, ValueKind::Color).default_value("transparent"))
}

pub fn text_definition() -> BlockDefinition {
    BlockDefinition::new(TEXT_BLOCK, 8).field(FieldDefinition::new("text", 0, ValueKind::Text))
}

pub fn font_definition() -> BlockDefinition {
    BlockDefinition::new(FONT_BLOCK, 4 + LENGTH_VALUE_SIZE + COLOR_VALUE_SIZE)
        .prefix("font")
        .field(FieldDefinition::new("face", 0, ValueKind::UInt).default_value("0"))
        .field(FieldDefinition::new("size", 4, ValueKind::Length).default_value("16px"))
        .field(
            FieldDefinition::new("color", 4 + LENGTH_VALUE_SIZE, ValueKind::Color)
                .default_value("#000000"),
        )
}

/// Ids and well-known properties of the built-in blocks, hashed once.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinBlocks {
    pub display: TypeHash,
    pub box_model: TypeHash,
    pub border: TypeHash,
    pub layout_box: TypeHash,
    pub size: TypeHash,
    pub background: TypeHash,
    pub text: TypeHash,
    pub font: TypeHash,
    pub visible: Property,
    pub display_flag: Property,
}

impl BuiltinBlocks {
    pub fn new() -> Self {
        let display = TypeHash::of(DISPLAY_BLOCK);
        Self {
            display,
            box_model: TypeHash::of(BOX_BLOCK),
            border: TypeHash::of(BORDER_BLOCK),
            layout_box: TypeHash::of(LAYOUT_BOX_BLOCK),
            size: TypeHash::of(SIZE_BLOCK),
            background: TypeHash::of(BACKGROUND_BLOCK),
            text: TypeHash::of(TEXT_BLOCK),
            font: TypeHash::of(FONT_BLOCK),
            visible: Property::bit(display, 0, 1, 0),
            display_flag: Property::bit(display, 0, 1, 1),
        }
    }

    pub fn definitions() -> Vec<BlockDefinition> {
        vec![
            display_definition(),
            box_definition(),
            border_definition(),
            layout_box_definition(),
            size_definition(),
            background_definition(),
            text_definition(),
            font_definition(),
        ]
    }

    pub fn register(registry: &mut TypeRegistry) -> Result<Self> {
        for definition in Self::definitions() {
            registry.define_block(&definition)?;
        }
        Ok(Self::new())
    }

    /// `(visible, display)`; both true when the block is missing.
    pub fn display_flags(&self, config: &[u8]) -> (bool, bool) {
        match crate::buffer::get_property_block(config, self.display, false) {
            Some(payload) if !payload.is_empty() => (
                payload[0] & DISPLAY_VISIBLE_BIT != 0,
                payload[0] & DISPLAY_DISPLAY_BIT != 0,
            ),
            _ => (true, true),
        }
    }

    pub fn is_displayed(&self, config: &[u8]) -> bool {
        self.display_flags(config).1
    }

    pub fn box_block(&self, config: &ConfigRef<'_>) -> BoxBlock {
        config.block(self.box_model).map(BoxBlock::decode).unwrap_or_default()
    }

    pub fn border_block(&self, config: &ConfigRef<'_>) -> BorderBlock {
        config.block(self.border).map(BorderBlock::decode).unwrap_or_default()
    }

    pub fn layout_box_block(&self, config: &ConfigRef<'_>) -> LayoutBoxBlock {
        config.block(self.layout_box).map(LayoutBoxBlock::decode).unwrap_or_default()
    }

    pub fn size_block(&self, config: &ConfigRef<'_>) -> SizeBlock {
        config.block(self.size).map(SizeBlock::decode).unwrap_or_default()
    }

    /// Only when the optional block is enabled.
    pub fn background_block(&self, config: &ConfigRef<'_>) -> Option<BackgroundBlock> {
        config.block(self.background).map(BackgroundBlock::decode)
    }

    pub fn text_block(&self, config: &ConfigRef<'_>) -> Option<TextBlock> {
        config.block(self.text).map(TextBlock::decode)
    }

    pub fn font_block(&self, config: &ConfigRef<'_>) -> FontBlock {
        config.block(self.font).map(FontBlock::decode).unwrap_or_default()
    }

    /// Margin, padding and border widths of a node.
    pub fn box_model(&self, config: &ConfigRef<'_>) -> BoxModel {
        BoxModel::new(&self.box_block(config), &self.border_block(config))
    }
}

impl Default for BuiltinBlocks {
    fn default() -> Self {
        Self::new()
    }
}

fn read_length_quad(bytes: &[u8]) -> [Length; 4] {
    [
        Length::read(&bytes[0..]),
        Length::read(&bytes[LENGTH_VALUE_SIZE..]),
        Length::read(&bytes[LENGTH_VALUE_SIZE * 2..]),
        Length::read(&bytes[LENGTH_VALUE_SIZE * 3..]),
    ]
}

fn read_length_pair(bytes: &[u8]) -> [Length; 2] {
    [Length::read(&bytes[0..]), Length::read(&bytes[LENGTH_VALUE_SIZE..])]
}

fn real_values(lengths: &[Length; 4]) -> [f32; 4] {
    [
        lengths[0].real_value,
        lengths[1].real_value,
        lengths[2].real_value,
        lengths[3].real_value,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxBlock {
    pub margin: [Length; 4],
    pub padding: [Length; 4],
}

impl BoxBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            margin: read_length_quad(&bytes[0..]),
            padding: read_length_quad(&bytes[QUAD..]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderBlock {
    pub width: [Length; 4],
    pub radius: [Length; 4],
    pub color: [Color; 4],
    pub radius_factor: f32,
}

impl BorderBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        let colors = &bytes[QUAD * 2..];
        Self {
            width: read_length_quad(&bytes[0..]),
            radius: read_length_quad(&bytes[QUAD..]),
            color: [
                Color::from_bytes(&colors[0..]),
                Color::from_bytes(&colors[4..]),
                Color::from_bytes(&colors[8..]),
                Color::from_bytes(&colors[12..]),
            ],
            radius_factor: NativeEndian::read_f32(&bytes[QUAD * 2 + COLOR_VALUE_SIZE * 4..]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutBoxBlock {
    pub spacing: Length,
    pub alignment: Alignment,
}

impl LayoutBoxBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            spacing: Length::read(bytes),
            alignment: Alignment::from_byte(bytes[LENGTH_VALUE_SIZE]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBlock {
    pub width: [Length; 2],
    pub height: [Length; 2],
}

impl Default for SizeBlock {
    fn default() -> Self {
        let unbounded = [Length::px(0.0), Length::px(f32::INFINITY)];
        Self {
            width: unbounded,
            height: unbounded,
        }
    }
}

impl SizeBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            width: read_length_pair(&bytes[0..]),
            height: read_length_pair(&bytes[PAIR..]),
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.width[0].real_value, self.height[0].real_value)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.width[1].real_value, self.height[1].real_value)
    }

    /// Clamps content size into `[min, max]`. Max wins if the two cross.
    pub fn clamp(&self, content: Vec2) -> Vec2 {
        let (min, max) = (self.min(), self.max());
        Vec2::new(content.x.max(min.x).min(max.x), content.y.max(min.y).min(max.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackgroundBlock {
    /// Atlas rectangle `(u0, v0, u1, v1)`.
    pub image: [f32; 4],
    pub color: Color,
}

impl BackgroundBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        let mut image = [0.0; 4];
        NativeEndian::read_f32_into(&bytes[0..16], &mut image);
        Self {
            image,
            color: Color::from_bytes(&bytes[16..]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBlock {
    pub extra_data_offset: i64,
}

impl TextBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            extra_data_offset: NativeEndian::read_i64(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontBlock {
    pub face: u32,
    pub size: Length,
    pub color: Color,
}

impl Default for FontBlock {
    fn default() -> Self {
        Self {
            face: 0,
            size: Length::px(16.0),
            color: Color::new(0, 0, 0, 255),
        }
    }
}

impl FontBlock {
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            face: NativeEndian::read_u32(bytes),
            size: Length::read(&bytes[4..]),
            color: Color::from_bytes(&bytes[4 + LENGTH_VALUE_SIZE..]),
        }
    }
}

/// Resolved insets of a node, sides ordered top, right, bottom, left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxModel {
    pub margin: [f32; 4],
    pub padding: [f32; 4],
    pub border: [f32; 4],
}

impl BoxModel {
    pub fn new(box_block: &BoxBlock, border: &BorderBlock) -> Self {
        Self {
            margin: real_values(&box_block.margin),
            padding: real_values(&box_block.padding),
            border: real_values(&border.width),
        }
    }

    fn side(&self, index: usize) -> f32 {
        self.margin[index] + self.padding[index] + self.border[index]
    }

    pub fn top(&self) -> f32 {
        self.side(0)
    }

    pub fn right(&self) -> f32 {
        self.side(1)
    }

    pub fn bottom(&self) -> f32 {
        self.side(2)
    }

    pub fn left(&self) -> f32 {
        self.side(3)
    }

    pub fn horizontal(&self) -> f32 {
        self.left() + self.right()
    }

    pub fn vertical(&self) -> f32 {
        self.top() + self.bottom()
    }

    /// Where content starts relative to the node origin.
    pub fn content_origin(&self) -> Vec2 {
        Vec2::new(self.left(), self.top())
    }

    pub fn insets(&self) -> Vec2 {
        Vec2::new(self.horizontal(), self.vertical())
    }

    /// `rect` shrunk by the margins only.
    pub fn inside_margin(&self, rect: LayoutRect) -> LayoutRect {
        LayoutRect::new(
            Vec2::new(rect.min.x + self.margin[3], rect.min.y + self.margin[0]),
            Vec2::new(rect.max.x - self.margin[1], rect.max.y - self.margin[2]),
        )
    }
}
