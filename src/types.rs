//! Core types and constants for the config buffer format

use serde::{Deserialize, Serialize};
use std::fmt;

// Runtime header: rewritten by the layout pass every frame
pub const RUNTIME_HEADER_SIZE: usize = 32;
pub const RUNTIME_CONSTRAINTS_OFFSET: usize = 0;
pub const RUNTIME_SIZE_OFFSET: usize = 16;
pub const RUNTIME_POSITION_OFFSET: usize = 24;

// Config header, directly after the runtime header
pub const CONFIG_HEADER_OFFSET: usize = RUNTIME_HEADER_SIZE;
pub const CONFIG_HEADER_SIZE: usize = 16;
pub const CONFIG_LENGTH_OFFSET: usize = CONFIG_HEADER_OFFSET;
pub const CONFIG_ELEMENT_OFFSET: usize = CONFIG_HEADER_OFFSET + 4;
pub const CONFIG_COUNT_OFFSET: usize = CONFIG_HEADER_OFFSET + 12;

/// First property block header.
pub const BLOCK_SECTION_OFFSET: usize = RUNTIME_HEADER_SIZE + CONFIG_HEADER_SIZE;

// Property block header, relative to the header start
pub const BLOCK_HEADER_SIZE: usize = 13;
pub const BLOCK_LENGTH_OFFSET: usize = 0;
pub const BLOCK_HASH_OFFSET: usize = 4;
pub const BLOCK_ENABLED_OFFSET: usize = 12;

// Value payload sizes
pub const LENGTH_VALUE_SIZE: usize = 9;
pub const COLOR_VALUE_SIZE: usize = 4;

// Mesh layout
pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;
pub const QUAD_INDEX_PATTERN: [u16; INDICES_PER_QUAD] = [0, 1, 2, 1, 3, 2];
pub const MAX_MESH_VERTICES: usize = u16::MAX as usize + 1;

/// Namespace prefixed to every type name before hashing.
pub const TYPE_NAMESPACE: &str = "kryon.layout";

/// Stable 64-bit identifier of an element or property block type.
///
/// Computed from the md5 digest of the namespaced type name, so the same name
/// yields the same id in the producer and at runtime on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeHash(pub u64);

impl TypeHash {
    pub fn of(name: &str) -> Self {
        let digest = md5::compute(format!("{}.{}", TYPE_NAMESPACE, name));
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        Self(u64::from_le_bytes(bytes))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

/// Min/max box a parent hands down to a child.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
    pub max_height: f32,
}

impl Constraints {
    pub fn new(min_width: f32, min_height: f32, max_width: f32, max_height: f32) -> Self {
        Self {
            min_width,
            min_height,
            max_width,
            max_height,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0.0, 0.0, f32::INFINITY, f32::INFINITY)
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Absolute layout rectangle, top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl LayoutRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position, position.add(size))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_bytes(self) -> [u8; COLOR_VALUE_SIZE] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

// Alignment byte: horizontal in the low nibble, vertical in the high nibble
pub const ALIGN_HORIZONTAL_MASK: u8 = 0x0F;
pub const ALIGN_VERTICAL_MASK: u8 = 0xF0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Alignment {
    #[default]
    TopLeft = 0x00,
    TopCenter = 0x01,
    TopRight = 0x02,
    MiddleLeft = 0x10,
    MiddleCenter = 0x11,
    MiddleRight = 0x12,
    BottomLeft = 0x20,
    BottomCenter = 0x21,
    BottomRight = 0x22,
}

impl Alignment {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x01 => Self::TopCenter,
            0x02 => Self::TopRight,
            0x10 => Self::MiddleLeft,
            0x11 => Self::MiddleCenter,
            0x12 => Self::MiddleRight,
            0x20 => Self::BottomLeft,
            0x21 => Self::BottomCenter,
            0x22 => Self::BottomRight,
            _ => Self::TopLeft,
        }
    }

    /// Accepts `top-left`, `TopLeft`, `middle_center`, `center`, ...
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let alignment = match key.as_str() {
            "topleft" | "left" | "top" => Self::TopLeft,
            "topcenter" => Self::TopCenter,
            "topright" | "right" => Self::TopRight,
            "middleleft" | "centerleft" => Self::MiddleLeft,
            "middlecenter" | "center" => Self::MiddleCenter,
            "middleright" | "centerright" => Self::MiddleRight,
            "bottomleft" | "bottom" => Self::BottomLeft,
            "bottomcenter" => Self::BottomCenter,
            "bottomright" => Self::BottomRight,
            _ => return None,
        };
        Some(alignment)
    }

    fn factor(nibble: u8) -> f32 {
        match nibble {
            1 => 0.5,
            2 => 1.0,
            _ => 0.0,
        }
    }

    /// Offset of an object of `object` width inside `container` width.
    pub fn horizontal_offset(self, container: f32, object: f32) -> f32 {
        (container - object) * Self::factor(self as u8 & ALIGN_HORIZONTAL_MASK)
    }

    pub fn vertical_offset(self, container: f32, object: f32) -> f32 {
        (container - object) * Self::factor((self as u8 & ALIGN_VERTICAL_MASK) >> 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_hash_is_stable() {
        // Persisted in buffers; these values must never change.
        assert_eq!(TypeHash::of("BoxConfigBlock").value(), 0x5a5b_f338_4f1d_47a4);
        assert_eq!(TypeHash::of("HBox").value(), 0xec22_866a_0e15_3c58);
        assert_ne!(TypeHash::of("BoxConfigBlock"), TypeHash::of("SizeConfigBlock"));
    }

    #[test]
    fn test_header_offsets() {
        assert_eq!(CONFIG_HEADER_OFFSET, 32);
        assert_eq!(CONFIG_COUNT_OFFSET, 44);
        assert_eq!(BLOCK_SECTION_OFFSET, 48);
    }

    #[test]
    fn test_alignment_offsets() {
        let align = Alignment::from_name("bottom-center").unwrap();
        assert_eq!(align, Alignment::BottomCenter);
        assert_eq!(align.horizontal_offset(100.0, 20.0), 40.0);
        assert_eq!(align.vertical_offset(100.0, 20.0), 80.0);

        assert_eq!(Alignment::TopLeft.vertical_offset(100.0, 20.0), 0.0);
        assert_eq!(Alignment::from_byte(0x12), Alignment::MiddleRight);
        assert_eq!(Alignment::from_byte(0x77), Alignment::TopLeft);
        assert!(Alignment::from_name("diagonal").is_none());
    }
}
