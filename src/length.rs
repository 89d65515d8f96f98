//! Unit-tagged lengths and their normalization to pixels

use crate::types::{Vec2, LENGTH_VALUE_SIZE};
use byteorder::{ByteOrder, NativeEndian};
use std::fmt;

/// Unit codes as stored in the buffer. Odd codes are relative units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LengthUnit {
    #[default]
    Px = 0,
    Em = 1,
    Cm = 2,
    Ex = 3,
    Mm = 4,
    Ch = 5,
    In = 6,
    Rem = 7,
    Pt = 8,
    Vw = 9,
    Pc = 10,
    Vh = 11,
    Vmin = 13,
    Vmax = 15,
    Percent = 17,
    Auto = 19,
    Inherit = 21,
}

impl LengthUnit {
    pub fn from_byte(value: u8) -> Option<Self> {
        let unit = match value {
            0 => Self::Px,
            1 => Self::Em,
            2 => Self::Cm,
            3 => Self::Ex,
            4 => Self::Mm,
            5 => Self::Ch,
            6 => Self::In,
            7 => Self::Rem,
            8 => Self::Pt,
            9 => Self::Vw,
            10 => Self::Pc,
            11 => Self::Vh,
            13 => Self::Vmin,
            15 => Self::Vmax,
            17 => Self::Percent,
            19 => Self::Auto,
            21 => Self::Inherit,
            _ => return None,
        };
        Some(unit)
    }

    /// Case-insensitive unit suffix. An empty suffix means pixels.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix.to_ascii_lowercase().as_str() {
            "" | "px" => Self::Px,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            "in" => Self::In,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            "em" => Self::Em,
            "ex" => Self::Ex,
            "ch" => Self::Ch,
            "rem" => Self::Rem,
            "vw" => Self::Vw,
            "vh" => Self::Vh,
            "vmin" => Self::Vmin,
            "vmax" => Self::Vmax,
            "%" | "percent" => Self::Percent,
            "auto" => Self::Auto,
            "inherit" => Self::Inherit,
            _ => return None,
        };
        Some(unit)
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Em => "em",
            Self::Cm => "cm",
            Self::Ex => "ex",
            Self::Mm => "mm",
            Self::Ch => "ch",
            Self::In => "in",
            Self::Rem => "rem",
            Self::Pt => "pt",
            Self::Vw => "vw",
            Self::Pc => "pc",
            Self::Vh => "vh",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
            Self::Percent => "%",
            Self::Auto => "auto",
            Self::Inherit => "inherit",
        }
    }
}

/// Everything a length needs to resolve to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    pub dpi: f32,
    pub pixel_scale: f32,
    pub viewport_size: Vec2,
    /// Resolved reference value, only consulted for percentages.
    pub relative_to: f32,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            pixel_scale: 1.0,
            viewport_size: Vec2::new(1920.0, 1080.0),
            relative_to: 0.0,
        }
    }
}

impl LengthContext {
    pub fn with_relative_to(self, relative_to: f32) -> Self {
        Self {
            relative_to,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Length {
    /// Cached pixel value, recomputed every frame.
    pub real_value: f32,
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(value: f32, unit: LengthUnit) -> Self {
        Self {
            real_value: value,
            value,
            unit,
        }
    }

    pub fn px(value: f32) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    pub fn normalize(&self, context: &LengthContext) -> f32 {
        let value = self.value;
        if value.is_infinite() || value.is_nan() {
            return value;
        }
        let scale = context.pixel_scale;
        let viewport = context.viewport_size;
        match self.unit {
            LengthUnit::Px => value * scale,
            LengthUnit::Cm => value * scale * context.dpi / 2.54,
            LengthUnit::Mm => value * scale * context.dpi / 25.4,
            LengthUnit::In => value * scale * context.dpi,
            LengthUnit::Pt => value * scale * context.dpi / 72.0,
            LengthUnit::Pc => value * scale * context.dpi / 6.0,
            LengthUnit::Vw => value * scale * viewport.x / 100.0,
            LengthUnit::Vh => value * scale * viewport.y / 100.0,
            LengthUnit::Vmin => value * scale * viewport.x.min(viewport.y) / 100.0,
            LengthUnit::Vmax => value * scale * viewport.x.max(viewport.y) / 100.0,
            LengthUnit::Percent => value * context.relative_to / 100.0,
            LengthUnit::Em
            | LengthUnit::Ex
            | LengthUnit::Ch
            | LengthUnit::Rem
            | LengthUnit::Auto
            | LengthUnit::Inherit => 0.0,
        }
    }

    pub fn read(bytes: &[u8]) -> Self {
        Self {
            real_value: NativeEndian::read_f32(&bytes[0..4]),
            value: NativeEndian::read_f32(&bytes[4..8]),
            unit: LengthUnit::from_byte(bytes[8]).unwrap_or_default(),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        NativeEndian::write_f32(&mut bytes[0..4], self.real_value);
        NativeEndian::write_f32(&mut bytes[4..8], self.value);
        bytes[8] = self.unit as u8;
    }

    /// Cached pixel value straight out of an encoded length.
    pub fn read_real_value(bytes: &[u8]) -> f32 {
        NativeEndian::read_f32(&bytes[0..4])
    }

    pub fn write_real_value(bytes: &mut [u8], real_value: f32) {
        NativeEndian::write_f32(&mut bytes[0..4], real_value);
    }

    pub const ENCODED_SIZE: usize = LENGTH_VALUE_SIZE;
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_nan() {
            write!(f, "NaN")
        } else if self.value.is_infinite() {
            let sign = if self.value < 0.0 { "-" } else { "" };
            write!(f, "{}Infinity", sign)
        } else {
            write!(f, "{}{}", self.value, self.unit.suffix())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> LengthContext {
        LengthContext {
            dpi: 96.0,
            pixel_scale: 2.0,
            viewport_size: Vec2::new(800.0, 600.0),
            relative_to: 200.0,
        }
    }

    #[test]
    fn test_normalize_absolute_units() {
        let ctx = context();
        assert_eq!(Length::px(10.0).normalize(&ctx), 20.0);
        assert_eq!(Length::new(1.0, LengthUnit::In).normalize(&ctx), 192.0);
        assert_eq!(Length::new(72.0, LengthUnit::Pt).normalize(&ctx), 192.0);
        assert_eq!(Length::new(6.0, LengthUnit::Pc).normalize(&ctx), 192.0);
        assert!((Length::new(2.54, LengthUnit::Cm).normalize(&ctx) - 192.0).abs() < 1e-3);
        assert!((Length::new(25.4, LengthUnit::Mm).normalize(&ctx) - 192.0).abs() < 1e-3);
    }

    #[test]
    fn test_normalize_relative_units() {
        let ctx = context();
        assert_eq!(Length::new(10.0, LengthUnit::Vw).normalize(&ctx), 160.0);
        assert_eq!(Length::new(10.0, LengthUnit::Vh).normalize(&ctx), 120.0);
        assert_eq!(Length::new(10.0, LengthUnit::Vmin).normalize(&ctx), 120.0);
        assert_eq!(Length::new(10.0, LengthUnit::Vmax).normalize(&ctx), 160.0);
        assert_eq!(Length::new(50.0, LengthUnit::Percent).normalize(&ctx), 100.0);
        assert_eq!(Length::new(3.0, LengthUnit::Em).normalize(&ctx), 0.0);
        assert_eq!(Length::new(3.0, LengthUnit::Rem).normalize(&ctx), 0.0);
    }

    #[test]
    fn test_percent_is_exact_for_whole_pixels() {
        let ctx = LengthContext {
            relative_to: 960.0,
            ..context()
        };
        assert_eq!(Length::new(10.0, LengthUnit::Percent).normalize(&ctx), 96.0);
        assert_eq!(Length::new(30.0, LengthUnit::Percent).normalize(&ctx), 288.0);
        assert_eq!(Length::new(7.0, LengthUnit::Vw).normalize(&ctx), 112.0);
    }

    #[test]
    fn test_normalize_passes_through_unbounded() {
        let ctx = context();
        assert_eq!(Length::px(f32::INFINITY).normalize(&ctx), f32::INFINITY);
        assert!(Length::new(f32::NAN, LengthUnit::Percent).normalize(&ctx).is_nan());
    }

    #[test]
    fn test_encoded_layout() {
        let mut bytes = [0u8; Length::ENCODED_SIZE];
        let mut length = Length::new(4.0, LengthUnit::Mm);
        length.real_value = 15.0;
        length.write(&mut bytes);
        assert_eq!(bytes[8], LengthUnit::Mm as u8);
        assert_eq!(Length::read_real_value(&bytes), 15.0);
        assert_eq!(Length::read(&bytes), length);
    }
}
