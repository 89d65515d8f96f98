//! Property value parsing used by the buffer builder

use crate::error::{LayoutError, Result};
use crate::length::{Length, LengthUnit};
use crate::types::{Alignment, Color};
use regex::Regex;

/// Splits a composite value into tokens and expands it to four fields.
///
/// One token fills every field, two tokens are `(a, b, a, b)` and three are
/// `(a, b, c, b)`, following CSS box shorthand.
pub fn parse_quad<T: Copy>(input: &str, parse: impl Fn(&str) -> Result<T>) -> Result<[T; 4]> {
    let values = input
        .split_whitespace()
        .map(|token| parse(token))
        .collect::<Result<Vec<T>>>()?;
    match values.as_slice() {
        [a] => Ok([*a, *a, *a, *a]),
        [a, b] => Ok([*a, *b, *a, *b]),
        [a, b, c] => Ok([*a, *b, *c, *b]),
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => Err(composite_arity_error(input, 4)),
    }
}

/// Three-field composite. Missing trailing fields repeat the last value.
pub fn parse_triple<T: Copy>(input: &str, parse: impl Fn(&str) -> Result<T>) -> Result<[T; 3]> {
    let values = input
        .split_whitespace()
        .map(|token| parse(token))
        .collect::<Result<Vec<T>>>()?;
    match values.as_slice() {
        [a] => Ok([*a, *a, *a]),
        [a, b] => Ok([*a, *b, *b]),
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(composite_arity_error(input, 3)),
    }
}

/// Two-field composite. A single token fills both fields.
pub fn parse_pair<T: Copy>(input: &str, parse: impl Fn(&str) -> Result<T>) -> Result<[T; 2]> {
    let values = input
        .split_whitespace()
        .map(|token| parse(token))
        .collect::<Result<Vec<T>>>()?;
    match values.as_slice() {
        [a] => Ok([*a, *a]),
        [a, b] => Ok([*a, *b]),
        _ => Err(composite_arity_error(input, 2)),
    }
}

fn composite_arity_error(input: &str, arity: usize) -> LayoutError {
    LayoutError::invalid_value(
        "composite",
        input,
        format!("expected 1 to {} values", arity),
    )
}

pub struct ValueParser {
    length_regex: Regex,
}

impl ValueParser {
    pub fn new() -> Result<Self> {
        let length_regex =
            Regex::new(r"(?i)^(nan|-?inf(?:inity)?|-?[0-9]+(?:\.[0-9]+)?|-?\.[0-9]+)([a-z%]*)$")
                .map_err(|e| LayoutError::invalid_format(format!("length pattern: {}", e)))?;
        Ok(Self { length_regex })
    }

    /// Parses a single length token such as `12px`, `50%`, `1.5in` or `Infinity`.
    pub fn parse_length(&self, input: &str) -> Result<Length> {
        let trimmed = input.trim();
        let captures = self
            .length_regex
            .captures(trimmed)
            .ok_or_else(|| LayoutError::invalid_value("length", input, "not a length"))?;
        let value = match captures[1].to_ascii_lowercase().as_str() {
            "nan" => f32::NAN,
            "inf" | "infinity" => f32::INFINITY,
            "-inf" | "-infinity" => f32::NEG_INFINITY,
            number => number
                .parse::<f32>()
                .map_err(|e| LayoutError::invalid_value("length", input, e.to_string()))?,
        };
        let suffix = captures.get(2).map_or("", |m| m.as_str());
        let unit = LengthUnit::from_suffix(suffix).ok_or_else(|| {
            LayoutError::invalid_value("length", input, format!("unknown unit '{}'", suffix))
        })?;
        Ok(Length::new(value, unit))
    }

    pub fn parse_length_pair(&self, input: &str) -> Result<[Length; 2]> {
        parse_pair(input, |token| self.parse_length(token))
    }

    pub fn parse_length_quad(&self, input: &str) -> Result<[Length; 4]> {
        parse_quad(input, |token| self.parse_length(token))
    }

    pub fn parse_color_quad(&self, input: &str) -> Result<[Color; 4]> {
        parse_quad(input, parse_color)
    }
}

pub fn parse_color(color_str: &str) -> Result<Color> {
    let trimmed = color_str.trim();
    if trimmed.eq_ignore_ascii_case("transparent") {
        return Ok(Color::TRANSPARENT);
    }

    let hex_str = trimmed.strip_prefix('#').ok_or_else(|| {
        LayoutError::invalid_value("color", color_str, "color must start with #")
    })?;
    if !hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LayoutError::invalid_value("color", color_str, "invalid hex digits"));
    }

    // Short forms double every digit: #rgb -> #rrggbb
    let expanded: String = match hex_str.len() {
        3 | 4 => hex_str.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex_str.to_string(),
        _ => {
            return Err(LayoutError::invalid_value(
                "color",
                color_str,
                "expected 3, 4, 6 or 8 hex digits",
            ))
        }
    };

    let channel = |index: usize| -> Result<u8> {
        u8::from_str_radix(&expanded[index * 2..index * 2 + 2], 16)
            .map_err(|e| LayoutError::invalid_value("color", color_str, e.to_string()))
    };
    let alpha = if expanded.len() == 8 { channel(3)? } else { 255 };
    Ok(Color::new(channel(0)?, channel(1)?, channel(2)?, alpha))
}

pub fn parse_bool(input: &str) -> Result<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(LayoutError::invalid_value("bool", input, "expected true or false")),
    }
}

pub fn parse_f32(input: &str) -> Result<f32> {
    input
        .trim()
        .parse::<f32>()
        .map_err(|e| LayoutError::invalid_value("float", input, e.to_string()))
}

pub fn parse_u32(input: &str) -> Result<u32> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|e| LayoutError::invalid_value("integer", input, e.to_string()))
}

pub fn parse_alignment(input: &str) -> Result<Alignment> {
    Alignment::from_name(input)
        .ok_or_else(|| LayoutError::invalid_value("alignment", input, "unknown alignment"))
}

/// Four floats, e.g. an atlas rectangle `0 0 0.5 0.5`.
pub fn parse_float4(input: &str) -> Result<[f32; 4]> {
    let values = input
        .split_whitespace()
        .map(parse_f32)
        .collect::<Result<Vec<f32>>>()?;
    match values.as_slice() {
        [x, y, z, w] => Ok([*x, *y, *z, *w]),
        _ => Err(LayoutError::invalid_value("float4", input, "expected 4 values")),
    }
}
