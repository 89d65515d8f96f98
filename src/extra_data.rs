//! Out-of-line node data
//!
//! Fixed-size blocks cannot hold unbounded content, so text lives in a second
//! per-node buffer and blocks store its byte offset. A text entry is
//! `i32 char count`, the UTF-8 byte order mark, the UTF-8 bytes and a NUL.

use crate::error::{LayoutError, Result};
use byteorder::{ByteOrder, NativeEndian, WriteBytesExt};

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const TEXT_PREFIX_SIZE: usize = 4 + UTF8_BOM.len();

/// Appends a text entry and returns its offset.
pub fn write_text(extra: &mut Vec<u8>, text: &str) -> Result<i64> {
    if text.contains('\0') {
        return Err(LayoutError::invalid_value("text", text, "text may not contain NUL"));
    }
    let char_count = i32::try_from(text.chars().count())
        .map_err(|_| LayoutError::invalid_value("text", "<long text>", "text too long"))?;

    let offset = extra.len() as i64;
    extra.write_i32::<NativeEndian>(char_count)?;
    extra.extend_from_slice(&UTF8_BOM);
    extra.extend_from_slice(text.as_bytes());
    extra.write_u8(0)?;
    Ok(offset)
}

/// A text entry borrowed from an extra data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRef<'a> {
    pub char_count: usize,
    text: &'a str,
}

impl<'a> TextRef<'a> {
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Code points in order.
    pub fn chars(&self) -> std::str::Chars<'a> {
        self.text.chars()
    }

    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }
}

/// Reads the text entry at `offset`. `None` when the offset is out of range,
/// the preamble is missing or the bytes are not UTF-8.
pub fn read_text(extra: &[u8], offset: i64) -> Option<TextRef<'_>> {
    let start = usize::try_from(offset).ok()?;
    let prefix = extra.get(start..start + TEXT_PREFIX_SIZE)?;
    let char_count = NativeEndian::read_i32(&prefix[..4]);
    if prefix[4..] != UTF8_BOM {
        return None;
    }

    let body = &extra[start + TEXT_PREFIX_SIZE..];
    let end = body.iter().position(|b| *b == 0)?;
    let text = std::str::from_utf8(&body[..end]).ok()?;
    Some(TextRef {
        char_count: char_count.max(0) as usize,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_entry_layout() {
        let mut extra = Vec::new();
        let offset = write_text(&mut extra, "hé").unwrap();
        assert_eq!(offset, 0);
        assert_eq!(NativeEndian::read_i32(&extra[..4]), 2);
        assert_eq!(&extra[4..7], &UTF8_BOM);
        assert_eq!(&extra[7..10], "hé".as_bytes());
        assert_eq!(extra[10], 0);
        assert_eq!(extra.len(), 11);
    }

    #[test]
    fn test_multiple_entries() {
        let mut extra = Vec::new();
        write_text(&mut extra, "first").unwrap();
        let second = write_text(&mut extra, "→ ok").unwrap();

        let text = read_text(&extra, second).unwrap();
        assert_eq!(text.as_str(), "→ ok");
        assert_eq!(text.char_count, 4);
        assert_eq!(text.chars().next(), Some('→'));
        assert_eq!(read_text(&extra, 0).unwrap().as_str(), "first");
    }

    #[test]
    fn test_bad_offsets() {
        let mut extra = Vec::new();
        write_text(&mut extra, "abc").unwrap();
        assert!(read_text(&extra, -1).is_none());
        assert!(read_text(&extra, 2).is_none());
        assert!(read_text(&extra, 100).is_none());
        assert!(write_text(&mut extra, "a\0b").is_err());
    }

    #[test]
    fn test_empty_text() {
        let mut extra = Vec::new();
        let offset = write_text(&mut extra, "").unwrap();
        let text = read_text(&extra, offset).unwrap();
        assert!(text.is_empty());
        assert_eq!(text.as_str(), "");
    }
}
