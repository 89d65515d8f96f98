//! Config buffer accessors
//!
//! A node's config buffer is a packed byte region:
//!
//! ```text
//! [RuntimeHeader][ConfigHeader][BlockHeader 0][payload 0][BlockHeader 1][payload 1]...
//! ```
//!
//! Block headers are sorted ascending by hash so that every lookup is a
//! linear scan which stops at the first header whose hash exceeds the target.
//! The accessors here assume a buffer that passed [`validate_layout`]; an
//! out-of-order buffer is not detected at lookup time and simply misses.

use crate::error::{LayoutError, Result};
use crate::registry::Property;
use crate::types::*;
use byteorder::{ByteOrder, NativeEndian};

/// Decoded property block header plus where it sits in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub length: i32,
    pub hash: TypeHash,
    pub enabled: bool,
    /// Byte offset of the header itself.
    pub offset: usize,
}

impl BlockHeader {
    pub fn payload_offset(&self) -> usize {
        self.offset + BLOCK_HEADER_SIZE
    }

    pub fn payload_len(&self) -> usize {
        self.length.max(0) as usize
    }

    pub fn next_offset(&self) -> usize {
        self.payload_offset() + self.payload_len()
    }
}

pub fn read_block_header(buffer: &[u8], offset: usize) -> BlockHeader {
    let header = &buffer[offset..offset + BLOCK_HEADER_SIZE];
    BlockHeader {
        length: NativeEndian::read_i32(&header[BLOCK_LENGTH_OFFSET..]),
        hash: TypeHash(NativeEndian::read_u64(&header[BLOCK_HASH_OFFSET..])),
        enabled: header[BLOCK_ENABLED_OFFSET] != 0,
        offset,
    }
}

pub fn write_block_header(buffer: &mut [u8], offset: usize, length: i32, hash: TypeHash, enabled: bool) {
    let header = &mut buffer[offset..offset + BLOCK_HEADER_SIZE];
    NativeEndian::write_i32(&mut header[BLOCK_LENGTH_OFFSET..], length);
    NativeEndian::write_u64(&mut header[BLOCK_HASH_OFFSET..], hash.0);
    header[BLOCK_ENABLED_OFFSET] = enabled as u8;
}

pub fn write_config_header(buffer: &mut [u8], length: i32, element: TypeHash, count: i32) {
    NativeEndian::write_i32(&mut buffer[CONFIG_LENGTH_OFFSET..], length);
    NativeEndian::write_u64(&mut buffer[CONFIG_ELEMENT_OFFSET..], element.0);
    NativeEndian::write_i32(&mut buffer[CONFIG_COUNT_OFFSET..], count);
}

/// Block section byte length, block headers included.
pub fn config_length(buffer: &[u8]) -> usize {
    NativeEndian::read_i32(&buffer[CONFIG_LENGTH_OFFSET..]).max(0) as usize
}

pub fn element(buffer: &[u8]) -> TypeHash {
    TypeHash(NativeEndian::read_u64(&buffer[CONFIG_ELEMENT_OFFSET..]))
}

pub fn block_count(buffer: &[u8]) -> usize {
    NativeEndian::read_i32(&buffer[CONFIG_COUNT_OFFSET..]).max(0) as usize
}

fn read_vec2(buffer: &[u8], offset: usize) -> Vec2 {
    Vec2::new(
        NativeEndian::read_f32(&buffer[offset..]),
        NativeEndian::read_f32(&buffer[offset + 4..]),
    )
}

fn write_vec2(buffer: &mut [u8], offset: usize, value: Vec2) {
    NativeEndian::write_f32(&mut buffer[offset..], value.x);
    NativeEndian::write_f32(&mut buffer[offset + 4..], value.y);
}

pub fn size(buffer: &[u8]) -> Vec2 {
    read_vec2(buffer, RUNTIME_SIZE_OFFSET)
}

pub fn set_size(buffer: &mut [u8], size: Vec2) {
    write_vec2(buffer, RUNTIME_SIZE_OFFSET, size);
}

pub fn position(buffer: &[u8]) -> Vec2 {
    read_vec2(buffer, RUNTIME_POSITION_OFFSET)
}

pub fn set_position(buffer: &mut [u8], position: Vec2) {
    write_vec2(buffer, RUNTIME_POSITION_OFFSET, position);
}

pub fn constraints(buffer: &[u8]) -> Constraints {
    let min = read_vec2(buffer, RUNTIME_CONSTRAINTS_OFFSET);
    let max = read_vec2(buffer, RUNTIME_CONSTRAINTS_OFFSET + 8);
    Constraints::new(min.x, min.y, max.x, max.y)
}

pub fn set_constraints(buffer: &mut [u8], constraints: Constraints) {
    write_vec2(
        buffer,
        RUNTIME_CONSTRAINTS_OFFSET,
        Vec2::new(constraints.min_width, constraints.min_height),
    );
    write_vec2(
        buffer,
        RUNTIME_CONSTRAINTS_OFFSET + 8,
        Vec2::new(constraints.max_width, constraints.max_height),
    );
}

/// Finds the header for `id`. Reads at most `count` headers and stops early
/// once a header hash passes the target.
pub fn get_property_block_header(buffer: &[u8], id: TypeHash) -> Option<BlockHeader> {
    let mut offset = BLOCK_SECTION_OFFSET;
    for _ in 0..block_count(buffer) {
        if offset + BLOCK_HEADER_SIZE > buffer.len() {
            return None;
        }
        let header = read_block_header(buffer, offset);
        if header.hash > id {
            return None;
        }
        if header.hash == id {
            return Some(header);
        }
        offset = header.next_offset();
    }
    None
}

fn find_payload(buffer: &[u8], id: TypeHash, check_enabled: bool) -> Option<(usize, usize)> {
    let header = get_property_block_header(buffer, id)?;
    if check_enabled && !header.enabled {
        return None;
    }
    let start = header.payload_offset();
    let end = start + header.payload_len();
    (end <= buffer.len()).then_some((start, end))
}

pub fn get_property_block(buffer: &[u8], id: TypeHash, check_enabled: bool) -> Option<&[u8]> {
    find_payload(buffer, id, check_enabled).map(|(start, end)| &buffer[start..end])
}

pub fn get_property_block_mut(
    buffer: &mut [u8],
    id: TypeHash,
    check_enabled: bool,
) -> Option<&mut [u8]> {
    find_payload(buffer, id, check_enabled).map(move |(start, end)| &mut buffer[start..end])
}

/// Toggles an optional block. Returns false when the block is absent.
pub fn set_block_enabled(buffer: &mut [u8], id: TypeHash, enabled: bool) -> bool {
    match get_property_block_header(buffer, id) {
        Some(header) => {
            buffer[header.offset + BLOCK_ENABLED_OFFSET] = enabled as u8;
            true
        }
        None => false,
    }
}

fn property_range(buffer: &[u8], property: &Property, check_enabled: bool) -> Option<(usize, usize)> {
    let (block_start, block_end) = find_payload(buffer, property.block, check_enabled)?;
    let start = block_start + property.offset;
    let end = start + property.length;
    (end <= block_end).then_some((start, end))
}

/// Bytes of a single property inside its (enabled) block.
pub fn get_property<'a>(buffer: &'a [u8], property: &Property) -> Option<&'a [u8]> {
    property_range(buffer, property, true).map(|(start, end)| &buffer[start..end])
}

pub fn get_property_mut<'a>(buffer: &'a mut [u8], property: &Property) -> Option<&'a mut [u8]> {
    property_range(buffer, property, true).map(move |(start, end)| &mut buffer[start..end])
}

/// Property bytes regardless of the block's enabled flag.
pub fn get_property_unchecked<'a>(buffer: &'a [u8], property: &Property) -> Option<&'a [u8]> {
    property_range(buffer, property, false).map(|(start, end)| &buffer[start..end])
}

pub fn get_property_unchecked_mut<'a>(buffer: &'a mut [u8], property: &Property) -> Option<&'a mut [u8]> {
    property_range(buffer, property, false).map(move |(start, end)| &mut buffer[start..end])
}

/// Reads a packed boolean flag. `None` for byte-addressed descriptors.
pub fn get_bit_property(buffer: &[u8], property: &Property) -> Option<bool> {
    let bit = property.bit_offset?;
    let bytes = get_property(buffer, property)?;
    let byte = bytes.get(bit / 8)?;
    Some(byte & (1 << (bit % 8)) != 0)
}

pub fn set_bit_property(buffer: &mut [u8], property: &Property, value: bool) -> bool {
    let Some(bit) = property.bit_offset else {
        return false;
    };
    let Some(byte) = get_property_mut(buffer, property).and_then(|b| b.get_mut(bit / 8)) else {
        return false;
    };
    if value {
        *byte |= 1 << (bit % 8);
    } else {
        *byte &= !(1 << (bit % 8));
    }
    true
}

/// Walks the blocks in buffer order, yielding `count` items.
pub struct BlockIter<'a> {
    buffer: &'a [u8],
    offset: usize,
    remaining: usize,
}

impl<'a> BlockIter<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: BLOCK_SECTION_OFFSET,
            remaining: block_count(buffer),
        }
    }

    /// Rewinds to the first block.
    pub fn reset(&mut self) {
        self.offset = BLOCK_SECTION_OFFSET;
        self.remaining = block_count(self.buffer);
    }
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = (BlockHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.offset + BLOCK_HEADER_SIZE > self.buffer.len() {
            return None;
        }
        let header = read_block_header(self.buffer, self.offset);
        let payload = self.buffer.get(header.payload_offset()..header.next_offset())?;
        self.offset = header.next_offset();
        self.remaining -= 1;
        Some((header, payload))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

pub fn iterate(buffer: &[u8]) -> BlockIter<'_> {
    BlockIter::new(buffer)
}

/// Headers only, for callers that need to write into the blocks while walking.
pub fn block_headers(buffer: &[u8]) -> Vec<BlockHeader> {
    iterate(buffer).map(|(header, _)| header).collect()
}

/// Checks the structural invariants every accessor relies on: block hashes
/// strictly ascending, lengths inside the buffer, count and section length
/// consistent with the headers.
pub fn validate_layout(buffer: &[u8]) -> Result<()> {
    if buffer.len() < BLOCK_SECTION_OFFSET {
        return Err(LayoutError::Truncated {
            expected: BLOCK_SECTION_OFFSET,
            actual: buffer.len(),
        });
    }

    let count = NativeEndian::read_i32(&buffer[CONFIG_COUNT_OFFSET..]);
    let length = NativeEndian::read_i32(&buffer[CONFIG_LENGTH_OFFSET..]);
    if count < 0 || length < 0 {
        return Err(LayoutError::invalid_format(format!(
            "negative config header field (count {}, length {})",
            count, length
        )));
    }

    let expected_end = BLOCK_SECTION_OFFSET + length as usize;
    if buffer.len() < expected_end {
        return Err(LayoutError::Truncated {
            expected: expected_end,
            actual: buffer.len(),
        });
    }

    let mut offset = BLOCK_SECTION_OFFSET;
    let mut previous: Option<TypeHash> = None;
    for _ in 0..count {
        if offset + BLOCK_HEADER_SIZE > expected_end {
            return Err(LayoutError::Truncated {
                expected: offset + BLOCK_HEADER_SIZE,
                actual: expected_end,
            });
        }
        let header = read_block_header(buffer, offset);
        if header.length < 0 {
            return Err(LayoutError::invalid_format(format!(
                "block {} has negative length",
                header.hash
            )));
        }
        if header.next_offset() > expected_end {
            return Err(LayoutError::Truncated {
                expected: header.next_offset(),
                actual: expected_end,
            });
        }
        if let Some(previous) = previous {
            if header.hash == previous {
                return Err(LayoutError::DuplicateBlock { id: header.hash.0 });
            }
            if header.hash < previous {
                return Err(LayoutError::UnorderedBlocks {
                    previous: previous.0,
                    next: header.hash.0,
                });
            }
        }
        previous = Some(header.hash);
        offset = header.next_offset();
    }

    if offset != expected_end {
        return Err(LayoutError::invalid_format(format!(
            "config length {} does not match block section of {} bytes",
            length,
            offset - BLOCK_SECTION_OFFSET
        )));
    }
    Ok(())
}

/// Read-only view of one node's buffer handed to element behaviors.
#[derive(Debug, Clone, Copy)]
pub struct ConfigRef<'a> {
    bytes: &'a [u8],
}

impl<'a> ConfigRef<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn element(&self) -> TypeHash {
        element(self.bytes)
    }

    pub fn size(&self) -> Vec2 {
        size(self.bytes)
    }

    pub fn position(&self) -> Vec2 {
        position(self.bytes)
    }

    pub fn constraints(&self) -> Constraints {
        constraints(self.bytes)
    }

    /// Enabled block payload.
    pub fn block(&self, id: TypeHash) -> Option<&'a [u8]> {
        get_property_block(self.bytes, id, true)
    }

    pub fn block_unchecked(&self, id: TypeHash) -> Option<&'a [u8]> {
        get_property_block(self.bytes, id, false)
    }

    pub fn property(&self, property: &Property) -> Option<&'a [u8]> {
        get_property(self.bytes, property)
    }

    pub fn flag(&self, property: &Property) -> Option<bool> {
        get_bit_property(self.bytes, property)
    }
}
