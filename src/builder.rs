//! Config buffer construction
//!
//! The producer side of the format: sizes a node's buffer from the element's
//! block list, writes the headers in ascending block order, applies block
//! defaults and then the authored property values. Every buffer leaves here
//! validated; the traversal passes never re-check it.

use crate::behavior::ElementTable;
use crate::buffer;
use crate::error::{LayoutError, Result};
use crate::extra_data;
use crate::length::Length;
use crate::registry::{Property, TypeRegistry, ValueKind};
use crate::types::*;
use crate::utils::{self, ValueParser};
use byteorder::{ByteOrder, NativeEndian, WriteBytesExt};

/// Buffers for one node, ready to be placed in a document.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub name: Option<String>,
    pub config: Vec<u8>,
    pub extra: Vec<u8>,
}

impl NodeConfig {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn element(&self) -> TypeHash {
        buffer::element(&self.config)
    }
}

pub struct ConfigBuilder<'a> {
    registry: &'a TypeRegistry,
    elements: &'a ElementTable,
    parser: ValueParser,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry, elements: &'a ElementTable) -> Result<Self> {
        Ok(Self {
            registry,
            elements,
            parser: ValueParser::new()?,
        })
    }

    /// Builds the buffers of an `element_name` node from `(property, value)`
    /// pairs. Later pairs override earlier ones.
    pub fn build<K, V>(&self, element_name: &str, properties: &[(K, V)]) -> Result<NodeConfig>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let element = self.registry.element_id(element_name)?;
        self.elements.require(element)?;

        let blocks = self.registry.property_blocks_for_element(element)?;
        let mut config = self.allocate(element, &blocks)?;
        let mut extra = Vec::new();

        for (block, _) in &blocks {
            for (name, value) in self.registry.defaults(*block) {
                self.apply(&mut config, &mut extra, name, value, false)?;
            }
        }
        for (name, value) in properties {
            self.apply(&mut config, &mut extra, name.as_ref(), value.as_ref(), true)?;
        }

        self.validate(&config)?;
        log::trace!(
            "Built {} config: {} blocks, {} bytes, {} extra bytes",
            element_name,
            blocks.len(),
            config.len(),
            extra.len()
        );
        Ok(NodeConfig {
            name: None,
            config,
            extra,
        })
    }

    /// Zeroed runtime header, config header and one header plus zeroed
    /// payload per block. Optional blocks start disabled.
    fn allocate(&self, element: TypeHash, blocks: &[(TypeHash, bool)]) -> Result<Vec<u8>> {
        let mut section = 0usize;
        let mut previous: Option<TypeHash> = None;
        for (block, _) in blocks {
            if let Some(previous) = previous {
                if *block == previous {
                    return Err(LayoutError::DuplicateBlock { id: block.0 });
                }
                if *block < previous {
                    return Err(LayoutError::UnorderedBlocks {
                        previous: previous.0,
                        next: block.0,
                    });
                }
            }
            previous = Some(*block);
            let info = self
                .registry
                .block_info(*block)
                .ok_or(LayoutError::UnknownBlock { id: block.0 })?;
            section += BLOCK_HEADER_SIZE + info.size;
        }

        let mut output = Vec::with_capacity(BLOCK_SECTION_OFFSET + section);
        output.resize(RUNTIME_HEADER_SIZE, 0);
        output.write_i32::<NativeEndian>(section as i32)?;
        output.write_u64::<NativeEndian>(element.0)?;
        output.write_i32::<NativeEndian>(blocks.len() as i32)?;

        for (block, required) in blocks {
            let size = self.registry.block_info(*block).map_or(0, |info| info.size);
            output.write_i32::<NativeEndian>(size as i32)?;
            output.write_u64::<NativeEndian>(block.0)?;
            output.write_u8(*required as u8)?;
            output.resize(output.len() + size, 0);
        }
        Ok(output)
    }

    /// Parses `value` and writes it at the property's location. Explicitly
    /// authored values switch an optional block on.
    pub fn apply(
        &self,
        config: &mut [u8],
        extra: &mut Vec<u8>,
        name: &str,
        value: &str,
        enable: bool,
    ) -> Result<()> {
        let property = self.registry.lookup_property(name)?;
        let kind = self
            .registry
            .property_kind(&property)
            .ok_or_else(|| LayoutError::unknown_property(name))?;

        if buffer::get_property_block_header(config, property.block).is_none() {
            let element = buffer::element(config);
            let element_name = self
                .registry
                .element_name(element)
                .map_or_else(|| element.to_string(), str::to_string);
            return Err(LayoutError::invalid_value(
                name,
                value,
                format!("element '{}' has no block for this property", element_name),
            ));
        }
        if enable {
            buffer::set_block_enabled(config, property.block, true);
        }

        self.write_value(config, extra, &property, kind, value)
            .map_err(|e| match e {
                LayoutError::InvalidValue { message, .. } => {
                    LayoutError::invalid_value(name, value, message)
                }
                other => other,
            })
    }

    fn write_value(
        &self,
        config: &mut [u8],
        extra: &mut Vec<u8>,
        property: &Property,
        kind: ValueKind,
        value: &str,
    ) -> Result<()> {
        // Text is parsed before borrowing the target bytes.
        let text_offset = match kind {
            ValueKind::Text => Some(extra_data::write_text(extra, value)?),
            _ => None,
        };

        let bytes = buffer::get_property_unchecked_mut(config, property).ok_or_else(|| {
            LayoutError::invalid_format(format!("property outside block {}", property.block))
        })?;

        match kind {
            ValueKind::Length => self.parser.parse_length(value)?.write(bytes),
            ValueKind::LengthPair => write_lengths(bytes, &self.parser.parse_length_pair(value)?),
            ValueKind::LengthQuad => write_lengths(bytes, &self.parser.parse_length_quad(value)?),
            ValueKind::Color => bytes.copy_from_slice(&utils::parse_color(value)?.to_bytes()),
            ValueKind::ColorQuad => {
                for (index, color) in self.parser.parse_color_quad(value)?.iter().enumerate() {
                    let start = index * COLOR_VALUE_SIZE;
                    bytes[start..start + COLOR_VALUE_SIZE].copy_from_slice(&color.to_bytes());
                }
            }
            ValueKind::Float => NativeEndian::write_f32(bytes, utils::parse_f32(value)?),
            ValueKind::Float4 => {
                NativeEndian::write_f32_into(&utils::parse_float4(value)?, bytes)
            }
            ValueKind::UInt => NativeEndian::write_u32(bytes, utils::parse_u32(value)?),
            ValueKind::Alignment => bytes[0] = utils::parse_alignment(value)? as u8,
            ValueKind::Flag => {
                let bit = property.bit_offset.unwrap_or(0);
                let mask = 1u8 << (bit % 8);
                if utils::parse_bool(value)? {
                    bytes[bit / 8] |= mask;
                } else {
                    bytes[bit / 8] &= !mask;
                }
            }
            ValueKind::Flags => {
                return Err(LayoutError::invalid_value(
                    "flags",
                    value,
                    "set individual flags by name",
                ))
            }
            ValueKind::Text => NativeEndian::write_i64(bytes, text_offset.unwrap_or(0)),
        }
        Ok(())
    }

    /// Structural checks plus registry checks for buffers from any producer.
    pub fn validate(&self, config: &[u8]) -> Result<()> {
        buffer::validate_layout(config)?;

        let element = buffer::element(config);
        let info = self
            .registry
            .element_info(element)
            .ok_or_else(|| LayoutError::unknown_element(element.to_string()))?;
        self.elements.require(element)?;

        for (block, required) in self.registry.property_blocks_for_element(element)? {
            let header = buffer::get_property_block_header(config, block);
            let block_name = || {
                self.registry
                    .block_info(block)
                    .map_or_else(|| block.to_string(), |b| b.name.clone())
            };
            match header {
                None if required => {
                    return Err(LayoutError::MissingRequiredBlock {
                        element: info.name.clone(),
                        block: block_name(),
                    })
                }
                Some(header) => {
                    let expected = self.registry.block_info(block).map_or(0, |b| b.size);
                    if header.payload_len() != expected {
                        return Err(LayoutError::invalid_format(format!(
                            "block '{}' is {} bytes, registered as {}",
                            block_name(),
                            header.payload_len(),
                            expected
                        )));
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

fn write_lengths(bytes: &mut [u8], lengths: &[Length]) {
    for (index, length) in lengths.iter().enumerate() {
        length.write(&mut bytes[index * LENGTH_VALUE_SIZE..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ConfigRef;
    use crate::context::UiContext;
    use crate::length::LengthUnit;

    #[test]
    fn test_build_writes_sorted_headers() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let node = builder.build("HBox", &[("spacing", "5px")]).unwrap();

        let hashes: Vec<TypeHash> = buffer::iterate(&node.config).map(|(h, _)| h.hash).collect();
        let mut sorted = hashes.clone();
        sorted.sort();
        assert_eq!(hashes, sorted);

        let expected = context
            .registry()
            .property_blocks_for_element(node.element())
            .unwrap();
        assert_eq!(hashes.len(), expected.len());
        assert_eq!(buffer::block_count(&node.config), expected.len());
        assert_eq!(
            buffer::config_length(&node.config),
            node.config.len() - BLOCK_SECTION_OFFSET
        );
    }

    #[test]
    fn test_defaults_and_values() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let blocks = context.blocks();
        let node = builder
            .build("HBox", &[("margin", "1px 2px"), ("max-width", "50%")])
            .unwrap();
        let config = ConfigRef::new(&node.config);

        let box_block = blocks.box_block(&config);
        assert_eq!(box_block.margin[1], Length::px(2.0));
        assert_eq!(box_block.margin[2], Length::px(1.0));
        assert_eq!(box_block.padding, [Length::px(0.0); 4]);

        let size = blocks.size_block(&config);
        assert_eq!(size.width[1], Length::new(50.0, LengthUnit::Percent));
        assert!(size.height[1].value.is_infinite());

        assert_eq!(blocks.display_flags(&node.config), (true, true));
    }

    #[test]
    fn test_optional_block_enabled_by_value() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let blocks = context.blocks();

        let plain = builder.build("Box", &[] as &[(&str, &str)]).unwrap();
        assert!(ConfigRef::new(&plain.config).block(blocks.background).is_none());
        assert!(ConfigRef::new(&plain.config).block_unchecked(blocks.background).is_some());

        let colored = builder.build("Box", &[("background-color", "#ff0000")]).unwrap();
        let background = blocks.background_block(&ConfigRef::new(&colored.config)).unwrap();
        assert_eq!(background.color, Color::new(255, 0, 0, 255));
    }

    #[test]
    fn test_flags_and_text() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let blocks = context.blocks();

        let node = builder
            .build("Text", &[("text", "hello"), ("visible", "false")])
            .unwrap();
        assert_eq!(blocks.display_flags(&node.config), (false, true));

        let text = blocks.text_block(&ConfigRef::new(&node.config)).unwrap();
        let entry = extra_data::read_text(&node.extra, text.extra_data_offset).unwrap();
        assert_eq!(entry.as_str(), "hello");
    }

    #[test]
    fn test_producer_errors() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();

        assert!(matches!(
            builder.build("Marquee", &[] as &[(&str, &str)]),
            Err(LayoutError::UnknownElement { .. })
        ));
        assert!(matches!(
            builder.build("Box", &[("colour", "#fff")]),
            Err(LayoutError::UnknownProperty { .. })
        ));
        match builder.build("Box", &[("margin", "4 furlongs")]) {
            Err(LayoutError::InvalidValue { property, .. }) => assert_eq!(property, "margin"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        // Box has no layout block, so spacing does not apply.
        assert!(matches!(
            builder.build("Box", &[("spacing", "4px")]),
            Err(LayoutError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_required_block() {
        let context = UiContext::with_builtins(Default::default()).unwrap();
        let builder = context.builder().unwrap();
        let element = context.registry().element_id("Box").unwrap();

        let bare = buffer::tests::assemble(element.0, &[]);
        assert!(matches!(
            builder.validate(&bare),
            Err(LayoutError::MissingRequiredBlock { .. })
        ));

        let unknown = buffer::tests::assemble(12345, &[]);
        assert!(matches!(
            builder.validate(&unknown),
            Err(LayoutError::UnknownElement { .. })
        ));
    }
}
