//! Type registry: block and element types, named properties and the
//! length fields the normalization pass resolves every frame.

use crate::error::{LayoutError, Result};
use crate::types::{TypeHash, COLOR_VALUE_SIZE, LENGTH_VALUE_SIZE};
use std::collections::{HashMap, HashSet};
use std::ops::BitOr;

/// Addresses one property inside a block: `(block, offset, length, bit)`.
///
/// `bit_offset` is `None` for byte-addressed fields and the bit index inside
/// the field for packed boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    pub block: TypeHash,
    pub offset: usize,
    pub length: usize,
    pub bit_offset: Option<usize>,
}

impl Property {
    pub fn field(block: TypeHash, offset: usize, length: usize) -> Self {
        Self {
            block,
            offset,
            length,
            bit_offset: None,
        }
    }

    pub fn bit(block: TypeHash, offset: usize, length: usize, bit: usize) -> Self {
        Self {
            block,
            offset,
            length,
            bit_offset: Some(bit),
        }
    }

    pub fn is_bit_property(&self) -> bool {
        self.bit_offset.is_some()
    }
}

/// How a property's text value is parsed and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Length,
    LengthPair,
    LengthQuad,
    Color,
    ColorQuad,
    Float,
    Float4,
    UInt,
    Alignment,
    Flags,
    Flag,
    Text,
}

impl ValueKind {
    pub fn size(self) -> usize {
        match self {
            Self::Length => LENGTH_VALUE_SIZE,
            Self::LengthPair => LENGTH_VALUE_SIZE * 2,
            Self::LengthQuad => LENGTH_VALUE_SIZE * 4,
            Self::Color => COLOR_VALUE_SIZE,
            Self::ColorQuad => COLOR_VALUE_SIZE * 4,
            Self::Float | Self::UInt => 4,
            Self::Float4 => 16,
            Self::Alignment | Self::Flags | Self::Flag => 1,
            Self::Text => 8,
        }
    }

    /// Kind and arity of each sub-field of a composite.
    pub fn component(self) -> Option<(ValueKind, usize)> {
        match self {
            Self::LengthPair => Some((Self::Length, 2)),
            Self::LengthQuad => Some((Self::Length, 4)),
            Self::ColorQuad => Some((Self::Color, 4)),
            _ => None,
        }
    }
}

/// Which node a percentage resolves against. Combinable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReferenceTarget(u8);

impl ReferenceTarget {
    pub const NONE: ReferenceTarget = ReferenceTarget(0);
    pub const SELF: ReferenceTarget = ReferenceTarget(1);
    pub const PARENT: ReferenceTarget = ReferenceTarget(2);
    pub const ROOT: ReferenceTarget = ReferenceTarget(4);

    pub fn contains(self, other: ReferenceTarget) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ReferenceTarget {
    type Output = ReferenceTarget;

    fn bitor(self, rhs: ReferenceTarget) -> ReferenceTarget {
        ReferenceTarget(self.0 | rhs.0)
    }
}

/// A length-valued property and the reference its percentages resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthInfo {
    pub property: Property,
    pub reference: Option<Property>,
    pub target: ReferenceTarget,
}

#[derive(Debug, Clone)]
pub struct BlockInfo {
    pub id: TypeHash,
    pub name: String,
    pub size: usize,
    pub global: bool,
}

#[derive(Debug, Clone)]
pub struct ElementInfo {
    pub id: TypeHash,
    pub name: String,
    pub blocks: Vec<(TypeHash, bool)>,
}

/// One named field of a block definition.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub offset: usize,
    pub kind: ValueKind,
    pub default: Option<String>,
    /// Composite sub-field names, or flag names for `ValueKind::Flags`.
    pub parts: Vec<String>,
    /// `min-width` style (part before field) instead of `margin-top`.
    pub part_first: bool,
    /// Reference property name and target for percentages.
    pub reference: Option<(String, ReferenceTarget)>,
}

impl FieldDefinition {
    pub fn new(name: &str, offset: usize, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            offset,
            kind,
            default: None,
            parts: Vec::new(),
            part_first: false,
            reference: None,
        }
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    pub fn parts(mut self, parts: &[&str], part_first: bool) -> Self {
        self.parts = parts.iter().map(|p| p.to_string()).collect();
        self.part_first = part_first;
        self
    }

    pub fn reference(mut self, property: &str, target: ReferenceTarget) -> Self {
        self.reference = Some((property.to_string(), target));
        self
    }
}

/// A property block type with its named fields.
#[derive(Debug, Clone)]
pub struct BlockDefinition {
    pub name: String,
    pub prefix: Option<String>,
    pub size: usize,
    pub global: bool,
    pub fields: Vec<FieldDefinition>,
}

impl BlockDefinition {
    pub fn new(name: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            prefix: None,
            size,
            global: false,
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> TypeHash {
        TypeHash::of(&self.name)
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}

struct PendingLength {
    block: TypeHash,
    name: String,
    property: Property,
    reference: Option<(String, ReferenceTarget)>,
}

#[derive(Default)]
pub struct TypeRegistry {
    blocks: HashMap<TypeHash, BlockInfo>,
    global_blocks: Vec<TypeHash>,
    elements: HashMap<TypeHash, ElementInfo>,
    element_names: HashMap<String, TypeHash>,
    properties: HashMap<String, Property>,
    property_kinds: HashMap<Property, ValueKind>,
    defaults: HashMap<TypeHash, Vec<(String, String)>>,
    pending_lengths: Vec<PendingLength>,
    lengths: HashMap<TypeHash, Vec<LengthInfo>>,
    sealed: bool,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.sealed {
            return Err(LayoutError::registry("registry is sealed"));
        }
        Ok(())
    }

    pub fn register_block(&mut self, id: TypeHash, name: &str, size: usize, global: bool) -> Result<()> {
        self.ensure_open()?;
        if let Some(existing) = self.blocks.get(&id) {
            return Err(LayoutError::registry(format!(
                "block id {} of '{}' already registered by '{}'",
                id, name, existing.name
            )));
        }
        self.blocks.insert(
            id,
            BlockInfo {
                id,
                name: name.to_string(),
                size,
                global,
            },
        );
        if global {
            self.global_blocks.push(id);
        }
        log::debug!("Registered block '{}' ({}, {} bytes)", name, id, size);
        Ok(())
    }

    pub fn register_element(&mut self, id: TypeHash, name: &str, blocks: &[(TypeHash, bool)]) -> Result<()> {
        self.ensure_open()?;
        if self.element_names.contains_key(name) || self.elements.contains_key(&id) {
            return Err(LayoutError::registry(format!("element '{}' already registered", name)));
        }
        let mut seen = HashSet::new();
        for (block, _) in blocks {
            if !self.blocks.contains_key(block) {
                return Err(LayoutError::UnknownBlock { id: block.0 });
            }
            if !seen.insert(*block) {
                return Err(LayoutError::DuplicateBlock { id: block.0 });
            }
        }
        self.elements.insert(
            id,
            ElementInfo {
                id,
                name: name.to_string(),
                blocks: blocks.to_vec(),
            },
        );
        self.element_names.insert(name.to_string(), id);
        log::debug!("Registered element '{}' ({}) with {} blocks", name, id, blocks.len());
        Ok(())
    }

    pub fn register_property(&mut self, name: &str, property: Property, kind: ValueKind) -> Result<()> {
        self.ensure_open()?;
        if self.properties.contains_key(name) {
            return Err(LayoutError::registry(format!("property '{}' already registered", name)));
        }
        self.properties.insert(name.to_string(), property);
        self.property_kinds.insert(property, kind);
        Ok(())
    }

    /// Marks a length field for per-frame normalization. The reference is
    /// resolved by name when the registry is sealed.
    pub fn register_length(
        &mut self,
        name: &str,
        property: Property,
        reference: Option<(String, ReferenceTarget)>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.pending_lengths.push(PendingLength {
            block: property.block,
            name: name.to_string(),
            property,
            reference,
        });
        Ok(())
    }

    pub fn register_default(&mut self, block: TypeHash, property: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        self.defaults
            .entry(block)
            .or_default()
            .push((property.to_string(), value.to_string()));
        Ok(())
    }

    /// Registers a block type together with its named properties, defaults
    /// and length fields.
    pub fn define_block(&mut self, definition: &BlockDefinition) -> Result<TypeHash> {
        let id = definition.id();
        self.register_block(id, &definition.name, definition.size, definition.global)?;

        for field in &definition.fields {
            if field.offset + field.kind.size() > definition.size {
                return Err(LayoutError::registry(format!(
                    "field '{}' overruns block '{}'",
                    field.name, definition.name
                )));
            }
            let full_name = match &definition.prefix {
                Some(prefix) => format!("{}-{}", prefix, field.name),
                None => field.name.clone(),
            };
            let property = Property::field(id, field.offset, field.kind.size());

            if field.kind == ValueKind::Flags {
                for (bit, flag) in field.parts.iter().enumerate() {
                    let flag_name = match &definition.prefix {
                        Some(prefix) => format!("{}-{}", prefix, flag),
                        None => flag.clone(),
                    };
                    let flag_property = Property::bit(id, field.offset, field.kind.size(), bit);
                    self.register_property(&flag_name, flag_property, ValueKind::Flag)?;
                    if let Some(default) = &field.default {
                        self.register_default(id, &flag_name, default)?;
                    }
                }
            } else {
                self.register_property(&full_name, property, field.kind)?;
            }

            match field.kind.component() {
                Some((component_kind, arity)) => {
                    let step = component_kind.size();
                    for index in 0..arity {
                        let component = Property::field(id, field.offset + index * step, step);
                        if let Some(part) = field.parts.get(index) {
                            let part_name = if field.part_first {
                                match &definition.prefix {
                                    Some(prefix) => format!("{}-{}-{}", prefix, part, field.name),
                                    None => format!("{}-{}", part, field.name),
                                }
                            } else {
                                format!("{}-{}", full_name, part)
                            };
                            self.register_property(&part_name, component, component_kind)?;
                        }
                        if component_kind == ValueKind::Length {
                            let name = format!("{}[{}]", full_name, index);
                            self.register_length(&name, component, field.reference.clone())?;
                        }
                    }
                }
                None if field.kind == ValueKind::Length => {
                    self.register_length(&full_name, property, field.reference.clone())?;
                }
                None => {}
            }

            if field.kind != ValueKind::Flags {
                if let Some(default) = &field.default {
                    self.register_default(id, &full_name, default)?;
                }
            }
        }
        Ok(id)
    }

    /// Resolves length references and freezes the registry.
    pub fn seal(&mut self) -> Result<()> {
        self.ensure_open()?;
        for pending in self.pending_lengths.drain(..) {
            let (reference, target) = match &pending.reference {
                Some((name, target)) => {
                    let reference = self.properties.get(name).copied().ok_or_else(|| {
                        LayoutError::UnresolvedReference {
                            property: pending.name.clone(),
                            reference: name.clone(),
                        }
                    })?;
                    (Some(reference), *target)
                }
                None => (None, ReferenceTarget::NONE),
            };
            self.lengths.entry(pending.block).or_default().push(LengthInfo {
                property: pending.property,
                reference,
                target,
            });
        }
        self.sealed = true;
        log::info!(
            "Type registry sealed: {} blocks, {} elements, {} properties",
            self.blocks.len(),
            self.elements.len(),
            self.properties.len()
        );
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn lookup_property(&self, name: &str) -> Result<Property> {
        self.properties
            .get(name)
            .copied()
            .ok_or_else(|| LayoutError::unknown_property(name))
    }

    pub fn property_kind(&self, property: &Property) -> Option<ValueKind> {
        self.property_kinds.get(property).copied()
    }

    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn block_info(&self, id: TypeHash) -> Option<&BlockInfo> {
        self.blocks.get(&id)
    }

    pub fn element_info(&self, id: TypeHash) -> Option<&ElementInfo> {
        self.elements.get(&id)
    }

    pub fn element_id(&self, name: &str) -> Result<TypeHash> {
        self.element_names
            .get(name)
            .copied()
            .ok_or_else(|| LayoutError::unknown_element(name))
    }

    pub fn element_name(&self, id: TypeHash) -> Option<&str> {
        self.elements.get(&id).map(|info| info.name.as_str())
    }

    pub fn element_ids(&self) -> impl Iterator<Item = TypeHash> + '_ {
        self.elements.keys().copied()
    }

    /// Global blocks plus the element's own, ascending by block id. This is
    /// the order the builder writes blocks in.
    pub fn property_blocks_for_element(&self, element: TypeHash) -> Result<Vec<(TypeHash, bool)>> {
        let info = self
            .elements
            .get(&element)
            .ok_or_else(|| LayoutError::unknown_element(element.to_string()))?;
        let mut blocks: Vec<(TypeHash, bool)> = self.global_blocks.iter().map(|id| (*id, true)).collect();
        for (block, required) in &info.blocks {
            if !self.global_blocks.contains(block) {
                blocks.push((*block, *required));
            }
        }
        blocks.sort_by_key(|(id, _)| *id);
        Ok(blocks)
    }

    pub fn defaults(&self, block: TypeHash) -> &[(String, String)] {
        self.defaults.get(&block).map_or(&[], |d| d.as_slice())
    }

    /// Length fields of a block, available once the registry is sealed.
    pub fn length_infos(&self, block: TypeHash) -> &[LengthInfo] {
        self.lengths.get(&block).map_or(&[], |l| l.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spacing_block() -> BlockDefinition {
        BlockDefinition::new("SpacingBlock", 36 + 1)
            .prefix("pad")
            .field(
                FieldDefinition::new("inset", 0, ValueKind::LengthQuad)
                    .parts(&["top", "right", "bottom", "left"], false)
                    .default_value("0px"),
            )
            .field(FieldDefinition::new("flags", 36, ValueKind::Flags).parts(&["a", "b"], false))
    }

    #[test]
    fn test_define_block_names_properties() {
        let mut registry = TypeRegistry::new();
        let id = registry.define_block(&spacing_block()).unwrap();

        let whole = registry.lookup_property("pad-inset").unwrap();
        assert_eq!(whole, Property::field(id, 0, 36));
        assert_eq!(registry.property_kind(&whole), Some(ValueKind::LengthQuad));

        let left = registry.lookup_property("pad-inset-left").unwrap();
        assert_eq!(left, Property::field(id, 27, 9));
        assert_eq!(registry.property_kind(&left), Some(ValueKind::Length));

        let b = registry.lookup_property("pad-b").unwrap();
        assert!(b.is_bit_property());
        assert_eq!(b.bit_offset, Some(1));

        assert!(matches!(
            registry.lookup_property("pad-nope"),
            Err(LayoutError::UnknownProperty { .. })
        ));
        assert_eq!(registry.defaults(id), &[("pad-inset".to_string(), "0px".to_string())]);
    }

    #[test]
    fn test_part_first_naming() {
        let mut registry = TypeRegistry::new();
        let def = BlockDefinition::new("Sz", 18).field(
            FieldDefinition::new("width", 0, ValueKind::LengthPair).parts(&["min", "max"], true),
        );
        let id = registry.define_block(&def).unwrap();
        assert_eq!(registry.lookup_property("max-width").unwrap(), Property::field(id, 9, 9));
        assert!(registry.lookup_property("width-max").is_err());
    }

    #[test]
    fn test_property_blocks_sorted_with_globals() {
        let mut registry = TypeRegistry::new();
        let a = TypeHash(30);
        let b = TypeHash(10);
        let global = TypeHash(20);
        registry.register_block(a, "A", 1, false).unwrap();
        registry.register_block(b, "B", 1, false).unwrap();
        registry.register_block(global, "G", 1, true).unwrap();
        registry
            .register_element(TypeHash(99), "E", &[(a, true), (b, false)])
            .unwrap();

        let blocks = registry.property_blocks_for_element(TypeHash(99)).unwrap();
        assert_eq!(blocks, vec![(b, false), (global, true), (a, true)]);
        assert!(registry.property_blocks_for_element(TypeHash(1)).is_err());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = TypeRegistry::new();
        registry.register_block(TypeHash(1), "A", 1, false).unwrap();
        assert!(registry.register_block(TypeHash(1), "A2", 1, false).is_err());
        assert!(matches!(
            registry.register_element(TypeHash(5), "E", &[(TypeHash(1), true), (TypeHash(1), true)]),
            Err(LayoutError::DuplicateBlock { id: 1 })
        ));
        assert!(matches!(
            registry.register_element(TypeHash(5), "E", &[(TypeHash(2), true)]),
            Err(LayoutError::UnknownBlock { id: 2 })
        ));
    }

    #[test]
    fn test_seal_resolves_references() {
        let mut registry = TypeRegistry::new();
        let def = BlockDefinition::new("Sz", 18).field(
            FieldDefinition::new("width", 0, ValueKind::LengthPair)
                .parts(&["min", "max"], true)
                .reference("max-width", ReferenceTarget::PARENT),
        );
        let id = registry.define_block(&def).unwrap();
        registry.seal().unwrap();

        let infos = registry.length_infos(id);
        assert_eq!(infos.len(), 2);
        let max_width = registry.lookup_property("max-width").unwrap();
        assert!(infos.iter().all(|i| i.reference == Some(max_width)));
        assert!(infos.iter().all(|i| i.target == ReferenceTarget::PARENT));

        assert!(registry.register_block(TypeHash(3), "Late", 1, false).is_err());
    }

    #[test]
    fn test_seal_rejects_unknown_reference() {
        let mut registry = TypeRegistry::new();
        let def = BlockDefinition::new("Sz", 9).field(
            FieldDefinition::new("w", 0, ValueKind::Length).reference("missing", ReferenceTarget::SELF),
        );
        registry.define_block(&def).unwrap();
        assert!(matches!(
            registry.seal(),
            Err(LayoutError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_reference_target_flags() {
        let supported = ReferenceTarget::SELF | ReferenceTarget::ROOT;
        assert!(supported.contains(ReferenceTarget::ROOT));
        assert!(!supported.contains(ReferenceTarget::PARENT));
        assert!(!supported.contains(ReferenceTarget::NONE));
        assert!(ReferenceTarget::NONE.is_none());
    }
}
