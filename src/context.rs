//! Layout context and frame pipeline
//!
//! [`UiContext`] owns everything that is built once per process: the sealed
//! type registry, the element behavior table and the font library. A frame
//! runs normalization, layout, quad counting and rendering over each
//! document. Documents share nothing mutable, so a frame can spread them
//! over a rayon thread pool.

use crate::behavior::{Element, ElementTable};
use crate::builder::ConfigBuilder;
use crate::elements;
use crate::error::{LayoutError, Result};
use crate::fonts::FontLibrary;
use crate::layout::LayoutPass;
use crate::length::LengthContext;
use crate::normalize::NormalizePass;
use crate::properties::BuiltinBlocks;
use crate::registry::{BlockDefinition, TypeRegistry};
use crate::render::{self, MeshData, RenderPass};
use crate::tree::UiDocument;
use crate::types::{Constraints, TypeHash, Vec2};
use serde::{Deserialize, Serialize};
use rayon::prelude::*;
use std::sync::Arc;

/// Per-frame inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub dpi: f32,
    pub pixel_scale: f32,
    pub viewport_size: Vec2,
    pub root_constraints: Constraints,
    pub worker_threads: usize,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            pixel_scale: 1.0,
            viewport_size: Vec2::new(1920.0, 1080.0),
            root_constraints: Constraints::unbounded(),
            worker_threads: 1,
        }
    }
}

impl FrameSettings {
    pub fn length_context(&self) -> LengthContext {
        LengthContext {
            dpi: self.dpi,
            pixel_scale: self.pixel_scale,
            viewport_size: self.viewport_size,
            relative_to: 0.0,
        }
    }
}

/// Registers custom blocks and elements next to the built-in ones before
/// the registry is sealed.
pub struct UiContextBuilder {
    registry: TypeRegistry,
    elements: ElementTable,
    blocks: BuiltinBlocks,
    fonts: Arc<FontLibrary>,
}

impl UiContextBuilder {
    pub fn new(fonts: FontLibrary) -> Result<Self> {
        let mut registry = TypeRegistry::new();
        let mut elements = ElementTable::new();
        let blocks = BuiltinBlocks::register(&mut registry)?;
        let fonts = Arc::new(fonts);
        elements::register_builtin_elements(&mut registry, &mut elements, blocks, fonts.clone())?;
        Ok(Self {
            registry,
            elements,
            blocks,
            fonts,
        })
    }

    pub fn block(mut self, definition: BlockDefinition) -> Result<Self> {
        self.registry.define_block(&definition)?;
        Ok(self)
    }

    /// Registers an element over blocks given by name with their required
    /// flag. Global blocks are added implicitly.
    pub fn element(
        mut self,
        name: &str,
        blocks: &[(&str, bool)],
        behavior: Box<dyn Element>,
    ) -> Result<Self> {
        let id = TypeHash::of(name);
        let blocks: Vec<(TypeHash, bool)> = blocks
            .iter()
            .map(|(block, required)| (TypeHash::of(block), *required))
            .collect();
        self.registry.register_element(id, name, &blocks)?;
        self.elements.build(id, behavior)?;
        Ok(self)
    }

    pub fn blocks(&self) -> &BuiltinBlocks {
        &self.blocks
    }

    pub fn build(mut self) -> Result<UiContext> {
        self.registry.seal()?;
        for id in self.registry.element_ids() {
            self.elements.require(id)?;
        }
        log::info!(
            "Layout context ready: {} element behaviors, {} font faces",
            self.elements.len(),
            self.fonts.len()
        );
        Ok(UiContext {
            registry: self.registry,
            elements: self.elements,
            blocks: self.blocks,
            fonts: self.fonts,
        })
    }
}

pub struct UiContext {
    registry: TypeRegistry,
    elements: ElementTable,
    blocks: BuiltinBlocks,
    fonts: Arc<FontLibrary>,
}

impl UiContext {
    /// Context with the built-in blocks and elements only.
    pub fn with_builtins(fonts: FontLibrary) -> Result<Self> {
        UiContextBuilder::new(fonts)?.build()
    }

    pub fn builder(&self) -> Result<ConfigBuilder<'_>> {
        ConfigBuilder::new(&self.registry, &self.elements)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn elements(&self) -> &ElementTable {
        &self.elements
    }

    pub fn blocks(&self) -> &BuiltinBlocks {
        &self.blocks
    }

    pub fn fonts(&self) -> Arc<FontLibrary> {
        self.fonts.clone()
    }

    /// Lays out one document without rendering it.
    pub fn layout_document(&self, doc: &mut UiDocument, settings: &FrameSettings) -> Result<usize> {
        doc.set_root_constraints(settings.root_constraints);
        let lengths = NormalizePass::new(&self.registry, settings.length_context()).run(doc);
        let laid_out = LayoutPass::new(&self.elements, &self.blocks).run(doc)?;
        log::trace!(
            "Document laid out: {} nodes, {} lengths normalized",
            laid_out,
            lengths
        );
        Ok(laid_out)
    }

    /// Runs every pass over one document and returns its mesh.
    pub fn process_document(&self, doc: &mut UiDocument, settings: &FrameSettings) -> Result<MeshData> {
        self.layout_document(doc, settings)?;
        render::count_render_quads(doc, &self.elements)?;
        let mesh = RenderPass::new(&self.elements, &self.blocks).run(doc)?;
        log::debug!(
            "Document processed: {} nodes, {} quads, {} indices",
            doc.total_node_count(),
            mesh.quad_count(),
            mesh.indices.len()
        );
        Ok(mesh)
    }

    /// Processes documents on a pool of `settings.worker_threads` threads.
    /// Meshes come back in document order; the first failing document fails
    /// the frame.
    pub fn process_frame(&self, docs: &mut [UiDocument], settings: &FrameSettings) -> Result<Vec<MeshData>> {
        let workers = settings.worker_threads.max(1);
        if workers == 1 || docs.len() < 2 {
            return docs
                .iter_mut()
                .map(|doc| self.process_document(doc, settings))
                .collect();
        }

        log::debug!("Processing {} documents on {} workers", docs.len(), workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| LayoutError::Worker {
                message: e.to_string(),
            })?;
        pool.install(|| {
            docs.par_iter_mut()
                .map(|doc| self.process_document(doc, settings))
                .collect()
        })
    }

    /// Releases the context. Documents built against it must not be
    /// processed afterwards.
    pub fn shutdown(self) {
        log::info!(
            "Shutting down layout context ({} elements, {} properties)",
            self.elements.len(),
            self.registry.property_names().len()
        );
    }
}
