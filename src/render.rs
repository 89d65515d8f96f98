//! Quad counting and mesh generation
//!
//! The count pass records every node's quad count and the document total so
//! the render pass can size its vertex and index arrays once. Each node owns a
//! contiguous slot of `quads * 4` vertices in pre-order; hidden nodes keep
//! their slot and fill it with zeroed vertices.

use crate::behavior::ElementTable;
use crate::buffer::ConfigRef;
use crate::error::{LayoutError, Result};
use crate::mesh::{self, Vertex, FLIP};
use crate::properties::BuiltinBlocks;
use crate::tree::{NodeId, UiDocument};
use crate::types::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub center: [f32; 3],
    pub extents: [f32; 3],
}

impl Bounds {
    /// Bounds of a node at `position` (y-down) in y-up mesh space.
    pub fn of(position: Vec2, size: Vec2) -> Self {
        Self {
            center: [
                (position.x + size.x * 0.5) * FLIP.x,
                (position.y + size.y * 0.5) * FLIP.y,
                0.0,
            ],
            extents: [size.x, size.y, 0.0],
        }
    }
}

/// Vertex and index range of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SubMesh {
    pub index_start: usize,
    pub index_count: usize,
    pub first_vertex: usize,
    pub vertex_count: usize,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    /// One per node, in pre-order.
    pub sub_meshes: Vec<SubMesh>,
}

impl MeshData {
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Stores each node's quad count and the document total. Fails when the
/// total would not fit 16-bit indices.
pub fn count_render_quads(doc: &mut UiDocument, elements: &ElementTable) -> Result<usize> {
    let mut total = 0;
    for node in doc.nodes_mut() {
        let element = elements.require(node.element())?;
        node.render_quad_count = element.render_quad_count(ConfigRef::new(&node.config), &node.extra);
        total += node.render_quad_count;
    }

    let vertices = total * VERTICES_PER_QUAD;
    if vertices > MAX_MESH_VERTICES {
        return Err(LayoutError::IndexOverflow { vertices });
    }
    doc.set_total_render_quad_count(total);
    log::trace!("Counted {} quads over {} nodes", total, doc.total_node_count());
    Ok(total)
}

pub struct RenderPass<'a> {
    elements: &'a ElementTable,
    blocks: &'a BuiltinBlocks,
}

impl<'a> RenderPass<'a> {
    pub fn new(elements: &'a ElementTable, blocks: &'a BuiltinBlocks) -> Self {
        Self { elements, blocks }
    }

    /// Builds the document mesh. Expects a finished layout and quad count.
    pub fn run(&self, doc: &UiDocument) -> Result<MeshData> {
        let quads = doc.total_render_quad_count();
        let mut mesh = MeshData {
            vertices: vec![Vertex::default(); quads * VERTICES_PER_QUAD],
            indices: Vec::with_capacity(quads * INDICES_PER_QUAD),
            sub_meshes: Vec::with_capacity(doc.total_node_count()),
        };
        let mut cursor = 0;
        self.render(doc, UiDocument::ROOT, Vec2::ZERO, true, &mut mesh, &mut cursor)?;
        Ok(mesh)
    }

    fn render(
        &self,
        doc: &UiDocument,
        id: NodeId,
        offset: Vec2,
        visible: bool,
        mesh: &mut MeshData,
        cursor: &mut usize,
    ) -> Result<()> {
        let node = &doc.nodes()[id];
        let element = self.elements.require(node.element())?;
        let absolute = offset.add(node.position());
        let size = node.size();

        let quads = node.render_quad_count;
        let first_vertex = *cursor * VERTICES_PER_QUAD;
        let vertex_count = quads * VERTICES_PER_QUAD;
        let slot = mesh
            .vertices
            .get_mut(first_vertex..first_vertex + vertex_count)
            .ok_or_else(|| {
                LayoutError::invalid_format(format!(
                    "node {} needs {} quads beyond the counted total",
                    id, quads
                ))
            })?;

        let (node_visible, displayed) = self.blocks.display_flags(&node.config);
        let shown = visible && node_visible && displayed;
        if shown {
            element.generate_mesh_data(
                ConfigRef::new(&node.config),
                LayoutRect::from_position_size(absolute, size),
                slot,
                &node.extra,
            );
        } else {
            mesh::clear_vertices(slot);
        }

        let index_start = mesh.indices.len();
        for quad in 0..quads {
            let base = first_vertex + quad * VERTICES_PER_QUAD;
            mesh.indices
                .extend(QUAD_INDEX_PATTERN.iter().map(|i| (base + *i as usize) as u16));
        }
        mesh.sub_meshes.push(SubMesh {
            index_start,
            index_count: quads * INDICES_PER_QUAD,
            first_vertex,
            vertex_count,
            bounds: Bounds::of(absolute, size),
        });
        *cursor += quads;

        for &child in &node.children {
            self.render(doc, child, absolute, shown, mesh, cursor)?;
        }
        Ok(())
    }
}
