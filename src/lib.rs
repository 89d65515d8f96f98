//! Kryon UI Layout Engine
//!
//! Data-driven layout for UI trees whose nodes are packed binary config
//! buffers. Every node carries a runtime header (constraints, size,
//! position), a config header naming its element type, and a list of
//! property blocks sorted by 64-bit type hash. Element behaviors read the
//! blocks they need and the frame passes write the results back in place.
//!
//! # Basic Usage
//!
//! ```rust
//! use kryon_layout::{FontLibrary, FrameSettings, Result, UiContext, UiDocument};
//!
//! fn main() -> Result<()> {
//!     let context = UiContext::with_builtins(FontLibrary::with_default_face())?;
//!     let builder = context.builder()?;
//!     let mut doc = UiDocument::new(builder.build("HBox", &[("spacing", "4px")])?);
//!     doc.add_child(UiDocument::ROOT, builder.build("Text", &[("text", "Hello")])?)?;
//!
//!     let mesh = context.process_document(&mut doc, &FrameSettings::default())?;
//!     assert_eq!(mesh.sub_meshes.len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! # Frame Pipeline
//!
//! 1. **Normalize** - resolve every length field to pixels
//! 2. **Layout** - constrain children top-down, size nodes bottom-up
//! 3. **Count** - quads per node, total checked against 16-bit indices
//! 4. **Render** - vertices, indices and one sub-mesh per node

pub mod behavior;
pub mod buffer;
pub mod builder;
pub mod cli;
pub mod context;
pub mod elements;
pub mod error;
pub mod extra_data;
pub mod fonts;
pub mod layout;
pub mod length;
pub mod mesh;
pub mod normalize;
pub mod properties;
pub mod registry;
pub mod render;
pub mod tree;
pub mod types;
pub mod utils;
pub mod view;

pub use behavior::{Children, Container, Element, ElementTable};
pub use buffer::ConfigRef;
pub use builder::{ConfigBuilder, NodeConfig};
pub use context::{FrameSettings, UiContext, UiContextBuilder};
pub use error::{LayoutError, Result};
pub use fonts::{FontFace, FontLibrary, Glyph};
pub use length::{Length, LengthContext, LengthUnit};
pub use mesh::Vertex;
pub use properties::BuiltinBlocks;
pub use registry::{BlockDefinition, FieldDefinition, Property, ReferenceTarget, TypeRegistry, ValueKind};
pub use render::{Bounds, MeshData, SubMesh};
pub use tree::{NodeId, UiDocument, UiNode};
pub use types::*;
pub use view::ViewNode;

use std::path::Path;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Loads a view file and lays it out with the built-in elements.
pub fn layout_file(path: impl AsRef<Path>, settings: &FrameSettings) -> Result<UiDocument> {
    let context = UiContext::with_builtins(FontLibrary::with_default_face())?;
    let mut doc = ViewNode::load(path)?.build(&context.builder()?)?;
    context.layout_document(&mut doc, settings)?;
    context.shutdown();
    Ok(doc)
}

/// Loads a view file and runs a full frame over it.
pub fn render_file(path: impl AsRef<Path>, settings: &FrameSettings) -> Result<(UiDocument, MeshData)> {
    let context = UiContext::with_builtins(FontLibrary::with_default_face())?;
    let mut doc = ViewNode::load(path)?.build(&context.builder()?)?;
    let mesh = context.process_document(&mut doc, settings)?;
    context.shutdown();
    Ok((doc, mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn context() -> UiContext {
        UiContext::with_builtins(FontLibrary::with_default_face()).unwrap()
    }

    #[test]
    fn test_display_none_subtree_keeps_zeroed_slots() {
        let context = context();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("VBox", &[("spacing", "3px")]).unwrap());
        let hidden = doc
            .add_child(
                UiDocument::ROOT,
                builder.build("HBox", &[("display", "false"), ("background-color", "#fff")]).unwrap(),
            )
            .unwrap();
        let label = doc
            .add_child(hidden, builder.build("Text", &[("text", "abc")]).unwrap())
            .unwrap();
        let after = doc
            .add_child(UiDocument::ROOT, builder.build("Box", &[("min-height", "8px")]).unwrap())
            .unwrap();

        let mesh = context.process_document(&mut doc, &FrameSettings::default()).unwrap();
        for id in [hidden, label] {
            assert_eq!(doc.nodes()[id].size(), Vec2::ZERO);
            assert_eq!(doc.nodes()[id].position(), Vec2::ZERO);
        }
        assert_eq!(doc.nodes()[after].position(), Vec2::ZERO);
        assert_eq!(doc.nodes()[UiDocument::ROOT].size().y, 8.0);

        // VBox 1 + HBox 1 + Text 4 + Box 1, all reserved.
        assert_eq!(mesh.quad_count(), 7);
        let text = mesh.sub_meshes[label];
        let slot = &mesh.vertices[text.first_vertex..text.first_vertex + text.vertex_count];
        assert!(slot.iter().all(|v| *v == Vertex::default()));
    }

    #[test]
    fn test_frames_are_repeatable() {
        let context = context();
        let builder = context.builder().unwrap();
        let mut doc = UiDocument::new(builder.build("HBox", &[("max-width", "50vw")]).unwrap());
        doc.add_child(
            UiDocument::ROOT,
            builder.build("Box", &[("min-width", "10%"), ("min-height", "1in")]).unwrap(),
        )
        .unwrap();

        let settings = FrameSettings::default();
        let first = context.process_document(&mut doc, &settings).unwrap();
        let second = context.process_document(&mut doc, &settings).unwrap();
        assert_eq!(first.vertices, second.vertices);
        assert_eq!(first.indices, second.indices);
        assert_eq!(doc.nodes()[1].size(), Vec2::new(96.0, 96.0));
    }

    #[test]
    fn test_render_file() {
        let temp_dir = TempDir::new().unwrap();
        let view_path = temp_dir.path().join("panel.json");
        fs::write(
            &view_path,
            r##"{
                "element": "VBox",
                "properties": { "padding": "2px", "background-color": "#336699" },
                "children": [
                    { "element": "Text", "name": "title", "properties": { "text": "Hi", "font-size": "32px" } }
                ]
            }"##,
        )
        .unwrap();

        let doc = layout_file(&view_path, &FrameSettings::default()).unwrap();
        let title = doc.find("title").unwrap();
        assert_eq!(doc.absolute_position(title), Vec2::new(2.0, 2.0));
        assert_eq!(doc.nodes()[UiDocument::ROOT].size(), Vec2::new(36.0, 36.0));

        let (_, mesh) = render_file(&view_path, &FrameSettings::default()).unwrap();
        assert_eq!(mesh.quad_count(), 4);
        assert_eq!(mesh.vertices[0].color, Color::new(0x33, 0x66, 0x99, 0xff));
    }
}
