// FILE: src/cli/handlers.rs
use crate::{
    buffer, cli::OutputFormat, FontLibrary, LayoutError, MeshData, Result,
    UiContext, UiDocument, ViewNode,
};

use serde::Serialize;
use std::time::Instant;

/// One row of the `layout` report.
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: usize,
    pub depth: usize,
    pub element: String,
    pub name: Option<String>,
    pub position: [f32; 2],
    pub absolute_position: [f32; 2],
    pub size: [f32; 2],
    pub render_quad_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeshStats {
    pub nodes: usize,
    pub quads: usize,
    pub vertices: usize,
    pub indices: usize,
    pub sub_meshes: usize,
}

impl MeshStats {
    fn of(doc: &UiDocument, mesh: &MeshData) -> Self {
        Self {
            nodes: doc.total_node_count(),
            quads: mesh.quad_count(),
            vertices: mesh.vertices.len(),
            indices: mesh.indices.len(),
            sub_meshes: mesh.sub_meshes.len(),
        }
    }
}

fn load_document(context: &UiContext, view_path: &str) -> Result<UiDocument> {
    let view = ViewNode::load(view_path)?;
    view.build(&context.builder()?)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LayoutError::invalid_format(format!("JSON serialization error: {}", e)))
}

fn element_name(context: &UiContext, doc: &UiDocument, id: usize) -> String {
    let element = doc.nodes()[id].element();
    context
        .registry()
        .element_name(element)
        .map_or_else(|| element.to_string(), str::to_string)
}

pub fn node_reports(context: &UiContext, doc: &UiDocument) -> Vec<NodeReport> {
    doc.pre_order()
        .into_iter()
        .map(|id| {
            let node = &doc.nodes()[id];
            let (position, size, absolute) = (node.position(), node.size(), doc.absolute_position(id));
            NodeReport {
                id,
                depth: doc.depth(id),
                element: element_name(context, doc, id),
                name: node.name.clone(),
                position: [position.x, position.y],
                absolute_position: [absolute.x, absolute.y],
                size: [size.x, size.y],
                render_quad_count: node.render_quad_count,
            }
        })
        .collect()
}

pub fn format_reports(reports: &[NodeReport]) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:<32} {:>18} {:>18}\n", "NODE", "POSITION", "SIZE"));
    for report in reports {
        let label = match &report.name {
            Some(name) => format!("{}{} #{}", "  ".repeat(report.depth), report.element, name),
            None => format!("{}{}", "  ".repeat(report.depth), report.element),
        };
        output.push_str(&format!(
            "{:<32} {:>18} {:>18}\n",
            label,
            format!("({}, {})", report.absolute_position[0], report.absolute_position[1]),
            format!("{} x {}", report.size[0], report.size[1]),
        ));
    }
    output
}

// --- LAYOUT ---
pub fn handle_layout_command(cli: &super::KrylCli, matches: &clap::ArgMatches) -> Result<()> {
    let view_path = required(matches, "view")?;
    let format = matches.get_one::<OutputFormat>("format").copied().unwrap_or(OutputFormat::Text);
    let settings = cli.frame_settings(matches);

    let context = UiContext::with_builtins(FontLibrary::with_default_face())?;
    let mut doc = load_document(&context, view_path)?;

    let layout_start = Instant::now();
    context.layout_document(&mut doc, &settings)?;
    let elapsed = layout_start.elapsed();

    let reports = node_reports(&context, &doc);
    match format {
        OutputFormat::Json => println!("{}", to_json(&reports)?),
        OutputFormat::Text => {
            print!("{}", format_reports(&reports));
            println!("\n⏱  Layout: {:.3}ms", elapsed.as_secs_f64() * 1000.0);
        }
    }
    context.shutdown();
    Ok(())
}

// --- RENDER ---
pub fn handle_render_command(cli: &super::KrylCli, matches: &clap::ArgMatches) -> Result<()> {
    let view_path = required(matches, "view")?;
    let format = matches.get_one::<OutputFormat>("format").copied().unwrap_or(OutputFormat::Text);
    let settings = cli.frame_settings(matches);

    let render_start = Instant::now();
    let (doc, mesh) = crate::render_file(view_path, &settings)?;
    let elapsed = render_start.elapsed();
    let stats = MeshStats::of(&doc, &mesh);

    match format {
        OutputFormat::Json if matches.get_flag("full") => println!("{}", to_json(&mesh)?),
        OutputFormat::Json => println!("{}", to_json(&stats)?),
        OutputFormat::Text => {
            println!("🎨 Rendered {}", view_path);
            println!("   Nodes: {}", stats.nodes);
            println!("   Quads: {}", stats.quads);
            println!("   Vertices: {}", stats.vertices);
            println!("   Indices: {}", stats.indices);
            println!("   Sub-meshes: {}", stats.sub_meshes);
            println!("   Time: {:.3}ms", elapsed.as_secs_f64() * 1000.0);
        }
    }
    Ok(())
}

// --- DUMP ---
pub fn dump_document(context: &UiContext, doc: &UiDocument) -> String {
    let mut output = String::new();
    for id in doc.pre_order() {
        let node = &doc.nodes()[id];
        output.push_str(&format!(
            "{}node {} {} ({} bytes, {} extra)\n",
            "  ".repeat(doc.depth(id)),
            id,
            element_name(context, doc, id),
            node.config.len(),
            node.extra.len()
        ));
        for header in buffer::block_headers(&node.config) {
            let block_name = context
                .registry()
                .block_info(header.hash)
                .map_or("?", |info| info.name.as_str());
            output.push_str(&format!(
                "  @{:<5} {:<24} {} len={:<4} {}\n",
                header.offset,
                block_name,
                header.hash,
                header.length,
                if header.enabled { "enabled" } else { "disabled" }
            ));
        }
        for (row, chunk) in node.config.chunks(16).enumerate() {
            output.push_str(&format!("  {:06x}: {}\n", row * 16, hex::encode(chunk)));
        }
        if !node.extra.is_empty() {
            output.push_str(&format!("  extra: {}\n", hex::encode(&node.extra)));
        }
    }
    output
}

pub fn handle_dump_command(matches: &clap::ArgMatches) -> Result<()> {
    let view_path = required(matches, "view")?;
    let context = UiContext::with_builtins(FontLibrary::with_default_face())?;
    let doc = load_document(&context, view_path)?;
    print!("{}", dump_document(&context, &doc));
    Ok(())
}

// --- CHECK ---
pub fn handle_check_command(matches: &clap::ArgMatches) -> Result<()> {
    let view_path = required(matches, "view")?;
    println!("🔍 Checking {}", view_path);

    let context = UiContext::with_builtins(FontLibrary::with_default_face())?;
    match load_document(&context, view_path) {
        Ok(doc) => {
            println!("✅ {} - {} nodes, no issues found", view_path, doc.total_node_count());
            Ok(())
        }
        Err(e) => {
            println!("❌ {} - {}", view_path, e);
            Err(e)
        }
    }
}

fn required<'m>(matches: &'m clap::ArgMatches, name: &str) -> Result<&'m str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| LayoutError::invalid_format(format!("missing argument '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameSettings;
    use std::io::Write;

    fn view_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const VIEW: &str = r#"
element = "HBox"
name = "row"
properties = { spacing = "5px" }

[[children]]
element = "Box"
properties = { min-width = "10px", min-height = "10px" }

[[children]]
element = "Text"
name = "label"
properties = { text = "ok" }
"#;

    #[test]
    fn test_layout_report() {
        let file = view_file(VIEW);
        let context = UiContext::with_builtins(FontLibrary::with_default_face()).unwrap();
        let mut doc = load_document(&context, file.path().to_str().unwrap()).unwrap();
        context.layout_document(&mut doc, &FrameSettings::default()).unwrap();

        let reports = node_reports(&context, &doc);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].element, "HBox");
        assert_eq!(reports[2].name.as_deref(), Some("label"));
        assert_eq!(reports[2].absolute_position, [15.0, 0.0]);
        assert_eq!(reports[2].size, [16.0, 16.0]);

        let text = format_reports(&reports);
        assert!(text.contains("HBox #row"));
        assert!(text.contains("  Text #label"));
        assert!(to_json(&reports).unwrap().contains("\"absolute_position\""));
    }

    #[test]
    fn test_render_view_stats() {
        let file = view_file(VIEW);
        let (doc, mesh) = crate::render_file(file.path(), &FrameSettings::default()).unwrap();
        let stats = MeshStats::of(&doc, &mesh);
        // HBox, Box, and two glyphs plus a background for the text.
        assert_eq!(stats.quads, 5);
        assert_eq!(stats.indices, 30);
        assert_eq!(stats.sub_meshes, 3);
    }

    #[test]
    fn test_dump_lists_blocks() {
        let file = view_file(VIEW);
        let context = UiContext::with_builtins(FontLibrary::with_default_face()).unwrap();
        let doc = load_document(&context, file.path().to_str().unwrap()).unwrap();

        let dump = dump_document(&context, &doc);
        assert!(dump.contains("node 0 HBox"));
        assert!(dump.contains("LayoutBoxConfigBlock"));
        assert!(dump.contains("BackgroundConfigBlock"));
        assert!(dump.contains("disabled"));
        assert!(dump.contains("  extra: "));
        assert!(dump.lines().any(|line| line.starts_with("  000000: ")));
        assert!(dump.ends_with('\n'));
    }

    #[test]
    fn test_check_reports_producer_errors() {
        let file = view_file("element = \"Box\"\nproperties = { spacing = \"5px\" }\n");
        let context = UiContext::with_builtins(FontLibrary::new()).unwrap();
        let err = load_document(&context, file.path().to_str().unwrap()).unwrap_err();
        assert!(err.is_producer_error());
    }
}
