//! View descriptions
//!
//! A view is a node tree written as TOML or JSON:
//!
//! ```toml
//! element = "HBox"
//! name = "toolbar"
//! [properties]
//! spacing = "4px"
//! [[children]]
//! element = "Text"
//! properties = { text = "Open" }
//! ```
//!
//! Property values are strings in the producer's syntax. Numbers and
//! booleans are accepted and formatted before parsing, so `spacing = 4`
//! means `4px`.

use crate::builder::ConfigBuilder;
use crate::error::{LayoutError, Result};
use crate::tree::{NodeId, UiDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Flag(value) => write!(f, "{}", value),
            PropertyValue::Number(value) => write!(f, "{}", value),
            PropertyValue::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| LayoutError::FileNotFound {
            path: format!("{}: {}", path.display(), e),
        })?;
        log::debug!("Loaded view from {}", path.display());

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            _ => Err(LayoutError::invalid_format(format!(
                "view file {} must be .json or .toml",
                path.display()
            ))),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| LayoutError::invalid_format(format!("Invalid JSON view: {}", e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LayoutError::invalid_format(format!("Invalid TOML view: {}", e)))
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ViewNode::node_count).sum::<usize>()
    }

    /// Builds a document with this node as its root.
    pub fn build(&self, builder: &ConfigBuilder<'_>) -> Result<UiDocument> {
        let mut doc = UiDocument::new(self.build_config(builder)?);
        for child in &self.children {
            child.build_into(builder, &mut doc, UiDocument::ROOT)?;
        }
        log::debug!("Built document '{}' with {} nodes", self.element, doc.total_node_count());
        Ok(doc)
    }

    fn build_into(&self, builder: &ConfigBuilder<'_>, doc: &mut UiDocument, parent: NodeId) -> Result<()> {
        let id = doc.add_child(parent, self.build_config(builder)?)?;
        for child in &self.children {
            child.build_into(builder, doc, id)?;
        }
        Ok(())
    }

    fn build_config(&self, builder: &ConfigBuilder<'_>) -> Result<crate::builder::NodeConfig> {
        let properties: Vec<(&str, String)> = self
            .properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_string()))
            .collect();
        let node = builder.build(&self.element, &properties)?;
        Ok(match &self.name {
            Some(name) => node.named(name.clone()),
            None => node,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UiContext;
    use std::io::Write;

    const TOOLBAR: &str = r##"
element = "HBox"
name = "toolbar"

[properties]
spacing = 4
background-color = "#202020"

[[children]]
element = "Box"
name = "icon"
properties = { min-width = "16px", min-height = "16px" }

[[children]]
element = "Text"
properties = { text = "Open" }
"##;

    #[test]
    fn test_toml_view_builds_document() {
        let view = ViewNode::from_toml(TOOLBAR).unwrap();
        assert_eq!(view.node_count(), 3);
        assert_eq!(view.properties["spacing"], PropertyValue::Number(4.0));

        let context = UiContext::with_builtins(Default::default()).unwrap();
        let doc = view.build(&context.builder().unwrap()).unwrap();
        assert_eq!(doc.total_node_count(), 3);
        assert_eq!(doc.find("icon"), Some(1));
        assert_eq!(doc.find("toolbar"), Some(UiDocument::ROOT));
    }

    #[test]
    fn test_json_view_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"element": "VBox", "children": [{{"element": "Box", "properties": {{"display": false}}}}]}}"#
        )
        .unwrap();

        let view = ViewNode::load(file.path()).unwrap();
        assert_eq!(view.children[0].properties["display"].to_string(), "false");
    }

    #[test]
    fn test_view_errors() {
        assert!(matches!(
            ViewNode::load("/definitely/missing.toml"),
            Err(LayoutError::FileNotFound { .. })
        ));
        assert!(ViewNode::from_json("{").is_err());

        let view = ViewNode::from_toml("element = \"Nope\"").unwrap();
        let context = UiContext::with_builtins(Default::default()).unwrap();
        assert!(matches!(
            view.build(&context.builder().unwrap()),
            Err(LayoutError::UnknownElement { .. })
        ));
    }
}
