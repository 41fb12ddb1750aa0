// Node classification for author/file networks.

use serde::{Deserialize, Serialize};

use crate::types::{AttrValue, NodeAttributes};

/// Display colour keyword assigned to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColour {
    /// Authors.
    DodgerBlue,
    /// Python sources (`.py`).
    Tomato,
    /// C++ sources (`.cc`).
    Gold,
    /// C/C++ headers (`.h`).
    Goldenrod,
    /// Anything unclassified.
    LightGrey,
}

impl NodeColour {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DodgerBlue => "dodgerblue",
            Self::Tomato => "tomato",
            Self::Gold => "gold",
            Self::Goldenrod => "goldenrod",
            Self::LightGrey => "lightgrey",
        }
    }
}

impl std::fmt::Display for NodeColour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NodeColour> for AttrValue {
    fn from(colour: NodeColour) -> Self {
        AttrValue::Text(colour.as_str().to_string())
    }
}

const EXTENSION_COLOURS: &[(&str, NodeColour)] = &[
    (".py", NodeColour::Tomato),
    (".cc", NodeColour::Gold),
    (".h", NodeColour::Goldenrod),
];

/// Colour for a node of an author/file network.
pub fn node_colours(attrs: &NodeAttributes) -> NodeColour {
    match attrs.node_type.as_deref() {
        Some("author") => NodeColour::DodgerBlue,
        Some("files") => attrs
            .id
            .as_deref()
            .and_then(|id| {
                EXTENSION_COLOURS
                    .iter()
                    .find(|(ext, _)| id.ends_with(ext))
                    .map(|(_, colour)| *colour)
            })
            .unwrap_or(NodeColour::LightGrey),
        _ => NodeColour::LightGrey,
    }
}

/// Store `helper(node)` under `name` on every node.
pub fn node_attribute<F, T>(nodes: &mut [(String, NodeAttributes)], name: &str, helper: F)
where
    F: Fn(&NodeAttributes) -> T,
    T: Into<AttrValue>,
{
    for (_, node) in nodes.iter_mut() {
        let value = helper(node).into();
        node.attrs.insert(name.to_string(), value);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
