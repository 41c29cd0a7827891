//! Renderer-facing output: MolViewSpec-shaped state trees, snapshots and the
//! multi-snapshot document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MolViewSpec format version written into every exported document.
pub const MVS_FORMAT_VERSION: &str = "1.4";

/// One node of a visualization state tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub node_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Depth-first search for the first node of the given kind.
    pub fn find(&self, kind: &str) -> Option<&Node> {
        if self.kind == kind {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(kind))
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_description_format")]
    pub description_format: String,
    pub linger_duration_ms: u64,
    pub transition_duration_ms: u64,
}

fn default_description_format() -> String {
    "markdown".to_string()
}

/// One finalized, renderer-ready state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub root: Node,
    pub metadata: SnapshotMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// RFC 3339 UTC timestamp of the build.
    pub timestamp: String,
    pub version: String,
}

/// The ordered snapshot sequence for a whole story.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    /// Always `"multiple"`.
    pub kind: String,
    pub metadata: DocumentMetadata,
    pub snapshots: Vec<Snapshot>,
}

impl Document {
    pub fn multiple(metadata: DocumentMetadata, snapshots: Vec<Snapshot>) -> Self {
        Self {
            kind: "multiple".to_string(),
            metadata,
            snapshots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_omits_empty_fields() {
        let mut root = Node::new("root");
        let mut download = Node::new("download");
        download.params = Some(
            serde_json::json!({ "url": "https://example.org/1cbs.cif" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        root.children.push(download);

        let json = serde_json::to_value(&root).unwrap();
        assert!(json.get("params").is_none());
        assert!(json.get("ref").is_none());
        assert!(json["children"][0].get("children").is_none());
        assert_eq!(root.count(), 2);
        assert!(root.find("download").is_some());
    }
}
