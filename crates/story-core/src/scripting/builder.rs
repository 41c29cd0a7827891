//! # State Builder
//!
//! Arena-backed MolViewSpec state tree and the default [`SceneBuilder`].
//!
//! ## Responsibilities
//! - **Node kinds**: which calls exist, which parents accept them, positional shorthands.
//! - **Tree**: append-only arena rooted at node `0` (`root`).
//! - **Finalize**: convert the arena into a [`Snapshot`].

use super::types::NodeHandle;
use super::{BuilderFactory, CameraUpdate, SceneBuilder, SnapshotOptions};
use rhai::{Engine, EvalAltResult, Scope};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use story_schema::{Node, Snapshot, SnapshotMetadata};

pub type NodeId = usize;

/// A single positional argument accepted in place of a params map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shorthand {
    None,
    /// `node.download("https://...")` sets `params.url`.
    Text(&'static str),
    /// `node.opacity(0.5)` sets `params.opacity`.
    Number(&'static str),
}

/// One builder call and the node it creates.
#[derive(Debug)]
pub struct NodeKindSpec {
    /// Script-facing method name.
    pub method: &'static str,
    /// Node kind written to the snapshot.
    pub kind: &'static str,
    pub parents: &'static [&'static str],
    pub shorthand: Shorthand,
    /// Fixed param inserted unless the script sets it.
    pub preset: Option<(&'static str, &'static str)>,
    /// At most one child of this kind per parent; a later call replaces the earlier one.
    pub singleton: bool,
}

const COMPONENTS: &[&str] = &["component", "component_from_uri"];

pub static NODE_KINDS: &[NodeKindSpec] = &[
    NodeKindSpec { method: "download", kind: "download", parents: &["root"], shorthand: Shorthand::Text("url"), preset: None, singleton: false },
    NodeKindSpec { method: "canvas", kind: "canvas", parents: &["root"], shorthand: Shorthand::Text("background_color"), preset: None, singleton: true },
    NodeKindSpec { method: "camera", kind: "camera", parents: &["root"], shorthand: Shorthand::None, preset: None, singleton: true },
    NodeKindSpec { method: "parse", kind: "parse", parents: &["download"], shorthand: Shorthand::Text("format"), preset: None, singleton: false },
    NodeKindSpec { method: "model_structure", kind: "structure", parents: &["parse"], shorthand: Shorthand::None, preset: Some(("type", "model")), singleton: false },
    NodeKindSpec { method: "assembly_structure", kind: "structure", parents: &["parse"], shorthand: Shorthand::Text("assembly_id"), preset: Some(("type", "assembly")), singleton: false },
    NodeKindSpec { method: "symmetry_structure", kind: "structure", parents: &["parse"], shorthand: Shorthand::None, preset: Some(("type", "symmetry")), singleton: false },
    NodeKindSpec { method: "transform", kind: "transform", parents: &["structure"], shorthand: Shorthand::None, preset: None, singleton: false },
    NodeKindSpec { method: "component", kind: "component", parents: &["structure"], shorthand: Shorthand::Text("selector"), preset: None, singleton: false },
    NodeKindSpec { method: "component_from_uri", kind: "component_from_uri", parents: &["structure"], shorthand: Shorthand::Text("uri"), preset: None, singleton: false },
    NodeKindSpec { method: "representation", kind: "representation", parents: COMPONENTS, shorthand: Shorthand::Text("type"), preset: None, singleton: false },
    NodeKindSpec { method: "label", kind: "label", parents: COMPONENTS, shorthand: Shorthand::Text("text"), preset: None, singleton: false },
    NodeKindSpec { method: "tooltip", kind: "tooltip", parents: COMPONENTS, shorthand: Shorthand::Text("text"), preset: None, singleton: false },
    NodeKindSpec { method: "focus", kind: "focus", parents: COMPONENTS, shorthand: Shorthand::None, preset: None, singleton: false },
    NodeKindSpec { method: "color", kind: "color", parents: &["representation"], shorthand: Shorthand::Text("color"), preset: None, singleton: false },
    NodeKindSpec { method: "color_from_uri", kind: "color_from_uri", parents: &["representation"], shorthand: Shorthand::Text("uri"), preset: None, singleton: false },
    NodeKindSpec { method: "opacity", kind: "opacity", parents: &["representation"], shorthand: Shorthand::Number("opacity"), preset: None, singleton: false },
];

pub fn kind_spec(method: &str) -> Option<&'static NodeKindSpec> {
    NODE_KINDS.iter().find(|s| s.method == method)
}

#[derive(Debug, Clone)]
struct TreeNode {
    kind: &'static str,
    params: Map<String, Value>,
    node_ref: Option<String>,
    children: Vec<NodeId>,
}

/// Append-only arena of state nodes. Node `0` is the root.
#[derive(Debug, Clone)]
pub struct StateTree {
    nodes: Vec<TreeNode>,
}

impl StateTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode {
                kind: "root",
                params: Map::new(),
                node_ref: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.nodes.get(id).map(|n| n.kind).unwrap_or("")
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        spec: &'static NodeKindSpec,
        mut params: Map<String, Value>,
    ) -> Result<NodeId, String> {
        let parent_kind = self.kind(parent);
        if !spec.parents.contains(&parent_kind) {
            return Err(format!(
                "'{}' cannot be added to a '{}' node (expected one of: {})",
                spec.method,
                parent_kind,
                spec.parents.join(", ")
            ));
        }

        if let Some((key, value)) = spec.preset {
            params
                .entry(key.to_string())
                .or_insert_with(|| Value::String(value.to_string()));
        }

        let node_ref = match params.remove("ref") {
            Some(Value::String(s)) => Some(s),
            Some(other) => return Err(format!("'ref' must be a string, got {}", other)),
            None => None,
        };

        if spec.singleton {
            let nodes = &self.nodes;
            let mut kept = self.nodes[parent].children.clone();
            kept.retain(|c| nodes[*c].kind != spec.kind);
            self.nodes[parent].children = kept;
        }

        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            kind: spec.kind,
            params,
            node_ref,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Converts the subtree at `id` into its serializable form.
    pub fn to_node(&self, id: NodeId) -> Node {
        let node = &self.nodes[id];
        Node {
            kind: node.kind.to_string(),
            params: if node.params.is_empty() {
                None
            } else {
                Some(node.params.clone())
            },
            node_ref: node.node_ref.clone(),
            children: node.children.iter().map(|c| self.to_node(*c)).collect(),
        }
    }
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Default builder: records calls into a [`StateTree`].
#[derive(Clone, Default)]
pub struct StateBuilder {
    tree: Arc<Mutex<StateTree>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> NodeHandle {
        NodeHandle::root(self.tree.clone())
    }
}

impl SceneBuilder for StateBuilder {
    fn bind(&self, scope: &mut Scope<'_>) {
        scope.push("builder", self.root());
    }

    fn set_camera(&self, camera: CameraUpdate) -> Result<(), Box<EvalAltResult>> {
        let mut params = Map::new();
        params.insert("position".into(), serde_json::json!(camera.position));
        params.insert("target".into(), serde_json::json!(camera.target));
        params.insert("up".into(), serde_json::json!(camera.up));

        let spec = kind_spec("camera").ok_or("camera node kind is not registered")?;
        let mut tree = self.tree.lock().unwrap_or_else(|e| e.into_inner());
        tree.add_child(StateTree::ROOT, spec, params)?;
        Ok(())
    }

    fn snapshot(&self, options: SnapshotOptions) -> Result<Snapshot, Box<EvalAltResult>> {
        let tree = self.tree.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Snapshot {
            root: tree.to_node(StateTree::ROOT),
            metadata: SnapshotMetadata {
                key: options.key,
                title: options.title,
                description: options.description,
                description_format: "markdown".to_string(),
                linger_duration_ms: options.linger_duration_ms,
                transition_duration_ms: options.transition_duration_ms,
            },
        })
    }
}

/// Hands out a fresh [`StateBuilder`] per scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateBuilderFactory;

impl BuilderFactory for StateBuilderFactory {
    fn register_api(&self, engine: &mut Engine) {
        super::register_rhai_api(engine);
    }

    fn create(&self) -> Box<dyn SceneBuilder> {
        Box::new(StateBuilder::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(method: &str) -> &'static NodeKindSpec {
        kind_spec(method).unwrap()
    }

    #[test]
    fn test_parent_rules() {
        let mut tree = StateTree::new();
        let err = tree.add_child(StateTree::ROOT, spec("parse"), Map::new()).unwrap_err();
        assert!(err.contains("'parse' cannot be added to a 'root' node"));

        let download = tree.add_child(StateTree::ROOT, spec("download"), Map::new()).unwrap();
        let parse = tree.add_child(download, spec("parse"), Map::new()).unwrap();
        let structure = tree.add_child(parse, spec("model_structure"), Map::new()).unwrap();

        let node = tree.to_node(StateTree::ROOT);
        let s = node.find("structure").unwrap();
        assert_eq!(s.params.as_ref().unwrap()["type"], "model");
        assert_eq!(tree.kind(structure), "structure");
    }

    #[test]
    fn test_singleton_replaces_previous() {
        let mut tree = StateTree::new();
        let mut first = Map::new();
        first.insert("background_color".into(), "white".into());
        let mut second = Map::new();
        second.insert("background_color".into(), "black".into());

        tree.add_child(StateTree::ROOT, spec("canvas"), first).unwrap();
        tree.add_child(StateTree::ROOT, spec("canvas"), second).unwrap();

        let root = tree.to_node(StateTree::ROOT);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].params.as_ref().unwrap()["background_color"], "black");
    }

    #[test]
    fn test_ref_is_lifted_out_of_params() {
        let mut tree = StateTree::new();
        let mut params = Map::new();
        params.insert("url".into(), "https://example.org/a.cif".into());
        params.insert("ref".into(), "dl".into());
        tree.add_child(StateTree::ROOT, spec("download"), params).unwrap();

        let root = tree.to_node(StateTree::ROOT);
        assert_eq!(root.children[0].node_ref.as_deref(), Some("dl"));
        assert!(!root.children[0].params.as_ref().unwrap().contains_key("ref"));
    }

    #[test]
    fn test_camera_is_attached_to_root() {
        let builder = StateBuilder::new();
        builder
            .set_camera(CameraUpdate {
                position: [0.0, 0.0, 14.0],
                target: [0.0; 3],
                up: [0.0, 1.0, 0.0],
            })
            .unwrap();
        let snapshot = builder
            .snapshot(SnapshotOptions {
                key: None,
                title: Some("t".into()),
                description: None,
                linger_duration_ms: 5000,
                transition_duration_ms: 500,
            })
            .unwrap();
        let camera = snapshot.root.find("camera").unwrap();
        assert_eq!(camera.params.as_ref().unwrap()["position"][2], 14.0);
    }
}
