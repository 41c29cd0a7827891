//! # Scripting Types
//!
//! Handle types for Rhai scripting integration.
//!
//! ## Responsibilities
//! - **NodeHandle**: Reference to one node of a scene's state tree. The
//!   `builder` value scripts receive is the handle of the root node.

use super::builder::{NodeId, NodeKindSpec, StateTree};
use rhai::{Dynamic, EvalAltResult, Map};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Handle to a specific node in a state tree.
#[derive(Clone)]
pub struct NodeHandle {
    pub tree: Arc<Mutex<StateTree>>,
    pub id: NodeId,
}

impl NodeHandle {
    pub fn root(tree: Arc<Mutex<StateTree>>) -> Self {
        Self {
            tree,
            id: StateTree::ROOT,
        }
    }

    pub fn kind(&self) -> String {
        let tree = self.tree.lock().unwrap_or_else(|e| e.into_inner());
        tree.kind(self.id).to_string()
    }

    /// Adds a child of the given kind under this node.
    pub fn append(&self, spec: &'static NodeKindSpec, params: Map) -> Result<NodeHandle, Box<EvalAltResult>> {
        let params: serde_json::Map<String, Value> = rhai::serde::from_dynamic(&Dynamic::from_map(params))?;
        let mut tree = self.tree.lock().unwrap_or_else(|e| e.into_inner());
        let id = tree.add_child(self.id, spec, params)?;
        Ok(NodeHandle {
            tree: self.tree.clone(),
            id,
        })
    }
}
