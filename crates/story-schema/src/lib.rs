//! # Story Schema
//!
//! Plain serde types shared by every crate in the workspace.
//!
//! ## Responsibilities
//! - **Authoring model**: `Story`, `SceneData`, `SceneAsset`, `CameraData`, `StoryMetadata`.
//! - **Envelope**: `StoryContainer`, the versioned wrapper persisted as `.mvstory`.
//! - **Renderer output**: `Snapshot` and `Document` (see [`snapshot`]).
//!
//! Nothing in here executes scripts or touches I/O; that lives in `story-core`.

pub mod snapshot;

pub use snapshot::{Document, DocumentMetadata, Node, Snapshot, SnapshotMetadata, MVS_FORMAT_VERSION};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Linger time applied to a snapshot when the scene does not set one.
pub const DEFAULT_LINGER_MS: u64 = 5000;
/// Transition time applied to a snapshot when the scene does not set one.
pub const DEFAULT_TRANSITION_MS: u64 = 500;
/// The only container version this crate reads or writes.
pub const CONTAINER_VERSION: u32 = 1;
/// Header given to scenes created without one.
pub const DEFAULT_SCENE_HEADER: &str = "New Scene";

/// A broken story invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("story has no scenes")]
    NoScenes,
    #[error("duplicate asset name: {0}")]
    DuplicateAsset(String),
    #[error("duplicate scene id: {0}")]
    DuplicateSceneId(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct StoryMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_note: Option<String>,
}

/// Projection used when the viewpoint was captured.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    Perspective,
    Orthographic,
}

/// A captured viewpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraData {
    pub mode: CameraMode,
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
    /// Field of view in radians.
    pub fov: f64,
}

/// One step of the narrative.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SceneData {
    pub id: String,
    pub header: String,
    /// Caller-visible snapshot key. Blank means "no key".
    pub key: String,
    /// Markdown shown alongside the snapshot.
    pub description: String,
    /// Scene script, run after the story prelude. The field name is kept for
    /// compatibility with stories authored in the web editor.
    pub javascript: String,
    #[serde(default)]
    pub camera: Option<CameraData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linger_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_duration_ms: Option<u64>,
}

impl SceneData {
    /// Creates an empty scene with a freshly generated id.
    pub fn new() -> Self {
        Self {
            id: new_scene_id(),
            header: DEFAULT_SCENE_HEADER.to_string(),
            key: String::new(),
            description: String::new(),
            javascript: String::new(),
            camera: None,
            linger_duration_ms: None,
            transition_duration_ms: None,
        }
    }

    /// The trimmed key, or `None` when it is blank.
    pub fn snapshot_key(&self) -> Option<&str> {
        let key = self.key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    pub fn linger_ms(&self) -> u64 {
        self.linger_duration_ms.unwrap_or(DEFAULT_LINGER_MS)
    }

    pub fn transition_ms(&self) -> u64 {
        self.transition_duration_ms.unwrap_or(DEFAULT_TRANSITION_MS)
    }
}

impl Default for SceneData {
    fn default() -> Self {
        Self::new()
    }
}

/// Random unique scene identifier.
pub fn new_scene_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A named binary attachment (structure file, image, audio, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SceneAsset {
    pub name: String,
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
}

impl SceneAsset {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// The full authoring unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Story {
    pub metadata: StoryMetadata,
    /// Story-wide prelude prepended to every scene script.
    pub javascript: String,
    pub scenes: Vec<SceneData>,
    #[serde(default)]
    pub assets: Vec<SceneAsset>,
}

impl Story {
    /// One default scene, no prelude, no assets.
    pub fn empty() -> Self {
        Self {
            metadata: StoryMetadata::default(),
            javascript: String::new(),
            scenes: vec![SceneData::new()],
            assets: Vec::new(),
        }
    }

    /// Checks the invariants every producer of a `Story` must uphold.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.scenes.is_empty() {
            return Err(SchemaError::NoScenes);
        }

        let mut ids = HashSet::new();
        for scene in &self.scenes {
            if !ids.insert(scene.id.as_str()) {
                return Err(SchemaError::DuplicateSceneId(scene.id.clone()));
            }
        }

        let mut names = HashSet::new();
        for asset in &self.assets {
            if !names.insert(asset.name.as_str()) {
                return Err(SchemaError::DuplicateAsset(asset.name.clone()));
            }
        }
        Ok(())
    }

    pub fn scene(&self, id: &str) -> Option<&SceneData> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn asset(&self, name: &str) -> Option<&SceneAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

impl Default for Story {
    fn default() -> Self {
        Self::empty()
    }
}

/// Versioned envelope around a [`Story`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoryContainer {
    pub version: u32,
    pub story: Story,
}

impl StoryContainer {
    pub fn new(story: Story) -> Self {
        Self {
            version: CONTAINER_VERSION,
            story,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_story_is_valid() {
        let story = Story::empty();
        assert_eq!(story.scenes.len(), 1);
        assert_eq!(story.scenes[0].header, DEFAULT_SCENE_HEADER);
        assert!(story.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut story = Story::empty();
        story.assets.push(SceneAsset::new("a.cif", vec![1]));
        story.assets.push(SceneAsset::new("a.cif", vec![2]));
        assert_eq!(
            story.validate(),
            Err(SchemaError::DuplicateAsset("a.cif".into()))
        );

        let mut story = Story::empty();
        story.scenes.clear();
        assert_eq!(story.validate(), Err(SchemaError::NoScenes));
    }

    #[test]
    fn test_snapshot_key_trims() {
        let mut scene = SceneData::new();
        assert_eq!(scene.snapshot_key(), None);
        scene.key = "   ".into();
        assert_eq!(scene.snapshot_key(), None);
        scene.key = "  intro ".into();
        assert_eq!(scene.snapshot_key(), Some("intro"));
    }

    #[test]
    fn test_scene_json_shape() {
        let mut scene = SceneData::new();
        scene.linger_duration_ms = Some(1200);
        let json = serde_json::to_value(&scene).unwrap();

        assert!(json.get("camera").unwrap().is_null());
        assert_eq!(json["linger_duration_ms"], 1200);
        assert!(json.get("transition_duration_ms").is_none());

        let loaded: SceneData = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, scene);
        assert_eq!(loaded.transition_ms(), DEFAULT_TRANSITION_MS);
    }

    #[test]
    fn test_asset_bytes_in_json_are_numbers() {
        let asset = SceneAsset::new("x.bin", vec![0u8, 7, 255]);
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, r#"{"name":"x.bin","content":[0,7,255]}"#);

        let loaded: SceneAsset = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, asset);
    }

    #[test]
    fn test_camera_mode_serialization() {
        let camera = CameraData {
            mode: CameraMode::Orthographic,
            position: [0.0, 0.0, 10.0],
            target: [0.0; 3],
            up: [0.0, 1.0, 0.0],
            fov: 0.5,
        };
        let json = serde_json::to_value(&camera).unwrap();
        assert_eq!(json["mode"], "orthographic");
    }
}
