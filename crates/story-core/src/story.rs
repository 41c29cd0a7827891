//! # Story Editing
//!
//! Copy-on-write operations over a single-owner [`Story`].
//!
//! ## Responsibilities
//! - **Metadata / prelude**: `update_metadata`, `set_global_script`
//! - **Scenes**: `add_scene`, `update_scene`, `remove_scene`, `reorder_scene`
//! - **Assets**: `add_asset` (replace-by-name), `remove_asset`
//!
//! ## Pattern
//! Every mutation that changes something builds a new `Story` and swaps the
//! held `Arc`. A call that changes nothing keeps the old `Arc`, so
//! `Arc::ptr_eq` on two `current()` values answers "did anything change".

use crate::errors::{StoryError, StoryResult};
use story_schema::{CameraData, SceneAsset, SceneData, Story};
use std::sync::Arc;
use tracing::debug;

/// Shallow patch for [`story_schema::StoryMetadata`].
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the note.
    pub author_note: Option<Option<String>>,
}

/// Partial scene used by `add_scene` and `update_scene`. The id is not part of it.
#[derive(Debug, Clone, Default)]
pub struct ScenePatch {
    pub header: Option<String>,
    pub key: Option<String>,
    pub description: Option<String>,
    pub javascript: Option<String>,
    /// `Some(None)` clears the captured camera.
    pub camera: Option<Option<CameraData>>,
    pub linger_duration_ms: Option<Option<u64>>,
    pub transition_duration_ms: Option<Option<u64>>,
}

impl ScenePatch {
    fn apply(self, scene: &mut SceneData) {
        if let Some(v) = self.header {
            scene.header = v;
        }
        if let Some(v) = self.key {
            scene.key = v;
        }
        if let Some(v) = self.description {
            scene.description = v;
        }
        if let Some(v) = self.javascript {
            scene.javascript = v;
        }
        if let Some(v) = self.camera {
            scene.camera = v;
        }
        if let Some(v) = self.linger_duration_ms {
            scene.linger_duration_ms = v;
        }
        if let Some(v) = self.transition_duration_ms {
            scene.transition_duration_ms = v;
        }
    }
}

/// Holds the current story and hands out new versions on every edit.
#[derive(Debug, Clone)]
pub struct StoryEditor {
    story: Arc<Story>,
}

impl StoryEditor {
    /// Starts from [`Story::empty`].
    pub fn new() -> Self {
        Self {
            story: Arc::new(Story::empty()),
        }
    }

    /// Takes ownership of an existing story after checking its invariants.
    pub fn from_story(story: Story) -> StoryResult<Self> {
        story.validate()?;
        Ok(Self {
            story: Arc::new(story),
        })
    }

    /// The current version. Cheap to clone and never mutated afterwards.
    pub fn current(&self) -> Arc<Story> {
        self.story.clone()
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn into_story(self) -> Story {
        Arc::unwrap_or_clone(self.story)
    }

    /// Replaces the whole story, e.g. after an import.
    pub fn replace(&mut self, story: Story) -> StoryResult<()> {
        story.validate()?;
        self.story = Arc::new(story);
        Ok(())
    }

    fn commit(&mut self, next: Story) {
        self.story = Arc::new(next);
    }

    pub fn update_metadata(&mut self, patch: MetadataPatch) {
        let mut next = (*self.story).clone();
        if let Some(title) = patch.title {
            next.metadata.title = title;
        }
        if let Some(note) = patch.author_note {
            next.metadata.author_note = note;
        }
        self.commit(next);
    }

    pub fn set_global_script(&mut self, code: impl Into<String>) {
        let mut next = (*self.story).clone();
        next.javascript = code.into();
        self.commit(next);
    }

    /// Appends a scene and returns its new id.
    pub fn add_scene(&mut self, patch: ScenePatch) -> String {
        // SceneData::new() assigns the id and the "New Scene" header.
        let mut scene = SceneData::new();
        patch.apply(&mut scene);
        let id = scene.id.clone();

        let mut next = (*self.story).clone();
        next.scenes.push(scene);
        self.commit(next);

        debug!(scene_id = %id, scenes = self.story.scenes.len(), "Scene added");
        id
    }

    /// Merges `patch` into the scene with `id`. Returns whether it exists.
    pub fn update_scene(&mut self, id: &str, patch: ScenePatch) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let mut next = (*self.story).clone();
        patch.apply(&mut next.scenes[pos]);
        self.commit(next);
        true
    }

    /// Removes the scene with `id`.
    ///
    /// Fails with [`StoryError::LastScene`] while only one scene remains,
    /// whatever the id.
    pub fn remove_scene(&mut self, id: &str) -> StoryResult<bool> {
        if self.story.scenes.len() <= 1 {
            return Err(StoryError::LastScene);
        }
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        let mut next = (*self.story).clone();
        next.scenes.remove(pos);
        self.commit(next);
        Ok(true)
    }

    /// Moves the scene with `id` to `new_index`.
    pub fn reorder_scene(&mut self, id: &str, new_index: usize) -> bool {
        if new_index >= self.story.scenes.len() {
            return false;
        }
        let Some(pos) = self.position(id) else {
            return false;
        };
        if pos == new_index {
            return true;
        }
        let mut next = (*self.story).clone();
        let scene = next.scenes.remove(pos);
        next.scenes.insert(new_index, scene);
        self.commit(next);
        true
    }

    /// Adds an asset, replacing any existing asset with the same name in place.
    pub fn add_asset(&mut self, asset: SceneAsset) {
        let mut next = (*self.story).clone();
        match next.assets.iter_mut().find(|a| a.name == asset.name) {
            Some(existing) => *existing = asset,
            None => next.assets.push(asset),
        }
        self.commit(next);
    }

    pub fn remove_asset(&mut self, name: &str) -> bool {
        let Some(pos) = self.story.assets.iter().position(|a| a.name == name) else {
            return false;
        };
        let mut next = (*self.story).clone();
        next.assets.remove(pos);
        self.commit(next);
        true
    }

    pub fn get_asset(&self, name: &str) -> Option<&SceneAsset> {
        self.story.asset(name)
    }

    pub fn get_scene(&self, id: &str) -> Option<&SceneData> {
        self.story.scene(id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.story.scenes.iter().position(|s| s.id == id)
    }
}

impl Default for StoryEditor {
    fn default() -> Self {
        Self::new()
    }
}
