//! # MolViewSpec Stories
//!
//! `mvs-stories` bundles the story workspace behind one dependency.
//!
//! A story is a sequence of scenes, each a short [Rhai](https://rhai.rs/) script that
//! declares a MolViewSpec visualization state. The crates underneath edit stories,
//! run their scripts and write them out as JSON, `.mvstory` containers, `.mvsj` /
//! `.mvsx` snapshot exports, HTML pages and self-hosted bundles.
//!
//! * [`story_schema`]: the data model.
//! * [`story_core`]: editing, execution and export.
//! * [`story_cdn`]: viewer runtime downloads and their cache.

pub use story_cdn;
pub use story_core;
pub use story_schema;

pub use story_core::{
    from_container, from_json, ExportArtifact, ExportConfig, ExportFormat, SnapshotExport, StoryEditor,
    StoryError, StoryExporter, StoryResult,
};
pub use story_schema::{SceneAsset, SceneData, Story};
