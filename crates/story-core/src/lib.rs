//! # Story Core
//!
//! `story-core` turns an authored MolViewSpec story into the files a viewer or an
//! editor can open.
//!
//! A story is metadata, a shared script prelude, an ordered list of scenes (each with
//! its own script and optional camera) and a set of binary assets. Scene scripts are
//! [Rhai](https://rhai.rs/) programs that declare visualization state through a
//! `builder` value; running them in order yields one snapshot per scene.
//!
//! ## Core Features
//!
//! *   **Editing**: [`StoryEditor`] applies copy-on-write updates and keeps the
//!     story invariants (at least one scene, unique asset names).
//! *   **Execution**: [`SceneExecutor`] runs one scene against a fresh builder and
//!     corrects the exported camera for the viewer's framing.
//! *   **Assembly**: [`SnapshotAssembler`] produces the multi-snapshot document, zipped
//!     together with the story assets when there are any.
//! *   **Container**: [`container::pack`] / [`container::unpack`] for the compressed,
//!     versioned `.mvstory` format.
//! *   **Export**: [`StoryExporter`] covers JSON, container, snapshot, HTML and the
//!     self-hosted bundle.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use story_core::{StoryEditor, StoryExporter, ScenePatch};
//! use std::sync::Arc;
//!
//! # async fn run() -> story_core::StoryResult<()> {
//! let mut editor = StoryEditor::new();
//! editor.add_scene(ScenePatch {
//!     header: Some("Overview".into()),
//!     javascript: Some("builder.download(\"https://files.rcsb.org/download/1cbs.cif\").parse(\"mmcif\");".into()),
//!     ..Default::default()
//! });
//!
//! let exporter = StoryExporter::default();
//! let html = exporter.to_html(editor.story(), &Default::default())?;
//! let bundle = exporter.to_self_hosted_zip(editor.current(), Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod errors;

/// Copy-on-write story editing.
pub mod story;

/// Camera correction applied to exported snapshots.
pub mod camera;

/// Rhai bindings: the state builder and the helper library.
pub mod scripting;

pub mod executor;

/// Multi-scene document assembly and `.mvsx` packaging.
pub mod assembler;

pub mod archive;

/// The `.mvstory` container codec.
pub mod container;

pub mod config;

/// Viewer page templates.
pub mod html;

/// Format dispatch, HTML and the self-hosted bundle.
pub mod export;

pub use assembler::{SnapshotAssembler, SnapshotExport};
pub use config::ExportConfig;
pub use errors::{StoryError, StoryResult};
pub use executor::SceneExecutor;
pub use export::{
    from_container, from_json, ExportArtifact, ExportFormat, HtmlOptions, SelfHostedOptions, StoryExporter,
};
pub use scripting::ScriptLibrary;
pub use story::{MetadataPatch, ScenePatch, StoryEditor};
