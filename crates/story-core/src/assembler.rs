//! # Snapshot Assembler
//!
//! Runs the executor over an ordered scene list and aggregates the result.
//!
//! ## Responsibilities
//! - **Ordering**: scenes run one after another, in the order given. The index a
//!   script sees is its position in that list, not in the story.
//! - **Document**: `{ kind: "multiple", metadata, snapshots }`.
//! - **Packaging**: stories with assets come back as an `.mvsx` zip holding
//!   `index.mvsj` plus every asset under its own name.

use crate::archive::{read_zip, write_zip};
use crate::errors::{StoryError, StoryResult};
use crate::executor::SceneExecutor;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use story_schema::{Document, DocumentMetadata, SceneData, Story, MVS_FORMAT_VERSION};
use tracing::{debug, info, instrument};

/// Name of the document entry inside an `.mvsx` archive.
pub const ARCHIVE_INDEX: &str = "index.mvsj";

/// A snapshot export: either a plain document or a zip archive.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotExport {
    Document(Document),
    Archive(Vec<u8>),
}

impl SnapshotExport {
    /// `mvsj` for documents, `mvsx` for archives.
    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotExport::Document(_) => "mvsj",
            SnapshotExport::Archive(_) => "mvsx",
        }
    }

    /// Serialized file contents.
    pub fn to_bytes(&self) -> StoryResult<Vec<u8>> {
        match self {
            SnapshotExport::Document(doc) => Ok(serde_json::to_vec(doc)?),
            SnapshotExport::Archive(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Contents of an `.mvsx` archive.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotArchive {
    pub document: Document,
    /// Every other entry, in archive order.
    pub files: Vec<(String, Vec<u8>)>,
}

/// Opens an `.mvsx` archive produced by [`SnapshotAssembler::build_document`].
pub fn read_snapshot_archive(bytes: &[u8]) -> StoryResult<SnapshotArchive> {
    let mut document = None;
    let mut files = Vec::new();

    for (name, data) in read_zip(bytes)? {
        if name == ARCHIVE_INDEX {
            document = Some(serde_json::from_slice::<Document>(&data)?);
        } else {
            files.push((name, data));
        }
    }

    let document = document.ok_or(StoryError::Archive(zip::result::ZipError::FileNotFound))?;
    Ok(SnapshotArchive { document, files })
}

pub struct SnapshotAssembler {
    executor: Arc<SceneExecutor>,
}

impl SnapshotAssembler {
    pub fn new(executor: Arc<SceneExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<SceneExecutor> {
        &self.executor
    }

    /// Builds the document for `scenes`, or for every scene of the story when `None`.
    ///
    /// The first failing scene aborts the whole build.
    #[instrument(level = "info", skip_all, fields(title = %story.metadata.title))]
    pub fn build_document(&self, story: &Story, scenes: Option<&[SceneData]>) -> StoryResult<SnapshotExport> {
        let scenes = scenes.unwrap_or(&story.scenes);
        if story.asset(ARCHIVE_INDEX).is_some() {
            return Err(StoryError::ReservedAssetName(ARCHIVE_INDEX.to_string()));
        }

        // Scenes run strictly in order, one at a time.
        let mut snapshots = Vec::with_capacity(scenes.len());
        for (index, scene) in scenes.iter().enumerate() {
            let builder = self.executor.new_builder();
            let snapshot = self
                .executor
                .execute_scene(&story.javascript, scene, index, builder.as_ref())?;
            snapshots.push(snapshot);
        }

        let document = Document::multiple(
            DocumentMetadata {
                title: Some(story.metadata.title.clone()),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                version: MVS_FORMAT_VERSION.to_string(),
            },
            snapshots,
        );
        info!(snapshots = document.snapshots.len(), assets = story.assets.len(), "Snapshot document built");

        if story.assets.is_empty() {
            return Ok(SnapshotExport::Document(document));
        }

        let index = serde_json::to_vec(&document)?;
        let entries = std::iter::once((ARCHIVE_INDEX, index.as_slice())).chain(
            story
                .assets
                .iter()
                .map(|a| (a.name.as_str(), a.content.as_slice())),
        );
        let archive = write_zip(entries)?;
        debug!(bytes = archive.len(), "Snapshot archive written");

        Ok(SnapshotExport::Archive(archive))
    }
}

impl Default for SnapshotAssembler {
    fn default() -> Self {
        Self::new(Arc::new(SceneExecutor::default()))
    }
}
