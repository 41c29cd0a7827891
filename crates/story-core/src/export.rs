//! # Export Orchestrator
//!
//! Turns one [`Story`] into any of the five output formats, and reads the two
//! editable ones back.
//!
//! ## Formats
//! - **JSON**: the story itself, pretty-printed.
//! - **Container**: `.mvstory`, see [`crate::container`].
//! - **Snapshot**: `.mvsj` document or `.mvsx` archive, see [`crate::assembler`].
//! - **HTML**: one page with the snapshot export inlined.
//! - **Self-hosted bundle**: a zip with the viewer runtime, the snapshot export,
//!   the container and an `index.html` that ties them together.
//!
//! Only the bundle is async. It runs the two runtime downloads, the snapshot build
//! and the container encode concurrently; the first failure fails the export.

use crate::archive::write_zip;
use crate::assembler::{SnapshotAssembler, SnapshotExport};
use crate::config::ExportConfig;
use crate::container::{self, CONTAINER_EXTENSION};
use crate::errors::{StoryError, StoryResult};
use crate::html::{render_page, HtmlMode};
use std::str::FromStr;
use std::sync::Arc;
use story_cdn::sources::{runtime_asset_url, CdnSource};
use story_cdn::{RuntimeAssetCache, RuntimeAssetKind};
use story_schema::{SceneData, Story};
use tokio::task::JoinError;
use tracing::{debug, info, instrument};

/// Folder for the viewer runtime inside a self-hosted bundle.
pub const BUNDLE_ASSETS_DIR: &str = "assets";
/// Folder for the story data inside a self-hosted bundle.
pub const BUNDLE_STORY_DIR: &str = "story";

/// Export targets understood by [`StoryExporter::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Container,
    Snapshot,
    Html,
    SelfHosted,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Json,
        ExportFormat::Container,
        ExportFormat::Snapshot,
        ExportFormat::Html,
        ExportFormat::SelfHosted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Container => "container",
            ExportFormat::Snapshot => "snapshot",
            ExportFormat::Html => "html",
            ExportFormat::SelfHosted => "self-hosted",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "container" | "mvstory" => Ok(ExportFormat::Container),
            "snapshot" | "mvsj" | "mvsx" => Ok(ExportFormat::Snapshot),
            "html" => Ok(ExportFormat::Html),
            "bundle" | "self-hosted" => Ok(ExportFormat::SelfHosted),
            _ => Err(StoryError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished export: suggested file name plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Page title; the story title when `None`.
    pub title: Option<String>,
    /// Scenes to show, in order; every scene when `None`.
    pub scenes: Option<Vec<SceneData>>,
}

#[derive(Debug, Clone, Default)]
pub struct SelfHostedOptions {
    /// Renderer release to bundle; the configured one when `None`.
    pub version: Option<String>,
    pub title: Option<String>,
    /// Scenes in the data file, in order; every scene when `None`. The session
    /// container always holds the whole story.
    pub scenes: Option<Vec<SceneData>>,
}

/// Parses a story from its JSON form and validates it.
pub fn from_json(text: &str) -> StoryResult<Story> {
    let story: Story = serde_json::from_str(text)?;
    story.validate()?;
    Ok(story)
}

/// Reads a `.mvstory` container.
pub fn from_container(bytes: &[u8]) -> StoryResult<Story> {
    container::unpack(bytes)
}

fn join_error(e: JoinError) -> StoryError {
    StoryError::Task(e.to_string())
}

/// File-name stem derived from the story title: lowercase ASCII words joined by `-`.
fn file_stem(title: &str) -> String {
    let stem = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "story".to_string()
    } else {
        stem
    }
}

/// Cheap to clone; clones share the assembler and the runtime-asset cache.
#[derive(Clone)]
pub struct StoryExporter {
    assembler: Arc<SnapshotAssembler>,
    runtime: Arc<RuntimeAssetCache>,
    config: ExportConfig,
}

impl StoryExporter {
    pub fn new(assembler: Arc<SnapshotAssembler>, runtime: Arc<RuntimeAssetCache>, config: ExportConfig) -> Self {
        Self {
            assembler,
            runtime,
            config,
        }
    }

    /// Default assembler. The process-wide runtime cache is used unless the config
    /// points at another CDN.
    pub fn from_config(config: ExportConfig) -> Self {
        let runtime = if config.uses_default_cdn() {
            RuntimeAssetCache::shared()
        } else {
            Arc::new(RuntimeAssetCache::new(Arc::new(CdnSource::new(
                config.cdn_base_url.clone(),
            ))))
        };
        Self::new(Arc::new(SnapshotAssembler::default()), runtime, config)
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn assembler(&self) -> &Arc<SnapshotAssembler> {
        &self.assembler
    }

    pub fn runtime_cache(&self) -> &Arc<RuntimeAssetCache> {
        &self.runtime
    }

    /// Pretty JSON. Asset bytes come out as arrays of numbers.
    pub fn to_json(&self, story: &Story) -> StoryResult<String> {
        Ok(serde_json::to_string_pretty(story)?)
    }

    pub fn to_container(&self, story: &Story) -> StoryResult<Vec<u8>> {
        container::pack(story)
    }

    pub fn to_snapshot_export(&self, story: &Story, scenes: Option<&[SceneData]>) -> StoryResult<SnapshotExport> {
        self.assembler.build_document(story, scenes)
    }

    #[instrument(level = "info", skip_all, fields(title = %story.metadata.title))]
    pub fn to_html(&self, story: &Story, options: &HtmlOptions) -> StoryResult<String> {
        let export = self.to_snapshot_export(story, options.scenes.as_deref())?;
        let title = options.title.as_deref().unwrap_or(&story.metadata.title);
        let script_url = runtime_asset_url(
            &self.config.cdn_base_url,
            &self.config.renderer_version,
            RuntimeAssetKind::Script,
        );
        let stylesheet_url = runtime_asset_url(
            &self.config.cdn_base_url,
            &self.config.renderer_version,
            RuntimeAssetKind::Stylesheet,
        );

        let html = render_page(
            title,
            HtmlMode::Embed {
                export: &export,
                script_url: &script_url,
                stylesheet_url: &stylesheet_url,
            },
        )?;
        debug!(bytes = html.len(), format = export.extension(), "HTML page rendered");
        Ok(html)
    }

    #[instrument(level = "info", skip_all, fields(title = %story.metadata.title))]
    pub async fn to_self_hosted_zip(&self, story: Arc<Story>, options: SelfHostedOptions) -> StoryResult<Vec<u8>> {
        let version = options
            .version
            .clone()
            .unwrap_or_else(|| self.config.renderer_version.clone());

        let fetch = |kind: RuntimeAssetKind| {
            let runtime = self.runtime.clone();
            let version = version.clone();
            async move {
                runtime
                    .get(&version, kind)
                    .await
                    .map_err(|source| StoryError::RuntimeAssetFetch {
                        kind,
                        version,
                        source,
                    })
            }
        };

        let snapshot = {
            let assembler = self.assembler.clone();
            let story = story.clone();
            let scenes = options.scenes.clone();
            async move {
                tokio::task::spawn_blocking(move || assembler.build_document(&story, scenes.as_deref()))
                    .await
                    .map_err(join_error)
                    .and_then(|result| result)
            }
        };

        let session = {
            let story = story.clone();
            async move {
                tokio::task::spawn_blocking(move || container::pack(&story))
                    .await
                    .map_err(join_error)
                    .and_then(|result| result)
            }
        };

        let (script, stylesheet, snapshot, session) = tokio::try_join!(
            fetch(RuntimeAssetKind::Script),
            fetch(RuntimeAssetKind::Stylesheet),
            snapshot,
            session,
        )?;

        let script_path = format!("{}/{}", BUNDLE_ASSETS_DIR, RuntimeAssetKind::Script.file_name());
        let stylesheet_path = format!("{}/{}", BUNDLE_ASSETS_DIR, RuntimeAssetKind::Stylesheet.file_name());
        let data_path = format!("{}/data.{}", BUNDLE_STORY_DIR, snapshot.extension());
        let session_path = format!("{}/session.{}", BUNDLE_STORY_DIR, CONTAINER_EXTENSION);

        let title = options.title.as_deref().unwrap_or(&story.metadata.title);
        let html = render_page(
            title,
            HtmlMode::SelfHosted {
                script_path: &script_path,
                stylesheet_path: &stylesheet_path,
                data_path: &data_path,
                session_path: &session_path,
            },
        )?;
        let data = snapshot.to_bytes()?;

        let bundle = write_zip([
            (script_path.as_str(), script.as_slice()),
            (stylesheet_path.as_str(), stylesheet.as_slice()),
            (data_path.as_str(), data.as_slice()),
            (session_path.as_str(), session.as_slice()),
            ("index.html", html.as_bytes()),
        ])?;

        info!(
            bytes = bundle.len(),
            renderer_version = %version,
            data = %data_path,
            "Self-hosted bundle written"
        );
        Ok(bundle)
    }

    /// Runs one export and names the result after the story title.
    pub async fn export(&self, story: Arc<Story>, format: ExportFormat) -> StoryResult<ExportArtifact> {
        self.export_scenes(story, format, None).await
    }

    /// Like [`export`](Self::export), but the snapshot document and the pages built
    /// from it only show `scenes`, in that order. JSON, container and session
    /// outputs still carry the whole story.
    #[instrument(level = "info", skip_all, fields(format = %format, scenes = scenes.map(|s| s.len())))]
    pub async fn export_scenes(
        &self,
        story: Arc<Story>,
        format: ExportFormat,
        scenes: Option<&[SceneData]>,
    ) -> StoryResult<ExportArtifact> {
        let stem = file_stem(&story.metadata.title);
        let artifact = match format {
            ExportFormat::Json => ExportArtifact {
                file_name: format!("{}.json", stem),
                bytes: self.to_json(&story)?.into_bytes(),
            },
            ExportFormat::Container => ExportArtifact {
                file_name: format!("{}.{}", stem, CONTAINER_EXTENSION),
                bytes: self.to_container(&story)?,
            },
            ExportFormat::Snapshot => {
                let export = self.to_snapshot_export(&story, scenes)?;
                ExportArtifact {
                    file_name: format!("{}.{}", stem, export.extension()),
                    bytes: export.to_bytes()?,
                }
            }
            ExportFormat::Html => ExportArtifact {
                file_name: format!("{}.html", stem),
                bytes: self
                    .to_html(
                        &story,
                        &HtmlOptions {
                            scenes: scenes.map(<[SceneData]>::to_vec),
                            ..Default::default()
                        },
                    )?
                    .into_bytes(),
            },
            ExportFormat::SelfHosted => ExportArtifact {
                file_name: format!("{}.zip", stem),
                bytes: self
                    .to_self_hosted_zip(
                        story.clone(),
                        SelfHostedOptions {
                            scenes: scenes.map(<[SceneData]>::to_vec),
                            ..Default::default()
                        },
                    )
                    .await?,
            },
        };
        Ok(artifact)
    }
}

impl Default for StoryExporter {
    fn default() -> Self {
        Self::from_config(ExportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags() {
        assert_eq!("mvstory".parse::<ExportFormat>().unwrap(), ExportFormat::Container);
        assert_eq!("MVSX".parse::<ExportFormat>().unwrap(), ExportFormat::Snapshot);
        assert_eq!("bundle".parse::<ExportFormat>().unwrap(), ExportFormat::SelfHosted);
        for format in ExportFormat::ALL {
            assert_eq!(format.as_str().parse::<ExportFormat>().unwrap(), format);
        }
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(StoryError::UnsupportedFormat(tag)) if tag == "pdf"
        ));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Hemoglobin: Oxygen Transport!"), "hemoglobin-oxygen-transport");
        assert_eq!(file_stem("  ***  "), "story");
    }
}
