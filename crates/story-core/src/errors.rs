use story_cdn::{FetchError, RuntimeAssetKind};
use story_schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Cannot remove the last scene of a story")]
    LastScene,
    #[error("Unsupported story version: {found}")]
    Version { found: String },
    #[error("Script error in scene {index} ({scene_id}): {source}")]
    ScriptExecution {
        scene_id: String,
        index: usize,
        #[source]
        source: Box<rhai::EvalAltResult>,
    },
    #[error("Failed to fetch runtime {kind} for version {version}: {source}")]
    RuntimeAssetFetch {
        kind: RuntimeAssetKind,
        version: String,
        #[source]
        source: FetchError,
    },
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Asset name is reserved by the export layout: {0}")]
    ReservedAssetName(String),
    #[error("Invalid story: {0}")]
    InvalidStory(#[from] SchemaError),
    #[error("Binary encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("Binary decoding failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Background task failed: {0}")]
    Task(String),
}

pub type StoryResult<T> = Result<T, StoryError>;
