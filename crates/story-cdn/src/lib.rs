use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod sources;

pub use cache::RuntimeAssetCache;

/// Renderer release bundled with self-hosted exports unless the caller asks for another.
pub const DEFAULT_RENDERER_VERSION: &str = "4.18.0";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("source error: {0}")]
    Source(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// The two viewer files a self-hosted bundle needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeAssetKind {
    Script,
    Stylesheet,
}

impl RuntimeAssetKind {
    pub const ALL: [RuntimeAssetKind; 2] = [RuntimeAssetKind::Script, RuntimeAssetKind::Stylesheet];

    /// File name both on the CDN and inside the bundle's `assets/` folder.
    pub fn file_name(self) -> &'static str {
        match self {
            RuntimeAssetKind::Script => "molstar.js",
            RuntimeAssetKind::Stylesheet => "molstar.css",
        }
    }
}

impl std::fmt::Display for RuntimeAssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeAssetKind::Script => write!(f, "script"),
            RuntimeAssetKind::Stylesheet => write!(f, "stylesheet"),
        }
    }
}

#[async_trait]
pub trait RuntimeAssetSource: Send + Sync {
    /// Downloads one runtime file for the given renderer version.
    async fn fetch(&self, version: &str, kind: RuntimeAssetKind) -> FetchResult<Vec<u8>>;

    /// Returns the source name (e.g., "jsdelivr").
    fn name(&self) -> &'static str;
}
