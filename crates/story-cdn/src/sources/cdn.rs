use async_trait::async_trait;
use tracing::debug;
use crate::{FetchError, FetchResult, RuntimeAssetKind, RuntimeAssetSource};

pub const DEFAULT_CDN_BASE_URL: &str = "https://cdn.jsdelivr.net/npm";

/// Location of a viewer build file under an npm CDN base URL.
pub fn runtime_asset_url(base_url: &str, version: &str, kind: RuntimeAssetKind) -> String {
    format!(
        "{}/molstar@{}/build/viewer/{}",
        base_url.trim_end_matches('/'),
        version,
        kind.file_name()
    )
}

/// Pulls the viewer build from an npm CDN mirror.
pub struct CdnSource {
    base_url: String,
    client: reqwest::Client,
}

impl CdnSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, version: &str, kind: RuntimeAssetKind) -> String {
        runtime_asset_url(&self.base_url, version, kind)
    }
}

impl Default for CdnSource {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_BASE_URL)
    }
}

#[async_trait]
impl RuntimeAssetSource for CdnSource {
    fn name(&self) -> &'static str {
        "jsdelivr"
    }

    async fn fetch(&self, version: &str, kind: RuntimeAssetKind) -> FetchResult<Vec<u8>> {
        let url = self.url_for(version, kind);
        debug!(%url, "Fetching runtime asset");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
