//! Export settings shared by the exporter and the CLI.

use story_cdn::sources::DEFAULT_CDN_BASE_URL;
use story_cdn::DEFAULT_RENDERER_VERSION;

/// Overrides the renderer release bundled by self-hosted exports.
pub const ENV_RENDERER_VERSION: &str = "MVSTORY_RENDERER_VERSION";
/// Overrides the npm CDN base URL runtime assets are pulled from.
pub const ENV_CDN_URL: &str = "MVSTORY_CDN_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub renderer_version: String,
    pub cdn_base_url: String,
}

impl ExportConfig {
    /// Defaults, with each field replaced by its environment variable when set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(version) = non_empty_var(ENV_RENDERER_VERSION) {
            config.renderer_version = version;
        }
        if let Some(url) = non_empty_var(ENV_CDN_URL) {
            config.cdn_base_url = url;
        }
        config
    }

    pub fn with_renderer_version(mut self, version: impl Into<String>) -> Self {
        self.renderer_version = version.into();
        self
    }

    pub fn with_cdn_base_url(mut self, url: impl Into<String>) -> Self {
        self.cdn_base_url = url.into();
        self
    }

    pub fn uses_default_cdn(&self) -> bool {
        self.cdn_base_url.trim_end_matches('/') == DEFAULT_CDN_BASE_URL
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            renderer_version: DEFAULT_RENDERER_VERSION.to_string(),
            cdn_base_url: DEFAULT_CDN_BASE_URL.to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = ExportConfig::default()
            .with_renderer_version("4.5.0")
            .with_cdn_base_url("https://unpkg.com");
        assert_eq!(config.renderer_version, "4.5.0");
        assert!(!config.uses_default_cdn());
        assert!(ExportConfig::default().uses_default_cdn());
    }
}
