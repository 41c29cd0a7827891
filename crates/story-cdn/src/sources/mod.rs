pub mod cdn;

pub use cdn::{runtime_asset_url, CdnSource, DEFAULT_CDN_BASE_URL};
