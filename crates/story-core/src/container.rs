//! # Container Codec
//!
//! The `.mvstory` format: `{ version: 1, story }` encoded as MessagePack with
//! named fields, then raw-DEFLATE compressed at a fixed level.
//!
//! Asset bytes are MessagePack `bin` values, so binary content is never
//! escaped or inflated on the way through.

use crate::errors::{StoryError, StoryResult};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::Deserialize;
use std::io::{Read, Write};
use story_schema::{Story, StoryContainer, CONTAINER_VERSION};
use tracing::{debug, instrument};

/// File suffix for packed stories.
pub const CONTAINER_EXTENSION: &str = "mvstory";

/// Fixed DEFLATE level for every packed story.
const COMPRESSION_LEVEL: u32 = 6;

#[derive(Deserialize)]
struct VersionHeader {
    #[serde(default)]
    version: Option<rmpv::Value>,
}

#[instrument(level = "debug", skip_all, fields(scenes = story.scenes.len(), assets = story.assets.len()))]
pub fn pack(story: &Story) -> StoryResult<Vec<u8>> {
    #[derive(serde::Serialize)]
    struct Envelope<'a> {
        version: u32,
        story: &'a Story,
    }

    let encoded = rmp_serde::to_vec_named(&Envelope {
        version: CONTAINER_VERSION,
        story,
    })?;
    debug!(bytes = encoded.len(), "Story encoded");

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder.write_all(&encoded)?;
    let compressed = encoder.finish()?;
    debug!(
        compressed_bytes = compressed.len(),
        ratio = format!("{:.2}x", encoded.len() as f64 / compressed.len().max(1) as f64),
        "Story compressed"
    );

    Ok(compressed)
}

#[instrument(level = "debug", skip_all, fields(bytes = bytes.len()))]
pub fn unpack(bytes: &[u8]) -> StoryResult<Story> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut encoded = Vec::new();
    decoder.read_to_end(&mut encoded)?;
    debug!(decompressed_bytes = encoded.len(), "Container decompressed");

    let header: VersionHeader = rmp_serde::from_slice(&encoded)?;
    match &header.version {
        Some(value) if value.as_u64() == Some(CONTAINER_VERSION as u64) => {}
        Some(other) => {
            return Err(StoryError::Version {
                found: other.to_string(),
            })
        }
        None => {
            return Err(StoryError::Version {
                found: "missing".to_string(),
            })
        }
    }

    let container: StoryContainer = rmp_serde::from_slice(&encoded)?;
    container.story.validate()?;
    Ok(container.story)
}
