//! Container Codec Tests
//!
//! Lossless round trips (binary assets included), stable re-packing and the
//! version gate on unpack.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::Serialize;
use std::io::Write;
use story_core::container::{pack, unpack};
use story_core::{from_container, ScenePatch, StoryEditor, StoryError, StoryExporter};
use story_schema::{CameraData, CameraMode, SceneAsset, Story};

fn sample_story() -> Story {
    let mut editor = StoryEditor::new();
    editor.set_global_script("let base = \"https://files.rcsb.org/download/\";");
    editor.add_scene(ScenePatch {
        header: Some("Binding pocket".into()),
        key: Some("pocket".into()),
        description: Some("# Retinoic acid\nbound in the **barrel**".into()),
        javascript: Some("builder.download(base + \"1cbs.cif\").parse(\"mmcif\");".into()),
        camera: Some(Some(CameraData {
            mode: CameraMode::Perspective,
            position: [10.5, -3.25, 40.0],
            target: [1.0, 2.0, 3.0],
            up: [0.0, 1.0, 0.0],
            fov: std::f64::consts::FRAC_PI_4,
        })),
        transition_duration_ms: Some(Some(1200)),
        ..Default::default()
    });

    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    let noise: Vec<u8> = (0..100_000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 32) as u8
        })
        .collect();
    editor.add_asset(SceneAsset::new("empty.bin", Vec::new()));
    editor.add_asset(SceneAsset::new("zeros.bin", vec![0u8; 65_536]));
    editor.add_asset(SceneAsset::new("noise.bcif", noise));
    editor.into_story()
}

fn compress(raw: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(raw).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn round_trip_is_lossless() {
    let story = sample_story();
    let bytes = pack(&story).unwrap();
    let back = unpack(&bytes).unwrap();

    assert_eq!(back, story);
    assert_eq!(back.assets[0].content.len(), 0);
    assert_eq!(back.assets[1].content, vec![0u8; 65_536]);
}

#[test]
fn repacking_is_stable() {
    let story = sample_story();
    let first = pack(&story).unwrap();
    let second = pack(&unpack(&first).unwrap()).unwrap();
    let third = pack(&unpack(&second).unwrap()).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn binary_assets_are_not_inflated() {
    let story = sample_story();
    let bytes = pack(&story).unwrap();
    let raw_assets: usize = story.assets.iter().map(|a| a.content.len()).sum();
    assert!(bytes.len() < raw_assets);
}

#[test]
fn unknown_version_is_rejected() {
    #[derive(Serialize)]
    struct Envelope<'a> {
        version: u32,
        story: &'a Story,
    }

    let story = Story::empty();
    let raw = rmp_serde::to_vec_named(&Envelope { version: 2, story: &story }).unwrap();
    match unpack(&compress(&raw)) {
        Err(StoryError::Version { found }) => assert_eq!(found, "2"),
        other => panic!("expected a version error, got {:?}", other.map(|s| s.metadata)),
    }
}

fn raw_envelope(version: rmpv::Value) -> Vec<u8> {
    let envelope = rmpv::Value::Map(vec![
        (rmpv::Value::from("version"), version),
        (rmpv::Value::from("story"), rmpv::Value::Nil),
    ]);
    let mut raw = Vec::new();
    rmpv::encode::write_value(&mut raw, &envelope).unwrap();
    raw
}

#[test]
fn non_numeric_version_is_rejected() {
    let err = unpack(&compress(&raw_envelope(rmpv::Value::Binary(vec![1])))).unwrap_err();
    assert!(matches!(err, StoryError::Version { .. }), "got {:?}", err);

    let err = unpack(&compress(&raw_envelope(rmpv::Value::from("1")))).unwrap_err();
    assert!(matches!(err, StoryError::Version { .. }), "got {:?}", err);

    let err = unpack(&compress(&raw_envelope(rmpv::Value::F64(1.5)))).unwrap_err();
    assert!(matches!(err, StoryError::Version { .. }), "got {:?}", err);
}

#[test]
fn missing_version_is_rejected() {
    #[derive(Serialize)]
    struct Bare<'a> {
        story: &'a Story,
    }

    let story = Story::empty();
    let raw = rmp_serde::to_vec_named(&Bare { story: &story }).unwrap();
    let err = unpack(&compress(&raw)).unwrap_err();
    assert!(matches!(&err, StoryError::Version { found } if found == "missing"));
    assert_eq!(err.to_string(), "Unsupported story version: missing");
}

#[test]
fn garbage_is_an_error() {
    assert!(unpack(b"not a container").is_err());
    assert!(unpack(&compress(b"\x93\x01\x02\x03")).is_err());
}

#[test]
fn exporter_and_import_agree() {
    let story = sample_story();
    let exporter = StoryExporter::new(
        Default::default(),
        story_cdn::RuntimeAssetCache::shared(),
        Default::default(),
    );
    let bytes = exporter.to_container(&story).unwrap();
    assert_eq!(from_container(&bytes).unwrap(), story);
}
