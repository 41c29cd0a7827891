//! Export Orchestrator Tests
//!
//! HTML embedding modes, the self-hosted bundle layout, format dispatch and the
//! import paths.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use story_cdn::{FetchError, FetchResult, RuntimeAssetCache, RuntimeAssetKind, RuntimeAssetSource};
use story_core::archive::read_zip;
use story_core::assembler::{read_snapshot_archive, SnapshotAssembler};
use story_core::{
    from_json, ExportConfig, ExportFormat, HtmlOptions, MetadataPatch, ScenePatch, SelfHostedOptions, StoryEditor,
    StoryError, StoryExporter,
};
use story_schema::{SceneAsset, Story};

/// Serves `version:file` for every request, or fails every request.
struct FakeCdn {
    calls: AtomicUsize,
    offline: bool,
}

impl FakeCdn {
    fn online() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            offline: false,
        })
    }

    fn offline() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            offline: true,
        })
    }
}

#[async_trait]
impl RuntimeAssetSource for FakeCdn {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, version: &str, kind: RuntimeAssetKind) -> FetchResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(FetchError::Status {
                url: format!("https://fake/{}", kind.file_name()),
                status: 503,
            });
        }
        Ok(format!("{}:{}", version, kind.file_name()).into_bytes())
    }
}

fn exporter(source: Arc<FakeCdn>) -> StoryExporter {
    StoryExporter::new(
        Arc::new(SnapshotAssembler::default()),
        Arc::new(RuntimeAssetCache::new(source)),
        ExportConfig::default().with_renderer_version("4.9.1"),
    )
}

fn story(with_asset: bool) -> Story {
    let mut editor = StoryEditor::new();
    editor.update_metadata(MetadataPatch {
        title: Some("Retinol </script> binding".into()),
        author_note: None,
    });
    let first = editor.story().scenes[0].id.clone();
    editor.update_scene(
        &first,
        ScenePatch {
            javascript: Some(r#"builder.download("https://files.rcsb.org/download/1cbs.cif").parse("mmcif");"#.into()),
            ..Default::default()
        },
    );
    editor.add_scene(ScenePatch {
        header: Some("Close-up".into()),
        javascript: Some(r#"builder.canvas("black");"#.into()),
        ..Default::default()
    });
    if with_asset {
        editor.add_asset(SceneAsset::new("1cbs.bcif", vec![0, 159, 255, 7]));
    }
    editor.into_story()
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).unwrap() + start.len();
    let to = from + text[from..].find(end).unwrap();
    &text[from..to]
}

#[test]
fn html_embeds_a_document_as_a_literal() {
    let story = story(false);
    let html = exporter(FakeCdn::online()).to_html(&story, &HtmlOptions::default()).unwrap();

    assert!(html.contains("<title>Retinol &lt;/script&gt; binding</title>"));
    assert!(html.contains("const format = 'mvsj';"));
    assert!(html.contains(r#"https://cdn.jsdelivr.net/npm/molstar@4.9.1/build/viewer/molstar.js"#));
    assert!(html.contains("viewer.loadMvsData(data, format)"));
    // Page script tag plus loader block; the title inside the data is escaped.
    assert_eq!(html.matches("</script>").count(), 2);

    let literal = between(&html, "JSON.stringify(", ");\n");
    assert!(!literal.contains('<'));
    let doc: story_schema::Document = serde_json::from_str(literal).unwrap();
    assert_eq!(doc.snapshots.len(), 2);
    assert_eq!(doc.metadata.title.as_deref(), Some("Retinol </script> binding"));
}

#[test]
fn html_embeds_an_archive_as_base64() {
    let story = story(true);
    let html = exporter(FakeCdn::online())
        .to_html(
            &story,
            &HtmlOptions {
                title: Some("Custom".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(html.contains("<title>Custom</title>"));
    assert!(html.contains("const format = 'mvsx';"));
    let encoded = between(&html, "atob('", "')");
    let archive = read_snapshot_archive(&STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!(archive.document.snapshots.len(), 2);
    assert_eq!(archive.files, vec![("1cbs.bcif".to_string(), vec![0, 159, 255, 7])]);
}

#[tokio::test]
async fn self_hosted_bundle_layout() {
    let story = Arc::new(story(true));
    let source = FakeCdn::online();
    let bundle = exporter(source.clone())
        .to_self_hosted_zip(story.clone(), SelfHostedOptions::default())
        .await
        .unwrap();

    let entries = read_zip(&bundle).unwrap();
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "assets/molstar.js",
            "assets/molstar.css",
            "story/data.mvsx",
            "story/session.mvstory",
            "index.html",
        ]
    );
    assert_eq!(entries[0].1, b"4.9.1:molstar.js");
    assert_eq!(entries[1].1, b"4.9.1:molstar.css");
    assert_eq!(read_snapshot_archive(&entries[2].1).unwrap().document.snapshots.len(), 2);
    assert_eq!(story_core::from_container(&entries[3].1).unwrap(), *story);

    let html = String::from_utf8(entries[4].1.clone()).unwrap();
    assert!(html.contains(r#"src="assets/molstar.js""#));
    assert!(html.contains(r#"href="assets/molstar.css""#));
    assert!(html.contains(r#"fetch("story/data.mvsx")"#));
    assert!(html.contains(r#"href="story/session.mvstory""#));
    assert!(!html.contains("atob("));
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn scene_subset_only_narrows_the_viewer_data() {
    let story = Arc::new(story(true));
    let second = story.scenes[1].clone();
    let exporter = exporter(FakeCdn::online());

    let bundle = exporter
        .export_scenes(story.clone(), ExportFormat::SelfHosted, Some(&[second.clone()]))
        .await
        .unwrap();
    let entries = read_zip(&bundle.bytes).unwrap();
    assert_eq!(read_snapshot_archive(&entries[2].1).unwrap().document.snapshots.len(), 1);
    assert_eq!(story_core::from_container(&entries[3].1).unwrap(), *story);

    let json = exporter
        .export_scenes(story.clone(), ExportFormat::Json, Some(&[second]))
        .await
        .unwrap();
    assert_eq!(from_json(std::str::from_utf8(&json.bytes).unwrap()).unwrap(), *story);
}

#[tokio::test]
async fn self_hosted_bundle_reuses_cached_runtime() {
    let source = FakeCdn::online();
    let exporter = exporter(source.clone());
    let story = Arc::new(story(false));

    for _ in 0..3 {
        let bundle = exporter
            .to_self_hosted_zip(
                story.clone(),
                SelfHostedOptions {
                    version: Some("4.0.0".into()),
                    title: Some("Pinned".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let entries = read_zip(&bundle).unwrap();
        assert_eq!(entries[0].1, b"4.0.0:molstar.js");
        assert_eq!(entries[2].0, "story/data.mvsj");
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn runtime_fetch_failure_fails_the_bundle() {
    let source = FakeCdn::offline();
    let exporter = exporter(source.clone());

    let err = exporter
        .to_self_hosted_zip(Arc::new(story(false)), SelfHostedOptions::default())
        .await
        .unwrap_err();
    match err {
        StoryError::RuntimeAssetFetch { version, source, .. } => {
            assert_eq!(version, "4.9.1");
            assert!(matches!(source, FetchError::Status { status: 503, .. }));
        }
        other => panic!("expected a fetch error, got {other}"),
    }
    assert!(exporter.runtime_cache().is_empty());
}

#[tokio::test]
async fn script_failure_fails_the_bundle() {
    let mut story = story(false);
    story.scenes[1].javascript = r#"throw "nope";"#.into();

    let err = exporter(FakeCdn::online())
        .to_self_hosted_zip(Arc::new(story), SelfHostedOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::ScriptExecution { index: 1, .. }));
}

#[tokio::test]
async fn export_dispatches_by_format() {
    let exporter = exporter(FakeCdn::online());
    let story = Arc::new(story(false));

    let json = exporter.export(story.clone(), "json".parse().unwrap()).await.unwrap();
    assert_eq!(json.file_name, "retinol-script-binding.json");
    assert_eq!(from_json(std::str::from_utf8(&json.bytes).unwrap()).unwrap(), *story);

    let container = exporter.export(story.clone(), ExportFormat::Container).await.unwrap();
    assert_eq!(container.file_name, "retinol-script-binding.mvstory");

    let snapshot = exporter.export(story.clone(), "mvsj".parse().unwrap()).await.unwrap();
    assert_eq!(snapshot.file_name, "retinol-script-binding.mvsj");
    assert!(serde_json::from_slice::<story_schema::Document>(&snapshot.bytes).is_ok());

    let html = exporter.export(story.clone(), ExportFormat::Html).await.unwrap();
    assert_eq!(html.file_name, "retinol-script-binding.html");

    let bundle = exporter.export(story.clone(), "bundle".parse().unwrap()).await.unwrap();
    assert_eq!(bundle.file_name, "retinol-script-binding.zip");

    assert!(matches!(
        "gltf".parse::<ExportFormat>(),
        Err(StoryError::UnsupportedFormat(_))
    ));
}

#[test]
fn json_keeps_asset_bytes_as_numbers() {
    let story = story(true);
    let json = exporter(FakeCdn::online()).to_json(&story).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["assets"][0]["content"], serde_json::json!([0, 159, 255, 7]));
    assert_eq!(from_json(&json).unwrap(), story);
}

#[test]
fn json_import_validates() {
    let mut story = Story::empty();
    story.scenes.clear();
    let json = serde_json::to_string(&story).unwrap();
    assert!(matches!(from_json(&json), Err(StoryError::InvalidStory(_))));
    assert!(matches!(from_json("{"), Err(StoryError::Json(_))));
}
