use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use story_core::container::CONTAINER_EXTENSION;
use story_core::{from_container, from_json, ExportConfig, ExportFormat, StoryExporter};
use story_schema::{SceneData, Story};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mvstory", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a new story with a single empty scene
    New {
        /// Output path; `.mvstory` writes a container, anything else JSON
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Story title
        #[arg(long)]
        title: Option<String>,
    },
    /// Print a summary of a story file
    Inspect {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Export a story file
    Export {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// json, container, snapshot, html or bundle
        #[arg(long, short)]
        format: String,

        /// Output path (defaults to a file named after the story, next to the input)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Show only these scenes in the viewer data, in this order (repeatable)
        #[arg(long = "scene", value_name = "SCENE_ID")]
        scenes: Vec<String>,

        /// Title to export the story under
        #[arg(long)]
        title: Option<String>,

        /// Viewer release for HTML pages and bundles
        #[arg(long)]
        renderer_version: Option<String>,

        /// npm CDN the viewer runtime is fetched from
        #[arg(long)]
        cdn_url: Option<String>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.to_string().parse()?)
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
    Ok(())
}

fn is_container(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CONTAINER_EXTENSION)
}

fn read_story(path: &Path) -> Result<Story> {
    let story = if is_container(path) {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        from_container(&bytes)?
    } else {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        from_json(&text)?
    };
    Ok(story)
}

/// Resolves the requested scenes, in the requested order. `None` means every scene.
fn select_scenes(story: &Story, ids: &[String]) -> Result<Option<Vec<SceneData>>> {
    if ids.is_empty() {
        return Ok(None);
    }
    let mut selected: Vec<SceneData> = Vec::with_capacity(ids.len());
    for id in ids {
        if selected.iter().any(|s| &s.id == id) {
            bail!("scene {id} requested more than once");
        }
        match story.scene(id) {
            Some(scene) => selected.push(scene.clone()),
            None => bail!("no scene with id {id}"),
        }
    }
    Ok(Some(selected))
}

fn new_story(output: &Path, title: Option<String>) -> Result<()> {
    let mut story = Story::empty();
    if let Some(title) = title {
        story.metadata.title = title;
    }

    let exporter = StoryExporter::default();
    let bytes = if is_container(output) {
        exporter.to_container(&story)?
    } else {
        exporter.to_json(&story)?.into_bytes()
    };
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    info!("Created {}", output.display());
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let story = read_story(input)?;
    info!(
        title = %story.metadata.title,
        scenes = story.scenes.len(),
        assets = story.assets.len(),
        prelude_bytes = story.javascript.len(),
        "Story"
    );
    for (index, scene) in story.scenes.iter().enumerate() {
        info!(
            index,
            id = %scene.id,
            header = %scene.header,
            key = scene.snapshot_key().unwrap_or("-"),
            camera = scene.camera.is_some(),
            "Scene"
        );
    }
    for asset in &story.assets {
        info!(name = %asset.name, bytes = asset.content.len(), "Asset");
    }
    Ok(())
}

struct ExportArgs {
    input: PathBuf,
    format: String,
    output: Option<PathBuf>,
    scenes: Vec<String>,
    title: Option<String>,
    renderer_version: Option<String>,
    cdn_url: Option<String>,
}

async fn export(args: ExportArgs) -> Result<()> {
    let format: ExportFormat = args.format.parse()?;
    let mut story = read_story(&args.input)?;
    let scenes = select_scenes(&story, &args.scenes)?;
    if let Some(title) = args.title {
        story.metadata.title = title;
    }

    let mut config = ExportConfig::from_env();
    if let Some(version) = args.renderer_version {
        config = config.with_renderer_version(version);
    }
    if let Some(url) = args.cdn_url {
        config = config.with_cdn_base_url(url);
    }

    info!("Exporting {} as {}", args.input.display(), format);
    let exporter = StoryExporter::from_config(config);
    let artifact = exporter
        .export_scenes(Arc::new(story), format, scenes.as_deref())
        .await?;

    let output = match args.output {
        Some(path) => path,
        None => args
            .input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&artifact.file_name),
    };
    fs::write(&output, &artifact.bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(bytes = artifact.bytes.len(), "Wrote {}", output.display());
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::New { output, title } => new_story(&output, title),
        Command::Inspect { input } => inspect(&input),
        Command::Export {
            input,
            format,
            output,
            scenes,
            title,
            renderer_version,
            cdn_url,
        } => {
            export(ExportArgs {
                input,
                format,
                output,
                scenes,
                title,
                renderer_version,
                cdn_url,
            })
            .await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level, cli.log_format) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
