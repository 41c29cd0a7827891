//! # Scripting Module
//!
//! Rhai bindings used to run scene scripts.
//!
//! ## Responsibilities
//! - **Builder**: the `builder` value scripts receive, recording a MolViewSpec state tree.
//! - **Library**: named helper modules (`Vec3`, `Mat4`, `Color`) and constants injected by name.
//! - **Snapshots**: finalizing the recorded tree into a [`Snapshot`].
//!
//! ## Pattern
//! All bindings follow: `engine.register_fn("name", |node: &mut NodeHandle, ...| { ... })`
//!
//! ## Module Structure
//! - `types`: Handle type (`NodeHandle`) shared with scripts
//! - `builder`: State tree arena and the default `StateBuilder`
//! - `api`: Registration of node-creating calls
//! - `library`: `ScriptLibrary` and the standard helper modules
//! - `utils`: Colour and vector conversion helpers

mod api;
pub mod builder;
pub mod library;
pub mod types;
pub mod utils;

pub use builder::{StateBuilder, StateBuilderFactory, StateTree, NODE_KINDS};
pub use library::ScriptLibrary;
pub use types::NodeHandle;

use rhai::{Engine, EvalAltResult, Scope};
use story_schema::Snapshot;

/// Camera placement applied after a scene script has run.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraUpdate {
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
}

/// Metadata attached to a finalized snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOptions {
    pub key: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub linger_duration_ms: u64,
    pub transition_duration_ms: u64,
}

/// The capability a scene script builds its visualization state with.
///
/// One builder serves one scene: the executor binds it into the script scope,
/// applies the captured camera, then asks it for the snapshot.
pub trait SceneBuilder: Send + Sync {
    /// Exposes the builder to the script as `builder`.
    fn bind(&self, scope: &mut Scope<'_>);

    fn set_camera(&self, camera: CameraUpdate) -> Result<(), Box<EvalAltResult>>;

    fn snapshot(&self, options: SnapshotOptions) -> Result<Snapshot, Box<EvalAltResult>>;
}

/// Creates builders and registers the script API they need.
pub trait BuilderFactory: Send + Sync {
    fn register_api(&self, engine: &mut Engine);

    fn create(&self) -> Box<dyn SceneBuilder>;
}

/// Registers the default builder API into the provided Rhai `Engine`.
pub fn register_rhai_api(engine: &mut Engine) {
    api::register_all(engine);
}
