//! # Scene Executor
//!
//! Runs one scene script against a builder and finalizes the snapshot.
//!
//! ## Responsibilities
//! - **Synthesis**: prelude + blank line + scene script compiled as one unit.
//! - **Scope**: `builder`, `index`, and the library's constants; library modules are
//!   registered on the engine once.
//! - **Camera**: captured cameras are applied after the script, position adjusted.
//! - **Failure**: anything that goes wrong is logged with the scene id and index and
//!   returned as [`StoryError::ScriptExecution`]. Nothing is retried or patched up.

use crate::camera::adjust_camera_for_export;
use crate::errors::{StoryError, StoryResult};
use crate::scripting::{
    BuilderFactory, CameraUpdate, SceneBuilder, ScriptLibrary, SnapshotOptions, StateBuilderFactory,
};
use rhai::{Engine, EvalAltResult, Scope, INT};
use std::sync::Arc;
use story_schema::{SceneData, Snapshot};
use tracing::{debug, error, instrument};

/// Joins the story prelude and a scene script into one compilable unit.
pub fn synthesize_script(prelude: &str, scene_script: &str) -> String {
    format!("{}\n\n{}", prelude, scene_script)
}

pub struct SceneExecutor {
    engine: Engine,
    library: ScriptLibrary,
    builders: Arc<dyn BuilderFactory>,
}

impl SceneExecutor {
    pub fn new(library: ScriptLibrary, builders: Arc<dyn BuilderFactory>) -> Self {
        let mut engine = Engine::new();
        builders.register_api(&mut engine);
        library.install(&mut engine);

        Self {
            engine,
            library,
            builders,
        }
    }

    pub fn library(&self) -> &ScriptLibrary {
        &self.library
    }

    /// A fresh builder for one scene.
    pub fn new_builder(&self) -> Box<dyn SceneBuilder> {
        self.builders.create()
    }

    #[instrument(level = "debug", skip_all, fields(scene_id = %scene.id, index = index))]
    pub fn execute_scene(
        &self,
        prelude: &str,
        scene: &SceneData,
        index: usize,
        builder: &dyn SceneBuilder,
    ) -> StoryResult<Snapshot> {
        self.run(prelude, scene, index, builder).map_err(|source| {
            error!(
                scene_id = %scene.id,
                index,
                header = %scene.header,
                error = %source,
                "Scene script failed"
            );
            StoryError::ScriptExecution {
                scene_id: scene.id.clone(),
                index,
                source,
            }
        })
    }

    fn run(
        &self,
        prelude: &str,
        scene: &SceneData,
        index: usize,
        builder: &dyn SceneBuilder,
    ) -> Result<Snapshot, Box<EvalAltResult>> {
        let source = synthesize_script(prelude, &scene.javascript);
        let ast = self.engine.compile(&source)?;

        let mut scope = Scope::new();
        self.library.bind(&mut scope);
        builder.bind(&mut scope);
        scope.push_constant("index", index as INT);

        self.engine.run_ast_with_scope(&mut scope, &ast)?;
        debug!("Scene script finished");

        if let Some(camera) = &scene.camera {
            builder.set_camera(CameraUpdate {
                position: adjust_camera_for_export(camera),
                target: camera.target,
                up: camera.up,
            })?;
        }

        builder.snapshot(SnapshotOptions {
            key: scene.snapshot_key().map(str::to_string),
            title: Some(scene.header.clone()),
            description: Some(scene.description.clone()),
            linger_duration_ms: scene.linger_ms(),
            transition_duration_ms: scene.transition_ms(),
        })
    }
}

impl Default for SceneExecutor {
    fn default() -> Self {
        Self::new(ScriptLibrary::standard(), Arc::new(StateBuilderFactory))
    }
}
