//=========================================================================
// Engine Builder
//=========================================================================
//
// Fluent configuration for an [`Engine`].
//
//   EngineBuilder::new()
//       .with_title("Game")
//       .with_starting_scene(MainMenu::new())
//       .with_subsystem(factory(Physics::from_context))
//       .build()  ──> Engine
//
// `EngineOptions` is the resolved configuration; every subsystem factory
// receives it through its `SubsystemContext`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::sync::Arc;

use log::info;

//=== Internal Dependencies ===============================================

use super::{Engine, Extensions};
use crate::core::assets::AssetLoader;
use crate::core::events::Event;
use crate::core::properties::SceneArgs;
use crate::core::scene::{Scene, SceneObject, SceneSource};
use crate::core::systems::{default_subsystems, SubsystemFactory};
use crate::core::time::{SystemClock, TimeSource};
use crate::platform::Backends;

//=== EngineOptions =======================================================

/// Resolved engine configuration.
#[derive(Clone)]
pub struct EngineOptions {
    /// Window title.
    pub title: String,

    /// Window size in pixels.
    pub resolution: (u32, u32),

    /// Frames per second the renderer aims for.
    pub target_frame_rate: f64,

    /// Seconds of simulated time per `Update`.
    pub update_step: f64,

    /// Asset cache the loading subsystem drives.
    pub loader: AssetLoader,

    /// Source of `Idle` time deltas.
    pub time: Arc<dyn TimeSource>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            title: String::from("Aetheric 2D"),
            resolution: (800, 600),
            target_frame_rate: 60.0,
            update_step: 0.016,
            loader: AssetLoader::global(),
            time: Arc::new(SystemClock::new()),
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("title", &self.title)
            .field("resolution", &self.resolution)
            .field("target_frame_rate", &self.target_frame_rate)
            .field("update_step", &self.update_step)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Title**: `"Aetheric 2D"`
/// - **Resolution**: 800x600
/// - **Target frame rate**: 60.0
/// - **Update step**: 0.016 s
/// - **Starting scene**: a plain [`Scene`] built from the scene arguments
/// - **Platform**: headless backends
/// - **Subsystems**: Renderer, Updater, InputSystem, SoundSystem,
///   AssetLoadingSystem
///
/// # Examples
///
/// ```no_run
/// use aetheric_2d::prelude::*;
///
/// EngineBuilder::new()
///     .with_title("Demo")
///     .with_target_frame_rate(120.0)
///     .build()
///     .run()
///     .unwrap();
/// ```
pub struct EngineBuilder {
    options: EngineOptions,
    backends: Backends,
    first_scene: SceneSource,
    scene_args: SceneArgs,
    basic_subsystems: Vec<SubsystemFactory>,
    user_subsystems: Vec<SubsystemFactory>,
    extensions: Extensions,
    setup: Option<Box<dyn FnOnce(&mut Scene)>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            options: EngineOptions::default(),
            backends: Backends::headless(),
            first_scene: SceneSource::plain(),
            scene_args: SceneArgs::new(),
            basic_subsystems: default_subsystems(),
            user_subsystems: Vec::new(),
            extensions: Extensions::new(),
            setup: None,
        }
    }

    //--- Options ----------------------------------------------------------

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options.title = title.into();
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.options.resolution = (width, height);
        self
    }

    /// Sets how often the renderer draws.
    ///
    /// Default: 60.0
    ///
    /// # Panics
    ///
    /// Panics if `fps <= 0.0`.
    pub fn with_target_frame_rate(mut self, fps: f64) -> Self {
        assert!(fps > 0.0, "Target frame rate must be positive, got {}", fps);
        self.options.target_frame_rate = fps;
        self
    }

    /// Sets the fixed simulation step carried by `Update`.
    ///
    /// Default: 0.016
    ///
    /// # Panics
    ///
    /// Panics if `step <= 0.0`.
    pub fn with_update_step(mut self, step: f64) -> Self {
        assert!(step > 0.0, "Update step must be positive, got {}", step);
        self.options.update_step = step;
        self
    }

    /// Uses `loader` instead of the process-wide one.
    pub fn with_loader(mut self, loader: AssetLoader) -> Self {
        self.options.loader = loader;
        self
    }

    pub fn with_time_source(mut self, time: impl TimeSource + 'static) -> Self {
        self.options.time = Arc::new(time);
        self
    }

    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    //--- Scenes -----------------------------------------------------------

    pub fn with_starting_scene<S: SceneObject>(mut self, scene: S) -> Self {
        self.first_scene = SceneSource::instance(scene);
        self
    }

    /// Builds the starting scene from the scene arguments at `start()`.
    pub fn with_scene_factory<S, F>(mut self, factory: F) -> Self
    where
        S: SceneObject,
        F: FnOnce(&SceneArgs) -> S + 'static,
    {
        self.first_scene = SceneSource::factory(factory);
        self
    }

    /// Arguments handed to the starting scene's factory.
    pub fn with_scene_args(mut self, args: SceneArgs) -> Self {
        self.scene_args = args;
        self
    }

    /// Runs `setup` on the starting scene right before it starts.
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut Scene) + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    //--- Subsystems -------------------------------------------------------

    /// Replaces the standard subsystem set.
    pub fn with_basic_subsystems(mut self, factories: Vec<SubsystemFactory>) -> Self {
        self.basic_subsystems = factories;
        self
    }

    /// Adds a subsystem after the standard ones.
    pub fn with_subsystem(mut self, factory: SubsystemFactory) -> Self {
        self.user_subsystems.push(factory);
        self
    }

    //--- Extensions -------------------------------------------------------

    pub fn with_extension<E, F>(mut self, extension: F) -> Self
    where
        E: Event,
        F: FnMut(&mut E) + 'static,
    {
        self.extensions.add(extension);
        self
    }

    pub fn with_wildcard_extension<F>(mut self, extension: F) -> Self
    where
        F: FnMut(&mut dyn Event) + 'static,
    {
        self.extensions.add_wildcard(extension);
        self
    }

    //--- Build ------------------------------------------------------------

    /// Builds the engine. Nothing is activated until `enter()` or `run()`.
    pub fn build(self) -> Engine {
        info!(
            target: "engine",
            "Building engine \"{}\" ({}x{}, {} fps, step {})",
            self.options.title,
            self.options.resolution.0,
            self.options.resolution.1,
            self.options.target_frame_rate,
            self.options.update_step
        );

        let mut engine = Engine::new(
            self.first_scene,
            self.basic_subsystems,
            self.user_subsystems,
            self.scene_args,
            self.options,
        );
        engine.backends = self.backends;
        engine.extensions = self.extensions;
        engine.setup = self.setup;
        engine
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("options", &self.options)
            .field("first_scene", &self.first_scene)
            .field("basic_subsystems", &self.basic_subsystems.len())
            .field("user_subsystems", &self.user_subsystems.len())
            .field("extensions", &self.extensions)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = EngineBuilder::new();
        assert_eq!(builder.options.title, "Aetheric 2D");
        assert_eq!(builder.options.resolution, (800, 600));
        assert_eq!(builder.options.target_frame_rate, 60.0);
        assert_eq!(builder.options.update_step, 0.016);
        assert_eq!(builder.basic_subsystems.len(), 5);
        assert!(builder.user_subsystems.is_empty());
        assert!(builder.first_scene.is_available());
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let builder = EngineBuilder::new()
            .with_title("Test")
            .with_resolution(320, 240)
            .with_target_frame_rate(30.0)
            .with_update_step(0.01)
            .with_basic_subsystems(Vec::new());

        assert_eq!(builder.options.title, "Test");
        assert_eq!(builder.options.resolution, (320, 240));
        assert_eq!(builder.options.target_frame_rate, 30.0);
        assert_eq!(builder.options.update_step, 0.01);
        assert!(builder.basic_subsystems.is_empty());
    }

    #[test]
    #[should_panic(expected = "Target frame rate must be positive")]
    fn zero_frame_rate_panics() {
        EngineBuilder::new().with_target_frame_rate(0.0);
    }

    #[test]
    #[should_panic(expected = "Update step must be positive")]
    fn negative_update_step_panics() {
        EngineBuilder::new().with_update_step(-0.016);
    }

    #[test]
    fn build_creates_an_idle_engine() {
        let engine = EngineBuilder::new().build();
        assert!(!engine.is_entered());
        assert!(!engine.is_running());
        assert_eq!(engine.scene_depth(), 0);
    }
}
