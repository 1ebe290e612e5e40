//=========================================================================
// Subsystems
//=========================================================================
//
// Engine-owned services that take part in dispatch right after the
// engine itself and before the scene.
//
// Lifecycle (driven by Engine::enter / Engine::exit):
//
//   factory(&SubsystemContext) ──> Box<dyn Subsystem>
//        │
//        ├─ activate()     acquire platform handles, start workers
//        │   ... events ...
//        └─ deactivate()   release, in reverse registration order
//
// Default set, in dispatch order:
//   Renderer, Updater, InputSystem, SoundSystem, AssetLoadingSystem
//
//=========================================================================

//=== Module Declarations =================================================

pub mod asset_loading;
pub mod clock;
pub mod input;
pub mod renderer;
pub mod sound;

//=== External Dependencies ===============================================

use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::errors::EngineError;
use crate::core::objects::GameObject;
use crate::engine::{EngineHandle, EngineOptions};
use crate::platform::{Backends, InputSource, Mixer, RenderTarget};

//=== Public API ==========================================================

pub use asset_loading::AssetLoadingSystem;
pub use clock::Updater;
pub use input::InputSystem;
pub use renderer::Renderer;
pub use sound::{SoundManager, SoundNotice, SoundSystem};

//=== Subsystem Trait =====================================================

/// A scoped engine service.
///
/// Handlers are registered through [`GameObject::handlers`] like any other
/// object; during dispatch the [`EventContext`](crate::core::events::EventContext)
/// gives subsystems access to the current scene.
pub trait Subsystem: GameObject {
    /// Acquires resources. Called once per `Engine::enter`.
    fn activate(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Releases resources. Runs even when dispatch failed.
    fn deactivate(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

//=== SubsystemContext ====================================================

/// What a subsystem factory may use while constructing its subsystem.
pub struct SubsystemContext<'a> {
    pub options: &'a EngineOptions,

    /// Posts events back into the engine.
    pub handle: EngineHandle,

    backends: &'a Backends,
}

impl<'a> SubsystemContext<'a> {
    pub(crate) fn new(options: &'a EngineOptions, handle: EngineHandle, backends: &'a Backends) -> Self {
        Self {
            options,
            handle,
            backends,
        }
    }

    pub fn open_render_target(&self) -> Result<Box<dyn RenderTarget>, EngineError> {
        Ok(self.backends.open_render_target(self.options)?)
    }

    pub fn open_mixer(&self) -> Result<Box<dyn Mixer>, EngineError> {
        Ok(self.backends.open_mixer()?)
    }

    pub fn open_input(&self) -> Result<Box<dyn InputSource>, EngineError> {
        Ok(self.backends.open_input()?)
    }
}

//=== Factories ===========================================================

/// Builds a fresh subsystem on every `Engine::enter`.
pub type SubsystemFactory = Rc<dyn Fn(&SubsystemContext<'_>) -> Result<Box<dyn Subsystem>, EngineError>>;

/// Wraps a typed constructor as a [`SubsystemFactory`].
pub fn factory<S, F>(build: F) -> SubsystemFactory
where
    S: Subsystem,
    F: Fn(&SubsystemContext<'_>) -> Result<S, EngineError> + 'static,
{
    Rc::new(move |ctx: &SubsystemContext<'_>| {
        build(ctx).map(|subsystem| Box::new(subsystem) as Box<dyn Subsystem>)
    })
}

/// The standard subsystems in dispatch order.
pub fn default_subsystems() -> Vec<SubsystemFactory> {
    vec![
        factory(Renderer::from_context),
        factory(Updater::from_context),
        factory(InputSystem::from_context),
        factory(SoundSystem::from_context),
        factory(AssetLoadingSystem::from_context),
    ]
}
