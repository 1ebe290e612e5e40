//=========================================================================
// Engine Event Types
//=========================================================================
//
// The events the engine and its standard subsystems emit, plus the
// requests user code sends to the engine.
//
// | Event                        | Emitter          |
// |------------------------------|------------------|
// | Idle                         | engine loop      |
// | Update                       | clock            |
// | PreRender, Render            | renderer         |
// | Scene{Started,Paused,...}    | engine           |
// | StartScene, ReplaceScene     | user             |
// | StopScene, Quit              | user / platform  |
// | Key*, Button*, MouseMotion   | input            |
// | PlaySound                    | user             |
// | AssetLoaded                  | asset loading    |
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use glam::Vec2;

//=== Internal Dependencies ===============================================

use crate::core::assets::{AnyAsset, Asset, Sound};
use crate::core::properties::SceneArgs;
use crate::core::scene::{SceneObject, SceneSource};
use crate::core::systems::input::{KeyCode, Modifiers, MouseButton};
use crate::core::systems::sound::SoundManager;

//=== Loop Events =========================================================

/// Emitted once per loop iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Idle {
    /// Seconds since the previous `Idle`.
    pub time_delta: f64,
}

/// Fixed-step simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    /// The configured step, in seconds.
    pub time_delta: f64,
}

/// Emitted right before [`Render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreRender;

/// Draw the current scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Render;

//=== Scene Lifecycle =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStarted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScenePaused;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneContinued;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStopped;

//--- Scene Requests ------------------------------------------------------

/// Pauses the current scene and pushes a new one.
#[derive(Debug)]
pub struct StartScene {
    pub new_scene: SceneSource,
    pub kwargs: SceneArgs,
}

impl StartScene {
    pub fn new<S: SceneObject>(scene: S) -> Self {
        Self {
            new_scene: SceneSource::instance(scene),
            kwargs: SceneArgs::new(),
        }
    }

    /// Builds the scene from `factory` when the request is handled.
    pub fn factory<S, F>(factory: F) -> Self
    where
        S: SceneObject,
        F: FnOnce(&SceneArgs) -> S + 'static,
    {
        Self {
            new_scene: SceneSource::factory(factory),
            kwargs: SceneArgs::new(),
        }
    }

    pub fn with_args(mut self, kwargs: SceneArgs) -> Self {
        self.kwargs = kwargs;
        self
    }
}

/// Stops the current scene and starts a new one in its place.
#[derive(Debug)]
pub struct ReplaceScene {
    pub new_scene: SceneSource,
    pub kwargs: SceneArgs,
}

impl ReplaceScene {
    pub fn new<S: SceneObject>(scene: S) -> Self {
        Self {
            new_scene: SceneSource::instance(scene),
            kwargs: SceneArgs::new(),
        }
    }

    pub fn factory<S, F>(factory: F) -> Self
    where
        S: SceneObject,
        F: FnOnce(&SceneArgs) -> S + 'static,
    {
        Self {
            new_scene: SceneSource::factory(factory),
            kwargs: SceneArgs::new(),
        }
    }

    pub fn with_args(mut self, kwargs: SceneArgs) -> Self {
        self.kwargs = kwargs;
        self
    }
}

/// Pops the current scene. Quits when the stack becomes empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopScene;

/// Ends the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quit;

//=== Input Events ========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPressed {
    pub key: KeyCode,
    pub mods: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyReleased {
    pub key: KeyCode,
    pub mods: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonPressed {
    pub button: MouseButton,

    /// World position of the cursor.
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonReleased {
    pub button: MouseButton,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseMotion {
    /// World position of the cursor.
    pub position: Vec2,

    /// Cursor position in window pixels.
    pub screen_position: Vec2,

    /// Movement since the previous motion event, in world units.
    pub delta: Vec2,

    /// Mouse buttons held down while moving.
    pub buttons: HashSet<MouseButton>,
}

//=== Sound ===============================================================

/// Plays `sound` on the next free mixer channel.
#[derive(Debug, Clone)]
pub struct PlaySound {
    pub sound: Asset<Sound>,

    /// Receives channel lifecycle notices for this sound.
    pub manager: Option<SoundManager>,
}

impl PlaySound {
    pub fn new(sound: Asset<Sound>) -> Self {
        Self {
            sound,
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager: SoundManager) -> Self {
        self.manager = Some(manager);
        self
    }
}

//=== Assets ==============================================================

/// A background load finished.
#[derive(Debug, Clone)]
pub struct AssetLoaded {
    pub asset: AnyAsset,

    /// Assets loaded successfully so far.
    pub total_loaded: usize,

    /// Assets still waiting for a worker.
    pub total_queued: usize,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{handler_name_of, Event};
    use crate::core::properties::Properties;
    use crate::core::scene::Scene;

    #[test]
    fn engine_events_map_to_expected_handler_names() {
        assert_eq!(handler_name_of::<Idle>(), "on_idle");
        assert_eq!(handler_name_of::<PreRender>(), "on_pre_render");
        assert_eq!(handler_name_of::<SceneContinued>(), "on_scene_continued");
        assert_eq!(handler_name_of::<KeyPressed>(), "on_key_pressed");
        assert_eq!(handler_name_of::<MouseMotion>(), "on_mouse_motion");
        assert_eq!(handler_name_of::<AssetLoaded>(), "on_asset_loaded");
    }

    #[test]
    fn start_scene_carries_arguments() {
        let event = StartScene::factory(|_: &SceneArgs| Scene::new())
            .with_args(Properties::new().with("level", 2));
        assert_eq!(event.kwargs.get_i64("level"), Some(2));
        assert!(event.new_scene.is_available());
        assert_eq!(Event::event_name(&event), "StartScene");
    }
}
