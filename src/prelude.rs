//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_2d::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder, EngineHandle, EngineOptions};

// Errors
pub use crate::core::errors::{AssetError, EngineError, HandlerResult, ObjectError};

// Events
pub use crate::core::events::{
    AssetLoaded, ButtonPressed, ButtonReleased, Event, EventContext, Handlers, Idle, KeyPressed, KeyReleased,
    MouseMotion, PlaySound, PreRender, Quit, Render, ReplaceScene, SceneContinued, ScenePaused, SceneStarted,
    SceneStopped, StartScene, StopScene, Update,
};

// Game objects and scenes
pub use crate::core::objects::{GameObject, Kind, Node, ObjectId, Tag};
pub use crate::core::properties::{Properties, SceneArgs, Value};
pub use crate::core::scene::{BlendMode, Camera, ImageSource, Scene, SceneObject, Sprite};

// Assets
pub use crate::core::assets::{Animation, Asset, AssetLoader, Image, Shape, Sound};

// Subsystems and input
pub use crate::core::systems::input::{KeyCode, Modifiers, MouseButton};
pub use crate::core::systems::{factory, Subsystem, SubsystemContext, SoundManager, SoundNotice};

// Shared value types
pub use crate::core::color::Color;
pub use glam::Vec2;
