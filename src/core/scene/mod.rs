//=========================================================================
// Scene System
//=========================================================================
//
// A scene is the root game object of one game state. The engine keeps a
// stack of them; only the top scene receives events.
//
// Architecture:
//   Engine
//     └─ scenes: Vec<Box<dyn SceneObject>>   (top = current)
//          └─ Scene
//               ├─ background_color
//               ├─ children (Children)
//               │    ├─ Camera  [main_camera]
//               │    └─ Sprite, Node, ...
//               └─ handlers
//
// User scene types embed a `Scene` and implement `SceneObject` to expose
// it. A plain `Scene` is itself a `SceneObject`.
//
//=========================================================================

//=== Module Declarations =================================================

mod camera;
mod sprite;

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::color::Color;
use crate::core::errors::ObjectError;
use crate::core::events::Handlers;
use crate::core::objects::{Children, GameObject, Kind, ObjectId, Tag};
use crate::core::properties::{Properties, SceneArgs};

//=== Public API ==========================================================

pub use camera::Camera;
pub use sprite::{BlendMode, ImageSource, Sprite};

//=== SceneId =============================================================

/// Identity of a scene on one engine's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub(crate) u64);

impl SceneId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

//=== SceneObject =========================================================

/// A game object that can sit on the scene stack.
pub trait SceneObject: GameObject {
    fn scene(&self) -> &Scene;

    fn scene_mut(&mut self) -> &mut Scene;
}

impl fmt::Debug for dyn SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

//=== Scene ===============================================================

/// Root game object with a background color and a main camera.
#[derive(Debug)]
pub struct Scene {
    pub background_color: Color,
    pub children: Children,
    pub handlers: Handlers,
    pub properties: Properties,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// An empty scene with a default camera tagged `main_camera`.
    pub fn new() -> Self {
        let mut children = Children::new();
        children.add_tagged(Camera::default(), [Tag::MAIN_CAMERA]);

        Self {
            background_color: Color::NAVY,
            children,
            handlers: Handlers::new(),
            properties: Properties::new(),
        }
    }

    /// Builds a scene from keyword arguments.
    ///
    /// `background_color` sets the clear color; every argument is also
    /// kept in `properties`.
    pub fn from_args(args: &SceneArgs) -> Self {
        let mut scene = Self::new();
        if let Some(color) = args.get_color("background_color") {
            scene.background_color = color;
        }
        scene.properties.merge(args);
        scene
    }

    pub fn with_background(mut self, color: impl Into<Color>) -> Self {
        self.background_color = color.into();
        self
    }

    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    //--- Shorthand --------------------------------------------------------

    pub fn add<O: GameObject>(&mut self, child: O) -> ObjectId {
        self.children.add(child)
    }

    pub fn add_tagged<O, I>(&mut self, child: O, tags: I) -> ObjectId
    where
        O: GameObject,
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        self.children.add_tagged(child, tags)
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<Box<dyn GameObject>, ObjectError> {
        self.children.remove(id)
    }

    pub fn get(
        &self,
        kind: Option<Kind>,
        tag: Option<&Tag>,
    ) -> Result<impl Iterator<Item = &dyn GameObject> + '_, ObjectError> {
        self.children.get(kind, tag)
    }

    //--- Layers -----------------------------------------------------------

    /// Direct children sorted by ascending layer.
    ///
    /// The sort is stable: children on the same layer keep insertion order.
    pub fn sprite_layers(&self) -> Vec<&dyn GameObject> {
        let mut layers: Vec<&dyn GameObject> = self.children.iter().collect();
        layers.sort_by(|a, b| a.layer().total_cmp(&b.layer()));
        layers
    }

    //--- Main Camera ------------------------------------------------------

    pub fn main_camera_id(&self) -> Option<ObjectId> {
        self.children.first_tagged(&Tag::MAIN_CAMERA)
    }

    pub fn main_camera(&self) -> Option<&Camera> {
        self.children.get_as::<Camera>(self.main_camera_id()?)
    }

    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        let id = self.main_camera_id()?;
        self.children.get_as_mut::<Camera>(id)
    }

    /// Replaces the main camera, returning the previous one.
    pub fn set_main_camera(&mut self, camera: Camera) -> Option<Box<dyn GameObject>> {
        let previous = self
            .main_camera_id()
            .and_then(|id| self.children.remove(id).ok());
        self.children.add_tagged(camera, [Tag::MAIN_CAMERA]);
        previous
    }
}

impl GameObject for Scene {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }

    fn children(&self) -> Option<&Children> {
        Some(&self.children)
    }

    fn children_mut(&mut self) -> Option<&mut Children> {
        Some(&mut self.children)
    }
}

impl SceneObject for Scene {
    fn scene(&self) -> &Scene {
        self
    }

    fn scene_mut(&mut self) -> &mut Scene {
        self
    }
}

//=== SceneSource =========================================================

type SceneFactory = Box<dyn FnOnce(&SceneArgs) -> Box<dyn SceneObject>>;

/// Either a ready scene or a factory that builds one from arguments.
pub enum SceneSource {
    Instance(Box<dyn SceneObject>),
    Factory(SceneFactory),

    /// Already taken by the engine.
    Consumed,
}

impl SceneSource {
    pub fn instance<S: SceneObject>(scene: S) -> Self {
        SceneSource::Instance(Box::new(scene))
    }

    pub fn factory<S, F>(factory: F) -> Self
    where
        S: SceneObject,
        F: FnOnce(&SceneArgs) -> S + 'static,
    {
        SceneSource::Factory(Box::new(move |args: &SceneArgs| {
            Box::new(factory(args)) as Box<dyn SceneObject>
        }))
    }

    /// A factory for a plain [`Scene`] built with [`Scene::from_args`].
    pub fn plain() -> Self {
        Self::factory(Scene::from_args)
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, SceneSource::Consumed)
    }

    /// Moves the source out, leaving `Consumed` behind.
    pub(crate) fn take(&mut self) -> SceneSource {
        std::mem::replace(self, SceneSource::Consumed)
    }

    /// Produces the scene, calling the factory with `args` if needed.
    pub fn build(self, args: &SceneArgs) -> Option<Box<dyn SceneObject>> {
        match self {
            SceneSource::Instance(scene) => Some(scene),
            SceneSource::Factory(factory) => Some(factory(args)),
            SceneSource::Consumed => None,
        }
    }
}

impl fmt::Debug for SceneSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneSource::Instance(scene) => f.debug_tuple("Instance").field(scene).finish(),
            SceneSource::Factory(_) => f.write_str("Factory(..)"),
            SceneSource::Consumed => f.write_str("Consumed"),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
