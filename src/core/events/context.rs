//=========================================================================
// Event Context
//=========================================================================
//
// Handed to every handler alongside the event. It is the handler's only
// way back into the engine:
//
//   ctx.signal(E)           → enqueue a new event at the tail
//   ctx.current_scene()     → read the scene the event is delivered to
//   ctx.spawn(obj) / despawn(id)
//                           → structural changes applied after the walk
//
// Subsystems and scene children see the current scene. The scene's own
// handlers receive the scene as their receiver instead.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use super::{Event, EventQueue};
use crate::core::objects::{GameObject, ObjectId, Tag};
use crate::core::scene::{Scene, SceneId, SceneObject};

//=== SceneCommand ========================================================

/// Structural change to the current scene, deferred until the event has
/// been delivered to every target.
pub enum SceneCommand {
    /// Add `object` to the top level of the scene.
    Spawn {
        id: ObjectId,
        object: Box<dyn GameObject>,
        tags: Vec<Tag>,
    },

    /// Remove the object (from anywhere in the scene tree).
    Despawn(ObjectId),
}

impl fmt::Debug for SceneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneCommand::Spawn { id, object, tags } => f
                .debug_struct("Spawn")
                .field("id", id)
                .field("object", &object.type_name())
                .field("tags", tags)
                .finish(),
            SceneCommand::Despawn(id) => f.debug_tuple("Despawn").field(id).finish(),
        }
    }
}

//=== EventContext ========================================================

/// Per-call handle given to event handlers.
pub struct EventContext<'a> {
    queue: &'a mut EventQueue,
    scene: Option<&'a mut (dyn SceneObject + 'static)>,
    scene_id: Option<SceneId>,
    commands: &'a mut Vec<SceneCommand>,
    object: Option<ObjectId>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        queue: &'a mut EventQueue,
        scene: Option<&'a mut (dyn SceneObject + 'static)>,
        scene_id: Option<SceneId>,
        commands: &'a mut Vec<SceneCommand>,
    ) -> Self {
        Self {
            queue,
            scene,
            scene_id,
            commands,
            object: None,
        }
    }

    /// Marks the object whose handler is about to run.
    pub(crate) fn set_object(&mut self, object: Option<ObjectId>) {
        self.object = object;
    }

    //--- Signalling -------------------------------------------------------

    /// Enqueues `event` at the tail of the engine queue.
    pub fn signal<E: Event>(&mut self, event: E) {
        self.queue.push(event);
    }

    pub fn signal_boxed(&mut self, event: Box<dyn Event>) {
        self.queue.push_boxed(event);
    }

    //--- Scene Access -----------------------------------------------------

    /// Id of the scene the event is being delivered to.
    pub fn scene_id(&self) -> Option<SceneId> {
        self.scene_id
    }

    /// The scene the event is delivered to, when this handler may see it.
    pub fn current_scene(&self) -> Option<&Scene> {
        self.scene.as_deref().map(|scene| scene.scene())
    }

    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_deref_mut().map(|scene| scene.scene_mut())
    }

    /// The full scene object (for downcasting to a user scene type).
    pub fn scene_object(&self) -> Option<&dyn SceneObject> {
        match &self.scene {
            Some(scene) => Some(&**scene),
            None => None,
        }
    }

    pub fn scene_object_mut(&mut self) -> Option<&mut (dyn SceneObject + 'static)> {
        self.scene.as_deref_mut()
    }

    /// Id of the scene child whose handler is running.
    ///
    /// `None` for the engine, subsystems and the scene itself.
    pub fn current_object(&self) -> Option<ObjectId> {
        self.object
    }

    //--- Deferred Commands ------------------------------------------------

    /// Adds `object` to the current scene once the event is delivered.
    ///
    /// The id is allocated now so the caller can refer to the object
    /// before it exists in the tree.
    pub fn spawn<O: GameObject>(&mut self, object: O) -> ObjectId {
        self.spawn_tagged(object, std::iter::empty::<Tag>())
    }

    pub fn spawn_tagged<O, I>(&mut self, object: O, tags: I) -> ObjectId
    where
        O: GameObject,
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        let id = ObjectId::next();
        self.commands.push(SceneCommand::Spawn {
            id,
            object: Box::new(object),
            tags: tags.into_iter().map(Into::into).collect(),
        });
        id
    }

    /// Removes the object from the current scene once the event is
    /// delivered. Unknown ids are ignored.
    pub fn despawn(&mut self, id: ObjectId) {
        self.commands.push(SceneCommand::Despawn(id));
    }

    /// Despawns the object whose handler is running, if any.
    pub fn despawn_self(&mut self) {
        if let Some(id) = self.object {
            self.despawn(id);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
