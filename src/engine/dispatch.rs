//=========================================================================
// Event Dispatch
//=========================================================================
//
// Delivery of one queued event:
//
//   pop ─> extensions ─> engine built-ins ─> subsystems ─> scene ─> children
//                                                                     │
//   deferred spawn/despawn commands applied to the scene <────────────┘
//
// Scene transitions (StartScene, StopScene, ReplaceScene) drain the queue
// into the outgoing scene before the stack changes. The draining publish
// calls are nested inside the one that carried the transition request.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, trace, warn};

//=== Internal Dependencies ===============================================

use super::{Engine, SceneEntry};
use crate::core::errors::EngineError;
use crate::core::events::{
    handler_name, invoke, Envelope, Event, EventContext, Quit, ReplaceScene, SceneCommand, SceneContinued,
    ScenePaused, SceneStarted, SceneStopped, StartScene, StopScene,
};
use crate::core::objects::{GameObject, ObjectId};
use crate::core::properties::SceneArgs;
use crate::core::scene::{SceneId, SceneObject, SceneSource};

//=== Publish =============================================================

impl Engine {
    /// Delivers the oldest queued event.
    ///
    /// Returns `Ok(false)` when the queue was empty. A handler error
    /// aborts delivery of that event and is returned as is.
    pub fn publish(&mut self) -> Result<bool, EngineError> {
        let Some(mut envelope) = self.queue.pop() else {
            return Ok(false);
        };
        envelope.scene = self.current_scene_id();

        self.publish_depth += 1;
        let result = self.deliver(&mut envelope);
        self.publish_depth -= 1;

        if self.publish_depth == 0 {
            self.retired.clear();
        }
        result.map(|()| true)
    }

    fn deliver(&mut self, envelope: &mut Envelope) -> Result<(), EngineError> {
        self.extensions.run(&mut *envelope.event);
        self.run_builtins(&mut *envelope.event)?;

        let event: &dyn Event = &*envelope.event;
        let name = self.handler_name_for(event);
        let scene_id = envelope.scene;
        trace!(target: "engine::dispatch", "publishing {} to {:?}", event.event_name(), scene_id);

        let Engine {
            subsystems,
            scenes,
            retired,
            queue,
            ..
        } = self;
        let mut commands = Vec::new();
        let mut scene = find_scene(scenes, retired, scene_id);

        //--- Subsystems ---------------------------------------------------

        for subsystem in subsystems.iter_mut() {
            let mut ctx = EventContext::new(queue, scene.as_deref_mut(), scene_id, &mut commands);
            invoke(&mut **subsystem, &name, event, &mut ctx)?;
        }

        let Some(scene) = scene else {
            return Ok(());
        };

        //--- Scene --------------------------------------------------------

        {
            let mut ctx = EventContext::new(queue, None, scene_id, &mut commands);
            invoke(&mut *scene, &name, event, &mut ctx)?;
        }

        //--- Children -----------------------------------------------------

        for id in scene.scene().children.ids() {
            let Some(mut child) = scene.scene_mut().children.detach(id) else {
                continue;
            };

            let result = {
                let mut ctx = EventContext::new(queue, Some(&mut *scene), scene_id, &mut commands);
                deliver_to_tree(&mut *child, id, &name, event, &mut ctx)
            };

            if let Some(orphan) = scene.scene_mut().children.reattach(id, child) {
                debug!(
                    target: "engine::dispatch",
                    "{} {:?} was removed while handling {}",
                    orphan.type_name(),
                    id,
                    event.event_name()
                );
            }
            result?;
        }

        apply_commands(scene, commands);
        Ok(())
    }

    fn handler_name_for(&mut self, event: &dyn Event) -> String {
        self.handler_names
            .entry(event.event_type())
            .or_insert_with(|| handler_name(event.event_name()))
            .clone()
    }

    //=== Built-ins ========================================================

    fn run_builtins(&mut self, event: &mut dyn Event) -> Result<(), EngineError> {
        if event.is::<Quit>() {
            info!(target: "engine", "quit requested");
            self.running = false;
        } else if let Some(request) = event.downcast_mut::<StartScene>() {
            let source = request.new_scene.take();
            let args = request.kwargs.clone();
            self.start_scene(source, &args, true)?;
        } else if event.is::<StopScene>() {
            self.stop_scene(true)?;
        } else if let Some(request) = event.downcast_mut::<ReplaceScene>() {
            let source = request.new_scene.take();
            let args = request.kwargs.clone();
            if !source.is_available() {
                warn!(target: "engine", "replacement scene was already consumed; keeping the current one");
                return Ok(());
            }
            self.stop_scene(false)?;
            self.start_scene(source, &args, false)?;
        }
        Ok(())
    }

    /// Pushes the scene `source` builds.
    ///
    /// With `pause_current`, the scene below is paused first.
    fn start_scene(&mut self, source: SceneSource, args: &SceneArgs, pause_current: bool) -> Result<(), EngineError> {
        if !source.is_available() {
            warn!(target: "engine", "scene request was already consumed; ignoring it");
            return Ok(());
        }

        if pause_current && !self.scenes.is_empty() {
            self.queue.push(ScenePaused);
            while self.publish()? {}
        }

        let Some(scene) = source.build(args) else {
            return Ok(());
        };
        info!(target: "engine", "starting {}", scene.type_name());
        self.push_scene(scene);
        self.queue.push(SceneStarted);
        Ok(())
    }

    /// Stops and pops the current scene.
    ///
    /// With `then_resume`, the scene below continues, or the engine quits
    /// if there is none.
    fn stop_scene(&mut self, then_resume: bool) -> Result<(), EngineError> {
        if self.scenes.is_empty() {
            warn!(target: "engine", "stop requested with no scene running");
            return Ok(());
        }

        self.queue.push(SceneStopped);
        while self.publish()? {}

        let Some(entry) = self.scenes.pop() else {
            return Ok(());
        };
        info!(target: "engine", "stopped {}", entry.1.type_name());
        self.retired.push(entry);

        if then_resume {
            if self.scenes.is_empty() {
                self.queue.push(Quit);
            } else {
                self.queue.push(SceneContinued);
            }
        }
        Ok(())
    }
}

//=== Helpers =============================================================

/// The scene an envelope was addressed to, live or popped this publish.
fn find_scene<'a>(
    scenes: &'a mut [SceneEntry],
    retired: &'a mut [SceneEntry],
    id: Option<SceneId>,
) -> Option<&'a mut (dyn SceneObject + 'static)> {
    let id = id?;
    scenes
        .iter_mut()
        .chain(retired.iter_mut())
        .find(|(scene_id, _)| *scene_id == id)
        .map(|(_, scene)| &mut **scene)
}

/// Depth-first pre-order: the object, then its children.
fn deliver_to_tree(
    object: &mut (dyn GameObject + 'static),
    id: ObjectId,
    name: &str,
    event: &dyn Event,
    ctx: &mut EventContext<'_>,
) -> Result<(), EngineError> {
    ctx.set_object(Some(id));
    invoke(&mut *object, name, event, ctx)?;

    if let Some(children) = object.children_mut() {
        for (child_id, child) in children.iter_mut_with_ids() {
            deliver_to_tree(child, child_id, name, event, ctx)?;
        }
    }
    Ok(())
}

fn apply_commands(scene: &mut dyn SceneObject, commands: Vec<SceneCommand>) {
    let children = &mut scene.scene_mut().children;
    for command in commands {
        match command {
            SceneCommand::Spawn { id, object, tags } => {
                trace!(target: "engine::dispatch", "spawning {} as {:?}", object.type_name(), id);
                children.insert(id, object, tags);
            }
            SceneCommand::Despawn(id) => {
                if children.remove_recursive(id).is_none() {
                    debug!(target: "engine::dispatch", "despawn of unknown {:?} ignored", id);
                }
            }
        }
    }
}
