//=========================================================================
// Aetheric 2D Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder ──build()──> Engine ──run()──> [Main Loop]
//                                  │
//                                  ├─ enter()   build + activate subsystems
//                                  ├─ start()   push the first scene
//                                  ├─ main_loop()
//                                  │    └─ loop_once()
//                                  │         ├─ signal Idle { dt }
//                                  │         ├─ drain EngineHandle inbox
//                                  │         └─ publish() until empty
//                                  └─ exit()    deactivate in reverse
// ```
//
// Everything runs on the calling thread. Other threads reach the engine
// only through an `EngineHandle`, whose events are picked up once per
// loop iteration.
//
//=========================================================================

//=== Module Declarations =================================================

mod builder;
mod dispatch;
mod extensions;


//=== External Dependencies ===============================================

use std::any::TypeId;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::errors::EngineError;
use crate::core::events::{Event, EventQueue, Idle, SceneStarted};
use crate::core::properties::SceneArgs;
use crate::core::scene::{Scene, SceneId, SceneObject, SceneSource};
use crate::core::systems::{Subsystem, SubsystemContext, SubsystemFactory};
use crate::platform::Backends;

//=== Public API ==========================================================

pub use builder::{EngineBuilder, EngineOptions};
pub use extensions::Extensions;

//=== Entry Points ========================================================

/// Builds and runs an engine; returns once `Quit` has been dispatched.
///
/// ```no_run
/// use aetheric_2d::prelude::*;
///
/// aetheric_2d::run(EngineBuilder::new().with_title("Hello")).unwrap();
/// ```
pub fn run(builder: EngineBuilder) -> Result<(), EngineError> {
    builder.build().run()
}

/// Like [`run`], calling `setup` on the starting scene first.
pub fn run_with_setup<F>(builder: EngineBuilder, setup: F) -> Result<(), EngineError>
where
    F: FnOnce(&mut Scene) + 'static,
{
    builder.with_setup(setup).build().run()
}

//=== EngineHandle ========================================================

/// Thread-safe way to post events into a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: Sender<Box<dyn Event + Send>>,
}

impl EngineHandle {
    /// Queues `event` for the next loop iteration.
    ///
    /// Returns `false` if the engine has been dropped.
    pub fn signal<E: Event + Send>(&self, event: E) -> bool {
        self.sender.send(Box::new(event)).is_ok()
    }
}

//=== Engine ==============================================================

type SceneEntry = (SceneId, Box<dyn SceneObject>);

/// Aetheric 2D runtime.
///
/// Owns the scene stack, the event queue and the subsystems. Create one
/// with [`EngineBuilder`].
pub struct Engine {
    options: EngineOptions,
    backends: Backends,

    basic_factories: Vec<SubsystemFactory>,
    user_factories: Vec<SubsystemFactory>,
    subsystems: Vec<Box<dyn Subsystem>>,
    entered: bool,
    running: bool,

    first_scene: SceneSource,
    scene_args: SceneArgs,
    setup: Option<Box<dyn FnOnce(&mut Scene)>>,
    scenes: Vec<SceneEntry>,

    /// Scenes popped during the current publish; they still receive the
    /// event that popped them.
    retired: Vec<SceneEntry>,
    next_scene_id: u64,

    queue: EventQueue,
    extensions: Extensions,
    handler_names: HashMap<TypeId, String>,
    publish_depth: usize,

    handle: EngineHandle,
    inbox: Receiver<Box<dyn Event + Send>>,
    last_idle: f64,
}

impl Engine {
    //--- Construction -----------------------------------------------------

    /// Creates an engine with headless platform backends.
    pub fn new(
        first_scene: SceneSource,
        basic_subsystems: Vec<SubsystemFactory>,
        user_subsystems: Vec<SubsystemFactory>,
        scene_args: SceneArgs,
        options: EngineOptions,
    ) -> Self {
        let (sender, inbox) = unbounded();
        Self {
            options,
            backends: Backends::headless(),
            basic_factories: basic_subsystems,
            user_factories: user_subsystems,
            subsystems: Vec::new(),
            entered: false,
            running: false,
            first_scene,
            scene_args,
            setup: None,
            scenes: Vec::new(),
            retired: Vec::new(),
            next_scene_id: 0,
            queue: EventQueue::new(),
            extensions: Extensions::new(),
            handler_names: HashMap::new(),
            publish_depth: 0,
            handle: EngineHandle { sender },
            inbox,
            last_idle: 0.0,
        }
    }

    //--- Lifecycle --------------------------------------------------------

    /// Builds and activates every subsystem, basic ones first.
    ///
    /// If one fails, the ones already active are released in reverse
    /// order and the error is returned.
    pub fn enter(&mut self) -> Result<(), EngineError> {
        if self.entered {
            return Err(EngineError::AlreadyEntered);
        }

        let ctx = SubsystemContext::new(&self.options, self.handle.clone(), &self.backends);
        let mut active: Vec<Box<dyn Subsystem>> = Vec::new();

        for factory in self.basic_factories.iter().chain(&self.user_factories) {
            let acquired = factory(&ctx).and_then(|mut subsystem| {
                subsystem.activate()?;
                Ok(subsystem)
            });

            match acquired {
                Ok(subsystem) => {
                    debug!(target: "engine", "subsystem {} active", subsystem.type_name());
                    active.push(subsystem);
                }
                Err(error) => {
                    warn!(target: "engine", "subsystem failed to start: {}", error);
                    // The original failure wins over release errors.
                    let _ = release(&mut active);
                    return Err(error);
                }
            }
        }

        info!(target: "engine", "engine entered with {} subsystems", active.len());
        self.subsystems = active;
        self.entered = true;
        Ok(())
    }

    /// Releases subsystems in reverse order.
    ///
    /// Every subsystem is released even if an earlier one fails; the
    /// first failure is returned.
    pub fn exit(&mut self) -> Result<(), EngineError> {
        if !self.entered {
            return Err(EngineError::NotEntered);
        }

        self.entered = false;
        self.running = false;
        let result = release(&mut self.subsystems);
        info!(target: "engine", "engine exited");
        result
    }

    /// Enters if needed, then starts and runs the main loop.
    ///
    /// When this call did the entering it also exits, whether or not the
    /// loop failed.
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.entered {
            self.start()?;
            return self.main_loop();
        }

        self.enter()?;
        let result = self.start().and_then(|()| self.main_loop());
        let exited = self.exit();
        result.and(exited)
    }

    /// Pushes the starting scene and signals `SceneStarted`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let mut scene = self
            .first_scene
            .take()
            .build(&self.scene_args)
            .ok_or(EngineError::NoStartingScene)?;

        if let Some(setup) = self.setup.take() {
            setup(scene.scene_mut());
        }

        self.running = true;
        self.last_idle = self.options.time.now();
        info!(target: "engine", "starting with {}", scene.type_name());
        self.push_scene(scene);
        self.queue.push(SceneStarted);
        Ok(())
    }

    /// Loops until `Quit` is dispatched.
    pub fn main_loop(&mut self) -> Result<(), EngineError> {
        while self.running {
            self.loop_once()?;
            thread::sleep(Duration::ZERO);
        }
        Ok(())
    }

    /// One iteration: `Idle`, the handle inbox, then every pending event.
    pub fn loop_once(&mut self) -> Result<(), EngineError> {
        let now = self.options.time.now();
        let time_delta = now - self.last_idle;
        self.queue.push(Idle { time_delta });
        self.last_idle = now;

        for event in self.inbox.try_iter() {
            self.queue.push_boxed(event);
        }

        while self.publish()? {}
        Ok(())
    }

    //--- Signalling -------------------------------------------------------

    /// Appends `event` to the queue.
    pub fn signal<E: Event>(&mut self, event: E) {
        self.queue.push(event);
    }

    /// A handle that can signal from any thread.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    //--- Inspection -------------------------------------------------------

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of scenes on the stack.
    pub fn scene_depth(&self) -> usize {
        self.scenes.len()
    }

    /// The scene receiving events.
    pub fn current_scene(&self) -> Option<&dyn SceneObject> {
        self.scenes.last().map(|(_, scene)| &**scene)
    }

    pub fn current_scene_mut(&mut self) -> Option<&mut (dyn SceneObject + 'static)> {
        self.scenes.last_mut().map(|(_, scene)| &mut **scene)
    }

    /// The first active subsystem of type `S`.
    pub fn subsystem<S: Subsystem>(&self) -> Option<&S> {
        self.subsystems
            .iter()
            .find_map(|subsystem| (**subsystem).as_any().downcast_ref::<S>())
    }

    /// Events waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    //--- Scene Stack ------------------------------------------------------

    fn current_scene_id(&self) -> Option<SceneId> {
        self.scenes.last().map(|(id, _)| *id)
    }

    fn push_scene(&mut self, scene: Box<dyn SceneObject>) -> SceneId {
        let id = SceneId(self.next_scene_id);
        self.next_scene_id += 1;
        self.scenes.push((id, scene));
        id
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.entered {
            if let Err(error) = self.exit() {
                warn!(target: "engine", "error while releasing subsystems: {}", error);
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("entered", &self.entered)
            .field("running", &self.running)
            .field("subsystems", &self.subsystems.len())
            .field("scenes", &self.scenes.len())
            .field("pending", &self.queue.len())
            .finish()
    }
}

//=== Helpers =============================================================

/// Deactivates and drops `subsystems`, last first.
fn release(subsystems: &mut Vec<Box<dyn Subsystem>>) -> Result<(), EngineError> {
    let mut first_error = None;
    while let Some(mut subsystem) = subsystems.pop() {
        if let Err(error) = subsystem.deactivate() {
            warn!(target: "engine", "subsystem {} failed to release: {}", subsystem.type_name(), error);
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}
