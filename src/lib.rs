//=========================================================================
// Aetheric 2D Library Root
//
// Event-driven 2D sprite engine.
//
// Responsibilities:
// - Expose the engine facade (`Engine`, `EngineBuilder`, `run`)
// - Expose `core` for scenes, game objects, events and assets
// - Expose `platform` so applications can plug in their own window,
//   mixer and input backends
//
// Typical usage:
// ```no_run
// use aetheric_2d::prelude::*;
//
// fn main() -> Result<(), EngineError> {
//     aetheric_2d::run_with_setup(EngineBuilder::new(), |scene| {
//         scene.background_color = Color::rgb(20, 20, 40);
//     })
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds everything that runs on the engine thread.
//
// `platform` holds the backend traits, the headless implementations
// used by default, and the winit bridge.
//
pub mod core;
pub mod engine;
pub mod platform;
pub mod prelude;

//--- Public Exports ------------------------------------------------------

pub use engine::{run, run_with_setup, Engine, EngineBuilder, EngineHandle};
