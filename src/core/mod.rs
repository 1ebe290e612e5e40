//=========================================================================
// Core
//
// Platform-independent engine building blocks.
//
//   events      event values, queue, handler tables, dispatch context
//   objects     game-object tree with kind and tag indices
//   scene       scenes, cameras, sprites
//   systems     the standard subsystems (renderer, clock, input, sound,
//               asset loading)
//   assets      async asset cache and loaders
//
// Everything here runs on the engine thread except the asset workers.
//
//=========================================================================

pub mod assets;
pub mod color;
pub mod errors;
pub mod events;
pub mod objects;
pub mod properties;
pub mod scene;
pub mod systems;
pub mod time;
