//=========================================================================
// Asset Pipeline
//=========================================================================
//
// Background loading of named resources with at-most-one live instance
// per (kind, name).
//
// Architecture:
//   Asset::<Image>::new("hero.png")
//       │
//       ▼
//   AssetLoader ──registry (TypeId, name) → Weak<AssetCell>
//       │
//       ├─ submit ─> DelayedExecutor ─> worker threads
//       │                                  │ FileSystem::open
//       │                                  │ AssetKind::background_parse
//       │                                  ▼
//       │                            AssetCell::complete (Ready / Failed)
//       │                                  │
//       └─ notices (crossbeam) <───────────┘  AssetLoaded
//
// State machine of an asset:
//   Created ─submit─> Queued ─picked up─> Loading ─> Ready | Failed
//   Ready ─last reference dropped─> AssetKind::free (once)
//
// The executor holds work until the loader is started (engine entered)
// and cancels queued work on shutdown.
//
//=========================================================================

//=== Module Declarations =================================================

mod animation;
mod asset;
mod executor;
mod library;
mod loader;
mod vfs;

//=== Internal Dependencies ===============================================

use crate::core::errors::AssetError;

//=== Public API ==========================================================

pub use animation::{expand_pattern, Animation};
pub use asset::{AnyAsset, Asset, AssetId, AssetStatus};
pub use library::{Image, Shape, Sound, SoundData};
pub use loader::AssetLoader;
pub use vfs::{DirectoryFs, FileSystem, MemoryFs};

//=== AssetKind ===========================================================

/// A kind of asset: how raw bytes become a usable value.
///
/// Implemented by marker types (`Image`, `Sound`, ...). Every hook runs
/// on a loader worker thread except `free`, which runs wherever the last
/// reference is dropped.
pub trait AssetKind: Send + Sync + 'static {
    /// The parsed value handed out by `Asset::load`.
    type Output: Send + Sync + 'static;

    /// Parses the file contents.
    fn background_parse(name: &str, bytes: Vec<u8>) -> Result<Self::Output, AssetError>;

    /// Fallback used when the file does not exist.
    ///
    /// Returning `None` makes the load fail with `AssetError::NotFound`.
    fn file_missing(_name: &str) -> Option<Self::Output> {
        None
    }

    /// Called once when a ready asset is dropped.
    fn free(_output: &Self::Output) {}
}
