//=========================================================================
// Asset Handles
//=========================================================================
//
// `Asset<K>` is a cheap, clonable handle to a shared `AssetCell<K>`.
// The cell holds the load state behind a mutex and wakes blocked
// `load()` callers through a condvar.
//
//   Asset<K> ──Arc──> AssetCell<K>
//                        ├─ slot: Mutex<Slot>  (state + dependents)
//                        └─ ready: Condvar
//
// `AnyAsset` erases `K` for events and dependency lists.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use log::warn;
use parking_lot::{Condvar, Mutex};

//=== Internal Dependencies ===============================================

use super::loader::{AssetLoader, LoaderShared};
use super::AssetKind;
use crate::core::errors::AssetError;

//=== AssetId =============================================================

/// Process-unique identity of one asset instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

impl AssetId {
    fn next() -> Self {
        Self(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

//=== AssetStatus =========================================================

/// Observable position in the load state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetStatus {
    /// Known but not yet submitted (chained assets waiting on dependencies).
    Created,

    /// Submitted, waiting for a worker.
    Queued,

    /// A worker is producing the value.
    Loading,

    Ready,
    Failed,
}

//=== AssetCell ===========================================================

pub(crate) type Dependent = Box<dyn FnOnce(Result<(), AssetError>) + Send>;

enum LoadState<T> {
    Created,
    Queued,
    Loading,
    Ready(Arc<T>),
    Failed(AssetError),
}

impl<T> LoadState<T> {
    fn status(&self) -> AssetStatus {
        match self {
            LoadState::Created => AssetStatus::Created,
            LoadState::Queued => AssetStatus::Queued,
            LoadState::Loading => AssetStatus::Loading,
            LoadState::Ready(_) => AssetStatus::Ready,
            LoadState::Failed(_) => AssetStatus::Failed,
        }
    }

    fn outcome(&self) -> Option<Result<(), AssetError>> {
        match self {
            LoadState::Ready(_) => Some(Ok(())),
            LoadState::Failed(error) => Some(Err(error.clone())),
            _ => None,
        }
    }
}

struct Slot<T> {
    state: LoadState<T>,
    dependents: Vec<Dependent>,
}

/// Shared state of one asset.
pub(crate) struct AssetCell<K: AssetKind> {
    id: AssetId,
    name: String,
    slot: Mutex<Slot<K::Output>>,
    ready: Condvar,
    loader: Weak<LoaderShared>,
}

impl<K: AssetKind> AssetCell<K> {
    pub(crate) fn new(name: String, loader: Weak<LoaderShared>) -> Self {
        Self {
            id: AssetId::next(),
            name,
            slot: Mutex::new(Slot {
                state: LoadState::Created,
                dependents: Vec::new(),
            }),
            ready: Condvar::new(),
            loader,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn mark_queued(&self) {
        let mut slot = self.slot.lock();
        if matches!(slot.state, LoadState::Created) {
            slot.state = LoadState::Queued;
        }
    }

    pub(crate) fn mark_loading(&self) {
        let mut slot = self.slot.lock();
        if matches!(slot.state, LoadState::Created | LoadState::Queued) {
            slot.state = LoadState::Loading;
        }
    }

    /// Stores the final result, wakes waiters and runs dependents.
    ///
    /// Only the first completion counts; returns whether this one did.
    pub(crate) fn complete(&self, result: Result<K::Output, AssetError>) -> bool {
        let (outcome, dependents) = {
            let mut slot = self.slot.lock();
            if slot.state.outcome().is_some() {
                return false;
            }
            slot.state = match result {
                Ok(value) => LoadState::Ready(Arc::new(value)),
                Err(error) => LoadState::Failed(error),
            };
            let outcome = slot.state.outcome().unwrap_or(Ok(()));
            (outcome, std::mem::take(&mut slot.dependents))
        };

        self.ready.notify_all();
        for dependent in dependents {
            dependent(outcome.clone());
        }
        true
    }

    /// Runs `dependent` once this asset finishes (immediately if it has).
    pub(crate) fn on_complete(&self, dependent: Dependent) {
        let outcome = {
            let mut slot = self.slot.lock();
            match slot.state.outcome() {
                Some(outcome) => outcome,
                None => {
                    slot.dependents.push(dependent);
                    return;
                }
            }
        };
        dependent(outcome);
    }

    fn status(&self) -> AssetStatus {
        self.slot.lock().state.status()
    }

    fn loader_running(&self) -> bool {
        self.loader
            .upgrade()
            .is_some_and(|shared| AssetLoader::from_shared(shared).is_running())
    }
}

impl<K: AssetKind> Drop for AssetCell<K> {
    fn drop(&mut self) {
        if let LoadState::Ready(value) = &self.slot.get_mut().state {
            K::free(value);
        }
    }
}

//=== Asset ===============================================================

/// Handle to a background-loaded resource of kind `K`.
///
/// Handles with the same `(K, name)` obtained from the same loader point
/// at the same instance while any of them is alive.
pub struct Asset<K: AssetKind> {
    pub(crate) cell: Arc<AssetCell<K>>,
}

impl<K: AssetKind> Asset<K> {
    /// Looks up or creates `name` on the process-wide loader.
    pub fn new(name: impl Into<String>) -> Self {
        AssetLoader::global().asset(name)
    }

    pub fn id(&self) -> AssetId {
        self.cell.id
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    pub fn status(&self) -> AssetStatus {
        self.cell.status()
    }

    /// Non-blocking readiness check.
    pub fn is_loaded(&self) -> bool {
        self.status() == AssetStatus::Ready
    }

    /// The parsed value if the asset is ready.
    pub fn try_get(&self) -> Option<Arc<K::Output>> {
        match &self.cell.slot.lock().state {
            LoadState::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// The stored failure, if loading failed.
    pub fn error(&self) -> Option<AssetError> {
        match &self.cell.slot.lock().state {
            LoadState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Blocks until the asset is ready or failed.
    pub fn load(&self) -> Result<Arc<K::Output>, AssetError> {
        self.load_timeout(None)
    }

    /// Blocks for at most `timeout` (forever when `None`).
    ///
    /// Warns when called while the loader is not running, since nothing
    /// will make progress until it starts.
    pub fn load_timeout(&self, timeout: Option<Duration>) -> Result<Arc<K::Output>, AssetError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut warned = false;
        let mut slot = self.cell.slot.lock();

        loop {
            match &slot.state {
                LoadState::Ready(value) => return Ok(Arc::clone(value)),
                LoadState::Failed(error) => return Err(error.clone()),
                _ => {}
            }

            if !warned && !self.cell.loader_running() {
                warn!(
                    target: "assets",
                    "load() on {:?} while the asset loader is not running; it will block until the engine is entered",
                    self.cell.name
                );
                warned = true;
            }

            match deadline {
                None => self.cell.ready.wait(&mut slot),
                Some(deadline) => {
                    if self.cell.ready.wait_until(&mut slot, deadline).timed_out() {
                        return match &slot.state {
                            LoadState::Ready(value) => Ok(Arc::clone(value)),
                            LoadState::Failed(error) => Err(error.clone()),
                            _ => Err(AssetError::Timeout {
                                name: self.cell.name.clone(),
                            }),
                        };
                    }
                }
            }
        }
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Type-erased handle to the same instance.
    pub fn erase(&self) -> AnyAsset {
        AnyAsset {
            cell: self.cell.clone(),
        }
    }
}

impl<K: AssetKind> Clone for Asset<K> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<K: AssetKind> PartialEq for Asset<K> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<K: AssetKind> Eq for Asset<K> {}

impl<K: AssetKind> fmt::Debug for Asset<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("kind", &crate::core::events::short_type_name(std::any::type_name::<K>()))
            .field("name", &self.cell.name)
            .field("status", &self.status())
            .finish()
    }
}

//=== AnyAsset ============================================================

pub(crate) trait ErasedAsset: Send + Sync {
    fn id(&self) -> AssetId;

    fn name(&self) -> &str;

    fn kind_name(&self) -> &'static str;

    fn status(&self) -> AssetStatus;

    fn on_complete(&self, dependent: Dependent);

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<K: AssetKind> ErasedAsset for AssetCell<K> {
    fn id(&self) -> AssetId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind_name(&self) -> &'static str {
        crate::core::events::short_type_name(std::any::type_name::<K>())
    }

    fn status(&self) -> AssetStatus {
        AssetCell::status(self)
    }

    fn on_complete(&self, dependent: Dependent) {
        AssetCell::on_complete(self, dependent)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// An asset of any kind.
#[derive(Clone)]
pub struct AnyAsset {
    cell: Arc<dyn ErasedAsset>,
}

impl AnyAsset {
    pub fn id(&self) -> AssetId {
        self.cell.id()
    }

    pub fn name(&self) -> &str {
        self.cell.name()
    }

    /// Short name of the asset kind, e.g. `Image`.
    pub fn kind_name(&self) -> &'static str {
        self.cell.kind_name()
    }

    pub fn status(&self) -> AssetStatus {
        self.cell.status()
    }

    pub fn is<K: AssetKind>(&self) -> bool {
        self.downcast::<K>().is_some()
    }

    /// Recovers the typed handle.
    pub fn downcast<K: AssetKind>(&self) -> Option<Asset<K>> {
        let cell = Arc::clone(&self.cell).into_any().downcast::<AssetCell<K>>().ok()?;
        Some(Asset { cell })
    }

    pub(crate) fn on_complete(&self, dependent: Dependent) {
        self.cell.on_complete(dependent);
    }
}

impl<K: AssetKind> From<Asset<K>> for AnyAsset {
    fn from(asset: Asset<K>) -> Self {
        AnyAsset { cell: asset.cell }
    }
}

impl<K: AssetKind> From<&Asset<K>> for AnyAsset {
    fn from(asset: &Asset<K>) -> Self {
        asset.erase()
    }
}

impl PartialEq for AnyAsset {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for AnyAsset {}

impl<K: AssetKind> PartialEq<Asset<K>> for AnyAsset {
    fn eq(&self, other: &Asset<K>) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for AnyAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyAsset")
            .field("kind", &self.kind_name())
            .field("name", &self.name())
            .field("status", &self.status())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
