//=========================================================================
// Asset Loader
//=========================================================================
//
// Owns the weak-value registry, the worker pool, the load counters and
// the notice channel drained by `AssetLoadingSystem`.
//
// Registry key: (TypeId of the kind, name). Values are weak so an asset
// disappears from the cache once its last handle is dropped.
//
// Counters:
//   total_loaded  successful background loads since creation
//   total_queued  loads submitted and not yet finished
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, trace};
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use super::asset::{AnyAsset, Asset, AssetCell};
use super::executor::{DelayedExecutor, Task};
use super::vfs::{DirectoryFs, FileSystem};
use super::AssetKind;
use crate::core::errors::AssetError;
use crate::core::events::AssetLoaded;

//=== Types ===============================================================

type Work<T> = Box<dyn FnOnce() -> Result<T, AssetError> + Send>;

type RegistryKey = (TypeId, String);

pub(crate) struct LoaderShared {
    fs: Arc<dyn FileSystem>,
    workers: usize,
    registry: Mutex<HashMap<RegistryKey, Weak<dyn Any + Send + Sync>>>,
    executor: Mutex<Arc<DelayedExecutor>>,
    loaded: AtomicUsize,
    queued: AtomicUsize,
    submitted: AtomicUsize,
    notices: (Sender<AssetLoaded>, Receiver<AssetLoaded>),
}

//=== AssetLoader =========================================================

/// Cache and background loader for assets.
///
/// Cloning yields another handle to the same loader.
#[derive(Clone)]
pub struct AssetLoader {
    shared: Arc<LoaderShared>,
}

static GLOBAL_LOADER: OnceLock<AssetLoader> = OnceLock::new();

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(2)
        .clamp(1, 4)
}

impl AssetLoader {
    pub fn new(fs: impl FileSystem + 'static) -> Self {
        Self::with_workers(fs, default_workers())
    }

    pub fn with_workers(fs: impl FileSystem + 'static, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            shared: Arc::new(LoaderShared {
                fs: Arc::new(fs),
                workers,
                registry: Mutex::new(HashMap::new()),
                executor: Mutex::new(Arc::new(DelayedExecutor::new(workers))),
                loaded: AtomicUsize::new(0),
                queued: AtomicUsize::new(0),
                submitted: AtomicUsize::new(0),
                notices: unbounded(),
            }),
        }
    }

    /// Process-wide loader reading from the working directory.
    pub fn global() -> AssetLoader {
        GLOBAL_LOADER
            .get_or_init(|| AssetLoader::new(DirectoryFs::new(".")))
            .clone()
    }

    pub(crate) fn from_shared(shared: Arc<LoaderShared>) -> Self {
        Self { shared }
    }

    pub fn ptr_eq(&self, other: &AssetLoader) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    //--- Lookup -----------------------------------------------------------

    /// Returns the live asset for `(K, name)` or creates it and schedules
    /// its load.
    pub fn asset<K: AssetKind>(&self, name: impl Into<String>) -> Asset<K> {
        let name = name.into();
        let (cell, created) = self.lookup_or_create::<K>(name);
        if created {
            let fs = Arc::clone(&self.shared.fs);
            let file = cell.name().to_string();
            self.schedule(&cell, Box::new(move || read_and_parse::<K>(fs.as_ref(), &file)));
        }
        Asset { cell }
    }

    /// An asset produced by `build` once every asset in `deps` is ready.
    ///
    /// If any dependency fails, this asset fails with the same error and
    /// `build` never runs. Without dependencies `build` is submitted at
    /// once.
    pub fn chained<K, F>(&self, name: impl Into<String>, deps: Vec<AnyAsset>, build: F) -> Asset<K>
    where
        K: AssetKind,
        F: FnOnce() -> Result<K::Output, AssetError> + Send + 'static,
    {
        let (cell, created) = self.lookup_or_create::<K>(name.into());
        if !created {
            return Asset { cell };
        }
        if deps.is_empty() {
            self.schedule(&cell, Box::new(build));
            return Asset { cell };
        }

        trace!(target: "assets", "{:?} waits on {} dependencies", cell.name(), deps.len());
        let remaining = Arc::new(AtomicUsize::new(deps.len()));
        let pending: Arc<Mutex<Option<(Work<K::Output>, Vec<AnyAsset>)>>> =
            Arc::new(Mutex::new(Some((Box::new(build), deps.clone()))));

        for dep in deps {
            let remaining = Arc::clone(&remaining);
            let pending = Arc::clone(&pending);
            let target = Arc::downgrade(&cell);
            let loader = Arc::downgrade(&self.shared);

            dep.on_complete(Box::new(move |outcome| match outcome {
                Err(error) => {
                    let taken = pending.lock().take();
                    if taken.is_some() {
                        if let Some(cell) = target.upgrade() {
                            cell.complete(Err(error));
                        }
                    }
                }
                Ok(()) => {
                    if remaining.fetch_sub(1, Ordering::SeqCst) != 1 {
                        return;
                    }
                    let taken = pending.lock().take();
                    if let (Some((work, _deps)), Some(cell), Some(shared)) =
                        (taken, target.upgrade(), loader.upgrade())
                    {
                        AssetLoader::from_shared(shared).schedule(&cell, work);
                    }
                }
            }));
        }
        Asset { cell }
    }

    fn lookup_or_create<K: AssetKind>(&self, name: String) -> (Arc<AssetCell<K>>, bool) {
        let key = (TypeId::of::<K>(), name);
        let mut registry = self.shared.registry.lock();

        if let Some(existing) = registry.get(&key).and_then(Weak::upgrade) {
            if let Ok(cell) = existing.downcast::<AssetCell<K>>() {
                return (cell, false);
            }
        }

        let cell = Arc::new(AssetCell::<K>::new(key.1.clone(), Arc::downgrade(&self.shared)));
        let erased: Arc<dyn Any + Send + Sync> = cell.clone();
        registry.insert(key, Arc::downgrade(&erased));
        registry.retain(|_, weak| weak.strong_count() > 0);
        (cell, true)
    }

    //--- Scheduling -------------------------------------------------------

    fn schedule<K: AssetKind>(&self, cell: &Arc<AssetCell<K>>, work: Work<K::Output>) {
        let executor = self.shared.executor.lock().clone();
        let shut_down = executor.shut_down_flag();

        self.shared.queued.fetch_add(1, Ordering::SeqCst);
        self.shared.submitted.fetch_add(1, Ordering::SeqCst);
        cell.mark_queued();

        let name = cell.name().to_string();
        let run_cell = Arc::downgrade(cell);
        let run_loader = Arc::downgrade(&self.shared);
        let abort_cell = Arc::downgrade(cell);
        let abort_loader = Arc::downgrade(&self.shared);

        let run = move || {
            let Some(shared) = run_loader.upgrade() else {
                return;
            };
            let name = match run_cell.upgrade() {
                Some(cell) => {
                    cell.mark_loading();
                    cell.name().to_string()
                }
                None => {
                    shared.queued.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let result = panic::catch_unwind(AssertUnwindSafe(work))
                .unwrap_or_else(|_| Err(AssetError::Panicked { name: name.clone() }));
            let succeeded = result.is_ok();

            shared.queued.fetch_sub(1, Ordering::SeqCst);
            if succeeded {
                shared.loaded.fetch_add(1, Ordering::SeqCst);
            }

            let Some(cell) = run_cell.upgrade() else {
                trace!(target: "assets", "{:?} dropped while loading", name);
                return;
            };
            cell.complete(result);

            if succeeded && !shut_down.load(Ordering::SeqCst) {
                let notice = AssetLoaded {
                    asset: AnyAsset::from(Asset { cell }),
                    total_loaded: shared.loaded.load(Ordering::SeqCst),
                    total_queued: shared.queued.load(Ordering::SeqCst),
                };
                let _ = shared.notices.0.send(notice);
            }
        };

        let abort = move |error: AssetError| {
            if let Some(shared) = abort_loader.upgrade() {
                shared.queued.fetch_sub(1, Ordering::SeqCst);
            }
            if let Some(cell) = abort_cell.upgrade() {
                cell.complete(Err(error));
            }
        };

        executor.submit(Task {
            name,
            run: Box::new(run),
            abort: Box::new(abort),
        });
    }

    //--- Lifecycle --------------------------------------------------------

    /// Starts the workers; buffered loads begin.
    pub fn start(&self) -> io::Result<()> {
        let executor = self.shared.executor.lock().clone();
        executor.start()?;
        info!(target: "assets", "asset loader started");
        Ok(())
    }

    /// Cancels queued loads, forgets cached assets and arms a fresh,
    /// unstarted executor for the next `start`.
    pub fn shutdown(&self) {
        let previous = self.shared.executor.lock().clone();
        previous.shutdown();

        *self.shared.executor.lock() = Arc::new(DelayedExecutor::new(self.shared.workers));
        self.shared.registry.lock().clear();
        let dropped = self.shared.notices.1.try_iter().count();
        debug!(target: "assets", "asset loader shut down, {} undelivered notices dropped", dropped);
    }

    pub fn is_running(&self) -> bool {
        self.shared.executor.lock().is_running()
    }

    //--- Counters and Notices ---------------------------------------------

    pub fn total_loaded(&self) -> usize {
        self.shared.loaded.load(Ordering::SeqCst)
    }

    pub fn total_queued(&self) -> usize {
        self.shared.queued.load(Ordering::SeqCst)
    }

    /// Loads ever submitted to the worker pool.
    pub fn total_submitted(&self) -> usize {
        self.shared.submitted.load(Ordering::SeqCst)
    }

    /// Live assets currently in the cache.
    pub fn cached_count(&self) -> usize {
        self.shared
            .registry
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Drains the completion notices posted by workers.
    pub fn poll_notices(&self) -> Vec<AssetLoaded> {
        self.shared.notices.1.try_iter().collect()
    }
}

impl fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoader")
            .field("running", &self.is_running())
            .field("total_loaded", &self.total_loaded())
            .field("total_queued", &self.total_queued())
            .field("cached", &self.cached_count())
            .finish()
    }
}

//=== File Loading ========================================================

fn read_and_parse<K: AssetKind>(fs: &dyn FileSystem, name: &str) -> Result<K::Output, AssetError> {
    match fs.open(name) {
        Ok(bytes) => K::background_parse(name, bytes),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            K::file_missing(name).ok_or_else(|| AssetError::NotFound { name: name.to_string() })
        }
        Err(error) => Err(AssetError::Io {
            name: name.to_string(),
            source: Arc::new(error),
        }),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::{AssetStatus, MemoryFs};
    use std::time::{Duration, Instant};

    //--- Test Helpers -----------------------------------------------------

    struct Text;

    impl AssetKind for Text {
        type Output = String;

        fn background_parse(name: &str, bytes: Vec<u8>) -> Result<String, AssetError> {
            String::from_utf8(bytes).map_err(|error| AssetError::parse(name, error))
        }
    }

    struct Fallback;

    impl AssetKind for Fallback {
        type Output = String;

        fn background_parse(_name: &str, _bytes: Vec<u8>) -> Result<String, AssetError> {
            Ok("real".to_string())
        }

        fn file_missing(_name: &str) -> Option<String> {
            Some("placeholder".to_string())
        }
    }

    struct Explosive;

    impl AssetKind for Explosive {
        type Output = ();

        fn background_parse(_name: &str, _bytes: Vec<u8>) -> Result<(), AssetError> {
            panic!("parser exploded");
        }
    }

    const WAIT: Option<Duration> = Some(Duration::from_secs(5));

    fn loader() -> AssetLoader {
        let _ = env_logger::builder().is_test(true).try_init();
        let fs = MemoryFs::new()
            .with("hello.txt", b"hello".to_vec())
            .with("world.txt", b"world".to_vec())
            .with("binary.txt", vec![0xff, 0xfe]);
        AssetLoader::with_workers(fs, 2)
    }

    fn wait_for_notices(loader: &AssetLoader, count: usize) -> Vec<AssetLoaded> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut notices = Vec::new();
        while notices.len() < count && Instant::now() < deadline {
            notices.extend(loader.poll_notices());
            std::thread::sleep(Duration::from_millis(1));
        }
        notices
    }

    //--- Deduplication ----------------------------------------------------

    #[test]
    fn same_kind_and_name_share_one_instance() {
        let loader = loader();
        let first = loader.asset::<Text>("hello.txt");
        let second = loader.asset::<Text>("hello.txt");

        assert!(first.ptr_eq(&second));
        assert_eq!(loader.total_submitted(), 1);
        assert_eq!(loader.total_queued(), 1);
        assert_eq!(first.status(), AssetStatus::Queued);
    }

    #[test]
    fn different_kinds_do_not_share() {
        let loader = loader();
        let text = loader.asset::<Text>("hello.txt");
        let fallback = loader.asset::<Fallback>("hello.txt");
        assert_ne!(text.id(), fallback.id());
        assert_eq!(loader.total_submitted(), 2);
    }

    #[test]
    fn dropped_assets_leave_the_cache() {
        let loader = loader();
        let asset = loader.asset::<Text>("hello.txt");
        let id = asset.id();
        assert_eq!(loader.cached_count(), 1);

        drop(asset);
        assert_eq!(loader.cached_count(), 0);
        assert_ne!(loader.asset::<Text>("hello.txt").id(), id);
    }

    //--- Loading ----------------------------------------------------------

    #[test]
    fn load_returns_same_value_without_resubmitting() {
        let loader = loader();
        loader.start().unwrap();
        let asset = loader.asset::<Text>("hello.txt");

        let first = asset.load_timeout(WAIT).unwrap();
        let second = asset.load_timeout(WAIT).unwrap();
        assert_eq!(first.as_str(), "hello");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.total_submitted(), 1);
    }

    #[test]
    fn completion_posts_notice_with_totals() {
        let loader = loader();
        let asset = loader.asset::<Text>("hello.txt");
        loader.start().unwrap();

        let notices = wait_for_notices(&loader, 1);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].asset, asset);
        assert_eq!(notices[0].total_loaded, 1);
        assert_eq!(notices[0].total_queued, 0);
    }

    #[test]
    fn missing_file_without_fallback_fails() {
        let loader = loader();
        loader.start().unwrap();
        let asset = loader.asset::<Text>("nope.txt");
        assert!(matches!(asset.load_timeout(WAIT), Err(AssetError::NotFound { .. })));
        assert_eq!(loader.total_loaded(), 0);
        assert_eq!(loader.total_queued(), 0);
    }

    #[test]
    fn missing_file_uses_fallback_when_provided() {
        let loader = loader();
        loader.start().unwrap();
        let asset = loader.asset::<Fallback>("nope.txt");
        assert_eq!(asset.load_timeout(WAIT).unwrap().as_str(), "placeholder");
    }

    #[test]
    fn parse_errors_are_stored_on_the_asset() {
        let loader = loader();
        loader.start().unwrap();
        let asset = loader.asset::<Text>("binary.txt");
        assert!(matches!(asset.load_timeout(WAIT), Err(AssetError::Parse { .. })));
        assert!(matches!(asset.load_timeout(WAIT), Err(AssetError::Parse { .. })));
        assert!(wait_for_notices(&loader, 1).is_empty());
    }

    #[test]
    fn worker_panics_become_errors() {
        let loader = loader();
        loader.start().unwrap();
        let asset = loader.asset::<Explosive>("hello.txt");
        assert!(matches!(asset.load_timeout(WAIT), Err(AssetError::Panicked { .. })));
    }

    //--- Chained Assets ---------------------------------------------------

    #[test]
    fn chained_asset_builds_after_dependencies() {
        let loader = loader();
        let hello = loader.asset::<Text>("hello.txt");
        let world = loader.asset::<Text>("world.txt");

        let (a, b) = (hello.clone(), world.clone());
        let joined = loader.chained::<Text, _>(
            "joined",
            vec![hello.erase(), world.erase()],
            move || Ok(format!("{} {}", a.load()?, b.load()?)),
        );
        assert_eq!(joined.status(), AssetStatus::Created);

        loader.start().unwrap();
        assert_eq!(joined.load_timeout(WAIT).unwrap().as_str(), "hello world");
    }

    #[test]
    fn chained_asset_fails_with_dependency_error() {
        let loader = loader();
        let missing = loader.asset::<Text>("missing.txt");
        let chained = loader.chained::<Text, _>("derived", vec![missing.erase()], || {
            Ok("never".to_string())
        });

        loader.start().unwrap();
        assert!(matches!(chained.load_timeout(WAIT), Err(AssetError::NotFound { .. })));
    }

    //--- Shutdown ---------------------------------------------------------

    #[test]
    fn shutdown_cancels_queued_loads_and_clears_cache() {
        let loader = loader();
        let asset = loader.asset::<Text>("hello.txt");
        loader.shutdown();

        assert!(matches!(asset.load_timeout(WAIT), Err(AssetError::Cancelled { .. })));
        assert_eq!(loader.total_queued(), 0);
        assert_eq!(loader.cached_count(), 0);
        assert!(!loader.is_running());
        assert!(loader.poll_notices().is_empty());
    }

    #[test]
    fn loader_can_restart_after_shutdown() {
        let loader = loader();
        loader.start().unwrap();
        loader.shutdown();
        loader.start().unwrap();
        assert!(loader.is_running());

        let asset = loader.asset::<Text>("world.txt");
        assert_eq!(asset.load_timeout(WAIT).unwrap().as_str(), "world");
    }
}
