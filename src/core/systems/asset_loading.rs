//=========================================================================
// Asset Loading
//=========================================================================
//
// Ties the asset loader's worker pool to the engine lifetime and turns
// finished background loads into `AssetLoaded` events.
//
//   activate    → loader.start()      (queued requests begin loading)
//   Idle        → signal every pending AssetLoaded notice
//   deactivate  → loader.shutdown()   (cancel queued, clear the cache)
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::{Subsystem, SubsystemContext};
use crate::core::assets::AssetLoader;
use crate::core::errors::{EngineError, HandlerResult};
use crate::core::events::{EventContext, Handlers, Idle};
use crate::core::objects::GameObject;

//=== AssetLoadingSystem ==================================================

#[derive(Debug)]
pub struct AssetLoadingSystem {
    handlers: Handlers,
    loader: AssetLoader,
}

impl AssetLoadingSystem {
    pub fn new(loader: AssetLoader) -> Self {
        Self {
            handlers: Handlers::new().on(Self::on_idle),
            loader,
        }
    }

    pub fn from_context(ctx: &SubsystemContext<'_>) -> Result<Self, EngineError> {
        Ok(Self::new(ctx.options.loader.clone()))
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    fn on_idle(&mut self, _event: &Idle, ctx: &mut EventContext<'_>) -> HandlerResult {
        for notice in self.loader.poll_notices() {
            ctx.signal(notice);
        }
        Ok(())
    }
}

impl GameObject for AssetLoadingSystem {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }
}

impl Subsystem for AssetLoadingSystem {
    fn activate(&mut self) -> Result<(), EngineError> {
        self.loader.start().map_err(|e| EngineError::Subsystem {
            name: "AssetLoadingSystem",
            source: Box::new(e),
        })
    }

    fn deactivate(&mut self) -> Result<(), EngineError> {
        self.loader.shutdown();
        debug!(
            target: "assets",
            "loader released after {} loads",
            self.loader.total_loaded()
        );
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::{MemoryFs, Sound};
    use crate::core::events::{invoke, AssetLoaded, EventQueue};
    use std::time::{Duration, Instant};

    fn system() -> AssetLoadingSystem {
        let _ = env_logger::builder().is_test(true).try_init();
        let fs = MemoryFs::new()
            .with("a.wav", b"a".to_vec())
            .with("b.wav", b"b".to_vec());
        AssetLoadingSystem::new(AssetLoader::new(fs))
    }

    #[test]
    fn requests_made_before_activation_load_after_it() {
        let mut system = system();
        let asset = system.loader().asset::<Sound>("a.wav");
        assert!(!asset.is_loaded());

        system.activate().unwrap();
        assert!(asset.load_timeout(Some(Duration::from_secs(5))).is_ok());
        system.deactivate().unwrap();
    }

    #[test]
    fn idle_signals_loaded_notices() {
        let mut system = system();
        system.activate().unwrap();
        let a = system.loader().asset::<Sound>("a.wav");
        let b = system.loader().asset::<Sound>("b.wav");
        a.load().unwrap();
        b.load().unwrap();

        let mut queue = EventQueue::new();
        let mut commands = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.len() < 2 && Instant::now() < deadline {
            let mut ctx = EventContext::new(&mut queue, None, None, &mut commands);
            invoke(&mut system, "on_idle", &Idle { time_delta: 0.0 }, &mut ctx).unwrap();
        }

        let totals: Vec<usize> = std::iter::from_fn(|| queue.pop())
            .map(|envelope| {
                let notice = envelope.event.downcast_ref::<AssetLoaded>().unwrap();
                notice.total_loaded
            })
            .collect();
        assert_eq!(totals.len(), 2);
        assert_eq!(*totals.iter().max().unwrap(), 2);
        system.deactivate().unwrap();
    }

    #[test]
    fn deactivate_clears_the_cache() {
        let mut system = system();
        system.activate().unwrap();
        system.loader().asset::<Sound>("a.wav").load().unwrap();

        system.deactivate().unwrap();
        assert_eq!(system.loader().cached_count(), 0);
        assert!(!system.loader().is_running());
    }
}
