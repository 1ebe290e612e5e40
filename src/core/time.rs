//=========================================================================
// Time Sources
//=========================================================================
//
// Monotonic clocks read by the engine loop (Idle deltas) and by
// animations (frame selection).
//
// `SystemClock` reads the OS monotonic clock. `ManualClock` is advanced
// explicitly and is shared by cloning, which keeps engine tests
// deterministic.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

//=== TimeSource Trait ====================================================

/// A monotonic clock measured in seconds.
pub trait TimeSource: Send + Sync {
    /// Seconds elapsed since an arbitrary, fixed origin.
    fn now(&self) -> f64;
}

//=== SystemClock =========================================================

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

//=== ManualClock =========================================================

/// Clock that only moves when told to.
///
/// Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `0.0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current reading.
    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        let current = f64::from_bits(self.bits.load(Ordering::SeqCst));
        self.set(current + seconds);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::new().now(), 0.0);
    }

    #[test]
    fn manual_clock_clones_share_reading() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(0.25);
        other.advance(0.25);
        assert_eq!(clock.now(), 0.5);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
