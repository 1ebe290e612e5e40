//=========================================================================
// Clock
//=========================================================================
//
// Turns variable `Idle` deltas into fixed-step `Update` events.
//
//   accumulated += idle.time_delta
//   while accumulated >= step:
//       accumulated -= step
//       signal Update { time_delta: step }
//
// The accumulator is a `Duration` so repeated additions of the same
// delta stay exact at nanosecond resolution.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use log::debug;

//=== Internal Dependencies ===============================================

use super::{Subsystem, SubsystemContext};
use crate::core::errors::{EngineError, HandlerResult};
use crate::core::events::{EventContext, Handlers, Idle, Update};
use crate::core::objects::GameObject;

//=== Updater =============================================================

/// Fixed-step update pacing.
#[derive(Debug)]
pub struct Updater {
    handlers: Handlers,
    step: Duration,
    accumulated: Duration,
}

impl Updater {
    /// # Panics
    ///
    /// Panics if `step` is not positive.
    pub fn new(step: f64) -> Self {
        let step = Duration::try_from_secs_f64(step)
            .ok()
            .filter(|step| !step.is_zero());
        let Some(step) = step else {
            panic!("Update step must be positive");
        };

        Self {
            handlers: Handlers::new().on(Self::on_idle),
            step,
            accumulated: Duration::ZERO,
        }
    }

    pub fn from_context(ctx: &SubsystemContext<'_>) -> Result<Self, EngineError> {
        Ok(Self::new(ctx.options.update_step))
    }

    pub fn step(&self) -> f64 {
        self.step.as_secs_f64()
    }

    /// Time carried over toward the next `Update`.
    pub fn accumulated(&self) -> f64 {
        self.accumulated.as_secs_f64()
    }

    /// Adds `time_delta` and returns how many steps became due.
    pub fn advance(&mut self, time_delta: f64) -> usize {
        self.accumulated += Duration::try_from_secs_f64(time_delta.max(0.0)).unwrap_or_default();

        let mut due = 0;
        while self.accumulated >= self.step {
            self.accumulated -= self.step;
            due += 1;
        }
        due
    }

    fn on_idle(&mut self, event: &Idle, ctx: &mut EventContext<'_>) -> HandlerResult {
        let time_delta = self.step.as_secs_f64();
        for _ in 0..self.advance(event.time_delta) {
            ctx.signal(Update { time_delta });
        }
        Ok(())
    }
}

impl GameObject for Updater {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }
}

impl Subsystem for Updater {
    fn activate(&mut self) -> Result<(), EngineError> {
        self.accumulated = Duration::ZERO;
        debug!(target: "engine", "updater active, step {:?}", self.step);
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
