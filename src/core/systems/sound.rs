//=========================================================================
// Sound
//=========================================================================
//
// Plays `PlaySound` requests on the platform mixer.
//
//   PlaySound ─load─> SoundData ─mixer.play─> channel
//                                               │
//   Idle ─poll_finished────────────────────────>┘ Finished
//
// A request may carry a `SoundManager`; it receives `Started` and
// `Finished` notices for the channel the sound ends up on.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::{Subsystem, SubsystemContext};
use crate::core::errors::{EngineError, HandlerResult};
use crate::core::events::{EventContext, Handlers, Idle, PlaySound};
use crate::core::objects::GameObject;
use crate::platform::Mixer;

//=== SoundManager ========================================================

/// Channel lifecycle notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundNotice {
    Started { channel: usize },
    Finished { channel: usize },
}

/// Sending half of a sound notice channel.
#[derive(Debug, Clone)]
pub struct SoundManager {
    sender: Sender<SoundNotice>,
}

impl SoundManager {
    pub fn new() -> (SoundManager, Receiver<SoundNotice>) {
        let (sender, receiver) = unbounded();
        (SoundManager { sender }, receiver)
    }

    /// Dropped receivers are not an error.
    pub(crate) fn notify(&self, notice: SoundNotice) {
        let _ = self.sender.send(notice);
    }
}

//=== SoundSystem =========================================================

pub struct SoundSystem {
    handlers: Handlers,
    mixer: Box<dyn Mixer>,

    /// Busy channels and who wants to hear about them.
    active: HashMap<usize, Option<SoundManager>>,
}

impl SoundSystem {
    pub fn new(mixer: Box<dyn Mixer>) -> Self {
        Self {
            handlers: Handlers::new().on(Self::on_play_sound).on(Self::on_idle),
            mixer,
            active: HashMap::new(),
        }
    }

    pub fn from_context(ctx: &SubsystemContext<'_>) -> Result<Self, EngineError> {
        Ok(Self::new(ctx.open_mixer()?))
    }

    /// Channels with a sound still playing.
    pub fn active_channels(&self) -> usize {
        self.active.len()
    }

    fn on_play_sound(&mut self, event: &PlaySound, _ctx: &mut EventContext<'_>) -> HandlerResult {
        let data = event.sound.load()?;

        match self.mixer.play(&data)? {
            Some(channel) => {
                trace!(target: "systems::sound", "{} started on channel {}", data.name, channel);
                if let Some(manager) = &event.manager {
                    manager.notify(SoundNotice::Started { channel });
                }
                self.active.insert(channel, event.manager.clone());
            }
            None => {
                warn!(target: "systems::sound", "no free mixer channel for {}", data.name);
            }
        }
        Ok(())
    }

    fn on_idle(&mut self, _event: &Idle, _ctx: &mut EventContext<'_>) -> HandlerResult {
        for channel in self.mixer.poll_finished() {
            if let Some(Some(manager)) = self.active.remove(&channel) {
                manager.notify(SoundNotice::Finished { channel });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SoundSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundSystem")
            .field("active", &self.active.len())
            .finish()
    }
}

impl GameObject for SoundSystem {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }
}

impl Subsystem for SoundSystem {
    fn deactivate(&mut self) -> Result<(), EngineError> {
        self.active.clear();
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
