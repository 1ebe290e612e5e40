//=========================================================================
// Platform Layer
//
// The engine never talks to a window, GPU or audio device directly. The
// renderer, sound and input subsystems each open one collaborator from
// the `Backends` set when the engine is entered.
//
// Architecture:
// ```text
//  Renderer ───> RenderTarget   clear / draw / present
//  SoundSystem ─> Mixer         play / poll_finished
//  InputSystem ─> InputSource   poll -> Vec<RawEvent>
//
//  Backends (factories, cloned into every Engine::enter)
//   ├─ headless (default): HeadlessTarget, HeadlessMixer, ChannelInput
//   └─ user supplied:      with_render_target / with_mixer / with_input
//
//  Main Thread:                     Engine Thread:
//  ┌──────────────────────────┐    ┌──────────────────┐
//  │  Winit Event Loop        │    │  InputSystem     │
//  │   ↓                      │    │   ↑              │
//  │  WinitBridge ────────────┼───>│  ChannelInput    │
//  └──────────────────────────┘    └──────────────────┘
//                 crossbeam channel of RawEvent
// ```
//
//=========================================================================

//=== Submodules ==========================================================

mod headless;
mod winit_bridge;

//=== External Dependencies ===============================================

use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use image::RgbaImage;
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::assets::SoundData;
use crate::core::color::Color;
use crate::core::scene::BlendMode;
use crate::core::systems::input::RawEvent;
use crate::engine::EngineOptions;

//=== Public API ==========================================================

pub use headless::{ChannelInput, DrawRecord, Frame, HeadlessMixer, HeadlessTarget, PlayRecord};
pub use winit_bridge::{mouse_button_from_winit, WinitBridge};

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The window or drawing surface could not be opened or presented.
    #[error("window error: {0}")]
    Window(String),

    /// The audio device could not be opened or refused a sound.
    #[error("audio error: {0}")]
    Audio(String),

    /// The collaborator was closed by the OS or the user.
    #[error("platform collaborator closed")]
    Closed,
}

//=== RenderTarget ========================================================

/// One sprite draw, in window pixels.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// Already scaled to its on-screen size.
    pub image: &'a RgbaImage,

    /// Pixel position of the image center.
    pub center: Vec2,

    /// Degrees clockwise.
    pub rotation: f32,

    pub opacity: u8,
    pub blend_mode: BlendMode,
}

/// A drawing surface.
pub trait RenderTarget {
    /// Current size in pixels.
    fn size(&self) -> (u32, u32);

    /// Starts a frame filled with `color`.
    fn clear(&mut self, color: Color);

    fn draw(&mut self, call: DrawCall<'_>);

    /// Shows the frame.
    fn present(&mut self) -> Result<(), PlatformError>;
}

//=== Mixer ===============================================================

/// A fixed set of audio channels.
pub trait Mixer {
    /// Starts `sound` on a free channel.
    ///
    /// Returns `Ok(None)` when every channel is busy.
    fn play(&mut self, sound: &SoundData) -> Result<Option<usize>, PlatformError>;

    /// Channels whose sound finished since the last poll.
    fn poll_finished(&mut self) -> Vec<usize>;
}

//=== InputSource =========================================================

/// Where raw input comes from.
pub trait InputSource {
    /// Everything received since the last poll, oldest first.
    fn poll(&mut self) -> Vec<RawEvent>;
}

//=== Backends ============================================================

type TargetFactory = Rc<dyn Fn(&EngineOptions) -> Result<Box<dyn RenderTarget>, PlatformError>>;
type MixerFactory = Rc<dyn Fn() -> Result<Box<dyn Mixer>, PlatformError>>;
type InputFactory = Rc<dyn Fn() -> Result<Box<dyn InputSource>, PlatformError>>;

/// Factories for the platform collaborators.
///
/// Each `Engine::enter` opens fresh collaborators, so the factories may
/// run more than once.
#[derive(Clone)]
pub struct Backends {
    render_target: TargetFactory,
    mixer: MixerFactory,
    input: InputFactory,
}

impl Default for Backends {
    fn default() -> Self {
        Self::headless()
    }
}

impl Backends {
    /// In-memory collaborators: frames are recorded, sounds finish
    /// instantly and no input ever arrives.
    pub fn headless() -> Self {
        Self {
            render_target: Rc::new(|options: &EngineOptions| {
                Ok(Box::new(HeadlessTarget::new(options.resolution)) as Box<dyn RenderTarget>)
            }),
            mixer: Rc::new(|| Ok(Box::new(HeadlessMixer::default()) as Box<dyn Mixer>)),
            input: Rc::new(|| Ok(Box::new(ChannelInput::new().0) as Box<dyn InputSource>)),
        }
    }

    pub fn with_render_target<F, T>(mut self, open: F) -> Self
    where
        F: Fn(&EngineOptions) -> Result<T, PlatformError> + 'static,
        T: RenderTarget + 'static,
    {
        self.render_target = Rc::new(move |options: &EngineOptions| {
            open(options).map(|target| Box::new(target) as Box<dyn RenderTarget>)
        });
        self
    }

    pub fn with_mixer<F, T>(mut self, open: F) -> Self
    where
        F: Fn() -> Result<T, PlatformError> + 'static,
        T: Mixer + 'static,
    {
        self.mixer = Rc::new(move || open().map(|mixer| Box::new(mixer) as Box<dyn Mixer>));
        self
    }

    pub fn with_input<F, T>(mut self, open: F) -> Self
    where
        F: Fn() -> Result<T, PlatformError> + 'static,
        T: InputSource + 'static,
    {
        self.input = Rc::new(move || open().map(|input| Box::new(input) as Box<dyn InputSource>));
        self
    }

    //--- Opening ----------------------------------------------------------

    pub fn open_render_target(&self, options: &EngineOptions) -> Result<Box<dyn RenderTarget>, PlatformError> {
        (self.render_target)(options)
    }

    pub fn open_mixer(&self) -> Result<Box<dyn Mixer>, PlatformError> {
        (self.mixer)()
    }

    pub fn open_input(&self) -> Result<Box<dyn InputSource>, PlatformError> {
        (self.input)()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_target_matches_configured_resolution() {
        let options = EngineOptions {
            resolution: (320, 200),
            ..EngineOptions::default()
        };
        let target = Backends::headless().open_render_target(&options).unwrap();
        assert_eq!(target.size(), (320, 200));
    }

    #[test]
    fn custom_factories_replace_defaults() {
        let shared = HeadlessTarget::new((16, 16));
        let handle = shared.clone();
        let backends = Backends::headless()
            .with_render_target(move |_: &EngineOptions| Ok(handle.clone()))
            .with_mixer(|| Err::<HeadlessMixer, _>(PlatformError::Audio("no device".into())));

        let mut target = backends.open_render_target(&EngineOptions::default()).unwrap();
        target.clear(Color::BLACK);
        target.present().unwrap();
        assert_eq!(shared.frame_count(), 1);

        assert_eq!(
            backends.open_mixer().err(),
            Some(PlatformError::Audio("no device".into()))
        );
    }

    #[test]
    fn default_input_never_yields() {
        let mut input = Backends::headless().open_input().unwrap();
        assert!(input.poll().is_empty());
    }
}
