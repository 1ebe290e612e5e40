//=========================================================================
// Headless Collaborators
//=========================================================================
//
// In-memory stand-ins for a window, an audio device and an input queue.
// The engine uses them when no real platform is configured, and tests
// use them to observe what the subsystems did.
//
// HeadlessTarget and HeadlessMixer are cheap handles over shared state:
// keep a clone before handing one to the engine and inspect it later.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec2;
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use super::{DrawCall, InputSource, Mixer, PlatformError, RenderTarget};
use crate::core::assets::SoundData;
use crate::core::color::Color;
use crate::core::scene::BlendMode;
use crate::core::systems::input::RawEvent;

//=== HeadlessTarget ======================================================

/// What one draw call asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Pixel size of the scaled image.
    pub size: (u32, u32),
    pub center: Vec2,
    pub rotation: f32,
    pub opacity: u8,
    pub blend_mode: BlendMode,
}

/// A presented frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub background: Color,
    pub draws: Vec<DrawRecord>,
}

#[derive(Debug)]
struct TargetState {
    size: (u32, u32),
    current: Option<Frame>,
    presented: Vec<Frame>,
}

/// Render target that records frames instead of drawing them.
#[derive(Debug, Clone)]
pub struct HeadlessTarget {
    state: Arc<Mutex<TargetState>>,
}

impl HeadlessTarget {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            state: Arc::new(Mutex::new(TargetState {
                size,
                current: None,
                presented: Vec::new(),
            })),
        }
    }

    /// Simulates a window resize.
    pub fn set_size(&self, size: (u32, u32)) {
        self.state.lock().size = size;
    }

    /// Every presented frame, oldest first.
    pub fn frames(&self) -> Vec<Frame> {
        self.state.lock().presented.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.state.lock().presented.len()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.state.lock().presented.last().cloned()
    }
}

impl RenderTarget for HeadlessTarget {
    fn size(&self) -> (u32, u32) {
        self.state.lock().size
    }

    fn clear(&mut self, color: Color) {
        self.state.lock().current = Some(Frame {
            background: color,
            draws: Vec::new(),
        });
    }

    fn draw(&mut self, call: DrawCall<'_>) {
        let mut state = self.state.lock();
        let frame = state.current.get_or_insert_with(|| Frame {
            background: Color::BLACK,
            draws: Vec::new(),
        });
        frame.draws.push(DrawRecord {
            size: call.image.dimensions(),
            center: call.center,
            rotation: call.rotation,
            opacity: call.opacity,
            blend_mode: call.blend_mode,
        });
    }

    fn present(&mut self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let frame = state.current.take().unwrap_or(Frame {
            background: Color::BLACK,
            draws: Vec::new(),
        });
        state.presented.push(frame);
        Ok(())
    }
}

//=== HeadlessMixer =======================================================

/// A sound that was started on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRecord {
    pub name: String,
    pub channel: usize,
}

#[derive(Debug)]
struct MixerState {
    busy: Vec<bool>,
    finished: Vec<usize>,
    played: Vec<PlayRecord>,
}

/// Mixer whose sounds finish as soon as they start.
///
/// A channel stays busy until the next `poll_finished`.
#[derive(Debug, Clone)]
pub struct HeadlessMixer {
    state: Arc<Mutex<MixerState>>,
}

impl Default for HeadlessMixer {
    fn default() -> Self {
        Self::new(8)
    }
}

impl HeadlessMixer {
    pub fn new(channels: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MixerState {
                busy: vec![false; channels],
                finished: Vec::new(),
                played: Vec::new(),
            })),
        }
    }

    pub fn played(&self) -> Vec<PlayRecord> {
        self.state.lock().played.clone()
    }
}

impl Mixer for HeadlessMixer {
    fn play(&mut self, sound: &SoundData) -> Result<Option<usize>, PlatformError> {
        let mut state = self.state.lock();
        let Some(channel) = state.busy.iter().position(|busy| !busy) else {
            return Ok(None);
        };

        state.busy[channel] = true;
        state.finished.push(channel);
        state.played.push(PlayRecord {
            name: sound.name.clone(),
            channel,
        });
        Ok(Some(channel))
    }

    fn poll_finished(&mut self) -> Vec<usize> {
        let mut state = self.state.lock();
        let finished = std::mem::take(&mut state.finished);
        for &channel in &finished {
            state.busy[channel] = false;
        }
        finished
    }
}

//=== ChannelInput ========================================================

/// Input source fed through a channel.
///
/// Pair it with a [`WinitBridge`](super::WinitBridge) on the main thread,
/// or push events directly in tests.
#[derive(Debug)]
pub struct ChannelInput {
    receiver: Receiver<RawEvent>,
}

impl ChannelInput {
    pub fn new() -> (Self, Sender<RawEvent>) {
        let (sender, receiver) = unbounded();
        (Self { receiver }, sender)
    }

    pub fn from_receiver(receiver: Receiver<RawEvent>) -> Self {
        Self { receiver }
    }
}

impl InputSource for ChannelInput {
    fn poll(&mut self) -> Vec<RawEvent> {
        self.receiver.try_iter().collect()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    //--- HeadlessTarget ---------------------------------------------------

    #[test]
    fn frames_are_committed_on_present() {
        let handle = HeadlessTarget::new((100, 50));
        let mut target = handle.clone();
        let image = RgbaImage::new(4, 2);

        target.clear(Color::NAVY);
        target.draw(DrawCall {
            image: &image,
            center: Vec2::new(50.0, 25.0),
            rotation: 90.0,
            opacity: 128,
            blend_mode: BlendMode::Add,
        });
        assert_eq!(handle.frame_count(), 0);

        target.present().unwrap();
        let frame = handle.last_frame().unwrap();
        assert_eq!(frame.background, Color::NAVY);
        assert_eq!(frame.draws.len(), 1);
        assert_eq!(frame.draws[0].size, (4, 2));
        assert_eq!(frame.draws[0].opacity, 128);
    }

    #[test]
    fn resize_is_visible_through_every_handle() {
        let handle = HeadlessTarget::new((100, 50));
        let target = handle.clone();
        handle.set_size((640, 480));
        assert_eq!(target.size(), (640, 480));
    }

    //--- HeadlessMixer ----------------------------------------------------

    fn beep() -> SoundData {
        SoundData {
            name: "beep.wav".into(),
            bytes: Arc::from(&b"RIFF"[..]),
        }
    }

    #[test]
    fn channels_free_up_after_poll() {
        let handle = HeadlessMixer::new(1);
        let mut mixer = handle.clone();

        assert_eq!(mixer.play(&beep()).unwrap(), Some(0));
        assert_eq!(mixer.play(&beep()).unwrap(), None);
        assert_eq!(mixer.poll_finished(), vec![0]);
        assert_eq!(mixer.poll_finished(), Vec::<usize>::new());
        assert_eq!(mixer.play(&beep()).unwrap(), Some(0));
        assert_eq!(handle.played().len(), 2);
    }

    //--- ChannelInput -----------------------------------------------------

    #[test]
    fn poll_drains_in_order() {
        let (mut input, sender) = ChannelInput::new();
        sender.send(RawEvent::Quit).unwrap();
        sender.send(RawEvent::CursorMoved { position: Vec2::ONE }).unwrap();

        assert_eq!(
            input.poll(),
            vec![RawEvent::Quit, RawEvent::CursorMoved { position: Vec2::ONE }]
        );
        assert!(input.poll().is_empty());
    }
}
