//=========================================================================
// Animation
//=========================================================================
//
// A looping sequence of image assets selected by time.
//
//   frame = floor((now + offset) * fps) mod frame_count
//
// Pausing freezes the frame; unpausing shifts `offset` back by the time
// spent paused so playback resumes on the frozen frame. Pauses nest.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::sync::Arc;

//=== Internal Dependencies ===============================================

use super::{Asset, AssetLoader, Image};
use crate::core::errors::AssetError;
use crate::core::time::{SystemClock, TimeSource};

//=== Pattern Expansion ===================================================

/// Expands `name_{START..END}.ext` into one file name per frame.
///
/// Numbers are zero-padded to the shorter of the two bound literals and
/// the range is inclusive.
///
/// ```
/// use aetheric_2d::core::assets::expand_pattern;
///
/// let frames = expand_pattern("run_{08..10}.png").unwrap();
/// assert_eq!(frames, ["run_08.png", "run_09.png", "run_10.png"]);
/// ```
pub fn expand_pattern(pattern: &str) -> Result<Vec<String>, AssetError> {
    let bad = |reason: &'static str| AssetError::BadPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let open = pattern.find('{').ok_or_else(|| bad("missing '{'"))?;
    let close = pattern[open..]
        .find('}')
        .map(|offset| open + offset)
        .ok_or_else(|| bad("missing '}'"))?;
    let (start, end) = pattern[open + 1..close]
        .split_once("..")
        .ok_or_else(|| bad("missing '..' in range"))?;

    let first: u64 = start.trim().parse().map_err(|_| bad("range start is not an integer"))?;
    let last: u64 = end.trim().parse().map_err(|_| bad("range end is not an integer"))?;
    if first > last {
        return Err(bad("range is empty"));
    }

    let width = start.trim().len().min(end.trim().len());
    let (prefix, suffix) = (&pattern[..open], &pattern[close + 1..]);
    Ok((first..=last)
        .map(|index| format!("{}{:0width$}{}", prefix, index, suffix, width = width))
        .collect())
}

//=== Animation ===========================================================

/// Image source that cycles through frames at `fps`.
#[derive(Clone)]
pub struct Animation {
    frames: Vec<Asset<Image>>,
    fps: f64,
    time: Arc<dyn TimeSource>,
    pause_level: u32,
    paused_frame: usize,
    paused_time: f64,
    offset: f64,
}

impl Animation {
    /// Loads the frames of `pattern` through the process-wide loader.
    pub fn new(pattern: &str, fps: f64) -> Result<Self, AssetError> {
        Self::with_loader(&AssetLoader::global(), pattern, fps, Arc::new(SystemClock::new()))
    }

    /// # Panics
    ///
    /// Panics if `fps <= 0.0`.
    pub fn with_loader(
        loader: &AssetLoader,
        pattern: &str,
        fps: f64,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, AssetError> {
        assert!(fps > 0.0, "Animation fps must be positive, got {}", fps);
        let frames = expand_pattern(pattern)?
            .into_iter()
            .map(|name| loader.asset::<Image>(name))
            .collect();

        Ok(Self {
            frames,
            fps,
            time,
            pause_level: 0,
            paused_frame: 0,
            paused_time: 0.0,
            offset: 0.0,
        })
    }

    pub fn frames(&self) -> &[Asset<Image>] {
        &self.frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn is_paused(&self) -> bool {
        self.pause_level > 0
    }

    fn running_index(&self, now: f64) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        let ticks = ((now + self.offset) * self.fps).floor();
        ticks.rem_euclid(self.frames.len() as f64) as usize
    }

    /// Index of the frame to show now.
    pub fn frame_index(&self) -> usize {
        if self.is_paused() {
            self.paused_frame
        } else {
            self.running_index(self.time.now())
        }
    }

    pub fn current_frame(&self) -> Option<&Asset<Image>> {
        self.frames.get(self.frame_index())
    }

    //--- Pausing ----------------------------------------------------------

    pub fn pause(&mut self) {
        if self.pause_level == 0 {
            let now = self.time.now();
            self.paused_frame = self.running_index(now);
            self.paused_time = now;
        }
        self.pause_level += 1;
    }

    /// Undoes one `pause`. Extra calls are ignored.
    pub fn unpause(&mut self) {
        match self.pause_level {
            0 => {}
            1 => {
                self.pause_level = 0;
                self.offset -= self.time.now() - self.paused_time;
            }
            _ => self.pause_level -= 1,
        }
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("frames", &self.frames.len())
            .field("fps", &self.fps)
            .field("pause_level", &self.pause_level)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::MemoryFs;
    use crate::core::time::ManualClock;

    fn animation(pattern: &str, fps: f64) -> (Animation, ManualClock) {
        let clock = ManualClock::new();
        let loader = AssetLoader::with_workers(MemoryFs::new(), 1);
        let animation = Animation::with_loader(&loader, pattern, fps, Arc::new(clock.clone())).unwrap();
        (animation, clock)
    }

    //--- Patterns ---------------------------------------------------------

    #[test]
    fn pads_to_shorter_bound() {
        assert_eq!(
            expand_pattern("walk_{1..003}.png").unwrap(),
            ["walk_1.png", "walk_2.png", "walk_3.png"]
        );
        assert_eq!(
            expand_pattern("walk_{001..003}.png").unwrap(),
            ["walk_001.png", "walk_002.png", "walk_003.png"]
        );
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for pattern in ["walk.png", "walk_{1..3.png", "walk_{1-3}.png", "walk_{a..3}.png", "walk_{5..3}.png"] {
            assert!(
                matches!(expand_pattern(pattern), Err(AssetError::BadPattern { .. })),
                "{} should be rejected",
                pattern
            );
        }
    }

    //--- Frame Selection --------------------------------------------------

    #[test]
    fn frame_index_is_time_times_fps_mod_count() {
        let (animation, clock) = animation("f_{0..3}.png", 4.0);
        for (time, expected) in [(0.0, 0), (0.25, 1), (0.5, 2), (0.75, 3), (1.0, 0), (2.5, 2)] {
            clock.set(time);
            assert_eq!(animation.frame_index(), expected, "at t={}", time);
        }
        assert!(animation.current_frame().unwrap().ptr_eq(&animation.frames()[2]));
    }

    #[test]
    fn pause_freezes_and_unpause_resumes_at_frozen_frame() {
        let (mut animation, clock) = animation("f_{0..3}.png", 4.0);
        clock.set(0.5);
        animation.pause();
        assert_eq!(animation.frame_index(), 2);

        clock.set(10.0);
        assert_eq!(animation.frame_index(), 2);

        animation.unpause();
        assert_eq!(animation.frame_index(), 2);
        clock.set(10.25);
        assert_eq!(animation.frame_index(), 3);
    }

    #[test]
    fn pauses_nest() {
        let (mut animation, clock) = animation("f_{0..1}.png", 1.0);
        animation.pause();
        animation.pause();
        animation.unpause();
        clock.set(1.0);
        assert!(animation.is_paused());
        assert_eq!(animation.frame_index(), 0);

        animation.unpause();
        animation.unpause();
        assert!(!animation.is_paused());
        assert_eq!(animation.frame_index(), 0);
    }

    #[test]
    fn same_frame_names_share_assets() {
        let clock = ManualClock::new();
        let loader = AssetLoader::with_workers(MemoryFs::new(), 1);
        let a = Animation::with_loader(&loader, "f_{0..1}.png", 1.0, Arc::new(clock.clone())).unwrap();
        let b = Animation::with_loader(&loader, "f_{1..2}.png", 1.0, Arc::new(clock)).unwrap();
        assert!(a.frames()[1].ptr_eq(&b.frames()[0]));
    }
}
