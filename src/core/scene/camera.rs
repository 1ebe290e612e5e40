//=========================================================================
// Camera
//=========================================================================
//
// Maps between world units and window pixels.
//
//   world ──translate_to_viewport──> pixels
//   pixels ──translate_to_frame──> world
//
// The camera's `position` is the world point shown at the center of the
// viewport. One world unit spans `pixel_ratio` pixels.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec2;

//=== Internal Dependencies ===============================================

use super::Sprite;
use crate::core::objects::GameObject;

//=== Camera ==============================================================

/// Viewport into the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World point at the center of the viewport.
    pub position: Vec2,

    /// Viewport width in pixels.
    pub viewport_width: u32,

    /// Viewport height in pixels.
    pub viewport_height: u32,

    /// Pixels per world unit.
    pub pixel_ratio: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            viewport_width: 800,
            viewport_height: 600,
            pixel_ratio: 64.0,
        }
    }
}

impl Camera {
    /// # Panics
    ///
    /// Panics if `pixel_ratio <= 0.0`.
    pub fn new(viewport: (u32, u32), pixel_ratio: f32) -> Self {
        assert!(pixel_ratio > 0.0, "Pixel ratio must be positive, got {}", pixel_ratio);
        Self {
            position: Vec2::ZERO,
            viewport_width: viewport.0,
            viewport_height: viewport.1,
            pixel_ratio,
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// # Panics
    ///
    /// Panics if `pixel_ratio <= 0.0`.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        assert!(pixel_ratio > 0.0, "Pixel ratio must be positive, got {}", pixel_ratio);
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    //--- Frame ------------------------------------------------------------

    /// Visible width in world units.
    pub fn frame_width(&self) -> f32 {
        self.viewport_width as f32 / self.pixel_ratio
    }

    /// Visible height in world units.
    pub fn frame_height(&self) -> f32 {
        self.viewport_height as f32 / self.pixel_ratio
    }

    pub fn frame_left(&self) -> f32 {
        self.position.x - self.frame_width() / 2.0
    }

    pub fn frame_right(&self) -> f32 {
        self.position.x + self.frame_width() / 2.0
    }

    /// Lower y bound of the frame. `frame_top < frame_bottom`.
    pub fn frame_top(&self) -> f32 {
        self.position.y - self.frame_height() / 2.0
    }

    pub fn frame_bottom(&self) -> f32 {
        self.position.y + self.frame_height() / 2.0
    }

    /// Whether any part of `sprite` is inside the frame.
    pub fn in_frame(&self, sprite: &Sprite) -> bool {
        sprite.left() <= self.frame_right()
            && sprite.right() >= self.frame_left()
            && sprite.bottom() <= self.frame_bottom()
            && sprite.top() >= self.frame_top()
    }

    //--- Translation ------------------------------------------------------

    /// Center of the viewport in pixels.
    pub fn viewport_center(&self) -> Vec2 {
        Vec2::new(self.viewport_width as f32, self.viewport_height as f32) / 2.0
    }

    /// Pixel coordinates to world coordinates.
    pub fn translate_to_frame(&self, point: Vec2) -> Vec2 {
        self.position + (point - self.viewport_center()) / self.pixel_ratio
    }

    /// World coordinates to pixel coordinates.
    pub fn translate_to_viewport(&self, point: Vec2) -> Vec2 {
        (point - self.position) * self.pixel_ratio + self.viewport_center()
    }
}

impl GameObject for Camera {}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_80() -> Camera {
        Camera::new((800, 600), 80.0)
    }

    //--- Translation ------------------------------------------------------

    #[test]
    fn viewport_center_maps_to_camera_position() {
        let camera = camera_80();
        assert_eq!(camera.translate_to_frame(Vec2::new(400.0, 300.0)), Vec2::ZERO);
        assert_eq!(camera.translate_to_viewport(Vec2::ZERO), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn pixel_offsets_scale_by_ratio() {
        let camera = camera_80();
        assert_eq!(camera.translate_to_frame(Vec2::new(560.0, 220.0)), Vec2::new(2.0, -1.0));
        assert_eq!(camera.translate_to_viewport(Vec2::new(2.0, -1.0)), Vec2::new(560.0, 220.0));
    }

    #[test]
    fn translation_follows_camera_position() {
        let camera = camera_80().with_position(Vec2::new(10.0, 5.0));
        assert_eq!(camera.translate_to_frame(Vec2::new(400.0, 300.0)), Vec2::new(10.0, 5.0));
        assert_eq!(camera.translate_to_viewport(Vec2::new(11.0, 5.0)), Vec2::new(480.0, 300.0));
    }

    //--- Frame ------------------------------------------------------------

    #[test]
    fn frame_width_is_viewport_over_ratio() {
        let camera = camera_80();
        assert_eq!(camera.frame_width(), 10.0);
        assert_eq!(camera.frame_height(), 7.5);
        assert_eq!(camera.frame_left(), -5.0);
        assert_eq!(camera.frame_right(), 5.0);
        assert_eq!(camera.frame_top(), -3.75);
        assert_eq!(camera.frame_bottom(), 3.75);
    }

    #[test]
    fn in_frame_checks_overlap() {
        let camera = camera_80();
        assert!(camera.in_frame(&Sprite::new()));
        assert!(camera.in_frame(&Sprite::new().with_position(Vec2::new(5.4, 0.0))));
        assert!(!camera.in_frame(&Sprite::new().with_position(Vec2::new(6.0, 0.0))));
        assert!(!camera.in_frame(&Sprite::new().with_position(Vec2::new(0.0, -4.5))));
    }

    #[test]
    #[should_panic(expected = "Pixel ratio must be positive")]
    fn non_positive_ratio_panics() {
        Camera::new((800, 600), 0.0);
    }
}
