//=========================================================================
// Sprite
//=========================================================================
//
// The renderable game object. The renderer reads:
//
//   position   world-space center
//   width/height (equal for square sprites)
//   rotation   degrees clockwise
//   image      asset, animation or DoNotRender
//   layer      draw order (lower first)
//   opacity, blend_mode
//
// World axes: +x right, +y up.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec2;

//=== Internal Dependencies ===============================================

use crate::core::assets::{Animation, Asset, Image};
use crate::core::objects::GameObject;

//=== BlendMode ===========================================================

/// How a sprite's pixels combine with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Alpha blending.
    #[default]
    Blend,

    /// Additive blending.
    Add,

    /// Color modulation.
    Modulate,

    /// Overwrite the destination.
    None,
}

//=== ImageSource =========================================================

/// What the renderer draws for a sprite.
#[derive(Debug, Clone, Default)]
pub enum ImageSource {
    Image(Asset<Image>),
    Animation(Animation),

    /// Skip this sprite.
    #[default]
    DoNotRender,
}

impl ImageSource {
    /// The image to draw right now, if any.
    pub fn current(&self) -> Option<Asset<Image>> {
        match self {
            ImageSource::Image(image) => Some(image.clone()),
            ImageSource::Animation(animation) => animation.current_frame().cloned(),
            ImageSource::DoNotRender => None,
        }
    }
}

impl From<Asset<Image>> for ImageSource {
    fn from(image: Asset<Image>) -> Self {
        ImageSource::Image(image)
    }
}

impl From<Animation> for ImageSource {
    fn from(animation: Animation) -> Self {
        ImageSource::Animation(animation)
    }
}

//=== Sprite ==============================================================

/// A positioned, optionally rotated image.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,

    /// Degrees clockwise.
    pub rotation: f32,

    pub image: ImageSource,
    pub layer: f32,
    pub opacity: u8,
    pub blend_mode: BlendMode,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            width: 1.0,
            height: 1.0,
            rotation: 0.0,
            image: ImageSource::DoNotRender,
            layer: 0.0,
            opacity: 255,
            blend_mode: BlendMode::Blend,
        }
    }
}

impl Sprite {
    /// A unit square sprite at the origin that does not render.
    pub fn new() -> Self {
        Self::default()
    }

    /// A rectangular sprite.
    ///
    /// # Panics
    ///
    /// Panics if either side is not positive.
    pub fn rectangle(width: f32, height: f32) -> Self {
        assert!(width > 0.0 && height > 0.0, "Sprite sides must be positive, got {}x{}", width, height);
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    //--- Builders ---------------------------------------------------------

    pub fn with_image(mut self, image: impl Into<ImageSource>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Makes the sprite a square of side `size`.
    ///
    /// # Panics
    ///
    /// Panics if `size <= 0.0`.
    pub fn with_size(mut self, size: f32) -> Self {
        assert!(size > 0.0, "Sprite size must be positive, got {}", size);
        self.width = size;
        self.height = size;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees.rem_euclid(360.0);
        self
    }

    pub fn with_layer(mut self, layer: f32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    //--- Geometry ---------------------------------------------------------

    /// Side length of a square sprite; the shorter side otherwise.
    pub fn short_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub fn left(&self) -> f32 {
        self.position.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.position.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.position.y - self.height / 2.0
    }

    /// Turns the sprite clockwise by `degrees`.
    pub fn rotate(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    /// Unit vector the sprite faces. Rotation 0 faces +y.
    pub fn facing(&self) -> Vec2 {
        let radians = self.rotation.to_radians();
        Vec2::new(radians.sin(), radians.cos())
    }
}

impl GameObject for Sprite {
    fn sprite(&self) -> Option<&Sprite> {
        Some(self)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn edges_follow_position_and_size() {
        let sprite = Sprite::rectangle(4.0, 2.0).with_position(Vec2::new(1.0, 1.0));
        assert_eq!(sprite.left(), -1.0);
        assert_eq!(sprite.right(), 3.0);
        assert_eq!(sprite.top(), 2.0);
        assert_eq!(sprite.bottom(), 0.0);
        assert_eq!(sprite.short_side(), 2.0);
        assert!(!sprite.is_square());
    }

    #[test]
    fn rotation_is_clockwise_and_wraps() {
        let mut sprite = Sprite::new();
        assert!(close(sprite.facing(), Vec2::new(0.0, 1.0)));

        sprite.rotate(90.0);
        assert!(close(sprite.facing(), Vec2::new(1.0, 0.0)));

        sprite.rotate(300.0);
        assert_eq!(sprite.rotation, 30.0);

        sprite.rotate(-60.0);
        assert_eq!(sprite.rotation, 330.0);
    }

    #[test]
    fn do_not_render_has_no_current_image() {
        assert!(Sprite::new().image.current().is_none());
    }

    #[test]
    fn sprite_reports_its_layer() {
        let sprite = Sprite::new().with_layer(3.5);
        let object: &dyn GameObject = &sprite;
        assert_eq!(object.layer(), 3.5);
        assert!(object.sprite().is_some());
    }

    #[test]
    #[should_panic(expected = "Sprite size must be positive")]
    fn zero_size_panics() {
        Sprite::new().with_size(0.0);
    }
}
