//=========================================================================
// Renderer
//=========================================================================
//
// Paces frames off `Idle` and draws the current scene on `Render`.
//
// Frame pacing:
//   render_clock += idle.time_delta
//   if render_clock >= 1 / target_frame_rate:
//       render_clock = 0
//       signal PreRender, then Render
//
// Drawing (on Render):
//   1. main camera viewport ← target size
//   2. clear with the scene background
//   3. for each direct child by ascending layer:
//        skip if no sprite, DoNotRender, or the image is not loaded yet
//        scale so the sprite's short side spans short_side * pixel_ratio px
//        draw centered at the camera's viewport position
//   4. present
//
// Scaled images are cached per (asset, pixel size). Entries not used in
// a frame are dropped at the end of the next one.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{Subsystem, SubsystemContext};
use crate::core::assets::{AssetId, AssetStatus};
use crate::core::errors::{EngineError, HandlerResult};
use crate::core::events::{EventContext, Handlers, Idle, PreRender, Render};
use crate::core::objects::GameObject;
use crate::core::scene::{Camera, Scene, Sprite};
use crate::platform::{DrawCall, RenderTarget};

//=== Renderer ============================================================

type SurfaceKey = (AssetId, (u32, u32));

pub struct Renderer {
    handlers: Handlers,
    target: Box<dyn RenderTarget>,
    frame_interval: f64,
    render_clock: f64,

    cache: HashMap<SurfaceKey, Arc<RgbaImage>>,
    previous: HashMap<SurfaceKey, Arc<RgbaImage>>,

    /// Failed assets already reported.
    warned: HashSet<AssetId>,
}

impl Renderer {
    /// # Panics
    ///
    /// Panics if `target_frame_rate` is not positive.
    pub fn new(target: Box<dyn RenderTarget>, target_frame_rate: f64) -> Self {
        assert!(
            target_frame_rate > 0.0,
            "Target frame rate must be positive, got {}",
            target_frame_rate
        );
        Self {
            handlers: Handlers::new().on(Self::on_idle).on(Self::on_render),
            target,
            frame_interval: 1.0 / target_frame_rate,
            render_clock: 0.0,
            cache: HashMap::new(),
            previous: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    pub fn from_context(ctx: &SubsystemContext<'_>) -> Result<Self, EngineError> {
        Ok(Self::new(ctx.open_render_target()?, ctx.options.target_frame_rate))
    }

    /// Seconds between frames.
    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    /// Scaled images currently cached.
    pub fn cached_surfaces(&self) -> usize {
        self.cache.len()
    }

    //--- Handlers ---------------------------------------------------------

    fn on_idle(&mut self, event: &Idle, ctx: &mut EventContext<'_>) -> HandlerResult {
        self.render_clock += event.time_delta;
        if self.render_clock >= self.frame_interval {
            self.render_clock = 0.0;
            ctx.signal(PreRender);
            ctx.signal(Render);
        }
        Ok(())
    }

    fn on_render(&mut self, _event: &Render, ctx: &mut EventContext<'_>) -> HandlerResult {
        let Some(scene) = ctx.current_scene_mut() else {
            return Ok(());
        };
        self.render_scene(scene)?;
        Ok(())
    }

    //--- Drawing ----------------------------------------------------------

    /// Draws one frame of `scene`.
    pub fn render_scene(&mut self, scene: &mut Scene) -> Result<(), EngineError> {
        let (width, height) = self.target.size();
        if let Some(camera) = scene.main_camera_mut() {
            camera.set_viewport(width, height);
        }
        let camera = scene.main_camera().cloned().unwrap_or_default();

        self.target.clear(scene.background_color);
        self.previous = std::mem::take(&mut self.cache);

        for object in scene.sprite_layers() {
            if let Some(sprite) = object.sprite() {
                self.draw_sprite(sprite, &camera);
            }
        }

        self.previous.clear();
        self.target.present()?;
        Ok(())
    }

    fn draw_sprite(&mut self, sprite: &Sprite, camera: &Camera) {
        let Some(asset) = sprite.image.current() else {
            return;
        };

        let Some(image) = asset.try_get() else {
            if asset.status() == AssetStatus::Failed && self.warned.insert(asset.id()) {
                warn!(
                    target: "systems::renderer",
                    "Image {} failed to load, sprite skipped: {:?}",
                    asset.name(),
                    asset.error()
                );
            }
            return;
        };

        let size = scaled_size(&image, sprite, camera);
        let Some(surface) = self.surface(asset.id(), &image, size) else {
            return;
        };

        self.target.draw(DrawCall {
            image: &surface,
            center: camera.translate_to_viewport(sprite.position),
            rotation: sprite.rotation,
            opacity: sprite.opacity,
            blend_mode: sprite.blend_mode,
        });
    }

    /// The image resized to `size`, from the cache when possible.
    fn surface(&mut self, id: AssetId, image: &RgbaImage, size: (u32, u32)) -> Option<Arc<RgbaImage>> {
        if size.0 == 0 || size.1 == 0 {
            return None;
        }

        let key = (id, size);
        if let Some(surface) = self.cache.get(&key) {
            return Some(Arc::clone(surface));
        }

        let surface = match self.previous.remove(&key) {
            Some(surface) => surface,
            None => Arc::new(imageops::resize(image, size.0, size.1, FilterType::Nearest)),
        };
        self.cache.insert(key, Arc::clone(&surface));
        Some(surface)
    }
}

/// Pixel size that makes the image's short side span the sprite's short
/// side on screen, keeping its aspect ratio.
fn scaled_size(image: &RgbaImage, sprite: &Sprite, camera: &Camera) -> (u32, u32) {
    let (width, height) = image.dimensions();
    let source_short = width.min(height).max(1) as f32;
    let scale = sprite.short_side() * camera.pixel_ratio / source_short;
    (
        (width as f32 * scale).round() as u32,
        (height as f32 * scale).round() as u32,
    )
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("frame_interval", &self.frame_interval)
            .field("render_clock", &self.render_clock)
            .field("cached_surfaces", &self.cache.len())
            .finish()
    }
}

impl GameObject for Renderer {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }
}

impl Subsystem for Renderer {
    fn activate(&mut self) -> Result<(), EngineError> {
        let (width, height) = self.target.size();
        debug!(target: "systems::renderer", "renderer active, {}x{} target", width, height);
        self.render_clock = 0.0;
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), EngineError> {
        self.cache.clear();
        self.previous.clear();
        self.warned.clear();
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::{AssetLoader, Image, MemoryFs, Shape};
    use crate::core::color::Color;
    use crate::core::events::{invoke, EventQueue};
    use crate::core::scene::{BlendMode, ImageSource};
    use crate::platform::HeadlessTarget;
    use glam::Vec2;
    use std::time::Duration;

    //--- Test Helpers -----------------------------------------------------

    fn renderer(size: (u32, u32)) -> (Renderer, HeadlessTarget) {
        let target = HeadlessTarget::new(size);
        (Renderer::new(Box::new(target.clone()), 60.0), target)
    }

    fn loaded_square(loader: &AssetLoader) -> crate::core::assets::Asset<Image> {
        let asset = Shape::Square.asset_with(loader, Color::RED);
        asset.load_timeout(Some(Duration::from_secs(5))).unwrap();
        asset
    }

    fn running_loader() -> AssetLoader {
        let loader = AssetLoader::new(MemoryFs::new());
        loader.start().unwrap();
        loader
    }

    //--- Pacing -----------------------------------------------------------

    #[test]
    fn idle_paces_pre_render_and_render() {
        let (mut renderer, _target) = renderer((800, 600));
        let mut queue = EventQueue::new();
        let mut commands = Vec::new();

        for time_delta in [0.01, 0.01] {
            let mut ctx = EventContext::new(&mut queue, None, None, &mut commands);
            invoke(&mut renderer, "on_idle", &Idle { time_delta }, &mut ctx).unwrap();
        }

        assert_eq!(queue.pending_names(), vec!["PreRender", "Render"]);
    }

    #[test]
    #[should_panic(expected = "Target frame rate must be positive")]
    fn zero_frame_rate_panics() {
        Renderer::new(Box::new(HeadlessTarget::new((1, 1))), 0.0);
    }

    //--- Drawing ----------------------------------------------------------

    #[test]
    fn render_draws_loaded_sprites_in_layer_order() {
        let loader = running_loader();
        let image = loaded_square(&loader);
        let (mut renderer, target) = renderer((640, 480));

        let mut scene = Scene::new().with_background(Color::BLACK);
        scene.add(
            Sprite::new()
                .with_image(image.clone())
                .with_layer(2.0)
                .with_position(Vec2::new(1.0, 0.0))
                .with_blend_mode(BlendMode::Add),
        );
        scene.add(Sprite::new().with_image(image).with_layer(-1.0).with_size(2.0));
        scene.add(Sprite::new());

        renderer.render_scene(&mut scene).unwrap();

        let frame = target.last_frame().unwrap();
        assert_eq!(frame.background, Color::BLACK);
        assert_eq!(frame.draws.len(), 2);

        // Default camera: 64 px per unit, viewport updated to the target.
        assert_eq!(frame.draws[0].size, (128, 128));
        assert_eq!(frame.draws[0].center, Vec2::new(320.0, 240.0));
        assert_eq!(frame.draws[1].size, (64, 64));
        assert_eq!(frame.draws[1].center, Vec2::new(384.0, 240.0));
        assert_eq!(frame.draws[1].blend_mode, BlendMode::Add);

        let camera = scene.main_camera().unwrap();
        assert_eq!((camera.viewport_width, camera.viewport_height), (640, 480));
        loader.shutdown();
    }

    #[test]
    fn unloaded_images_are_skipped() {
        let loader = AssetLoader::new(MemoryFs::new());
        let pending = loader.asset::<Image>("never-started.png");
        let (mut renderer, target) = renderer((100, 100));

        let mut scene = Scene::new();
        scene.add(Sprite::new().with_image(ImageSource::from(pending)));
        renderer.render_scene(&mut scene).unwrap();

        assert!(target.last_frame().unwrap().draws.is_empty());
    }

    #[test]
    fn scaled_surfaces_are_cached_and_evicted() {
        let loader = running_loader();
        let image = loaded_square(&loader);
        let (mut renderer, _target) = renderer((200, 200));

        let mut scene = Scene::new();
        let id = scene.add(Sprite::new().with_image(image));
        renderer.render_scene(&mut scene).unwrap();
        renderer.render_scene(&mut scene).unwrap();
        assert_eq!(renderer.cached_surfaces(), 1);

        scene.remove(id).unwrap();
        renderer.render_scene(&mut scene).unwrap();
        assert_eq!(renderer.cached_surfaces(), 0);
        loader.shutdown();
    }

    #[test]
    fn render_without_scene_is_a_no_op() {
        let (mut renderer, target) = renderer((100, 100));
        let mut queue = EventQueue::new();
        let mut commands = Vec::new();
        let mut ctx = EventContext::new(&mut queue, None, None, &mut commands);

        invoke(&mut renderer, "on_render", &Render, &mut ctx).unwrap();
        assert_eq!(target.frame_count(), 0);
    }

    #[test]
    fn rectangular_images_keep_aspect_ratio() {
        let image = RgbaImage::new(20, 10);
        let sprite = Sprite::new().with_size(2.0);
        let camera = Camera::new((100, 100), 10.0);
        assert_eq!(scaled_size(&image, &sprite, &camera), (40, 20));
    }
}
