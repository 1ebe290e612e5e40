//=========================================================================
// Built-in Asset Kinds
//=========================================================================
//
// Image   PNG files decoded to RGBA8; a magenta square stands in for
//         missing files
// Sound   raw bytes handed to the mixer
// Shape   procedural images rasterized on the loader pool
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::warn;

//=== Internal Dependencies ===============================================

use super::{AssetKind, AssetLoader, Asset};
use crate::core::color::Color;
use crate::core::errors::AssetError;

/// Side length of placeholder and procedural images, in pixels.
const GENERATED_SIZE: u32 = 64;

//=== Image ===============================================================

/// A decoded RGBA image.
#[derive(Debug, Clone, Copy)]
pub struct Image;

impl AssetKind for Image {
    type Output = RgbaImage;

    fn background_parse(name: &str, bytes: Vec<u8>) -> Result<RgbaImage, AssetError> {
        image::load_from_memory(&bytes)
            .map(|decoded| decoded.to_rgba8())
            .map_err(|error| AssetError::parse(name, error))
    }

    fn file_missing(name: &str) -> Option<RgbaImage> {
        warn!(target: "assets", "image {:?} not found, using placeholder", name);
        Some(RgbaImage::from_pixel(
            GENERATED_SIZE,
            GENERATED_SIZE,
            Rgba(Color::MAGENTA.to_rgba()),
        ))
    }
}

//=== Sound ===============================================================

/// Encoded audio, decoded by the platform mixer.
#[derive(Debug, Clone, Copy)]
pub struct Sound;

/// Loaded sound file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundData {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl AssetKind for Sound {
    type Output = SoundData;

    fn background_parse(name: &str, bytes: Vec<u8>) -> Result<SoundData, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::parse(name, "empty sound file"));
        }
        Ok(SoundData {
            name: name.to_string(),
            bytes: bytes.into(),
        })
    }
}

//=== Shape ===============================================================

/// Procedurally drawn image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Square,
    Circle,

    /// Apex at the top of the image.
    Triangle,
}

impl Shape {
    fn label(self) -> &'static str {
        match self {
            Shape::Square => "square",
            Shape::Circle => "circle",
            Shape::Triangle => "triangle",
        }
    }

    /// Shape image on the process-wide loader.
    pub fn asset(self, color: impl Into<Color>) -> Asset<Image> {
        self.asset_with(&AssetLoader::global(), color)
    }

    /// Shape image on `loader`. Equal shape and color share one asset.
    pub fn asset_with(self, loader: &AssetLoader, color: impl Into<Color>) -> Asset<Image> {
        let color = color.into();
        let name = format!("shape:{}/{},{},{}", self.label(), color.r, color.g, color.b);
        loader.chained::<Image, _>(name, Vec::new(), move || Ok(self.rasterize(color)))
    }

    /// Draws the shape on a transparent square canvas.
    pub fn rasterize(self, color: Color) -> RgbaImage {
        let size = GENERATED_SIZE as f32;
        let half = size / 2.0;
        let fill = Rgba(color.to_rgba());

        RgbaImage::from_fn(GENERATED_SIZE, GENERATED_SIZE, |x, y| {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let inside = match self {
                Shape::Square => true,
                Shape::Circle => (px - half).powi(2) + (py - half).powi(2) <= half * half,
                Shape::Triangle => (px - half).abs() <= py / size * half,
            };
            if inside {
                fill
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::MemoryFs;
    use std::time::Duration;

    const WAIT: Option<Duration> = Some(Duration::from_secs(5));

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn images_decode_to_rgba() {
        let loader = AssetLoader::with_workers(MemoryFs::new().with("tile.png", encoded_png(3, 2)), 1);
        loader.start().unwrap();

        let image = loader.asset::<Image>("tile.png").load_timeout(WAIT).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn missing_images_become_placeholders() {
        let loader = AssetLoader::with_workers(MemoryFs::new(), 1);
        loader.start().unwrap();

        let image = loader.asset::<Image>("missing.png").load_timeout(WAIT).unwrap();
        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(image.get_pixel(10, 10), &Rgba([255, 0, 255, 255]));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let loader = AssetLoader::with_workers(MemoryFs::new().with("bad.png", b"nope".to_vec()), 1);
        loader.start().unwrap();
        let result = loader.asset::<Image>("bad.png").load_timeout(WAIT);
        assert!(matches!(result, Err(AssetError::Parse { .. })));
    }

    #[test]
    fn sounds_keep_raw_bytes() {
        let loader = AssetLoader::with_workers(MemoryFs::new().with("beep.ogg", vec![1, 2, 3]), 1);
        loader.start().unwrap();
        let sound = loader.asset::<Sound>("beep.ogg").load_timeout(WAIT).unwrap();
        assert_eq!(&*sound.bytes, &[1, 2, 3]);
    }

    #[test]
    fn circle_leaves_corners_transparent() {
        let circle = Shape::Circle.rasterize(Color::RED);
        assert_eq!(circle.get_pixel(0, 0)[3], 0);
        assert_eq!(circle.get_pixel(32, 32), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn triangle_points_up() {
        let triangle = Shape::Triangle.rasterize(Color::GREEN);
        assert_eq!(triangle.get_pixel(2, 1)[3], 0);
        assert_eq!(triangle.get_pixel(32, 1)[3], 255);
        assert_eq!(triangle.get_pixel(1, 63)[3], 255);
    }

    #[test]
    fn equal_shapes_share_an_asset() {
        let loader = AssetLoader::with_workers(MemoryFs::new(), 1);
        let a = Shape::Square.asset_with(&loader, Color::BLUE);
        let b = Shape::Square.asset_with(&loader, (0, 0, 255));
        let c = Shape::Circle.asset_with(&loader, Color::BLUE);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.name(), "shape:square/0,0,255");

        loader.start().unwrap();
        assert_eq!(a.load_timeout(WAIT).unwrap().dimensions(), (64, 64));
    }
}
