use std::path::Path;
use std::sync::Arc;

use image::RgbImage;

use crate::geometry::{Color, FloatType, WorldPoint};

/// Spatially varying color source. Textures are the one deliberately shared
/// resource in the scene: materials hold them by `Arc`.
pub trait Texture: Send + Sync {
    fn color(&self, u: FloatType, v: FloatType, position: &WorldPoint) -> Color;
}

pub struct SolidColor {
    color: Color,
}

impl SolidColor {
    pub fn new(r: FloatType, g: FloatType, b: FloatType) -> SolidColor {
        SolidColor {
            color: Color::new(r, g, b),
        }
    }
}

impl From<Color> for SolidColor {
    fn from(color: Color) -> SolidColor {
        SolidColor { color }
    }
}

impl Texture for SolidColor {
    fn color(&self, _u: FloatType, _v: FloatType, _position: &WorldPoint) -> Color {
        self.color
    }
}

/// Selects between two sub-textures based on the sign of a 3D sine product,
/// producing the classic world-space checker pattern.
pub struct Checker {
    negative: Arc<dyn Texture>,
    positive: Arc<dyn Texture>,
}

impl Checker {
    pub fn new(negative: Arc<dyn Texture>, positive: Arc<dyn Texture>) -> Checker {
        Checker { negative, positive }
    }
}

impl Texture for Checker {
    fn color(&self, u: FloatType, v: FloatType, position: &WorldPoint) -> Color {
        let s = position.x.sin() * position.y.sin() * position.z.sin();
        if s < 0.0 {
            self.negative.color(u, v, position)
        } else {
            self.positive.color(u, v, position)
        }
    }
}

/// Nearest-pixel image lookup with clamped, v-flipped UV.
pub struct ImageTexture {
    image: Option<RgbImage>,
}

impl ImageTexture {
    /// A missing or undecodable file degrades to a black texture instead of
    /// failing the render.
    pub fn open(path: impl AsRef<Path>) -> ImageTexture {
        let image = match image::open(path.as_ref()) {
            Ok(image) => Some(image.into_rgb8()),
            Err(err) => {
                log::warn!(
                    "loading image texture {} failed ({err}), substituting black",
                    path.as_ref().display()
                );
                None
            }
        };
        ImageTexture { image }
    }

    pub fn from_image(image: RgbImage) -> ImageTexture {
        ImageTexture { image: Some(image) }
    }
}

impl Texture for ImageTexture {
    fn color(&self, u: FloatType, v: FloatType, _position: &WorldPoint) -> Color {
        let Some(image) = &self.image else {
            return Color::zeros();
        };

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        // u == 1 or v == 1 would index one past the last pixel
        let x = ((u * image.width() as FloatType) as u32).min(image.width() - 1);
        let y = ((v * image.height() as FloatType) as u32).min(image.height() - 1);

        let pixel = image.get_pixel(x, y);
        Color::new(
            pixel[0] as FloatType,
            pixel[1] as FloatType,
            pixel[2] as FloatType,
        ) / 255.0
    }
}
