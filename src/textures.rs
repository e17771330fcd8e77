use crate::error::Result;
use glam::{vec3, Vec3};
use image::RgbImage;
use log::info;
use std::{fmt::Debug, path::Path};

pub trait Texture: Debug + Send + Sync {
    fn value(&self, u: f32, v: f32, point: Vec3) -> Vec3;
}

/// A texture with a constant uniform color
#[derive(Debug)]
pub struct UniformTexture {
    color: Vec3,
}

impl UniformTexture {
    pub fn new(color: Vec3) -> Self {
        Self { color }
    }
}

impl Texture for UniformTexture {
    fn value(&self, _u: f32, _v: f32, _point: Vec3) -> Vec3 {
        self.color
    }
}

#[derive(Debug)]
pub struct ImageTexture {
    image: RgbImage,
}

impl ImageTexture {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgb();
        info!(
            "Loaded texture {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        Ok(Self::new(image))
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f32, v: f32, _point: Vec3) -> Vec3 {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return vec3(0.0, 1.0, 1.0);
        }

        // Image rows run top to bottom
        let u = u.max(0.0).min(1.0);
        let v = 1.0 - v.max(0.0).min(1.0);

        let x = ((u * width as f32) as u32).min(width - 1);
        let y = ((v * height as f32) as u32).min(height - 1);

        let [r, g, b] = self.image.get_pixel(x, y).0;

        let r = r as f32 / 255.0;
        let g = g as f32 / 255.0;
        let b = b as f32 / 255.0;

        vec3(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn uniform_ignores_coordinates() {
        let texture = UniformTexture::new(vec3(0.1, 0.2, 0.3));
        assert_eq!(texture.value(0.9, 0.1, Vec3::one()), vec3(0.1, 0.2, 0.3));
    }

    #[test]
    fn image_lookup_flips_v_and_clamps() {
        let mut image = RgbImage::new(2, 2);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 255, 0]));
        image.put_pixel(0, 1, Rgb([0, 0, 255]));
        image.put_pixel(1, 1, Rgb([255, 255, 255]));
        let texture = ImageTexture::new(image);

        // v = 1 is the top row
        assert_eq!(texture.value(0.0, 1.0, Vec3::zero()), vec3(1.0, 0.0, 0.0));
        assert_eq!(texture.value(1.0, 1.0, Vec3::zero()), vec3(0.0, 1.0, 0.0));
        assert_eq!(texture.value(0.0, 0.0, Vec3::zero()), vec3(0.0, 0.0, 1.0));
        assert_eq!(texture.value(2.0, -1.0, Vec3::zero()), vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn missing_image_is_an_error() {
        assert!(ImageTexture::open("no/such/texture.png").is_err());
    }
}
