//! Texture loading for tile array layers

use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// Loaded RGBA8 texture data
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let img = image::open(path.as_ref()).map_err(|e| e.to_string())?;
        Ok(Self::from_image(img))
    }

    /// Load texture from encoded bytes (PNG, JPEG, ...)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        Ok(Self::from_image(img))
    }

    fn from_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.to_rgba8().into_raw();
        Self {
            width,
            height,
            data,
        }
    }

    /// Create from raw RGBA8 pixels
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, String> {
        if data.len() != (width * height * 4) as usize {
            return Err(format!(
                "pixel data length {} does not match {}x{} RGBA8",
                data.len(),
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a solid color texture
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Create a default white texture
    pub fn white(width: u32, height: u32) -> Self {
        Self::solid_color(width, height, [255, 255, 255, 255])
    }

    /// Create a two color checkerboard texture
    pub fn checkerboard(width: u32, height: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                data.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Resample to new dimensions
    ///
    /// Nearest-neighbor keeps tile texel edges crisp when snapping imagery
    /// to the fixed layer size.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }

        // Pixel data length is validated by every constructor
        let Some(img) = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
        else {
            return self.clone();
        };
        let resampled =
            image::imageops::resize(&img, width, height, image::imageops::FilterType::Nearest);

        Self {
            width,
            height,
            data: resampled.into_raw(),
        }
    }
}
