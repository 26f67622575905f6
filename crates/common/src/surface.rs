use glam::UVec2;
use image::{Rgba as Pixel, RgbaImage, imageops};
use std::path::Path;

/// RGBA color, one byte per channel.
pub type Rgba = [u8; 4];

/// An owned RGBA pixel surface.
///
/// Thin wrapper around [`RgbaImage`] with the handful of blit and line
/// operations the tile renderer needs. All blits clip against the
/// destination; nothing ever reads or writes outside either surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Fill color of freshly allocated surfaces (opaque black).
    pub const BACKGROUND: Rgba = [0, 0, 0, 255];

    /// Create a surface filled with [`Surface::BACKGROUND`].
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Self::BACKGROUND)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Pixel(color)),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width(), self.height())
    }

    /// Pixel at (x, y), or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(p) = self.image.get_pixel_mut_checked(x, y) {
            *p = Pixel(color);
        }
    }

    /// Copy `src` verbatim with its top-left corner at (x, y).
    pub fn blit(&mut self, src: &Surface, x: i64, y: i64) {
        imageops::replace(&mut self.image, &src.image, x, y);
    }

    /// Draw `src` over this surface at (x, y).
    ///
    /// Fully transparent source pixels leave the destination untouched and
    /// opaque ones overwrite it.
    pub fn overlay(&mut self, src: &Surface, x: i64, y: i64) {
        imageops::overlay(&mut self.image, &src.image, x, y);
    }

    /// Copy out the `width` x `height` region at (x, y), clamped to the surface.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Surface {
        Surface {
            image: imageops::crop_imm(&self.image, x, y, width, height).to_image(),
        }
    }

    /// Horizontal line spanning the full width at row `y`.
    pub fn hline(&mut self, y: u32, color: Rgba) {
        for x in 0..self.width() {
            self.set_pixel(x, y, color);
        }
    }

    /// Vertical line spanning the full height at column `x`.
    pub fn vline(&mut self, x: u32, color: Rgba) {
        for y in 0..self.height() {
            self.set_pixel(x, y, color);
        }
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }
}
