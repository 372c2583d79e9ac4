//! Pixel buffers that frames are encoded from and decoded into,
//! and the `Encoder` and `Decoder` for whole animations.

pub mod read;
pub mod write;

use crate::math::{Vec2, Rect};
use crate::meta::attribute::Disposal;
use crate::meta::palette::{Rgb, Rgba};
use crate::error::{Error, Result};


/// Anything that can provide the pixels of a frame to the encoder,
/// as three bytes per pixel in the order blue, green, red, row by row.
pub trait BgrSource {

    /// Width and height in pixels.
    fn size(&self) -> Vec2<usize>;

    /// Exactly `width * height * 3` bytes.
    fn bgr_bytes(&self) -> &[u8];
}


/// An opaque image stored as blue, green, red bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BgrImage {
    size: Vec2<usize>,
    bytes: Vec<u8>,
}

impl BgrImage {

    /// Use a buffer of blue, green, red bytes as an image.
    /// Returns an error if the buffer does not contain exactly `width * height` pixels.
    pub fn from_bgr(size: impl Into<Vec2<usize>>, bytes: Vec<u8>) -> Result<Self> {
        let size = size.into();

        if bytes.len() != size.area() * 3 {
            return Err(Error::invalid("pixel buffer length does not match image size"));
        }

        Ok(BgrImage { size, bytes })
    }

    /// Copy a buffer of red, green, blue bytes into a new image.
    pub fn from_rgb(size: impl Into<Vec2<usize>>, rgb: &[u8]) -> Result<Self> {
        let mut bytes = rgb.to_vec();
        for pixel in bytes.chunks_exact_mut(3) { pixel.swap(0, 2); }
        Self::from_bgr(size, bytes)
    }

    /// Create an image by computing the color of each pixel.
    pub fn from_fn(size: impl Into<Vec2<usize>>, mut color: impl FnMut(Vec2<usize>) -> Rgb) -> Self {
        let size = size.into();
        let mut bytes = Vec::with_capacity(size.area() * 3);

        for y in 0 .. size.height() {
            for x in 0 .. size.width() {
                let Rgb { red, green, blue } = color(Vec2(x, y));
                bytes.extend_from_slice(&[ blue, green, red ]);
            }
        }

        BgrImage { size, bytes }
    }

    /// An image where all pixels have the same color.
    pub fn solid(size: impl Into<Vec2<usize>>, color: Rgb) -> Self {
        Self::from_fn(size, |_| color)
    }

    /// The color at the position. Panics if the position is outside of the image.
    pub fn pixel(&self, position: Vec2<usize>) -> Rgb {
        let start = (position.y() * self.size.width() + position.x()) * 3;
        let bgr = &self.bytes[start .. start + 3];
        Rgb::new(bgr[2], bgr[1], bgr[0])
    }
}

impl BgrSource for BgrImage {
    fn size(&self) -> Vec2<usize> { self.size }
    fn bgr_bytes(&self) -> &[u8] { &self.bytes }
}


/// A fully composited frame of an animation, with one `Rgba` per pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbaImage {
    size: Vec2<usize>,
    pixels: Vec<Rgba>,
}

impl RgbaImage {

    /// An image where no pixel has been drawn yet.
    pub fn transparent(size: impl Into<Vec2<usize>>) -> Self {
        let size = size.into();
        RgbaImage { size, pixels: vec![ Rgba::TRANSPARENT; size.area() ] }
    }

    /// Width and height in pixels.
    pub fn size(&self) -> Vec2<usize> { self.size }

    /// All pixels, row by row.
    pub fn pixels(&self) -> &[Rgba] { &self.pixels }

    /// All pixels, row by row.
    pub fn pixels_mut(&mut self) -> &mut [Rgba] { &mut self.pixels }

    #[inline]
    fn index(&self, position: Vec2<usize>) -> usize {
        debug_assert!(position.x() < self.size.width() && position.y() < self.size.height());
        position.y() * self.size.width() + position.x()
    }

    /// The color at the position. Panics if the position is outside of the image.
    pub fn pixel(&self, position: Vec2<usize>) -> Rgba {
        self.pixels[self.index(position)]
    }

    /// Overwrite the color at the position. Panics if the position is outside of the image.
    pub fn set_pixel(&mut self, position: Vec2<usize>, color: Rgba) {
        let index = self.index(position);
        self.pixels[index] = color;
    }

    /// Overwrite all pixels of the rectangle that lie inside the image.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let rect = rect.clip_to(self.size);
        if rect.size.area() == 0 { return }

        for y in rect.position.y() .. rect.end().y() {
            let start = self.index(Vec2(rect.position.x(), y));
            for pixel in &mut self.pixels[start .. start + rect.size.width()] {
                *pixel = color;
            }
        }
    }

    /// Copy the color channels into an opaque image, ignoring transparency.
    pub fn to_bgr_image(&self) -> BgrImage {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);

        for pixel in &self.pixels {
            bytes.extend_from_slice(&[ pixel.blue, pixel.green, pixel.red ]);
        }

        BgrImage { size: self.size, bytes }
    }
}


/// A decoded frame: the composited canvas, and the blocks it was decoded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {

    /// The whole canvas after this frame was drawn.
    pub image: RgbaImage,

    /// How long this frame is displayed, in milliseconds.
    pub delay_ms: u32,

    /// What happens to this frame before the next frame is drawn.
    pub disposal: Disposal,

    /// The part of the canvas covered by the pixel data of this frame.
    pub bounds: Rect,

    /// Whether the pixel data was stored in interlaced row order.
    pub interlaced: bool,

    /// The color index that was not drawn, if any.
    pub transparent_index: Option<u8>,
}
