//! How an animation is encoded.

use crate::math::Vec2;
use crate::meta::attribute::Disposal;
use crate::meta::palette::Rgb;
use crate::quantize::clamp_sample_factor;


/// The default width when a size of zero is requested.
pub const DEFAULT_WIDTH: usize = 320;

/// The default height when a size of zero is requested.
pub const DEFAULT_HEIGHT: usize = 240;

/// The default sampling factor of the quantizer.
pub const DEFAULT_QUALITY: i32 = 10;


/// Everything about an animation that is not part of the frames themselves.
/// Delay, disposal and transparency apply to all following frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderOptions {

    /// The sampling factor of the color quantizer, between 1 and 30.
    /// Lower values produce better colors, but take longer.
    /// Values above 20 do not speed up encoding noticeably.
    pub quality: i32,

    /// Display duration of each frame, in hundredths of a second.
    pub delay: u16,

    /// Number of times the animation is played again, zero for infinite.
    /// If `None`, no looping extension is written and the animation plays once.
    pub repeat: Option<u16>,

    /// Overrides the disposal of each frame.
    /// If `None`, frames are disposed to the background if a transparent color is set.
    pub dispose: Option<Disposal>,

    /// The color that will not be drawn, if any.
    pub transparent: Option<Rgb>,

    /// Whether the transparent color must appear in the palette exactly,
    /// instead of marking the closest palette color as transparent.
    pub transparent_exact: bool,

    /// The color of the canvas area not covered by smaller frames.
    pub background: Rgb,

    /// The canvas size. If `None`, the size of the first frame is used.
    pub size: Option<Vec2<usize>>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            quality: DEFAULT_QUALITY,
            delay: 0,
            repeat: None,
            dispose: None,
            transparent: None,
            transparent_exact: false,
            background: Rgb::BLACK,
            size: None,
        }
    }
}

impl EncoderOptions {

    /// Set the display duration of each frame, rounded to hundredths of a second.
    pub fn with_delay_ms(self, milliseconds: u32) -> Self {
        EncoderOptions { delay: delay_from_ms(milliseconds), ..self }
    }

    /// Loop the animation, zero meaning forever.
    pub fn with_repeat(self, repeat: u16) -> Self {
        EncoderOptions { repeat: Some(repeat), ..self }
    }

    /// Set the quantizer sampling factor, clamped to the range 1 to 30.
    pub fn with_quality(self, quality: i32) -> Self {
        EncoderOptions { quality: clamp_sample_factor(quality), ..self }
    }

    /// Mark a color as transparent.
    pub fn with_transparent(self, color: Rgb, exact: bool) -> Self {
        EncoderOptions { transparent: Some(color), transparent_exact: exact, ..self }
    }

    /// Fix the canvas size. A zero dimension is replaced by 320 by 240.
    pub fn with_size(self, size: impl Into<Vec2<usize>>) -> Self {
        EncoderOptions { size: Some(non_zero_size(size.into())), ..self }
    }
}


/// Convert milliseconds to hundredths of a second, rounding half up.
pub(crate) fn delay_from_ms(milliseconds: u32) -> u16 {
    let centiseconds = (u64::from(milliseconds) + 5) / 10;
    centiseconds.min(u64::from(u16::MAX)) as u16
}

/// Replace zero dimensions with the defaults.
pub(crate) fn non_zero_size(size: Vec2<usize>) -> Vec2<usize> {
    Vec2(
        if size.width() == 0 { DEFAULT_WIDTH } else { size.width() },
        if size.height() == 0 { DEFAULT_HEIGHT } else { size.height() },
    )
}
