//! Limits for reading untrusted gif streams.


/// The default limit of the canvas area, in pixels.
pub const DEFAULT_MAX_CANVAS_PIXELS: usize = 16384 * 16384;


/// Memory limits of the decoder.
/// Streams exceeding them are reported as format errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecoderOptions {

    /// Stop with an error when a stream contains more frames.
    /// `None` allows any number of frames.
    pub max_frames: Option<usize>,

    /// The largest area the canvas or a single frame may have.
    pub max_canvas_pixels: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            max_frames: None,
            max_canvas_pixels: DEFAULT_MAX_CANVAS_PIXELS,
        }
    }
}

impl DecoderOptions {

    /// Allow at most this many frames.
    pub fn with_max_frames(self, max_frames: usize) -> Self {
        DecoderOptions { max_frames: Some(max_frames), ..self }
    }

    /// Allow at most this many pixels in the canvas and in each frame.
    pub fn with_max_canvas_pixels(self, max_canvas_pixels: usize) -> Self {
        DecoderOptions { max_canvas_pixels, ..self }
    }
}
