//! Draws decoded frames onto the canvas,
//! starting from what the previous frames left behind.

use crate::math::{Vec2, Rect, InterlacedLines};
use crate::meta::attribute::Disposal;
use crate::meta::palette::{Rgba, MAX_COLORS};
use crate::image::{Frame, RgbaImage};


/// The canvas the next frame is drawn onto, as left behind by the previous frame.
/// The frames slice contains all frames decoded so far, in order.
/// `clear_color` fills the area of a previous frame that is disposed to the background.
pub fn initial_canvas(frames: &[Frame], size: Vec2<usize>, clear_color: Rgba) -> RgbaImage {
    let previous = match frames.last() {
        Some(previous) => previous,
        None => return RgbaImage::transparent(size),
    };

    match previous.disposal {
        Disposal::Previous => {
            // the canvas before the previous frame is the frame before that
            frames.len().checked_sub(2)
                .map(|before_previous| frames[before_previous].image.clone())
                .unwrap_or_else(|| RgbaImage::transparent(size))
        },

        Disposal::Background => {
            let mut canvas = previous.image.clone();
            canvas.fill_rect(previous.bounds, clear_color);
            canvas
        },

        // no disposal is drawn like keeping the frame in place
        Disposal::None | Disposal::Keep => previous.image.clone(),
    }
}

/// Draw the palette indices of a frame into its bounds on the canvas.
/// Pixels outside the canvas are skipped, as are pixels whose color is transparent.
pub fn draw_indices(
    canvas: &mut RgbaImage, bounds: Rect, interlaced: bool,
    indices: &[u8], lookup: &[Rgba; MAX_COLORS]
) {
    let canvas_size = canvas.size();
    let visible = bounds.clip_to(canvas_size);
    let frame_width = bounds.size.width();

    let mut draw_row = |source_row: usize, line: usize| {
        let y = bounds.position.y() + line;
        if y >= visible.end().y() { return; }

        let source_start = source_row * frame_width;
        let source = match indices.get(source_start .. source_start + visible.size.width()) {
            Some(source) => source,
            None => return,
        };

        let target_start = y * canvas_size.width() + visible.position.x();
        let target = &mut canvas.pixels_mut()[target_start .. target_start + visible.size.width()];

        for (pixel, &index) in target.iter_mut().zip(source) {
            let color = lookup[usize::from(index)];
            if !color.is_transparent() { *pixel = color; }
        }
    };

    if interlaced {
        for (source_row, line) in InterlacedLines::new(bounds.size.height()).enumerate() {
            draw_row(source_row, line);
        }
    }
    else {
        for line in 0 .. bounds.size.height() {
            draw_row(line, line);
        }
    }
}
