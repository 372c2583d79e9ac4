//! Write an animated gif, frame by frame.
//!
//! Start the encoder with a writer, add frames, and finish it:
//! ```no_run
//!     use anigif::prelude::*;
//!
//!     let mut encoder = Encoder::with_options(EncoderOptions::default().with_repeat(0));
//!     encoder.set_delay(500);
//!
//!     encoder.start_file("animation.gif");
//!     encoder.add_frame(&BgrImage::solid((2, 2), Rgb::new(255, 0, 0)));
//!     encoder.add_frame(&BgrImage::solid((2, 2), Rgb::new(0, 0, 255)));
//!     assert!(encoder.finish());
//! ```
//!
//! The methods returning `bool` log the cause of a failure.
//! Use the `try_` variants to receive the error instead.

pub mod options;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::io::*;
use crate::math::{Vec2, Rect};
use crate::compression::Compressor;
use crate::quantize::{NeuQuant, clamp_sample_factor};
use crate::meta::{MetaData, label};
use crate::meta::attribute::{ScreenDescriptor, GraphicControl, ImageDescriptor, LoopExtension, Disposal};
use crate::meta::palette::{Palette, Rgb};
use crate::image::BgrSource;
use crate::error::{Error, UnitResult};
use self::options::{EncoderOptions, delay_from_ms, non_zero_size};


/// Every palette produced by the quantizer has this many bits per index.
const COLOR_DEPTH: u8 = 8;


/// Writes frames to a gif stream as they are added.
/// Reuses its quantizer and compressor tables for all frames.
/// An encoder can write several animations, one after another.
#[derive(Debug)]
pub struct Encoder<W> {
    options: EncoderOptions,

    /// `None` until `start` is called, and again after `finish`.
    output: Option<W>,

    /// The canvas size of the current animation, fixed by the first frame.
    size: Option<Vec2<usize>>,

    /// The palette of the most recent frame, with its used entries.
    palette: Option<Palette>,

    quantizer: NeuQuant,
    compressor: Compressor,
    indices: Vec<u8>,
    fitted_bgr: Vec<u8>,
}


impl<W: Write> Default for Encoder<W> {
    fn default() -> Self { Self::with_options(EncoderOptions::default()) }
}

impl<W: Write> Encoder<W> {

    /// Create an encoder with the default options.
    pub fn new() -> Self { Self::default() }

    /// Create an encoder with custom options.
    /// The quality is clamped to the range 1 to 30.
    pub fn with_options(options: EncoderOptions) -> Self {
        let options = EncoderOptions { quality: clamp_sample_factor(options.quality), ..options };

        Encoder {
            quantizer: NeuQuant::new(options.quality),
            options,
            output: None,
            size: None,
            palette: None,
            compressor: Compressor::new(),
            indices: Vec::new(),
            fitted_bgr: Vec::new(),
        }
    }

    /// The current options.
    pub fn options(&self) -> &EncoderOptions { &self.options }

    /// Set the display duration of all following frames, rounded to hundredths of a second.
    pub fn set_delay(&mut self, milliseconds: u32) {
        self.options.delay = delay_from_ms(milliseconds);
    }

    /// Set the delay of all following frames from a frame rate. Ignored for zero.
    pub fn set_frame_rate(&mut self, frames_per_second: f32) {
        if frames_per_second != 0.0 {
            self.options.delay = (100.0 / frames_per_second).round() as u16;
        }
    }

    /// Override the disposal of all following frames.
    pub fn set_dispose(&mut self, disposal: Disposal) {
        self.options.dispose = Some(disposal);
    }

    /// Loop the animation, zero meaning forever.
    /// Only has an effect before the first frame is added.
    pub fn set_repeat(&mut self, repeat: u16) {
        self.options.repeat = Some(repeat);
    }

    /// Set the color that is not drawn in all following frames.
    /// If `exact` is set and the color does not appear in a frame,
    /// no pixel of that frame is transparent. Otherwise, the closest color is used.
    pub fn set_transparent(&mut self, color: Option<Rgb>, exact: bool) {
        self.options.transparent = color;
        self.options.transparent_exact = exact;
    }

    /// Set the color that fills the canvas around frames smaller than the canvas.
    /// `None` resets it to black.
    pub fn set_background(&mut self, color: Option<Rgb>) {
        self.options.background = color.unwrap_or(Rgb::BLACK);
    }

    /// Set the quantizer sampling factor, clamped to the range 1 to 30.
    /// The default is 10, which gives good colors at reasonable speed.
    pub fn set_quality(&mut self, quality: i32) {
        self.options.quality = clamp_sample_factor(quality);
    }

    /// Fix the canvas size. A zero dimension is replaced by 320 by 240.
    /// Returns false and does nothing if a frame has already been added.
    pub fn set_size(&mut self, width: usize, height: usize) -> bool {
        if self.size.is_some() {
            log::warn!("ignoring canvas size {}x{}, the first frame has already been written", width, height);
            return false;
        }

        self.options.size = Some(non_zero_size(Vec2(width, height)));
        true
    }

    /// Whether `start` has been called without `finish`.
    pub fn is_started(&self) -> bool {
        self.output.is_some()
    }

    /// Whether a pixel of the most recent frame uses this exact color.
    pub fn is_color_used(&self, color: Rgb) -> bool {
        self.palette.as_ref().map_or(false, |palette| palette.find_exact(color).is_some())
    }

    /// Write the gif header to the writer.
    /// The writer is kept until `finish` is called.
    /// Pass `&mut writer` to keep ownership of the writer.
    pub fn start(&mut self, write: W) -> bool {
        report("start", self.try_start(write))
    }

    /// Write the gif header to the writer, returning the cause of any failure.
    pub fn try_start(&mut self, mut write: W) -> UnitResult {
        if self.is_started() {
            return Err(Error::unsupported("encoder has already been started"));
        }

        MetaData::write_header(&mut write)?;
        self.output = Some(write);
        Ok(())
    }

    /// Quantize and write the next frame.
    pub fn add_frame(&mut self, image: &impl BgrSource) -> bool {
        report("add frame", self.write_frame(image))
    }

    /// Quantize and write the next frame, returning the cause of any failure.
    /// Bytes that have been written before the failure remain in the stream.
    pub fn write_frame(&mut self, image: &impl BgrSource) -> UnitResult {
        let output = self.output.as_mut()
            .ok_or_else(|| Error::unsupported("encoder has not been started"))?;

        let options = &self.options;
        let first_frame = self.size.is_none();
        let size = self.size.or(options.size).unwrap_or_else(|| image.size());

        if size.area() == 0 {
            return Err(Error::invalid("frame has no pixels"));
        }

        let bgr = if image.size() == size { image.bgr_bytes() } else {
            log::debug!("fitting frame of size {:?} into canvas of size {:?}", image.size(), size);
            fit_to_canvas(image, size, options.background, &mut self.fitted_bgr);
            self.fitted_bgr.as_slice()
        };

        if bgr.len() != size.area() * 3 {
            return Err(Error::invalid("pixel buffer length does not match frame size"));
        }

        // quantize and map each pixel to its palette index
        self.quantizer.set_sample_factor(options.quality);
        let mut palette = Palette::new(self.quantizer.process(bgr)?);

        let quantizer = &self.quantizer;
        self.indices.clear();
        self.indices.extend(bgr.chunks_exact(3).map(|pixel| {
            let index = quantizer.map(pixel[0], pixel[1], pixel[2]);
            palette.mark_used(index);
            index
        }));

        let transparent_index = options.transparent.and_then(|color| {
            if options.transparent_exact { palette.find_exact(color) }
            else { Some(palette.find_closest(color)) }
        });

        if options.transparent.is_some() && transparent_index.is_none() {
            log::debug!("transparent color {:?} is not used by this frame", options.transparent);
        }

        if first_frame {
            let meta = MetaData {
                version: *crate::meta::VERSION_89A,
                screen: ScreenDescriptor {
                    size,
                    global_table_bits: Some(palette.table.size_bits()),
                    color_resolution: 7,
                    sorted: false,
                    background_index: 0,
                    pixel_aspect: 0,
                },
                global_table: Some(palette.table.clone()),
            };

            meta.write_screen(output)?;

            if let Some(count) = options.repeat {
                LoopExtension { count }.write(output)?;
            }
        }

        let disposal = options.dispose.unwrap_or_else(|| {
            if options.transparent.is_some() { Disposal::Background } else { Disposal::None }
        });

        GraphicControl {
            disposal,
            user_input: false,
            transparent_index,
            delay: options.delay,
        }.write(output)?;

        ImageDescriptor {
            bounds: Rect::from_size(size),
            local_table_bits: if first_frame { None } else { Some(palette.table.size_bits()) },
            interlaced: false,
            sorted: false,
        }.write(output)?;

        if !first_frame {
            palette.table.write(output)?;
        }

        self.compressor.compress(&self.indices, COLOR_DEPTH, &mut *output)?;

        self.size = Some(size);
        self.palette = Some(palette);
        Ok(())
    }

    /// Write the trailer, flush the stream, and release the writer.
    /// Afterwards, a new animation can be started.
    pub fn finish(&mut self) -> bool {
        report("finish", self.try_finish())
    }

    /// Write the trailer, flush the stream, and release the writer,
    /// returning the cause of any failure.
    /// The encoder is ready for a new animation even if this fails.
    pub fn try_finish(&mut self) -> UnitResult {
        let output = self.output.take();

        self.size = None;
        self.palette = None;
        self.indices.clear();
        self.fitted_bgr.clear();

        let mut output = output.ok_or_else(|| Error::unsupported("encoder has not been started"))?;
        label::TRAILER.write(&mut output)?;
        output.flush()?;
        Ok(())
    }
}

impl Encoder<BufWriter<File>> {

    /// Create a file and write the gif header to it.
    /// The file is closed by `finish`.
    pub fn start_file(&mut self, path: impl AsRef<Path>) -> bool {
        report("start file", self.try_start_file(path))
    }

    /// Create a file and write the gif header to it, returning the cause of any failure.
    pub fn try_start_file(&mut self, path: impl AsRef<Path>) -> UnitResult {
        if self.is_started() {
            return Err(Error::unsupported("encoder has already been started"));
        }

        let file = File::create(path).map_err(Error::Open)?;
        self.try_start(BufWriter::new(file))
    }
}


fn report(operation: &str, result: UnitResult) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            log::warn!("gif encoder cannot {}: {}", operation, error);
            false
        }
    }
}

/// Copy the image into the top left corner of a canvas filled with the background color.
/// Parts of the image outside the canvas are cut off.
fn fit_to_canvas(image: &impl BgrSource, canvas: Vec2<usize>, background: Rgb, target: &mut Vec<u8>) {
    let source = image.bgr_bytes();
    let source_size = image.size();

    target.clear();
    target.reserve(canvas.area() * 3);

    for _ in 0 .. canvas.area() {
        target.extend_from_slice(&[ background.blue, background.green, background.red ]);
    }

    let copied = Rect::from_size(source_size).clip_to(canvas);
    let row_bytes = copied.size.width() * 3;

    for y in 0 .. copied.size.height() {
        let source_start = y * source_size.width() * 3;
        let target_start = y * canvas.width() * 3;

        if let Some(row) = source.get(source_start .. source_start + row_bytes) {
            target[target_start .. target_start + row_bytes].copy_from_slice(row);
        }
    }
}
