//! Read an animated gif and composite all of its frames.
//!
//! ```no_run
//!     use anigif::prelude::*;
//!
//!     let mut decoder = Decoder::new();
//!
//!     if decoder.read_file("animation.gif").is_err() {
//!         eprintln!("decoded {} frames before failing: {:?}", decoder.frame_count(), decoder.last_error());
//!     }
//!
//!     for frame in decoder.frames() {
//!         println!("{:?} for {} ms", frame.image.size(), frame.delay_ms);
//!     }
//! ```
//!
//! Every frame is stored fully composited,
//! so memory grows with the number of frames times the canvas size.

pub mod options;
mod compose;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::io::*;
use crate::math::Vec2;
use crate::compression::Decompressor;
use crate::meta::{MetaData, label};
use crate::meta::attribute::{GraphicControl, ImageDescriptor, LoopExtension};
use crate::meta::palette::{ColorTable, Rgb, Rgba};
use crate::image::{Frame, RgbaImage};
use crate::error::{Error, Status, UnitResult};
use self::options::DecoderOptions;


/// Decodes all frames of a gif stream into memory.
/// The frames decoded before an error remain available.
/// A decoder can read several streams, one after another.
#[derive(Debug)]
pub struct Decoder {
    options: DecoderOptions,

    status: Status,
    last_error: Option<Error>,

    meta: Option<MetaData>,
    loop_count: u16,
    frames: Vec<Frame>,

    /// Applies to all following frames until the next graphic control extension.
    control: GraphicControl,

    /// The background color at the time the most recent frame was drawn.
    last_background: Rgba,

    decompressor: Decompressor,
    indices: Vec<u8>,
}


impl Default for Decoder {
    fn default() -> Self { Self::with_options(DecoderOptions::default()) }
}

impl Decoder {

    /// Create a decoder with the default limits.
    pub fn new() -> Self { Self::default() }

    /// Create a decoder with custom limits.
    pub fn with_options(options: DecoderOptions) -> Self {
        Decoder {
            options,
            status: Status::Ok,
            last_error: None,
            meta: None,
            loop_count: 1,
            frames: Vec::new(),
            control: GraphicControl::default(),
            last_background: Rgba::TRANSPARENT,
            decompressor: Decompressor::new(),
            indices: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.status = Status::Ok;
        self.last_error = None;
        self.meta = None;
        self.loop_count = 1;
        self.frames.clear();
        self.control = GraphicControl::default();
        self.last_background = Rgba::TRANSPARENT;
    }

    /// Decode a whole gif stream, replacing anything decoded before.
    /// Stops at the trailer, or at the first error.
    pub fn read(&mut self, mut read: impl Read) -> Status {
        self.reset();

        let result = self.read_blocks(&mut read);
        self.finish_reading(result)
    }

    /// Open a file and decode it, replacing anything decoded before.
    /// Returns `Status::OpenError` if the file cannot be opened.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Status {
        self.reset();

        let result = File::open(path).map_err(Error::Open)
            .and_then(|file| self.read_blocks(&mut BufReader::new(file)));

        self.finish_reading(result)
    }

    fn finish_reading(&mut self, result: UnitResult) -> Status {
        if let Err(error) = result {
            log::warn!("gif decoding stopped after {} frames: {}", self.frames.len(), error);
            self.status = Status::from(&error);
            self.last_error = Some(error);
        }

        self.status
    }

    fn read_blocks(&mut self, read: &mut impl Read) -> UnitResult {
        let meta = MetaData::read_from_buffered(read)?;

        if meta.screen.size.area() > self.options.max_canvas_pixels {
            return Err(Error::invalid("canvas size exceeds the limit"));
        }

        self.meta = Some(meta);

        loop {
            match u8::read(read)? {
                label::IMAGE_SEPARATOR => self.read_frame(read)?,

                label::EXTENSION => match u8::read(read)? {
                    label::GRAPHIC_CONTROL => {
                        self.control = GraphicControl::read(read)?;
                        log::trace!("graphic control {:?}", self.control);
                    },

                    label::APPLICATION => {
                        if let Some(extension) = LoopExtension::read(read)? {
                            self.loop_count = extension.count;
                        }
                    },

                    label::COMMENT | label::PLAIN_TEXT => {
                        log::trace!("skipping comment or plain text extension");
                        skip_sub_blocks(read)?;
                    },

                    other => {
                        log::trace!("skipping unknown extension {:#04x}", other);
                        skip_sub_blocks(read)?;
                    },
                },

                label::TRAILER => return Ok(()),

                // some encoders pad between blocks
                0 => {},

                other => return Err(Error::invalid(format!("unknown block label {:#04x}", other))),
            }
        }
    }

    fn read_frame(&mut self, read: &mut impl Read) -> UnitResult {
        if let Some(max_frames) = self.options.max_frames {
            if self.frames.len() >= max_frames {
                return Err(Error::invalid("frame count exceeds the limit"));
            }
        }

        let descriptor = ImageDescriptor::read(read)?;
        log::trace!("image descriptor {:?}", descriptor);

        let local_table = match descriptor.local_table_bits {
            Some(bits) => Some(ColorTable::read(read, bits)?),
            None => None,
        };

        let meta = self.meta.as_ref().ok_or_else(|| Error::invalid("frame before screen descriptor"))?;
        let table = local_table.as_ref().or_else(|| meta.global_table.as_ref())
            .ok_or_else(|| Error::invalid("frame without color table"))?;

        let transparent_index = self.control.transparent_index;
        let mut lookup = table.to_lookup();

        if let Some(index) = transparent_index {
            lookup[usize::from(index)] = Rgba::TRANSPARENT;
        }

        let pixel_count = descriptor.bounds.size.area();
        if pixel_count > self.options.max_canvas_pixels {
            return Err(Error::invalid("frame size exceeds the limit"));
        }

        self.indices.resize(pixel_count, 0);
        self.decompressor.decompress(read, &mut self.indices)?;

        let background_index = meta.screen.background_index;
        let background = match meta.global_table.as_ref().and_then(|table| table.get(usize::from(background_index))) {
            Some(_) if local_table.is_none() && transparent_index == Some(background_index) => Rgba::TRANSPARENT,
            Some(color) => color.opaque(),
            None => Rgba::TRANSPARENT,
        };

        let clear_color = if transparent_index.is_some() { Rgba::TRANSPARENT } else { self.last_background };

        let mut canvas = compose::initial_canvas(&self.frames, meta.screen.size, clear_color);
        compose::draw_indices(&mut canvas, descriptor.bounds, descriptor.interlaced, &self.indices, &lookup);

        self.frames.push(Frame {
            image: canvas,
            delay_ms: self.control.delay_ms(),
            disposal: self.control.disposal,
            bounds: descriptor.bounds,
            interlaced: descriptor.interlaced,
            transparent_index,
        });

        self.last_background = background;
        Ok(())
    }

    /// The outcome of the most recent read.
    pub fn status(&self) -> Status { self.status }

    /// The cause of the most recent read failing, if it failed.
    pub fn last_error(&self) -> Option<&Error> { self.last_error.as_ref() }

    /// Number of frames decoded successfully.
    pub fn frame_count(&self) -> usize { self.frames.len() }

    /// All decoded frames, in display order.
    pub fn frames(&self) -> std::slice::Iter<'_, Frame> { self.frames.iter() }

    /// The composited canvas of the frame with this index.
    pub fn frame(&self, index: usize) -> Option<&RgbaImage> {
        self.frames.get(index).map(|frame| &frame.image)
    }

    /// The composited canvas of the first frame.
    pub fn image(&self) -> Option<&RgbaImage> { self.frame(0) }

    /// The display duration of the frame with this index, in milliseconds.
    pub fn delay(&self, index: usize) -> Option<u32> {
        self.frames.get(index).map(|frame| frame.delay_ms)
    }

    /// How many times the animation repeats, zero meaning forever.
    /// Streams without looping extension play once.
    pub fn loop_count(&self) -> u16 { self.loop_count }

    /// The canvas size, or zero if no stream has been read.
    pub fn frame_size(&self) -> Vec2<usize> {
        self.meta.as_ref().map_or(Vec2(0, 0), |meta| meta.screen.size)
    }

    /// The index of the background color in the global color table.
    pub fn background_index(&self) -> u8 {
        self.meta.as_ref().map_or(0, |meta| meta.screen.background_index)
    }

    /// The raw pixel aspect ratio byte of the screen descriptor.
    pub fn pixel_aspect(&self) -> u8 {
        self.meta.as_ref().map_or(0, |meta| meta.screen.pixel_aspect)
    }

    /// The global color table, if the stream has one.
    pub fn global_table(&self) -> Option<&ColorTable> {
        self.meta.as_ref().and_then(|meta| meta.global_table.as_ref())
    }

    /// The background color declared by the screen descriptor, if the stream has a global color table.
    pub fn background_color(&self) -> Option<Rgb> {
        self.global_table().and_then(|table| table.get(usize::from(self.background_index())))
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::meta::attribute::Disposal;
    use crate::compression::compress_indices;

    /// Header and screen of a 2 by 2 canvas, with a black and white global table.
    fn header() -> Vec<u8> {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[ 2, 0, 2, 0, 0x80, 0, 0 ]);
        bytes.extend_from_slice(&[ 0, 0, 0, 255, 255, 255 ]);
        bytes
    }

    fn image(bytes: &mut Vec<u8>, indices: &[u8]) {
        bytes.extend_from_slice(&[ 0x2C, 0, 0, 0, 0, 2, 0, 2, 0, 0 ]);
        bytes.extend_from_slice(&compress_indices(indices, 1).unwrap());
    }

    #[test]
    fn minimal_stream(){
        let mut bytes = header();
        image(&mut bytes, &[ 0, 1, 1, 0 ]);
        bytes.push(0x3B);

        let mut decoder = Decoder::new();
        assert_eq!(decoder.read(bytes.as_slice()), Status::Ok);
        assert_eq!(decoder.frame_count(), 1);
        assert_eq!(decoder.loop_count(), 1);
        assert_eq!(decoder.delay(0), Some(0));
        assert_eq!(decoder.delay(1), None);
        assert_eq!(decoder.frame_size(), Vec2(2, 2));
        assert_eq!(decoder.background_color(), Some(Rgb::BLACK));

        let first = decoder.image().unwrap();
        assert_eq!(first.pixel(Vec2(0, 0)), Rgb::BLACK.opaque());
        assert_eq!(first.pixel(Vec2(1, 0)), Rgb::new(255, 255, 255).opaque());
    }

    #[test]
    fn control_carries_over(){
        let mut bytes = header();
        bytes.extend_from_slice(&[ 0x21, 0xF9, 4, 0b0000_0101, 7, 0, 1, 0 ]);
        image(&mut bytes, &[ 0, 1, 1, 0 ]);
        image(&mut bytes, &[ 1, 1, 1, 1 ]);
        bytes.push(0x3B);

        let mut decoder = Decoder::new();
        assert_eq!(decoder.read(bytes.as_slice()), Status::Ok);

        let frames: Vec<&Frame> = decoder.frames().collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].delay_ms, 70);
        assert_eq!(frames[1].disposal, Disposal::Keep);
        assert_eq!(frames[1].transparent_index, Some(1));

        // white is transparent, so the second frame leaves the first in place
        assert_eq!(frames[1].image, frames[0].image);
        assert!(frames[0].image.pixel(Vec2(1, 0)).is_transparent());
    }

    #[test]
    fn skips_unknown_extensions(){
        let mut bytes = header();
        bytes.extend_from_slice(&[ 0x21, label::COMMENT, 3, b'h', b'e', b'y', 0 ]);
        bytes.extend_from_slice(&[ 0x21, label::PLAIN_TEXT, 2, 1, 2, 1, 9, 0 ]);
        bytes.extend_from_slice(&[ 0x21, 0x42, 1, 7, 0 ]);
        bytes.push(0);
        image(&mut bytes, &[ 0, 0, 0, 0 ]);
        bytes.push(0x3B);

        let mut decoder = Decoder::new();
        assert_eq!(decoder.read(bytes.as_slice()), Status::Ok);
        assert_eq!(decoder.frame_count(), 1);
    }

    #[test]
    fn unknown_block_is_sticky_error(){
        let mut bytes = header();
        image(&mut bytes, &[ 0, 0, 0, 0 ]);
        bytes.push(0x99);
        image(&mut bytes, &[ 1, 1, 1, 1 ]);
        bytes.push(0x3B);

        let mut decoder = Decoder::new();
        assert_eq!(decoder.read(bytes.as_slice()), Status::FormatError);
        assert_eq!(decoder.status(), Status::FormatError);
        assert_eq!(decoder.frame_count(), 1);
        assert!(matches!(decoder.last_error(), Some(Error::Invalid(_))));

        // reading again resets the status
        let mut valid = header();
        valid.push(0x3B);
        assert_eq!(decoder.read(valid.as_slice()), Status::Ok);
        assert_eq!(decoder.frame_count(), 0);
        assert!(decoder.last_error().is_none());
    }

    #[test]
    fn missing_trailer_and_table(){
        let mut bytes = header();
        image(&mut bytes, &[ 0, 0, 0, 0 ]);

        let mut decoder = Decoder::new();
        assert_eq!(decoder.read(bytes.as_slice()), Status::FormatError);
        assert_eq!(decoder.frame_count(), 1);

        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[ 2, 0, 2, 0, 0, 0, 0 ]);
        image(&mut bytes, &[ 0, 0, 0, 0 ]);
        bytes.push(0x3B);

        assert_eq!(decoder.read(bytes.as_slice()), Status::FormatError);
        assert_eq!(decoder.frame_count(), 0);
    }

    #[test]
    fn limits(){
        let mut bytes = header();
        image(&mut bytes, &[ 0, 0, 0, 0 ]);
        image(&mut bytes, &[ 0, 0, 0, 0 ]);
        bytes.push(0x3B);

        let mut decoder = Decoder::with_options(DecoderOptions::default().with_max_frames(1));
        assert_eq!(decoder.read(bytes.as_slice()), Status::FormatError);
        assert_eq!(decoder.frame_count(), 1);

        let mut decoder = Decoder::with_options(DecoderOptions::default().with_max_canvas_pixels(3));
        assert_eq!(decoder.read(bytes.as_slice()), Status::FormatError);
        assert_eq!(decoder.frame_count(), 0);
    }

    #[test]
    fn open_error(){
        let mut decoder = Decoder::new();
        assert_eq!(decoder.read_file("no/such/directory/animation.gif"), Status::OpenError);
        assert_eq!(decoder.status().code(), 2);
        assert!(matches!(decoder.last_error(), Some(Error::Open(_))));
    }
}
