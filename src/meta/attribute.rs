//! Contains the fixed-layout blocks of a gif stream:
//! logical screen descriptor, graphic control extension,
//! image descriptor, and the netscape looping extension.
//! Each block knows how to read and write itself.

use bit_field::BitField;
use crate::io::*;
use crate::math::{Vec2, Rect};
use crate::error::{Result, UnitResult, Error, usize_to_u16};
use super::label;


/// Declares the size of the canvas all frames are drawn onto,
/// and whether a global color table follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenDescriptor {

    /// Width and height of the canvas in pixels.
    pub size: Vec2<usize>,

    /// The size bits of the global color table, if a global color table follows.
    /// The table contains `2 << bits` colors.
    pub global_table_bits: Option<u8>,

    /// Number of bits per primary color available in the original image, minus one.
    pub color_resolution: u8,

    /// Whether the global color table is sorted by decreasing importance.
    pub sorted: bool,

    /// Index into the global color table for pixels not covered by any frame.
    pub background_index: u8,

    /// Zero if no aspect ratio is given, otherwise `(aspect + 15) / 64`.
    pub pixel_aspect: u8,
}

impl ScreenDescriptor {

    /// Number of bytes this block occupies.
    pub const BYTE_SIZE: usize = 7;

    /// Write the descriptor to the stream.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        usize_to_u16(self.size.0, "screen width")?.write(write)?;
        usize_to_u16(self.size.1, "screen height")?.write(write)?;

        let mut packed = 0_u8;
        packed.set_bit(7, self.global_table_bits.is_some());
        packed.set_bits(4..7, self.color_resolution & 7);
        packed.set_bit(3, self.sorted);
        packed.set_bits(0..3, self.global_table_bits.unwrap_or(0) & 7);

        packed.write(write)?;
        self.background_index.write(write)?;
        self.pixel_aspect.write(write)
    }

    /// Read the descriptor from the stream.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        let width = u16::read(read)?;
        let height = u16::read(read)?;
        let packed = u8::read(read)?;
        let background_index = u8::read(read)?;
        let pixel_aspect = u8::read(read)?;

        Ok(ScreenDescriptor {
            size: Vec2(width as usize, height as usize),
            global_table_bits: if packed.get_bit(7) { Some(packed.get_bits(0..3)) } else { None },
            color_resolution: packed.get_bits(4..7),
            sorted: packed.get_bit(3),
            background_index,
            pixel_aspect,
        })
    }
}


/// How the area of a frame is treated before the next frame is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Disposal {

    /// No disposal specified. The next frame is drawn on top of this one.
    None,

    /// Leave the frame in place. The next frame is drawn on top of this one.
    Keep,

    /// Restore the area of this frame to the background color.
    Background,

    /// Restore the canvas to what it looked like before this frame.
    Previous,
}

impl Default for Disposal {
    fn default() -> Self { Disposal::None }
}

impl Disposal {

    /// The three bit disposal field.
    pub fn to_bits(self) -> u8 {
        match self {
            Disposal::None => 0,
            Disposal::Keep => 1,
            Disposal::Background => 2,
            Disposal::Previous => 3,
        }
    }

    /// Interpret the three bit disposal field.
    /// The reserved values 4 to 7 are treated like `Keep`.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Disposal::None,
            2 => Disposal::Background,
            3 => Disposal::Previous,
            _ => Disposal::Keep,
        }
    }
}


/// Delay, disposal and transparency of the following frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicControl {

    /// What happens to this frame before the next frame is drawn.
    pub disposal: Disposal,

    /// Whether the viewer should wait for user input before continuing.
    pub user_input: bool,

    /// The color index that is not drawn, if any.
    pub transparent_index: Option<u8>,

    /// Display duration of the frame, in hundredths of a second.
    pub delay: u16,
}

impl GraphicControl {

    /// Size of the single data sub-block.
    const BLOCK_SIZE: u8 = 4;

    /// The delay in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        u32::from(self.delay) * 10
    }

    /// Write the extension, including introducer and label.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        label::EXTENSION.write(write)?;
        label::GRAPHIC_CONTROL.write(write)?;
        Self::BLOCK_SIZE.write(write)?;

        let mut packed = 0_u8;
        packed.set_bits(2..5, self.disposal.to_bits());
        packed.set_bit(1, self.user_input);
        packed.set_bit(0, self.transparent_index.is_some());

        packed.write(write)?;
        self.delay.write(write)?;
        self.transparent_index.unwrap_or(0).write(write)?;
        0_u8.write(write)
    }

    /// Read the extension, after its introducer and label have been consumed.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        let mut block = [0_u8; MAX_SUB_BLOCK_SIZE];
        let size = read_sub_block(read, &mut block)?;

        if size < Self::BLOCK_SIZE as usize {
            return Err(Error::invalid("graphic control extension size"));
        }

        let packed = block[0];
        let delay = u16::from_le_bytes([ block[1], block[2] ]);
        let transparent = packed.get_bit(0);

        skip_sub_blocks(read)?;

        Ok(GraphicControl {
            disposal: Disposal::from_bits(packed.get_bits(2..5)),
            user_input: packed.get_bit(1),
            transparent_index: if transparent { Some(block[3]) } else { None },
            delay,
        })
    }
}


/// Position, size and layout of a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageDescriptor {

    /// Where the frame is drawn on the canvas.
    pub bounds: Rect,

    /// The size bits of the local color table, if a local color table follows.
    /// The table contains `2 << bits` colors.
    pub local_table_bits: Option<u8>,

    /// Whether the rows are stored in four interlaced passes.
    pub interlaced: bool,

    /// Whether the local color table is sorted by decreasing importance.
    pub sorted: bool,
}

impl ImageDescriptor {

    /// Write the descriptor, including the image separator.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        label::IMAGE_SEPARATOR.write(write)?;

        usize_to_u16(self.bounds.position.0, "frame x position")?.write(write)?;
        usize_to_u16(self.bounds.position.1, "frame y position")?.write(write)?;
        usize_to_u16(self.bounds.size.0, "frame width")?.write(write)?;
        usize_to_u16(self.bounds.size.1, "frame height")?.write(write)?;

        let mut packed = 0_u8;
        packed.set_bit(7, self.local_table_bits.is_some());
        packed.set_bit(6, self.interlaced);
        packed.set_bit(5, self.sorted);
        packed.set_bits(0..3, self.local_table_bits.unwrap_or(0) & 7);
        packed.write(write)
    }

    /// Read the descriptor, after the image separator has been consumed.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        let x = u16::read(read)? as usize;
        let y = u16::read(read)? as usize;
        let width = u16::read(read)? as usize;
        let height = u16::read(read)? as usize;
        let packed = u8::read(read)?;

        Ok(ImageDescriptor {
            bounds: Rect::new((x, y), (width, height)),
            local_table_bits: if packed.get_bit(7) { Some(packed.get_bits(0..3)) } else { None },
            interlaced: packed.get_bit(6),
            sorted: packed.get_bit(5),
        })
    }
}


/// The application identifier and authentication code of the looping extension.
pub const NETSCAPE_IDENTIFIER: &[u8; 11] = b"NETSCAPE2.0";

/// Tells viewers how many times to play the animation.
/// Zero means the animation repeats forever.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopExtension {

    /// Number of repetitions, zero for infinite.
    pub count: u16,
}

impl LoopExtension {

    /// Identifier of the loop count sub-block.
    const LOOP_SUB_BLOCK: u8 = 1;

    /// Write the extension, including introducer and label.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        label::EXTENSION.write(write)?;
        label::APPLICATION.write(write)?;
        (NETSCAPE_IDENTIFIER.len() as u8).write(write)?;
        u8::write_slice(write, NETSCAPE_IDENTIFIER)?;

        3_u8.write(write)?;
        Self::LOOP_SUB_BLOCK.write(write)?;
        self.count.write(write)?;
        0_u8.write(write)
    }

    /// Read an application extension, after its introducer and label have been consumed.
    /// Returns `None` and skips the whole extension if it is not the netscape looping extension.
    /// If the extension contains no loop sub-block, returns a loop count of `None` as well.
    pub fn read(read: &mut impl Read) -> Result<Option<Self>> {
        let mut block = [0_u8; MAX_SUB_BLOCK_SIZE];
        let size = read_sub_block(read, &mut block)?;

        if size == 0 { return Ok(None) }

        if &block[.. size] != NETSCAPE_IDENTIFIER {
            log::debug!("skipping application extension {:?}", String::from_utf8_lossy(&block[.. size]));
            skip_sub_blocks(read)?;
            return Ok(None);
        }

        let mut count = None;
        loop {
            let size = read_sub_block(read, &mut block)?;
            if size == 0 { break }

            if block[0] == Self::LOOP_SUB_BLOCK && size >= 3 {
                count = Some(u16::from_le_bytes([ block[1], block[2] ]));
            }
        }

        Ok(count.map(|count| LoopExtension { count }))
    }
}
