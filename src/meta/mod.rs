//! Describes the meta data of a gif stream:
//! the header, the logical screen, the global color table,
//! and the per-frame blocks in the `attribute` module.

pub mod attribute;
pub mod palette;


use std::fs::File;
use std::io::BufReader;
use crate::io::*;
use crate::error::{Error, Result, UnitResult};
use self::attribute::ScreenDescriptor;
use self::palette::ColorTable;


/// The bytes that introduce the blocks of a gif stream.
pub mod label {

    /// Starts an image descriptor.
    pub const IMAGE_SEPARATOR: u8 = 0x2C;

    /// Starts any extension block. Followed by one of the extension labels.
    pub const EXTENSION: u8 = 0x21;

    /// Ends the gif stream.
    pub const TRAILER: u8 = 0x3B;

    /// Labels a graphic control extension.
    pub const GRAPHIC_CONTROL: u8 = 0xF9;

    /// Labels an application extension.
    pub const APPLICATION: u8 = 0xFF;

    /// Labels a comment extension.
    pub const COMMENT: u8 = 0xFE;

    /// Labels a plain text extension.
    pub const PLAIN_TEXT: u8 = 0x01;
}


/// The three bytes every gif stream starts with.
pub const SIGNATURE: &[u8; 3] = b"GIF";

/// The version this crate writes. Animation requires at least this version.
pub const VERSION_89A: &[u8; 3] = b"89a";


/// Everything in front of the first frame, except for extensions:
/// the version, the logical screen descriptor, and the global color table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaData {

    /// The three version bytes following the signature, usually `89a` or `87a`.
    pub version: [u8; 3],

    /// Canvas size and global color table layout.
    pub screen: ScreenDescriptor,

    /// Present if the screen descriptor declares a global color table.
    pub global_table: Option<ColorTable>,
}


impl MetaData {

    /// Read the meta data from a file.
    /// Returns `Error::Open` if the file cannot be opened.
    pub fn read_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = File::open(path).map_err(Error::Open)?;
        Self::read_from_buffered(&mut BufReader::new(file))
    }

    /// Read the meta data from a reader.
    /// Use `read_from_file` if you have a file path.
    /// Leaves the reader positioned at the first block after the global color table.
    pub fn read_from_buffered(read: &mut impl Read) -> Result<Self> {
        let version = Self::read_header(read)?;
        let screen = ScreenDescriptor::read(read)?;

        let global_table = match screen.global_table_bits {
            Some(bits) => Some(ColorTable::read(read, bits)?),
            None => None,
        };

        Ok(MetaData { version, screen, global_table })
    }

    /// Read the six byte header and return the version.
    /// Any version is accepted, as long as the signature is present.
    pub fn read_header(read: &mut impl Read) -> Result<[u8; 3]> {
        let mut header = [0_u8; 6];

        u8::read_slice(read, &mut header)
            .map_err(|_| Error::invalid("gif header"))?;

        if &header[.. 3] != SIGNATURE {
            return Err(Error::invalid("gif signature"));
        }

        Ok([ header[3], header[4], header[5] ])
    }

    /// Write the signature and the gif89a version.
    pub fn write_header(write: &mut impl Write) -> UnitResult {
        u8::write_slice(write, SIGNATURE)?;
        u8::write_slice(write, VERSION_89A)
    }

    /// Write the logical screen descriptor and the global color table, but not the header.
    pub fn write_screen(&self, write: &mut impl Write) -> UnitResult {
        if self.screen.global_table_bits.is_some() != self.global_table.is_some() {
            return Err(Error::invalid("global color table flag does not match table"));
        }

        self.screen.write(write)?;

        if let Some(table) = &self.global_table {
            if Some(table.size_bits()) != self.screen.global_table_bits {
                return Err(Error::invalid("global color table size does not match descriptor"));
            }

            table.write(write)?;
        }

        Ok(())
    }
}
