//! Specialized binary input and output.
//! Uses the error handling for this crate.

pub use ::std::io::{Read, Write};
use lebe::prelude::*;
use crate::error::{Error, Result, UnitResult, IoResult};


/// The largest number of bytes a single data sub-block can hold.
pub const MAX_SUB_BLOCK_SIZE: usize = 255;

/// The payload of a single data sub-block.
pub type SubBlock = [u8; MAX_SUB_BLOCK_SIZE];


/// Skip reading uninteresting bytes without allocating.
#[inline]
pub fn skip_bytes(read: &mut impl Read, count: usize) -> IoResult<()> {
    let skipped = std::io::copy(
        &mut read.by_ref().take(count as u64),
        &mut std::io::sink()
    )?;

    if skipped < count as u64 {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }

    Ok(())
}

/// Read the size byte of a data sub-block and then its contents into the buffer.
/// Returns the number of payload bytes, which is zero for the block terminator.
/// Returns `Error::Invalid` if the stream ends before the announced block size.
pub fn read_sub_block(read: &mut impl Read, block: &mut SubBlock) -> Result<usize> {
    let size = u8::read(read)? as usize;
    read.read_exact(&mut block[.. size])
        .map_err(|_| Error::invalid("truncated data sub-block"))?;

    Ok(size)
}

/// Skip data sub-blocks up to and including the next zero length block.
pub fn skip_sub_blocks(read: &mut impl Read) -> UnitResult {
    loop {
        let size = u8::read(read)? as usize;
        if size == 0 { return Ok(()) }

        skip_bytes(read, size)
            .map_err(|_| Error::invalid("truncated data sub-block"))?;
    }
}


/// Splits a continuous byte stream into data sub-blocks of at most 255 bytes,
/// each prefixed by its length. Call `finish` to write the block terminator.
#[derive(Debug)]
pub struct SubBlockWriter<W> {
    inner: W,
    block: SubBlock,
    len: usize,
}

impl<W: Write> SubBlockWriter<W> {

    /// Wrap a writer. Nothing is written until the first block is complete.
    pub fn new(inner: W) -> Self {
        SubBlockWriter { inner, block: [0; MAX_SUB_BLOCK_SIZE], len: 0 }
    }

    /// Append a single byte, writing a full sub-block when necessary.
    #[inline]
    pub fn push(&mut self, byte: u8) -> UnitResult {
        self.block[self.len] = byte;
        self.len += 1;

        if self.len == MAX_SUB_BLOCK_SIZE {
            self.flush_block()?;
        }

        Ok(())
    }

    fn flush_block(&mut self) -> UnitResult {
        if self.len > 0 {
            (self.len as u8).write(&mut self.inner)?;
            u8::write_slice(&mut self.inner, &self.block[.. self.len])?;
            self.len = 0;
        }

        Ok(())
    }

    /// Write the pending partial block and the zero length terminator.
    pub fn finish(mut self) -> Result<W> {
        self.flush_block()?;
        0_u8.write(&mut self.inner)?;
        Ok(self.inner)
    }
}


/// Generic trait that defines common binary operations such as reading and writing for this type.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this would consume in a gif file.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Read as many values of type `Self` as fit into the specified slice.
    /// If the slice cannot be filled completely, returns `Error::Invalid`.
    fn read_slice(read: &mut impl Read, slice: &mut[Self]) -> UnitResult;

    /// Write this value to the writer.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the writer.
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult;
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            #[inline]
            fn write(self, write: &mut impl Write) -> Result<()> {
                write.write_as_little_endian(&self)?;
                Ok(())
            }

            #[inline]
            fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> Result<()> {
                read.read_from_little_endian_into(slice)?;
                Ok(())
            }

            #[inline]
            fn write_slice(write: &mut impl Write, slice: &[Self]) -> Result<()> {
                write.write_as_little_endian(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
