//! Contains the LZW codec used for the pixel data of every frame,
//! and functions to compress and decompress whole index buffers.


// private modules make non-breaking changes easier
mod lzw;

pub use self::lzw::{Compressor, Decompressor};

use crate::error::Result;


/// A byte vector.
pub type ByteVec = Vec<u8>;

/// A byte slice.
pub type Bytes<'s> = &'s [u8];


/// The widest code an LZW stream in a gif may contain.
pub const MAX_CODE_SIZE: u32 = 12;

/// The number of codes that fit into the dictionary.
/// The dictionary is cleared when it is full.
pub const MAX_CODES: usize = 1 << MAX_CODE_SIZE;


/// Compress palette indices into the byte layout of gif image data:
/// the minimum code size, data sub-blocks, and the block terminator.
/// Allocates a new dictionary. Use a `Compressor` to compress many frames.
pub fn compress_indices(indices: Bytes<'_>, color_depth: u8) -> Result<ByteVec> {
    let mut compressed = ByteVec::with_capacity(indices.len() / 2 + 16);
    Compressor::new().compress(indices, color_depth, &mut compressed)?;
    Ok(compressed)
}

/// Decompress gif image data into exactly `pixel_count` palette indices.
/// Pixels missing from the stream are zero.
/// Allocates new tables. Use a `Decompressor` to decompress many frames.
pub fn decompress_indices(mut compressed: Bytes<'_>, pixel_count: usize) -> Result<ByteVec> {
    let mut indices = vec![ 0_u8; pixel_count ];
    Decompressor::new().decompress(&mut compressed, &mut indices)?;
    Ok(indices)
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compress_gradient(){
        let indices: ByteVec = (0 .. 64 * 64).map(|i: usize| (i % 64 + i / 64) as u8).collect();
        let compressed = compress_indices(&indices, 8).unwrap();

        assert_eq!(compressed[0], 8, "minimum code size");
        assert_eq!(*compressed.last().unwrap(), 0, "block terminator");
        assert!(compressed.len() < indices.len(), "gradient should compress");

        assert_eq!(decompress_indices(&compressed, indices.len()).unwrap(), indices);
    }

    #[test]
    fn sub_blocks_are_full(){
        let indices: ByteVec = (0 .. 10_000_u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
        let compressed = compress_indices(&indices, 8).unwrap();

        // walk the sub-blocks: all but the last data block hold 255 bytes
        let mut position = 1;
        let mut sizes = Vec::new();

        loop {
            let size = compressed[position] as usize;
            position += 1 + size;
            if size == 0 { break; }
            sizes.push(size);
        }

        assert_eq!(position, compressed.len());
        assert!(sizes.len() > 2);
        assert!(sizes[.. sizes.len() - 1].iter().all(|&size| size == 255));
    }
}
