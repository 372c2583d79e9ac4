//! Variable-width LZW codes, packed least significant bit first
//! into data sub-blocks, as used for the pixel data of gif frames.

use crate::io::*;
use crate::error::{Error, Result, UnitResult};
use super::{MAX_CODE_SIZE, MAX_CODES};


// the dictionary of the compressor is an open addressing hash table.
// 5003 is a prime a bit larger than the 4096 codes, giving an occupancy of about 80%.
const HASH_SIZE: usize = 5003;

// shifts the 8 bit suffix such that `(suffix << HASH_SHIFT) ^ prefix` stays below `HASH_SIZE`
const HASH_SHIFT: usize = 4;

const EMPTY_SLOT: i32 = -1;


/// Encodes palette indices to LZW codes.
/// Keeps its dictionary allocated, so it can be reused for many frames.
#[derive(Debug, Clone)]
pub struct Compressor {

    /// The `(suffix, prefix)` pair stored in each slot, or `EMPTY_SLOT`.
    hashes: Vec<i32>,

    /// The code assigned to the pair in the corresponding slot.
    codes: Vec<u16>,
}

/// Packs codes of the current width into bytes,
/// and tracks when the code width must grow.
struct CodeWriter<W> {
    blocks: SubBlockWriter<W>,
    accumulator: u32,
    bit_count: u32,

    initial_code_size: u32,
    code_size: u32,
    max_code: usize,
    reset_pending: bool,
}

impl<W: Write> CodeWriter<W> {
    fn new(write: W, initial_code_size: u32) -> Self {
        CodeWriter {
            blocks: SubBlockWriter::new(write),
            accumulator: 0, bit_count: 0,
            initial_code_size,
            code_size: initial_code_size,
            max_code: max_code(initial_code_size),
            reset_pending: false,
        }
    }

    /// Write a code with the current width.
    /// Afterwards, widen the codes if `next_code` does not fit anymore,
    /// or go back to the initial width if the dictionary was just cleared.
    fn write_code(&mut self, code: u16, next_code: usize) -> UnitResult {
        self.accumulator |= u32::from(code) << self.bit_count;
        self.bit_count += self.code_size;

        while self.bit_count >= 8 {
            self.blocks.push(self.accumulator as u8)?;
            self.accumulator >>= 8;
            self.bit_count -= 8;
        }

        if self.reset_pending {
            self.code_size = self.initial_code_size;
            self.max_code = max_code(self.code_size);
            self.reset_pending = false;
        }
        else if next_code > self.max_code {
            self.code_size += 1;

            // at the maximum width, codes never grow again, the dictionary is cleared instead
            self.max_code = if self.code_size == MAX_CODE_SIZE { MAX_CODES }
                else { max_code(self.code_size) };
        }

        Ok(())
    }

    /// Write the remaining bits and the block terminator.
    fn finish(mut self) -> UnitResult {
        if self.bit_count > 0 {
            self.blocks.push(self.accumulator as u8)?;
        }

        self.blocks.finish()?;
        Ok(())
    }
}

fn max_code(code_size: u32) -> usize {
    (1 << code_size) - 1
}


impl Default for Compressor {
    fn default() -> Self { Self::new() }
}

impl Compressor {

    /// Allocate the dictionary.
    pub fn new() -> Self {
        Compressor {
            hashes: vec![EMPTY_SLOT; HASH_SIZE],
            codes: vec![0; HASH_SIZE],
        }
    }

    fn clear_dictionary(&mut self) {
        for hash in &mut self.hashes { *hash = EMPTY_SLOT; }
    }

    /// Write the minimum code size byte, followed by the LZW codes
    /// of all indices in data sub-blocks, followed by the block terminator.
    /// Each index must be smaller than `1 << color_depth`.
    pub fn compress(&mut self, indices: &[u8], color_depth: u8, mut write: impl Write) -> UnitResult {
        if color_depth == 0 || color_depth > 8 {
            return Err(Error::unsupported("lzw color depth must be between 1 and 8"));
        }

        // a minimum code size of one is not allowed by the gif specification
        let minimum_code_size = color_depth.max(2);
        let clear_code = 1_u16 << minimum_code_size;
        let end_code = clear_code + 1;
        let first_free_code = usize::from(clear_code) + 2;

        if color_depth < 8 && indices.iter().any(|&index| u16::from(index) >= clear_code) {
            return Err(Error::invalid("palette index exceeds color depth"));
        }

        minimum_code_size.write(&mut write)?;

        let mut output = CodeWriter::new(write, u32::from(minimum_code_size) + 1);
        let mut next_code = first_free_code;

        self.clear_dictionary();
        output.write_code(clear_code, next_code)?;

        let mut pixels = indices.iter().copied();

        let mut prefix = match pixels.next() {
            Some(first) => u16::from(first),
            None => {
                output.write_code(end_code, next_code)?;
                return output.finish();
            }
        };

        'pixels: for pixel in pixels {
            let key = (i32::from(pixel) << MAX_CODE_SIZE) + i32::from(prefix);
            let mut slot = (usize::from(pixel) << HASH_SHIFT) ^ usize::from(prefix);

            if self.hashes[slot] == key {
                prefix = self.codes[slot];
                continue;
            }

            if self.hashes[slot] != EMPTY_SLOT {
                let displacement = if slot == 0 { 1 } else { HASH_SIZE - slot };

                loop {
                    slot = if slot >= displacement { slot - displacement }
                        else { slot + HASH_SIZE - displacement };

                    if self.hashes[slot] == key {
                        prefix = self.codes[slot];
                        continue 'pixels;
                    }

                    if self.hashes[slot] == EMPTY_SLOT { break; }
                }
            }

            output.write_code(prefix, next_code)?;
            prefix = u16::from(pixel);

            if next_code < MAX_CODES {
                self.codes[slot] = next_code as u16;
                self.hashes[slot] = key;
                next_code += 1;
            }
            else {
                self.clear_dictionary();
                next_code = first_free_code;
                output.reset_pending = true;
                output.write_code(clear_code, next_code)?;
            }
        }

        output.write_code(prefix, next_code)?;
        output.write_code(end_code, next_code)?;
        output.finish()
    }
}


/// Decodes LZW codes to palette indices.
/// Keeps its tables allocated, so it can be reused for many frames.
#[derive(Debug, Clone)]
pub struct Decompressor {
    prefix: Vec<u16>,
    suffix: Vec<u8>,

    /// The indices of the current code, in reverse order.
    stack: Vec<u8>,

    block: SubBlock,
}

impl Default for Decompressor {
    fn default() -> Self { Self::new() }
}

impl Decompressor {

    /// Allocate the tables.
    pub fn new() -> Self {
        Decompressor {
            prefix: vec![0; MAX_CODES],
            suffix: vec![0; MAX_CODES],
            stack: Vec::with_capacity(MAX_CODES + 1),
            block: [0; MAX_SUB_BLOCK_SIZE],
        }
    }

    /// Read the minimum code size and the data sub-blocks of one frame,
    /// including the block terminator, and decode them into the pixel slice.
    ///
    /// An invalid code or an early end code stops decoding,
    /// and all remaining pixels are set to zero.
    /// Returns the number of pixels that were actually decoded.
    /// Returns `Error::Invalid` if the stream ends in the middle of the data.
    pub fn decompress(&mut self, read: &mut impl Read, pixels: &mut [u8]) -> Result<usize> {
        let minimum_code_size = u8::read(read)?;

        if u32::from(minimum_code_size) >= MAX_CODE_SIZE {
            return Err(Error::invalid("lzw minimum code size"));
        }

        let clear_code = 1_usize << minimum_code_size;
        let end_code = clear_code + 1;

        let mut available = clear_code + 2;
        let mut previous_code: Option<usize> = None;
        let mut code_size = u32::from(minimum_code_size) + 1;
        let mut code_mask = max_code(code_size);

        for code in 0 .. clear_code {
            self.prefix[code] = 0;
            self.suffix[code] = code as u8;
        }

        let mut accumulator = 0_u32;
        let mut bit_count = 0_u32;
        let mut block_len = 0;
        let mut block_index = 0;
        let mut terminated = false;
        let mut first = 0_u8;
        let mut decoded = 0;

        self.stack.clear();

        while decoded < pixels.len() {
            if let Some(pixel) = self.stack.pop() {
                pixels[decoded] = pixel;
                decoded += 1;
                continue;
            }

            // load bytes until there are enough bits for a code
            if bit_count < code_size {
                if block_index == block_len {
                    block_len = read_sub_block(read, &mut self.block)?;
                    block_index = 0;

                    if block_len == 0 {
                        terminated = true;
                        break;
                    }
                }

                accumulator |= u32::from(self.block[block_index]) << bit_count;
                bit_count += 8;
                block_index += 1;
                continue;
            }

            let mut code = accumulator as usize & code_mask;
            accumulator >>= code_size;
            bit_count -= code_size;

            // a code equal to the next free code is valid, it repeats the previous string
            if code > available {
                log::debug!("invalid lzw code {} (next free code is {}), skipping remaining pixels", code, available);
                break;
            }

            if code == end_code {
                break;
            }

            if code == clear_code {
                code_size = u32::from(minimum_code_size) + 1;
                code_mask = max_code(code_size);
                available = clear_code + 2;
                previous_code = None;
                continue;
            }

            let previous = match previous_code {
                Some(previous) => previous,
                None => {
                    // the dictionary is empty, so only single indices can follow a clear code
                    if code > clear_code {
                        log::debug!("lzw code {} follows a clear code, skipping remaining pixels", code);
                        break;
                    }

                    first = self.suffix[code];
                    self.stack.push(first);
                    previous_code = Some(code);
                    continue;
                }
            };

            let current_code = code;

            if code == available {
                self.stack.push(first);
                code = previous;
            }

            while code > clear_code {
                self.stack.push(self.suffix[code]);
                code = usize::from(self.prefix[code]);
            }

            first = self.suffix[code];
            self.stack.push(first);

            // a full dictionary stays as it is until the next clear code
            if available >= MAX_CODES {
                continue;
            }

            self.prefix[available] = previous as u16;
            self.suffix[available] = first;
            available += 1;

            if available & code_mask == 0 && available < MAX_CODES {
                code_size += 1;
                code_mask += available;
            }

            previous_code = Some(current_code);
        }

        for pixel in &mut pixels[decoded ..] {
            *pixel = 0;
        }

        if !terminated {
            skip_sub_blocks(read)?;
        }

        Ok(decoded)
    }
}
