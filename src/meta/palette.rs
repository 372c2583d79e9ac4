//! Colors and color tables.

use smallvec::SmallVec;
use crate::io::*;
use crate::math::ceil_log_2;
use crate::error::{Result, UnitResult, Error};


/// The largest number of entries any color table can have.
pub const MAX_COLORS: usize = 256;


/// A color without transparency, as stored in gif color tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {

    /// The red channel.
    pub red: u8,

    /// The green channel.
    pub green: u8,

    /// The blue channel.
    pub blue: u8,
}

/// A color with transparency, as produced when decoding frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {

    /// The red channel.
    pub red: u8,

    /// The green channel.
    pub green: u8,

    /// The blue channel.
    pub blue: u8,

    /// Zero for transparent pixels, 255 otherwise.
    pub alpha: u8,
}

impl Rgb {

    /// Black.
    pub const BLACK: Rgb = Rgb { red: 0, green: 0, blue: 0 };

    /// Create a color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Rgb { red, green, blue }
    }

    /// This color, fully opaque.
    pub const fn opaque(self) -> Rgba {
        Rgba { red: self.red, green: self.green, blue: self.blue, alpha: 255 }
    }

    /// Squared euclidean distance in rgb space.
    pub fn distance_squared(self, other: Rgb) -> u32 {
        let difference = |a: u8, b: u8| (i32::from(a) - i32::from(b)).pow(2) as u32;
        difference(self.red, other.red) + difference(self.green, other.green) + difference(self.blue, other.blue)
    }
}

impl Rgba {

    /// The color of pixels that no frame has drawn yet.
    pub const TRANSPARENT: Rgba = Rgba { red: 0, green: 0, blue: 0, alpha: 0 };

    /// Whether this pixel will show anything underneath it.
    pub fn is_transparent(self) -> bool {
        self.alpha == 0
    }

    /// The color channels, ignoring transparency.
    pub fn rgb(self) -> Rgb {
        Rgb::new(self.red, self.green, self.blue)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self { Rgb::new(red, green, blue) }
}


/// The list of colors referenced by the indexed pixels of a frame.
/// In the file, the number of entries is always a power of two between 2 and 256.
/// Shorter tables are padded with black when written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: SmallVec<[Rgb; MAX_COLORS]>,
}

impl ColorTable {

    /// Create a table from a list of colors.
    /// Returns an error if there are more than 256 colors.
    pub fn new(entries: impl IntoIterator<Item = Rgb>) -> Result<Self> {
        let entries: SmallVec<[Rgb; MAX_COLORS]> = entries.into_iter().collect();

        if entries.len() > MAX_COLORS {
            return Err(Error::invalid("color table has more than 256 entries"));
        }

        Ok(ColorTable { entries })
    }

    /// Create a table from packed `r, g, b` triples.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 3 != 0 {
            return Err(Error::invalid("color table byte count"));
        }

        Self::new(bytes.chunks_exact(3).map(|rgb| Rgb::new(rgb[0], rgb[1], rgb[2])))
    }

    /// The colors in this table.
    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    /// Number of colors actually present, excluding padding.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this table contains no colors at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the color at an index.
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.entries.get(index).copied()
    }

    /// The three bit size field of the packed descriptor byte.
    /// The table holds `2 << size_bits` entries in the file.
    pub fn size_bits(&self) -> u8 {
        let len = self.len().max(2) as u32;
        (ceil_log_2(len) - 1) as u8
    }

    /// Number of entries written to the file, including padding.
    pub fn declared_len(&self) -> usize {
        2 << self.size_bits()
    }

    /// Number of bytes written to the file, including padding.
    pub fn byte_size(&self) -> usize {
        self.declared_len() * 3
    }

    /// Write all colors, padded with black up to the declared size.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        let mut bytes = Vec::with_capacity(self.byte_size());

        for color in &self.entries {
            bytes.extend_from_slice(&[ color.red, color.green, color.blue ]);
        }

        bytes.resize(self.byte_size(), 0);
        u8::write_slice(write, &bytes)
    }

    /// Read a table with `2 << size_bits` entries.
    pub fn read(read: &mut impl Read, size_bits: u8) -> Result<Self> {
        let len = 2_usize << (size_bits & 7);
        let mut bytes = vec![0_u8; len * 3];

        u8::read_slice(read, &mut bytes)
            .map_err(|_| Error::invalid("truncated color table"))?;

        Self::from_rgb_bytes(&bytes)
    }

    /// All 256 possible indices mapped to opaque colors.
    /// Indices beyond the end of this table map to transparent black.
    pub fn to_lookup(&self) -> [Rgba; MAX_COLORS] {
        let mut lookup = [Rgba::TRANSPARENT; MAX_COLORS];

        for (target, color) in lookup.iter_mut().zip(&self.entries) {
            *target = color.opaque();
        }

        lookup
    }
}


/// A quantized color table, together with
/// a flag for each entry marking whether any pixel of the frame uses it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {

    /// The colors, in the order they are written to the file.
    pub table: ColorTable,

    /// Whether an index is referenced by at least one pixel.
    pub used: [bool; MAX_COLORS],
}

impl Palette {

    /// Create a palette where no entry is used yet.
    pub fn new(table: ColorTable) -> Self {
        Palette { table, used: [false; MAX_COLORS] }
    }

    /// Mark an index as referenced by a pixel.
    #[inline]
    pub fn mark_used(&mut self, index: u8) {
        self.used[index as usize] = true;
    }

    fn used_entries(&self) -> impl Iterator<Item = (usize, Rgb)> + '_ {
        self.table.entries().iter().copied().enumerate()
            .filter(move |&(index, _)| self.used[index])
    }

    /// The used entry with the smallest euclidean distance to the color.
    /// Returns the first entry if no entry is used.
    pub fn find_closest(&self, color: Rgb) -> u8 {
        let mut closest_index = 0;
        let mut closest_distance = 256 * 256 * 256;

        for (index, entry) in self.used_entries() {
            let distance = entry.distance_squared(color);

            if distance < closest_distance {
                closest_distance = distance;
                closest_index = index;
            }
        }

        closest_index as u8
    }

    /// The first used entry that equals the color exactly.
    pub fn find_exact(&self, color: Rgb) -> Option<u8> {
        self.used_entries()
            .find(|&(_, entry)| entry == color)
            .map(|(index, _)| index as u8)
    }
}
