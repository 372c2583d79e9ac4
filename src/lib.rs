//! Read and write animated gif files.
//!
//! Frames are reduced to 256 colors by a neural network quantizer,
//! compressed with LZW, and written as gif89a blocks by the `Encoder`.
//! The `Decoder` parses any gif stream and composites every frame
//! according to the disposal of the frame before it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub mod io;
pub mod math;
pub mod compression;
pub mod quantize;
pub mod meta;
pub mod image;
pub mod error;


/// Re-exports of all types commonly required for reading and writing animations.
pub mod prelude {

    // main exports
    pub use crate::image::write::Encoder;
    pub use crate::image::read::Decoder;
    pub use crate::meta::MetaData;

    // core data types
    pub use crate::image::{BgrSource, BgrImage, RgbaImage, Frame};
    pub use crate::image::write::options::EncoderOptions;
    pub use crate::image::read::options::DecoderOptions;
    pub use crate::meta::palette::{Rgb, Rgba, ColorTable};
    pub use crate::meta::attribute::Disposal;
    pub use crate::math::{Vec2, Rect};

    // secondary data types
    pub use crate::meta;
    pub use crate::error::{self, Error, Status, Result, UnitResult};
}
