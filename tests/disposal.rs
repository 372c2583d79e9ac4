//! Decode hand-built streams that exercise compositing,
//! interlacing, and error handling.

extern crate anigif;

use anigif::prelude::*;
use anigif::meta::attribute::{ScreenDescriptor, GraphicControl, ImageDescriptor, LoopExtension};
use anigif::compression::compress_indices;

const BLACK: Rgb = Rgb::BLACK;
const RED: Rgb = Rgb::new(255, 0, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);


/// Writes gif blocks into a byte vector.
struct Stream { bytes: Vec<u8> }

impl Stream {
    fn new(size: (usize, usize), background_index: u8) -> Self {
        let table = ColorTable::new(vec![ BLACK, RED, GREEN, BLUE ]).unwrap();

        let meta = MetaData {
            version: *anigif::meta::VERSION_89A,
            screen: ScreenDescriptor {
                size: size.into(),
                global_table_bits: Some(table.size_bits()),
                color_resolution: 7, sorted: false,
                background_index, pixel_aspect: 0,
            },
            global_table: Some(table),
        };

        let mut bytes = Vec::new();
        MetaData::write_header(&mut bytes).unwrap();
        meta.write_screen(&mut bytes).unwrap();
        Stream { bytes }
    }

    fn control(mut self, disposal: Disposal, transparent_index: Option<u8>) -> Self {
        GraphicControl { disposal, user_input: false, transparent_index, delay: 10 }
            .write(&mut self.bytes).unwrap();

        self
    }

    fn image(mut self, position: (usize, usize), size: (usize, usize), interlaced: bool, indices: &[u8]) -> Self {
        ImageDescriptor { bounds: Rect::new(position, size), local_table_bits: None, interlaced, sorted: false }
            .write(&mut self.bytes).unwrap();

        self.bytes.extend_from_slice(&compress_indices(indices, 2).unwrap());
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }
}

fn decode(bytes: &[u8]) -> Decoder {
    let mut decoder = Decoder::new();
    assert_eq!(decoder.read(bytes), Status::Ok, "{:?}", decoder.last_error());
    decoder
}

fn row(image: &RgbaImage, y: usize) -> Vec<Option<Rgb>> {
    (0 .. image.size().width())
        .map(|x| image.pixel(Vec2(x, y)))
        .map(|pixel| if pixel.is_transparent() { None } else { Some(pixel.rgb()) })
        .collect()
}


#[test]
fn background_disposal_with_transparency(){
    let bytes = Stream::new((4, 1), 0)
        .control(Disposal::Keep, None)
        .image((0, 0), (4, 1), false, &[ 1, 1, 2, 2 ])
        .control(Disposal::Background, Some(0))
        .image((0, 0), (2, 1), false, &[ 3, 3 ])
        .image((2, 0), (2, 1), false, &[ 0, 0 ])
        .finish();

    let decoder = decode(&bytes);
    assert_eq!(decoder.frame_count(), 3);

    assert_eq!(row(decoder.frame(0).unwrap(), 0), vec![ Some(RED), Some(RED), Some(GREEN), Some(GREEN) ]);
    assert_eq!(row(decoder.frame(1).unwrap(), 0), vec![ Some(BLUE), Some(BLUE), Some(GREEN), Some(GREEN) ]);

    // the area of the second frame is cleared, the rest of the canvas is untouched
    assert_eq!(row(decoder.frame(2).unwrap(), 0), vec![ None, None, Some(GREEN), Some(GREEN) ]);
}

#[test]
fn background_disposal_without_transparency(){
    let bytes = Stream::new((3, 1), 2)
        .control(Disposal::Background, None)
        .image((0, 0), (3, 1), false, &[ 1, 1, 1 ])
        .control(Disposal::None, None)
        .image((2, 0), (1, 1), false, &[ 3 ])
        .finish();

    let decoder = decode(&bytes);
    assert_eq!(decoder.background_color(), Some(GREEN));
    assert_eq!(row(decoder.frame(1).unwrap(), 0), vec![ Some(GREEN), Some(GREEN), Some(BLUE) ]);
}

#[test]
fn previous_disposal(){
    let bytes = Stream::new((4, 1), 0)
        .control(Disposal::Keep, None)
        .image((0, 0), (4, 1), false, &[ 1, 1, 1, 1 ])
        .control(Disposal::Previous, None)
        .image((0, 0), (1, 1), false, &[ 3 ])
        .control(Disposal::None, None)
        .image((3, 0), (1, 1), false, &[ 2 ])
        .finish();

    let decoder = decode(&bytes);
    assert_eq!(row(decoder.frame(1).unwrap(), 0), vec![ Some(BLUE), Some(RED), Some(RED), Some(RED) ]);
    assert_eq!(row(decoder.frame(2).unwrap(), 0), vec![ Some(RED), Some(RED), Some(RED), Some(GREEN) ]);
}

#[test]
fn previous_disposal_of_first_frame(){
    let bytes = Stream::new((2, 1), 0)
        .control(Disposal::Previous, None)
        .image((0, 0), (2, 1), false, &[ 1, 1 ])
        .image((1, 0), (1, 1), false, &[ 3 ])
        .finish();

    let decoder = decode(&bytes);
    assert_eq!(row(decoder.frame(1).unwrap(), 0), vec![ None, Some(BLUE) ]);
}

#[test]
fn reserved_disposal_keeps_frame(){
    let mut bytes = Stream::new((2, 1), 0).bytes;
    bytes.extend_from_slice(&[ 0x21, 0xF9, 4, 0b0001_1100, 0, 0, 0, 0 ]);

    let bytes = Stream { bytes }
        .image((0, 0), (2, 1), false, &[ 1, 1 ])
        .image((1, 0), (1, 1), false, &[ 3 ])
        .finish();

    let decoder = decode(&bytes);
    assert_eq!(decoder.frames().next().unwrap().disposal, Disposal::Keep);
    assert_eq!(row(decoder.frame(1).unwrap(), 0), vec![ Some(RED), Some(BLUE) ]);
}

#[test]
fn interlaced_rows(){
    // row y stores index y % 4, in interlaced order 0, 8, 4, 2, 6, 1, 3, 5, 7, 9
    let order = [ 0_usize, 8, 4, 2, 6, 1, 3, 5, 7, 9 ];
    let stored: Vec<u8> = order.iter().map(|&y| (y % 4) as u8).collect();

    let bytes = Stream::new((1, 10), 0)
        .image((0, 0), (1, 10), true, &stored)
        .finish();

    let decoder = decode(&bytes);
    let frame = decoder.frames().next().unwrap();
    assert!(frame.interlaced);

    let colors = [ BLACK, RED, GREEN, BLUE ];
    for y in 0 .. 10 {
        assert_eq!(frame.image.pixel(Vec2(0, y)).rgb(), colors[y % 4], "row {}", y);
    }
}

#[test]
fn frames_are_clipped_to_canvas(){
    let bytes = Stream::new((2, 2), 0)
        .image((1, 1), (3, 3), false, &[ 1, 2, 2,  2, 2, 2,  2, 2, 2 ])
        .finish();

    let decoder = decode(&bytes);
    let image = decoder.image().unwrap();
    assert_eq!(row(image, 0), vec![ None, None ]);
    assert_eq!(row(image, 1), vec![ None, Some(RED) ]);
}

#[test]
fn truncated_frame_keeps_previous_frames(){
    let complete = Stream::new((2, 2), 0)
        .image((0, 0), (2, 2), false, &[ 1, 1, 1, 1 ])
        .image((0, 0), (2, 2), false, &[ 2, 2, 2, 2 ])
        .finish();

    // cut the stream in the middle of the pixel data of the second frame
    let second_frame = complete.len() - 1 - compress_indices(&[ 2, 2, 2, 2 ], 2).unwrap().len();
    let truncated = &complete[.. second_frame + 2];

    let mut decoder = Decoder::new();
    assert_eq!(decoder.read(truncated), Status::FormatError);
    assert_eq!(decoder.frame_count(), 1);
    assert!(matches!(decoder.last_error(), Some(Error::Invalid(_))));
    assert_eq!(row(decoder.frame(0).unwrap(), 1), vec![ Some(RED), Some(RED) ]);
}

#[test]
fn loop_count_and_unknown_application(){
    let mut stream = Stream::new((1, 1), 0);

    stream.bytes.extend_from_slice(&[ 0x21, 0xFF, 11 ]);
    stream.bytes.extend_from_slice(b"ANIMEXTS1.0");
    stream.bytes.extend_from_slice(&[ 3, 1, 9, 0, 0 ]);
    LoopExtension { count: 4 }.write(&mut stream.bytes).unwrap();

    let bytes = stream.image((0, 0), (1, 1), false, &[ 3 ]).finish();

    let decoder = decode(&bytes);
    assert_eq!(decoder.loop_count(), 4);
    assert_eq!(decoder.frame_count(), 1);
}
