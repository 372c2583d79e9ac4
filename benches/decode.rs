#[macro_use]
extern crate bencher;

extern crate anigif;
use anigif::prelude::*;
use anigif::compression::{compress_indices, Decompressor};

use bencher::Bencher;


fn encoded_animation() -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut encoder = Encoder::new();
    encoder.set_repeat(0);

    assert!(encoder.start(&mut bytes));

    for frame in 0 .. 8_usize {
        let image = BgrImage::from_fn((320, 240), |Vec2(x, y)| {
            Rgb::new((x + frame * 8) as u8, y as u8, (x ^ y) as u8)
        });

        assert!(encoder.add_frame(&image));
    }

    assert!(encoder.finish());
    drop(encoder);
    bytes
}

/// Parse, decompress and composite all frames
fn decode_animation(bench: &mut Bencher) {
    let bytes = encoded_animation();
    let mut decoder = Decoder::new();

    bench.iter(||{
        assert_eq!(decoder.read(bytes.as_slice()), Status::Ok);
        bencher::black_box(decoder.frame_count());
    })
}

/// Decompress a single large frame without compositing
fn decompress_gradient(bench: &mut Bencher) {
    let indices: Vec<u8> = (0 .. 1024 * 1024_usize).map(|i| (i % 1024 / 4) as u8).collect();
    let compressed = compress_indices(&indices, 8).unwrap();

    let mut decompressor = Decompressor::new();
    let mut decompressed = vec![ 0_u8; indices.len() ];

    bench.iter(||{
        decompressor.decompress(&mut compressed.as_slice(), &mut decompressed).unwrap();
        bencher::black_box(&decompressed);
    })
}

benchmark_group!(decode,
    decode_animation,
    decompress_gradient
);

benchmark_main!(decode);
