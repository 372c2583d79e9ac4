//! Fuzzy testing.
//! Tries to discover panics with random and damaged bytes.
//! The long running test is marked with `#[ignore]`. To run it, use `cargo test -- --ignored`.

extern crate anigif;
extern crate rand;

use std::panic::catch_unwind;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use anigif::prelude::*;


fn options() -> DecoderOptions {
    DecoderOptions::default().with_max_canvas_pixels(1 << 20)
}

fn valid_animation() -> Vec<u8> {
    let mut bytes = Vec::new();

    {
        let mut encoder = Encoder::new();
        encoder.set_repeat(0);
        encoder.set_transparent(Some(Rgb::new(0, 0, 0)), false);

        assert!(encoder.start(&mut bytes));
        for frame in 0 .. 3_usize {
            let image = BgrImage::from_fn((24, 16), |Vec2(x, y)| {
                Rgb::new((x * 10) as u8, (y * 15) as u8, (frame * 80) as u8)
            });

            assert!(encoder.add_frame(&image));
        }

        assert!(encoder.finish());
    }

    bytes
}

/// Decode the bytes, and make sure the decoder does not panic.
/// Returns the status of the decoder.
fn decode_without_panic(bytes: Vec<u8>) -> Status {
    let result = catch_unwind(move || {
        let mut decoder = Decoder::with_options(options());
        let status = decoder.read(bytes.as_slice());

        // accessing the partial result must not panic either
        for frame in decoder.frames() {
            assert_eq!(frame.image.size(), decoder.frame_size());
        }

        status
    });

    match result {
        Ok(status) => status,
        Err(_) => panic!("decoder panicked"),
    }
}


#[test]
fn damaged_animation(){
    let valid = valid_animation();
    assert_eq!(decode_without_panic(valid.clone()), Status::Ok);

    let mut random = StdRng::seed_from_u64(1);

    for _ in 0 .. 512 {
        let mut damaged = valid.clone();

        for _ in 0 .. random.random_range(1 .. 8) {
            let index = random.random_range(0 .. damaged.len());
            damaged[index] = random.random();
        }

        decode_without_panic(damaged);
    }
}

#[test]
fn truncated_animation(){
    let valid = valid_animation();

    for length in 0 .. valid.len() {
        let status = decode_without_panic(valid[.. length].to_vec());
        assert_eq!(status, Status::FormatError, "truncated at {}", length);
    }
}

#[test]
fn random_bytes_after_header(){
    let mut random = StdRng::seed_from_u64(2);

    for _ in 0 .. 256 {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[ 16, 0, 16, 0, 0x80, 0, 0, 0, 0, 0, 255, 255, 255 ]);

        let length = random.random_range(0 .. 512);
        bytes.extend((0 .. length).map(|_| random.random::<u8>()));

        decode_without_panic(bytes);
    }
}

#[test]
#[ignore]
fn many_damaged_animations(){
    let valid = valid_animation();
    let mut random = StdRng::seed_from_u64(3);

    for _ in 0 .. 100_000 {
        let mut damaged = valid.clone();

        let start = random.random_range(0 .. damaged.len());
        let end = (start + random.random_range(1 .. 64)).min(damaged.len());
        for byte in &mut damaged[start .. end] { *byte = random.random(); }

        decode_without_panic(damaged);
    }
}
