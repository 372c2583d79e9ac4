//! Reduces true color pixels to a palette of 256 colors,
//! using a self-organizing Kohonen network (NeuQuant).
//!
//! All arithmetic is done with fixed-point integers,
//! so that the same pixels always produce the same palette.

use crate::meta::palette::{ColorTable, Rgb, MAX_COLORS};
use crate::error::Result;


/// Number of neurons, which is the number of colors in the palette.
const NETWORK_SIZE: usize = MAX_COLORS;

// four primes near 500, used to step through the pixels in a non-periodic order
const PRIMES: [usize; 4] = [ 499, 491, 487, 503 ];

/// Smaller images are sampled completely.
const MIN_PICTURE_BYTES: usize = 3 * 503;

/// Number of learning cycles, after each of which alpha and radius are decreased.
const LEARNING_CYCLES: usize = 100;

// color channels are stored with four extra fractional bits while learning
const NETWORK_BIAS_SHIFT: u32 = 4;

// frequency and bias are fixed-point values with 16 fractional bits
const INT_BIAS_SHIFT: u32 = 16;
const INT_BIAS: i32 = 1 << INT_BIAS_SHIFT;
const GAMMA_SHIFT: u32 = 10;
const BETA_SHIFT: u32 = 10;
const BETA: i32 = INT_BIAS >> BETA_SHIFT;
const BETA_GAMMA: i32 = INT_BIAS << (GAMMA_SHIFT - BETA_SHIFT);

// the neighbourhood radius starts at 32 neurons, with 6 fractional bits
const INITIAL_RADIUS_NEURONS: usize = NETWORK_SIZE >> 3;
const RADIUS_BIAS_SHIFT: u32 = 6;
const INITIAL_RADIUS: i32 = (INITIAL_RADIUS_NEURONS as i32) << RADIUS_BIAS_SHIFT;
const RADIUS_DECREASE: i32 = 30;

// the learning rate starts at 1.0, with 10 fractional bits
const ALPHA_BIAS_SHIFT: u32 = 10;
const INITIAL_ALPHA: i32 = 1 << ALPHA_BIAS_SHIFT;

// the neighbourhood falloff has 8 fractional bits, on top of alpha
const RADIUS_POWER_BIAS_SHIFT: u32 = 8;
const RADIUS_POWER_BIAS: i32 = 1 << RADIUS_POWER_BIAS_SHIFT;
const ALPHA_RADIUS_BIAS: i32 = 1 << (ALPHA_BIAS_SHIFT + RADIUS_POWER_BIAS_SHIFT);

/// The fastest sampling, which only looks at every 30th pixel.
pub const MAX_SAMPLE_FACTOR: i32 = 30;


/// Limit a sampling factor to the range 1 to 30.
pub fn clamp_sample_factor(sample_factor: i32) -> i32 {
    sample_factor.max(1).min(MAX_SAMPLE_FACTOR)
}


/// Blue, green, red, and finally the palette index of the neuron.
type Neuron = [i32; 4];


/// Trains a palette of 256 colors for a buffer of `b, g, r` pixels,
/// and maps colors to the closest palette index.
/// Keeps its network allocated, so it can be reused for many frames.
#[derive(Clone, Debug)]
pub struct NeuQuant {
    sample_factor: i32,

    network: Vec<Neuron>,

    /// For each green value, the neuron where the search for that green value starts.
    green_index: [usize; 256],

    bias: Vec<i32>,
    frequency: Vec<i32>,

    /// Precomputed learning rate for each distance to the winning neuron.
    radius_power: [i32; INITIAL_RADIUS_NEURONS],
}


impl NeuQuant {

    /// Create a quantizer with a sampling factor between 1 and 30.
    /// Lower factors look at more pixels and produce better palettes.
    /// Out of range factors are clamped.
    pub fn new(sample_factor: i32) -> Self {
        NeuQuant {
            sample_factor: clamp_sample_factor(sample_factor),
            network: vec![ [0; 4]; NETWORK_SIZE ],
            green_index: [0; 256],
            bias: vec![ 0; NETWORK_SIZE ],
            frequency: vec![ 0; NETWORK_SIZE ],
            radius_power: [0; INITIAL_RADIUS_NEURONS],
        }
    }

    /// The sampling factor used for learning.
    pub fn sample_factor(&self) -> i32 { self.sample_factor }

    /// Change the sampling factor for the next call to `process`, clamped to the valid range.
    pub fn set_sample_factor(&mut self, sample_factor: i32) {
        self.sample_factor = clamp_sample_factor(sample_factor);
    }

    /// Train the network on the pixels, freeze it, and return the palette.
    /// Every call starts with a fresh network.
    /// Trailing bytes that do not form a complete pixel are ignored.
    pub fn process(&mut self, bgr: &[u8]) -> Result<ColorTable> {
        let bgr = &bgr[.. bgr.len() - bgr.len() % 3];

        self.reset();
        self.learn(bgr);
        self.unbias();
        self.build_index();

        ColorTable::new(self.color_map())
    }

    fn reset(&mut self) {
        for (index, neuron) in self.network.iter_mut().enumerate() {
            let value = ((index << (NETWORK_BIAS_SHIFT + 8)) / NETWORK_SIZE) as i32;
            *neuron = [ value, value, value, 0 ];
        }

        for frequency in &mut self.frequency { *frequency = INT_BIAS / NETWORK_SIZE as i32; }
        for bias in &mut self.bias { *bias = 0; }
    }

    fn learn(&mut self, bgr: &[u8]) {
        let len = bgr.len();

        let sample_factor = if len < MIN_PICTURE_BYTES { 1 } else { self.sample_factor };
        let alpha_decrease = 30 + (sample_factor - 1) / 3;
        let sample_pixels = len / (3 * sample_factor as usize);
        let delta = (sample_pixels / LEARNING_CYCLES).max(1);

        let mut alpha = INITIAL_ALPHA;
        let mut radius = INITIAL_RADIUS;
        let mut neighbours = (radius >> RADIUS_BIAS_SHIFT) as usize;
        self.update_radius_power(alpha, neighbours);

        let step = if len < MIN_PICTURE_BYTES { 3 } else {
            let prime = PRIMES[.. 3].iter().copied()
                .find(|&prime| len % prime != 0)
                .unwrap_or(PRIMES[3]);

            3 * prime
        };

        let mut position = 0;

        for sample in 1 ..= sample_pixels {
            let channel = |offset: usize| i32::from(bgr[position + offset]) << NETWORK_BIAS_SHIFT;
            let color = [ channel(0), channel(1), channel(2) ];

            let winner = self.contest(color);
            self.alter_single(alpha, winner, color);

            if neighbours != 0 {
                self.alter_neighbours(neighbours, winner, color);
            }

            position += step;
            if position >= len { position -= len; }

            if sample % delta == 0 {
                alpha -= alpha / alpha_decrease;
                radius -= radius / RADIUS_DECREASE;

                neighbours = (radius >> RADIUS_BIAS_SHIFT) as usize;
                if neighbours <= 1 { neighbours = 0; }

                self.update_radius_power(alpha, neighbours);
            }
        }
    }

    fn update_radius_power(&mut self, alpha: i32, radius: usize) {
        let radius = radius as i32;

        for (distance, power) in self.radius_power.iter_mut().enumerate().take(radius as usize) {
            let distance = distance as i32;
            *power = alpha * (((radius * radius - distance * distance) * RADIUS_POWER_BIAS) / (radius * radius));
        }
    }

    /// Find the closest neuron, and update the frequencies of all neurons.
    /// Returns the neuron with the smallest distance minus bias,
    /// which gives rarely chosen neurons a chance to learn.
    fn contest(&mut self, color: [i32; 3]) -> usize {
        let mut best_distance = i32::MAX;
        let mut best_bias_distance = i32::MAX;
        let mut best_index = 0;
        let mut best_bias_index = 0;

        for index in 0 .. NETWORK_SIZE {
            let distance = manhattan_distance(&self.network[index], color);

            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }

            let bias_distance = distance.wrapping_sub(self.bias[index] >> (INT_BIAS_SHIFT - NETWORK_BIAS_SHIFT));
            if bias_distance < best_bias_distance {
                best_bias_distance = bias_distance;
                best_bias_index = index;
            }

            let beta_frequency = self.frequency[index] >> BETA_SHIFT;
            self.frequency[index] = self.frequency[index].wrapping_sub(beta_frequency);
            self.bias[index] = self.bias[index].wrapping_add(beta_frequency << GAMMA_SHIFT);
        }

        self.frequency[best_index] = self.frequency[best_index].wrapping_add(BETA);
        self.bias[best_index] = self.bias[best_index].wrapping_sub(BETA_GAMMA);
        best_bias_index
    }

    fn alter_single(&mut self, alpha: i32, index: usize, color: [i32; 3]) {
        let neuron = &mut self.network[index];

        for channel in 0 .. 3 {
            neuron[channel] -= (alpha * (neuron[channel] - color[channel])) / INITIAL_ALPHA;
        }
    }

    /// Move the neurons next to the winner towards the color,
    /// by an amount that decreases with the distance to the winner.
    fn alter_neighbours(&mut self, radius: usize, index: usize, color: [i32; 3]) {
        let index = index as isize;
        let low = (index - radius as isize).max(-1);
        let high = (index + radius as isize).min(NETWORK_SIZE as isize);

        let mut up = index + 1;
        let mut down = index - 1;
        let mut distance = 1;

        while up < high || down > low {
            let power = self.radius_power[distance];
            distance += 1;

            let alter = |neuron: &mut Neuron| {
                for channel in 0 .. 3 {
                    neuron[channel] -= (power * (neuron[channel] - color[channel])) / ALPHA_RADIUS_BIAS;
                }
            };

            if up < high {
                alter(&mut self.network[up as usize]);
                up += 1;
            }

            if down > low {
                alter(&mut self.network[down as usize]);
                down -= 1;
            }
        }
    }

    /// Remove the fractional bits, and remember the palette index of each neuron before sorting.
    fn unbias(&mut self) {
        for (index, neuron) in self.network.iter_mut().enumerate() {
            for channel in &mut neuron[.. 3] {
                *channel >>= NETWORK_BIAS_SHIFT;
            }

            neuron[3] = index as i32;
        }
    }

    /// Sort the neurons by green, and record where each green value starts.
    fn build_index(&mut self) {
        let mut previous_green = 0;
        let mut start = 0;

        for index in 0 .. NETWORK_SIZE {
            let smallest = (index .. NETWORK_SIZE)
                .min_by_key(|&candidate| (self.network[candidate][1], candidate))
                .unwrap_or(index);

            self.network.swap(index, smallest);
            let green = self.network[index][1] as usize;

            if green != previous_green {
                self.green_index[previous_green] = (start + index) >> 1;

                for entry in &mut self.green_index[previous_green + 1 .. green] {
                    *entry = index;
                }

                previous_green = green;
                start = index;
            }
        }

        let last = NETWORK_SIZE - 1;
        self.green_index[previous_green] = (start + last) >> 1;

        for entry in &mut self.green_index[previous_green + 1 ..] {
            *entry = last;
        }
    }

    /// The palette in the original neuron order.
    fn color_map(&self) -> Vec<Rgb> {
        let mut colors = vec![ Rgb::BLACK; NETWORK_SIZE ];

        for neuron in &self.network {
            colors[neuron[3] as usize] = Rgb::new(neuron[2] as u8, neuron[1] as u8, neuron[0] as u8);
        }

        colors
    }

    /// The palette index of the color closest to the pixel, by manhattan distance.
    /// Only meaningful after `process` has been called.
    pub fn map(&self, blue: u8, green: u8, red: u8) -> u8 {
        let color = [ i32::from(blue), i32::from(green), i32::from(red) ];

        // larger than the largest possible distance of 3 * 255
        let mut best_distance = 1000;
        let mut best = 0;

        let mut up = self.green_index[usize::from(green)];
        let mut down = up as isize - 1;

        let mut test = |neuron: &Neuron, green_distance: i32, best_distance: &mut i32| {
            let mut distance = green_distance.abs() + (neuron[0] - color[0]).abs();
            if distance < *best_distance {
                distance += (neuron[2] - color[2]).abs();

                if distance < *best_distance {
                    *best_distance = distance;
                    best = neuron[3];
                }
            }
        };

        while up < NETWORK_SIZE || down >= 0 {
            if up < NETWORK_SIZE {
                let neuron = &self.network[up];
                let green_distance = neuron[1] - color[1];

                if green_distance >= best_distance { up = NETWORK_SIZE; }
                else {
                    up += 1;
                    test(neuron, green_distance, &mut best_distance);
                }
            }

            if down >= 0 {
                let neuron = &self.network[down as usize];
                let green_distance = color[1] - neuron[1];

                if green_distance >= best_distance { down = -1; }
                else {
                    down -= 1;
                    test(neuron, green_distance, &mut best_distance);
                }
            }
        }

        best as u8
    }
}

fn manhattan_distance(neuron: &Neuron, color: [i32; 3]) -> i32 {
    (neuron[0] - color[0]).abs() + (neuron[1] - color[1]).abs() + (neuron[2] - color[2]).abs()
}
