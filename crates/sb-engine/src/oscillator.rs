//! Waveform generators and pitch conversion.
//!
//! Oscillator phase is an accumulating cycle count (1.0 = one period) and
//! is never wrapped.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sb_ir::Waveform;

/// `2π` as the synth has always spelled it.
pub(crate) const TAU: f64 = 6.283184;

/// Frequency of pitch code 128 in cycles per sample at 44100 Hz (F3, 174.61 Hz).
const BASE_FREQ: f64 = 0.003959503758;

/// Seeded random source for sine dither and the noise oscillator.
#[derive(Clone, Debug)]
pub struct Noise {
    rng: Pcg32,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform value in `[-1, 1)`.
    #[inline]
    pub fn bipolar(&mut self) -> f64 {
        2.0 * self.unit() - 1.0
    }
}

/// Sine with ±0.005 dither.
#[inline]
pub fn osc_sin(phase: f64, noise: &mut Noise) -> f64 {
    libm::sin(phase * TAU) + (noise.unit() - 0.5) * 0.01
}

#[inline]
pub fn osc_square(phase: f64) -> f64 {
    if phase % 1.0 < 0.5 {
        1.0
    } else {
        -1.0
    }
}

#[inline]
pub fn osc_saw(phase: f64) -> f64 {
    2.0 * (phase % 1.0) - 1.0
}

#[inline]
pub fn osc_tri(phase: f64) -> f64 {
    let v = (phase % 1.0) * 4.0;
    if v < 2.0 {
        v - 1.0
    } else {
        3.0 - v
    }
}

/// Evaluate a waveform at `phase`.
#[inline]
pub fn oscillate(wave: Waveform, phase: f64, noise: &mut Noise) -> f64 {
    match wave {
        Waveform::Sine => osc_sin(phase, noise),
        Waveform::Square => osc_square(phase),
        Waveform::Saw => osc_saw(phase),
        Waveform::Triangle => osc_tri(phase),
    }
}

/// Frequency (cycles per 44100 Hz sample) of an absolute pitch code.
///
/// `note` is the pattern pitch plus arpeggio offset plus oscillator
/// semitone setting, minus 128; 128 itself is F3.
#[inline]
pub fn note_frequency(note: i32) -> f64 {
    BASE_FREQ * libm::pow(2.0, (note - 128) as f64 / 12.0)
}
