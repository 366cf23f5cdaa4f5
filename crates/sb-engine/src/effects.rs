//! Per-channel effects: state-variable filter, distortion, drive, panner
//! and the stereo cross-feed delay.

use alloc::vec;
use alloc::vec::Vec;
use sb_ir::{FilterType, Instrument, Param, Waveform};

use crate::oscillator::{osc_sin, oscillate, Noise, TAU};

/// Streaming delay capacity in frames.
pub const MAX_DELAY: usize = 1 << 17;

/// Effect coefficients derived from an instrument and a row length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FxParams {
    pub lfo_wave: Waveform,
    pub lfo_amt: f64,
    pub lfo_freq: f64,
    /// LFO modulates the filter cutoff.
    pub lfo_fx: bool,
    pub filter: FilterType,
    pub fx_freq: f64,
    pub q: f64,
    pub dist: f64,
    pub drive: f64,
    pub pan_amt: f64,
    pub pan_freq: f64,
    pub delay_amt: f64,
    /// Delay length in frames.
    pub delay_frames: usize,
}

impl FxParams {
    /// `row_len` is in render-rate samples.
    pub fn new(inst: &Instrument, row_len: f64) -> Self {
        let byte = |p: Param| inst.get(p) as f64;
        let delay_words = (inst.get(Param::FxDelayTime) as f64 * row_len) as u64 & !1;
        Self {
            lfo_wave: inst.lfo_waveform(),
            lfo_amt: byte(Param::LfoAmt) / 512.0,
            lfo_freq: libm::pow(2.0, byte(Param::LfoFreq) - 9.0) / row_len,
            lfo_fx: inst.get(Param::LfoFxFreq) != 0,
            filter: inst.filter_type(),
            fx_freq: byte(Param::FxFreq) * 43.23529 * 3.141592 / 44100.0,
            q: 1.0 - byte(Param::FxResonance) / 255.0,
            dist: byte(Param::FxDist) * 1e-5,
            drive: byte(Param::FxDrive) / 32.0,
            pan_amt: byte(Param::FxPanAmt) / 512.0,
            pan_freq: TAU * libm::pow(2.0, byte(Param::FxPanFreq) - 9.0) / row_len,
            delay_amt: byte(Param::FxDelayAmt) / 255.0,
            delay_frames: (delay_words / 2) as usize,
        }
    }
}

/// Filter registers plus the silence gate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterState {
    low: f64,
    band: f64,
    active: bool,
}

impl FilterState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the last processed sample was still audible.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Run one dry mono sample through filter, distortion, drive and panner.
    ///
    /// `k` is the LFO/pan time base (twice the absolute frame index).
    /// Returns the dry-of-delay `(left, right)` pair; silent input on an
    /// inactive filter is skipped and yields `(0, 0)`.
    #[inline]
    pub fn process(&mut self, x: f64, fx: &FxParams, k: f64, noise: &mut Noise) -> (f64, f64) {
        if x == 0.0 && !self.active {
            return (0.0, 0.0);
        }

        let mut f = fx.fx_freq;
        if fx.lfo_fx {
            f *= oscillate(fx.lfo_wave, fx.lfo_freq * k, noise) * fx.lfo_amt + 0.5;
        }
        f = 1.5 * libm::sin(f);
        self.low += f * self.band;
        let high = fx.q * (x - self.band) - self.low;
        self.band += f * high;
        let mut s = match fx.filter {
            FilterType::BandPass => self.band,
            FilterType::HighPass => high,
            FilterType::LowPass => self.low,
        };

        if fx.dist != 0.0 {
            s *= fx.dist;
            s = if s < 1.0 {
                if s > -1.0 {
                    osc_sin(s * 0.25, noise)
                } else {
                    -1.0
                }
            } else {
                1.0
            };
            s /= fx.dist;
        }

        s *= fx.drive;
        self.active = s * s > 1e-5;

        let t = libm::sin(fx.pan_freq * k) * fx.pan_amt + 0.5;
        (s * (1.0 - t), s * t)
    }
}

/// Circular stereo delay with cross-feed (left reads right, right reads left).
#[derive(Clone, Debug)]
pub struct DelayLine {
    left: Vec<f64>,
    right: Vec<f64>,
    write: usize,
    mask: usize,
}

impl DelayLine {
    /// `capacity` is rounded up to a power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        Self {
            left: vec![0.0; capacity],
            right: vec![0.0; capacity],
            write: 0,
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    pub fn reset(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.write = 0;
    }

    /// Feed one wet frame through the delay. A zero delay length (or amount)
    /// passes the frame through but still records it.
    #[inline]
    pub fn process(&mut self, left: f64, right: f64, delay_frames: usize, amount: f64) -> (f64, f64) {
        let delay = delay_frames.min(self.mask);
        let (mut l, mut r) = (left, right);
        if delay > 0 && amount != 0.0 {
            let read = self.write.wrapping_sub(delay) & self.mask;
            l += self.right[read] * amount;
            r += self.left[read] * amount;
        }
        self.left[self.write] = l;
        self.right[self.write] = r;
        self.write = (self.write + 1) & self.mask;
        (l, r)
    }
}

/// Filter chain plus delay line: the persistent effect state of one
/// streaming channel.
#[derive(Clone, Debug)]
pub struct EffectsProcessor {
    filter: FilterState,
    delay: DelayLine,
}

impl EffectsProcessor {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DELAY)
    }

    pub fn with_capacity(delay_capacity: usize) -> Self {
        Self {
            filter: FilterState::default(),
            delay: DelayLine::new(delay_capacity),
        }
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.delay.reset();
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Process one dry mono sample into a wet stereo frame. The delay runs
    /// on every sample, gated or not.
    #[inline]
    pub fn process(&mut self, x: f64, fx: &FxParams, k: f64, noise: &mut Noise) -> (f64, f64) {
        let (l, r) = self.filter.process(x, fx, k, noise);
        self.delay.process(l, r, fx.delay_frames, fx.delay_amt)
    }
}

impl Default for EffectsProcessor {
    fn default() -> Self {
        Self::new()
    }
}
