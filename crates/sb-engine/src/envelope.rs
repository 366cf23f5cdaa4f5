//! Attack / sustain / release amplitude envelope.

use sb_ir::{Instrument, Param};

/// Envelope segment durations, in samples at the render rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    attack: u32,
    sustain: u32,
    release: u32,
    /// Release curve exponent (`-decay / 16`).
    decay: f64,
}

/// Phase of a sounding envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Sustain,
    Release,
    Terminated,
}

impl Envelope {
    /// Durations `param² · 4`, scaled by `time_scale` (device rate / 44100).
    pub fn from_instrument(instrument: &Instrument, time_scale: f64) -> Self {
        let scaled = |p: Param| {
            let v = instrument.get(p) as u32;
            let samples = (v * v * 4) as f64 * time_scale;
            samples as u32
        };
        Self {
            attack: scaled(Param::EnvAttack),
            sustain: scaled(Param::EnvSustain),
            release: scaled(Param::EnvRelease),
            decay: -(instrument.get(Param::EnvExpDecay) as f64) / 16.0,
        }
    }

    pub fn attack(&self) -> u32 {
        self.attack
    }

    pub fn sustain(&self) -> u32 {
        self.sustain
    }

    pub fn release(&self) -> u32 {
        self.release
    }

    /// Total note length `A + S + R`.
    pub fn total(&self) -> u32 {
        self.attack + self.sustain + self.release
    }

    pub fn phase(&self, t: u32) -> EnvelopePhase {
        if t < self.attack {
            EnvelopePhase::Attack
        } else if t < self.attack + self.sustain {
            EnvelopePhase::Sustain
        } else if t < self.total() {
            EnvelopePhase::Release
        } else {
            EnvelopePhase::Terminated
        }
    }

    /// Envelope level at sample `t`, or `None` once the note has ended.
    #[inline]
    pub fn level(&self, t: u32) -> Option<f64> {
        match self.phase(t) {
            EnvelopePhase::Attack => Some(t as f64 / self.attack as f64),
            EnvelopePhase::Sustain => Some(1.0),
            EnvelopePhase::Release => {
                // A zero-length release never reaches this arm; clamp anyway.
                let u = (t - self.attack - self.sustain) as f64 / self.release.max(1) as f64;
                Some((1.0 - u) * libm::pow(3.0, self.decay * u))
            }
            EnvelopePhase::Terminated => None,
        }
    }
}
