//! Voice: one sounding note.

use alloc::vec::Vec;
use sb_ir::{Instrument, Param, Waveform};

use crate::envelope::Envelope;
use crate::oscillator::{note_frequency, oscillate, Noise};

/// Batch renderer amplitude scale (`≈ 0.002441481 · 32768`).
const BATCH_GAIN: f64 = 80.0;

/// Arpeggio rotation state.
///
/// The chord byte holds two semitone offsets (high and low nibble). Each step
/// rotates the state so the low nibble cycles `0, chord >> 4, chord & 15`.
#[derive(Clone, Copy, Debug)]
struct Arpeggio {
    state: u32,
    interval: f64,
    /// Samples until the next step; a step happens whenever this is >= 0.
    clock: f64,
}

impl Arpeggio {
    fn new(chord: u8, speed: u8, row_len: f64) -> Self {
        Self {
            state: chord as u32,
            interval: row_len * libm::pow(2.0, 2.0 - speed as f64),
            clock: 0.0,
        }
    }

    /// Advance one sample. Returns the new semitone offset on a step.
    #[inline]
    fn tick(&mut self) -> Option<i32> {
        let step = if self.clock >= 0.0 {
            self.state = (self.state >> 8) | ((self.state & 255) << 4);
            self.clock -= self.interval;
            Some((self.state & 15) as i32)
        } else {
            None
        };
        self.clock += 1.0;
        step
    }
}

/// A single voice with a frozen copy of its instrument.
#[derive(Clone, Debug)]
pub struct Voice {
    instrument: Instrument,
    envelope: Envelope,
    note: u8,
    /// Samples since trigger.
    elapsed: u32,
    osc1_phase: f64,
    osc2_phase: f64,
    osc1_freq: f64,
    osc2_freq: f64,
    arpeggio: Arpeggio,
    /// Divides oscillator frequencies (device rate / 44100).
    time_scale: f64,
    osc1_wave: Waveform,
    osc2_wave: Waveform,
    osc1_vol: f64,
    osc2_vol: f64,
    osc1_xenv: f64,
    osc2_xenv: f64,
    noise_vol: f64,
}

impl Voice {
    /// Trigger `note` on a snapshot of `instrument`.
    ///
    /// `row_len` is in render-rate samples and sets the arpeggio interval;
    /// `time_scale` is the render rate divided by 44100.
    pub fn new(instrument: &Instrument, note: u8, row_len: f64, time_scale: f64) -> Self {
        let instrument = *instrument;
        Self {
            envelope: Envelope::from_instrument(&instrument, time_scale),
            note,
            elapsed: 0,
            osc1_phase: 0.0,
            osc2_phase: 0.0,
            osc1_freq: 0.0,
            osc2_freq: 0.0,
            arpeggio: Arpeggio::new(
                instrument.get(Param::ArpChord),
                instrument.get(Param::ArpSpeed),
                row_len,
            ),
            time_scale,
            osc1_wave: instrument.osc1_waveform(),
            osc2_wave: instrument.osc2_waveform(),
            osc1_vol: instrument.get(Param::Osc1Volume) as f64,
            osc2_vol: instrument.get(Param::Osc2Volume) as f64,
            osc1_xenv: instrument.get(Param::Osc1Xenv) as f64 / 32.0,
            osc2_xenv: instrument.get(Param::Osc2Xenv) as f64 / 32.0,
            noise_vol: instrument.get(Param::NoiseVolume) as f64,
            instrument,
        }
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Samples since trigger.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Samples this voice produces in total.
    pub fn len(&self) -> u32 {
        self.envelope.total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.envelope.total()
    }

    /// Current oscillator 1 frequency (for diagnostics and tests).
    pub fn osc1_frequency(&self) -> f64 {
        self.osc1_freq
    }

    fn retune(&mut self, arp: i32) {
        let base = self.note as i32 + arp - 128;
        let semi1 = self.instrument.get(Param::Osc1Semi) as i32;
        let semi2 = self.instrument.get(Param::Osc2Semi) as i32;
        let detune = 1.0 + 0.0008 * self.instrument.get(Param::Osc2Detune) as f64;
        self.osc1_freq = note_frequency(base + semi1) / self.time_scale;
        self.osc2_freq = note_frequency(base + semi2) * detune / self.time_scale;
    }

    /// Produce the next raw sample (oscillator mix times envelope), or `None`
    /// once the envelope has run out.
    #[inline]
    pub fn next_sample(&mut self, noise: &mut Noise) -> Option<f64> {
        let e = self.envelope.level(self.elapsed)?;
        if let Some(arp) = self.arpeggio.tick() {
            self.retune(arp);
        }

        self.osc1_phase += self.osc1_freq * libm::pow(e, self.osc1_xenv);
        let mut sample = oscillate(self.osc1_wave, self.osc1_phase, noise) * self.osc1_vol;

        self.osc2_phase += self.osc2_freq * libm::pow(e, self.osc2_xenv);
        sample += oscillate(self.osc2_wave, self.osc2_phase, noise) * self.osc2_vol;

        if self.noise_vol != 0.0 {
            sample += noise.bipolar() * self.noise_vol;
        }

        self.elapsed += 1;
        Some(sample * e)
    }
}

/// Render a complete note (attack + sustain + release) at 44100 Hz into the
/// integer form the batch renderer mixes.
pub fn render_note(instrument: &Instrument, note: u8, row_len: u32, noise: &mut Noise) -> Vec<i32> {
    let mut voice = Voice::new(instrument, note, row_len as f64, 1.0);
    let mut out = Vec::with_capacity(voice.len() as usize);
    while let Some(sample) = voice.next_sample(noise) {
        out.push((BATCH_GAIN * sample) as i32);
    }
    out
}
