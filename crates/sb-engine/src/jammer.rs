//! Streaming renderer for live auditioning.
//!
//! The jammer owns a snapshot of one instrument, a voice pool and one
//! channel's effect state, and fills device buffers on demand. Every
//! buffer it needs is allocated up front, so [`Jammer::render`] is safe
//! to call from an audio callback.

use alloc::vec;
use alloc::vec::Vec;
use sb_ir::{row_len_for_bpm, Instrument, SAMPLE_RATE};

use crate::effects::{EffectsProcessor, FxParams};
use crate::frame::{Frame, FrameSource};
use crate::oscillator::Noise;
use crate::polyphony::VoicePool;

/// Frames synthesized per internal block.
pub const MAX_BLOCK: usize = 4096;

/// Voice gain into the mix range, `0.002441481 · 32768`.
const VOICE_GAIN: f64 = 80.0;

/// Jammer construction options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JammerConfig {
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    /// Row length in 44100 Hz samples.
    pub row_len: u32,
    /// Seed for the dither/noise generator.
    pub seed: u64,
}

impl Default for JammerConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            row_len: row_len_for_bpm(120),
            seed: 0,
        }
    }
}

/// A control message for a running jammer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JamCommand {
    SetInstrument(Instrument),
    SetRowLen(u32),
    NoteOn(u8),
    Clear,
}

/// Live polyphonic renderer.
pub struct Jammer {
    sample_rate: u32,
    time_scale: f64,
    instrument: Instrument,
    row_len: u32,
    fx: FxParams,
    pool: VoicePool,
    effects: EffectsProcessor,
    noise: Noise,
    scratch: Vec<f64>,
    clear_requested: bool,
    /// Frames rendered since construction (LFO and pan time base).
    position: u64,
}

impl Jammer {
    pub fn new(config: JammerConfig) -> Self {
        let sample_rate = config.sample_rate.max(1);
        let time_scale = sample_rate as f64 / SAMPLE_RATE as f64;
        let instrument = Instrument::default();
        let row_len = config.row_len.max(1);
        Self {
            sample_rate,
            time_scale,
            instrument,
            row_len,
            fx: FxParams::new(&instrument, row_len as f64 * time_scale),
            pool: VoicePool::new(),
            effects: EffectsProcessor::new(),
            noise: Noise::new(config.seed),
            scratch: vec![0.0; MAX_BLOCK],
            clear_requested: false,
            position: 0,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn row_len(&self) -> u32 {
        self.row_len
    }

    /// Number of sounding voices.
    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    /// Replace the instrument snapshot. Changing two or more fields at once
    /// is treated as a preset swap and silences every voice.
    pub fn set_instrument(&mut self, instrument: &Instrument) {
        if self.instrument.changed_params(instrument).len() >= 2 {
            self.pool.clear();
        }
        self.instrument = *instrument;
        self.update_fx();
    }

    /// Row length in 44100 Hz samples. Zero is ignored.
    pub fn set_row_len(&mut self, row_len: u32) {
        if row_len > 0 {
            self.row_len = row_len;
            self.update_fx();
        }
    }

    /// Start a note with the current instrument.
    pub fn note_on(&mut self, note: u8) {
        self.pool.trigger(
            &self.instrument,
            note,
            self.effective_row_len(),
            self.time_scale,
        );
    }

    /// Stop all voices and reset filter and delay at the start of the next
    /// [`render`](Self::render).
    pub fn request_clear(&mut self) {
        self.clear_requested = true;
    }

    pub fn apply(&mut self, command: JamCommand) {
        match command {
            JamCommand::SetInstrument(instrument) => self.set_instrument(&instrument),
            JamCommand::SetRowLen(row_len) => self.set_row_len(row_len),
            JamCommand::NoteOn(note) => self.note_on(note),
            JamCommand::Clear => self.request_clear(),
        }
    }

    /// Fill `out` with the next frames.
    pub fn render(&mut self, out: &mut [Frame]) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.render_blocks(out));
        #[cfg(not(feature = "alloc_check"))]
        self.render_blocks(out);
    }

    fn render_blocks(&mut self, out: &mut [Frame]) {
        if self.clear_requested {
            self.clear_requested = false;
            self.pool.clear();
            self.effects.reset();
        }

        for chunk in out.chunks_mut(MAX_BLOCK) {
            let dry = &mut self.scratch[..chunk.len()];
            dry.fill(0.0);
            self.pool.render_into(dry, VOICE_GAIN, &mut self.noise);

            for (i, frame) in chunk.iter_mut().enumerate() {
                let k = 2.0 * (self.position + i as u64) as f64;
                let (l, r) = self.effects.process(dry[i], &self.fx, k, &mut self.noise);
                *frame = Frame::from_mix(l as i32, r as i32);
            }
            self.position += chunk.len() as u64;
        }
    }

    fn effective_row_len(&self) -> f64 {
        self.row_len as f64 * self.time_scale
    }

    fn update_fx(&mut self) {
        self.fx = FxParams::new(&self.instrument, self.effective_row_len());
    }
}

impl FrameSource for Jammer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn render(&mut self, out: &mut [Frame]) {
        Jammer::render(self, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyphony::MAX_POLYPHONY;
    use sb_ir::{Param, Waveform};

    /// A short square blip with the effects chain neutral.
    fn blip() -> Instrument {
        let mut inst = Instrument::zeroed();
        inst.set(Param::Osc1Waveform, Waveform::Square.code());
        inst.set(Param::Osc1Volume, 200);
        inst.set(Param::Osc1Semi, 128);
        inst.set(Param::Osc2Semi, 128);
        inst.set(Param::EnvSustain, 5);
        inst.set(Param::EnvRelease, 5);
        inst.set(Param::FxFilter, 1);
        inst.set(Param::FxFreq, 255);
        inst.set(Param::FxDrive, 32);
        inst
    }

    fn jammer(sample_rate: u32) -> Jammer {
        let mut j = Jammer::new(JammerConfig {
            sample_rate,
            ..JammerConfig::default()
        });
        j.set_instrument(&blip());
        j
    }

    fn is_silent(frames: &[Frame]) -> bool {
        frames.iter().all(|f| *f == Frame::silence())
    }

    #[test]
    fn silent_without_notes() {
        let mut j = jammer(44100);
        let mut out = vec![Frame::silence(); 1000];
        j.render(&mut out);
        assert!(is_silent(&out));
    }

    #[test]
    fn note_plays_then_voice_ends() {
        let mut j = jammer(44100);
        j.note_on(144);
        assert_eq!(j.active_voices(), 1);
        let mut out = vec![Frame::silence(); 100];
        j.render(&mut out);
        assert!(!is_silent(&out));
        // 100 + 100 samples of envelope in total.
        let mut rest = vec![Frame::silence(); 100];
        j.render(&mut rest);
        assert_eq!(j.active_voices(), 0);
    }

    #[test]
    fn render_spans_multiple_blocks() {
        let mut j = jammer(44100);
        let mut inst = blip();
        inst.set(Param::EnvSustain, 60);
        j.set_instrument(&inst);
        j.note_on(144);
        let mut out = vec![Frame::silence(); MAX_BLOCK * 2 + 17];
        j.render(&mut out);
        assert!(!is_silent(&out[MAX_BLOCK + 1..]));
    }

    #[test]
    fn single_field_edit_keeps_voices() {
        let mut j = jammer(44100);
        j.note_on(144);
        let mut inst = blip();
        inst.set(Param::FxPanAmt, 100);
        j.set_instrument(&inst);
        assert_eq!(j.active_voices(), 1);

        inst.set(Param::FxDist, 10);
        inst.set(Param::NoiseVolume, 10);
        j.set_instrument(&inst);
        assert_eq!(j.active_voices(), 0);
    }

    #[test]
    fn clear_is_applied_at_next_render() {
        let mut j = jammer(44100);
        j.note_on(144);
        j.apply(JamCommand::Clear);
        assert_eq!(j.active_voices(), 1);
        let mut out = vec![Frame::silence(); 64];
        j.render(&mut out);
        assert_eq!(j.active_voices(), 0);
        assert!(is_silent(&out));
    }

    #[test]
    fn polyphony_is_capped() {
        let mut j = jammer(44100);
        for n in 0..20 {
            j.apply(JamCommand::NoteOn(120 + n));
        }
        assert_eq!(j.active_voices(), MAX_POLYPHONY);
    }

    #[test]
    fn same_seed_same_output() {
        let mut inst = blip();
        inst.set(Param::Osc1Waveform, Waveform::Sine.code());
        inst.set(Param::NoiseVolume, 40);
        let render = || {
            let mut j = jammer(44100);
            j.set_instrument(&inst);
            j.note_on(150);
            let mut out = vec![Frame::silence(); 300];
            j.render(&mut out);
            out
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn device_rate_stretches_envelope() {
        let mut j = jammer(88200);
        assert_eq!(j.sample_rate(), 88200);
        j.note_on(144);
        let mut out = vec![Frame::silence(); 300];
        j.render(&mut out);
        assert_eq!(j.active_voices(), 1);
        let mut out = vec![Frame::silence(); 100];
        j.render(&mut out);
        assert_eq!(j.active_voices(), 0);
    }

    #[test]
    fn row_len_commands() {
        let mut j = jammer(44100);
        j.apply(JamCommand::SetRowLen(368));
        assert_eq!(j.row_len(), 368);
        j.apply(JamCommand::SetRowLen(0));
        assert_eq!(j.row_len(), 368);
    }
}
