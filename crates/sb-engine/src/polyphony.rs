//! VoicePool: fixed-size voice allocation with oldest-first stealing.

use heapless::Vec;
use sb_ir::Instrument;

use crate::oscillator::Noise;
use crate::voice::Voice;

/// Maximum number of simultaneous voices in the live renderer.
pub const MAX_POLYPHONY: usize = 8;

/// Pool of sounding voices. Never allocates.
#[derive(Debug, Default)]
pub struct VoicePool {
    voices: Vec<Voice, MAX_POLYPHONY>,
}

impl VoicePool {
    pub fn new() -> Self {
        Self { voices: Vec::new() }
    }

    /// Start a note. Takes a free slot, or replaces the voice that has been
    /// sounding longest when the pool is full. Always succeeds.
    pub fn trigger(&mut self, instrument: &Instrument, note: u8, row_len: f64, time_scale: f64) {
        let voice = Voice::new(instrument, note, row_len, time_scale);
        if let Err(voice) = self.voices.push(voice) {
            let oldest = self
                .voices
                .iter()
                .enumerate()
                .max_by_key(|(_, v)| v.elapsed())
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.voices[oldest] = voice;
        }
    }

    /// Drop every voice.
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Count of sounding voices.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Add every voice's output, scaled by `gain`, into `out` (mono) and
    /// retire voices whose envelope has ended.
    pub fn render_into(&mut self, out: &mut [f64], gain: f64, noise: &mut Noise) {
        for voice in self.voices.iter_mut() {
            for sample in out.iter_mut() {
                match voice.next_sample(noise) {
                    Some(v) => *sample += gain * v,
                    None => break,
                }
            }
        }
        self.voices.retain(|v| !v.is_finished());
    }
}
