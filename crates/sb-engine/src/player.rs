//! Batch renderer: the whole arrangement in one pass.
//!
//! Channels are rendered one after another into a private stereo buffer
//! and summed into the song-wide [`MixBuffer`]. Automation commands write
//! into a per-channel copy of the instrument, so the caller's song is
//! never modified.

use alloc::vec;
use alloc::vec::Vec;
use sb_ir::{Channel, EffectCommand, Instrument, RenderRange, Song, MAX_CHANNELS, MAX_SONG_ROWS, NOTE_COLUMNS};

use crate::effects::{FilterState, FxParams};
use crate::frame::Frame;
use crate::oscillator::Noise;
use crate::voice::render_note;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x5B0C_5EED;

/// Batch render options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Sub-range to render; `None` renders the whole song.
    pub range: Option<RenderRange>,
    /// Seed for the dither/noise generators (mixed with the channel index).
    pub seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            range: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Interleaved stereo `i32` samples at 44100 Hz, before clamping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MixBuffer {
    samples: Vec<i32>,
}

impl MixBuffer {
    pub fn new(frames: usize) -> Self {
        Self {
            samples: vec![0; frames * 2],
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Interleaved left/right samples.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i32] {
        &mut self.samples
    }

    pub fn frame(&self, index: usize) -> (i32, i32) {
        (self.samples[index * 2], self.samples[index * 2 + 1])
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> i32 {
        self.samples.iter().map(|s| s.saturating_abs()).max().unwrap_or(0)
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }

    /// Clamped 16-bit frames.
    pub fn to_frames(&self) -> Vec<Frame> {
        self.samples
            .chunks_exact(2)
            .map(|lr| Frame::from_mix(lr[0], lr[1]))
            .collect()
    }
}

/// Cached note waveforms, keyed by pitch.
struct NoteCache {
    notes: Vec<Option<Vec<i32>>>,
}

impl NoteCache {
    fn new() -> Self {
        Self {
            notes: vec![None; 256],
        }
    }

    fn clear(&mut self) {
        self.notes.iter_mut().for_each(|n| *n = None);
    }

    fn cached(&self) -> usize {
        self.notes.iter().filter(|n| n.is_some()).count()
    }

    fn get_or_render(&mut self, instrument: &Instrument, note: u8, row_len: u32, noise: &mut Noise) -> &[i32] {
        self.notes[note as usize].get_or_insert_with(|| render_note(instrument, note, row_len, noise))
    }
}

/// State of one channel across a render.
struct ChannelRender {
    instrument: Instrument,
    cache: NoteCache,
    filter: FilterState,
    noise: Noise,
}

impl ChannelRender {
    fn new(channel: &Channel, seed: u64) -> Self {
        Self {
            instrument: channel.instrument,
            cache: NoteCache::new(),
            filter: FilterState::default(),
            noise: Noise::new(seed),
        }
    }

    /// Dispatch an automation command into the live instrument. Tonal
    /// fields change note waveforms, so they invalidate the cache.
    fn apply_command(&mut self, command: EffectCommand) {
        if self.instrument.set_by_index(command.param.index(), command.value) && command.param.is_tonal() {
            self.cache.clear();
        }
    }

    /// Mix the notes of one row into the dry (left) slots of `buf`.
    fn mix_note(&mut self, note: u8, row_len: u32, start_frame: usize, buf: &mut [i32]) {
        let wave = self.cache.get_or_render(&self.instrument, note, row_len, &mut self.noise);
        let words = buf.len();
        for (j, s) in wave.iter().enumerate() {
            let i = (start_frame + j) * 2;
            if i >= words {
                break;
            }
            buf[i] = buf[i].wrapping_add(*s);
        }
    }

    /// Run the effect chain over `frames` frames starting at `start_frame`.
    /// The dry mono sample is read from the left slot and replaced by the
    /// wet stereo pair; the delay reads earlier wet frames from `buf`.
    ///
    /// Both delay taps are read before the frame is written back. With a
    /// delay time of 0 the taps are the current frame itself: the right
    /// slot is still empty and the left slot still holds the dry sample,
    /// so the dry signal is fed into the right channel.
    fn process_row(&mut self, fx: &FxParams, start_frame: usize, frames: usize, buf: &mut [i32], mix: &mut [i32]) {
        let dly = fx.delay_frames * 2;
        for j in 0..frames {
            let k = (start_frame + j) * 2;
            let (mut l, mut r) = self.filter.process(buf[k] as f64, fx, k as f64, &mut self.noise);
            if k >= dly {
                l += buf[k - dly + 1] as f64 * fx.delay_amt;
                r += buf[k - dly] as f64 * fx.delay_amt;
            }
            let (l, r) = (l as i32, r as i32);
            buf[k] = l;
            buf[k + 1] = r;
            mix[k] = mix[k].wrapping_add(l);
            mix[k + 1] = mix[k + 1].wrapping_add(r);
        }
    }
}

/// Render a song (or a sub-range of it) to a stereo mix buffer.
///
/// `progress` is called with the completed fraction after every sequence
/// row of every channel, then once with `1.0`.
pub fn render_song<F>(song: &Song, options: &RenderOptions, mut progress: F) -> MixBuffer
where
    F: FnMut(f32),
{
    let range = clamp_range(options.range.unwrap_or_else(|| song.default_range()));
    let Some(range) = range else {
        progress(1.0);
        return MixBuffer::default();
    };

    let row_len = song.row_len.max(1);
    let frames = song.frames_in_range(&range);
    let mut mix = MixBuffer::new(frames);
    let mut chn = vec![0i32; frames * 2];
    let rows = range.rows();
    let cols = range.cols();

    for (done_cols, col) in (range.first_col..=range.last_col).enumerate() {
        let channel = &song.channels[col];
        let mut state = ChannelRender::new(channel, options.seed.wrapping_add(col as u64));
        chn.fill(0);

        for seq_row in range.first_row..=range.last_row {
            let pattern = channel.pattern_at(seq_row);
            for row in 0..song.pattern_len {
                if let Some(cmd) = pattern.and_then(|p| p.effect(row)) {
                    state.apply_command(cmd);
                }

                let fx = FxParams::new(&state.instrument, row_len as f64);
                let start = ((seq_row - range.first_row) * song.pattern_len + row) * row_len as usize;

                if let Some(p) = pattern {
                    for column in 0..NOTE_COLUMNS {
                        let note = p.note(column, row);
                        if note != 0 {
                            state.mix_note(note, row_len, start, &mut chn);
                        }
                    }
                }

                state.process_row(&fx, start, row_len as usize, &mut chn, &mut mix.samples);
            }

            let done = done_cols * rows + (seq_row - range.first_row + 1);
            progress(done as f32 / (rows * cols) as f32);
        }
    }

    progress(1.0);
    mix
}

/// Clip a range to the song's capacities; `None` if nothing is left.
fn clamp_range(range: RenderRange) -> Option<RenderRange> {
    let clamped = RenderRange {
        first_row: range.first_row,
        last_row: range.last_row.min(MAX_SONG_ROWS - 1),
        first_col: range.first_col,
        last_col: range.last_col.min(MAX_CHANNELS - 1),
    };
    (clamped.first_row <= clamped.last_row && clamped.first_col <= clamped.last_col).then_some(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_ir::{Param, Waveform};

    fn blip() -> Instrument {
        let mut inst = Instrument::zeroed();
        inst.set(Param::Osc1Waveform, Waveform::Square.code());
        inst.set(Param::Osc1Volume, 100);
        inst.set(Param::Osc1Semi, 128);
        inst.set(Param::Osc2Semi, 128);
        inst.set(Param::EnvAttack, 2);
        inst.set(Param::EnvSustain, 4);
        inst.set(Param::EnvRelease, 6);
        inst.set(Param::FxFilter, 2);
        inst.set(Param::FxFreq, 128);
        inst.set(Param::FxDrive, 32);
        inst
    }

    fn one_note_song() -> Song {
        let mut song = Song::empty(368, 16);
        song.channels[0].instrument = blip();
        song.channels[0].sequence[0] = 1;
        song.channels[0].patterns[0].set_note(0, 0, 144);
        song.update_song_ranges();
        song
    }

    fn render(song: &Song) -> MixBuffer {
        render_song(song, &RenderOptions::default(), |_| {})
    }

    #[test]
    fn single_note_burst() {
        let song = one_note_song();
        let mix = render(&song);
        assert_eq!(mix.frames(), 368 * 16);
        let first = (0..mix.frames()).find(|&i| mix.frame(i) != (0, 0));
        assert!(matches!(first, Some(i) if i < 8), "{:?}", first);
        // 224 envelope samples plus a short filter ring-out.
        assert!((300..mix.frames()).all(|i| mix.frame(i) == (0, 0)));
    }

    #[test]
    fn empty_song_is_silent() {
        let mut song = Song::empty(100, 4);
        song.num_channels = 1;
        let mix = render(&song);
        assert_eq!(mix.frames(), 400);
        assert!(mix.is_silent());
    }

    #[test]
    fn progress_is_monotonic_and_complete() {
        let mut song = one_note_song();
        song.channels[1].sequence[2] = 1;
        song.update_song_ranges();
        let mut seen = Vec::new();
        render_song(&song, &RenderOptions::default(), |p| seen.push(p));
        assert_eq!(seen.len(), 2 * 3 + 1);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&1.0));
        assert!((seen[0] - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn channels_sum_into_mix() {
        let mut song = one_note_song();
        song.channels[1].instrument = blip();
        song.channels[1].instrument.set(Param::FxPanAmt, 200);
        song.channels[1].sequence[0] = 1;
        song.channels[1].patterns[0].set_note(2, 3, 150);
        song.update_song_ranges();

        let full = render(&song);
        let range = song.default_range();
        let only = |col: usize| {
            let options = RenderOptions {
                range: Some(RenderRange { first_col: col, last_col: col, ..range }),
                ..RenderOptions::default()
            };
            render_song(&song, &options, |_| {})
        };
        let (a, b) = (only(0), only(1));
        let summed: Vec<i32> = a.samples().iter().zip(b.samples()).map(|(x, y)| x + y).collect();
        assert_eq!(full.samples(), summed.as_slice());
    }

    #[test]
    fn automation_persists_and_song_is_untouched() {
        let mut song = one_note_song();
        song.channels[0].sequence[1] = 1;
        // Silence oscillator 1 from row 8 on; it stays silent for the
        // second pass through the same pattern.
        song.channels[0].patterns[0].set_command(8, Param::Osc1Volume.command(), 0);
        song.update_song_ranges();
        let before = song.clone();

        let mix = render(&song);
        let pattern_frames = 368 * 16;
        assert!(!(0..pattern_frames).all(|i| mix.frame(i) == (0, 0)));
        assert!((pattern_frames..2 * pattern_frames).all(|i| mix.frame(i) == (0, 0)));
        assert_eq!(song, before);
    }

    #[test]
    fn tonal_commands_invalidate_cache() {
        let song = one_note_song();
        let mut state = ChannelRender::new(&song.channels[0], 1);
        let mut buf = vec![0i32; 2 * 368];
        state.mix_note(144, 368, 0, &mut buf);
        assert_eq!(state.cache.cached(), 1);

        state.apply_command(EffectCommand { param: Param::FxFreq, value: 10 });
        assert_eq!(state.cache.cached(), 1);
        assert_eq!(state.instrument.get(Param::FxFreq), 10);

        state.apply_command(EffectCommand { param: Param::ArpSpeed, value: 3 });
        assert_eq!(state.cache.cached(), 0);
    }

    #[test]
    fn notes_past_the_end_are_truncated() {
        let mut song = one_note_song();
        song.channels[0].patterns[0].set_note(1, 15, 144);
        let mix = render(&song);
        assert_eq!(mix.frames(), 368 * 16);
    }

    #[test]
    fn delay_echoes_after_note() {
        let mut song = one_note_song();
        song.channels[0].instrument.set(Param::FxDelayAmt, 255);
        song.channels[0].instrument.set(Param::FxDelayTime, 2);
        let mix = render(&song);
        let dry = render(&one_note_song());
        // Delay time counts half rows: the echo arrives one row later.
        assert_eq!(&mix.samples()[..2 * 368], &dry.samples()[..2 * 368]);
        assert!((368..700).any(|i| mix.frame(i) != (0, 0)));
        assert!((368..700).all(|i| dry.frame(i) == (0, 0)));
    }

    #[test]
    fn zero_delay_time_adds_dry_note_to_right() {
        let mut song = one_note_song();
        song.channels[0].instrument.set(Param::FxDelayAmt, 255);
        let mix = render(&song);
        let note = render_note(&blip(), 144, 368, &mut Noise::new(DEFAULT_SEED));
        // Pan is centred, so without the feed both sides would match.
        for (i, x) in note.iter().enumerate() {
            let (l, r) = mix.frame(i);
            assert!((r - l - x).abs() <= 1, "frame {}: {} {} {}", i, l, r, x);
        }
        assert!(note.iter().any(|&x| x.abs() > 100));
    }

    #[test]
    fn same_seed_same_bytes() {
        let mut song = one_note_song();
        song.channels[0].instrument.set(Param::NoiseVolume, 80);
        song.channels[0].instrument.set(Param::Osc2Volume, 100);
        assert_eq!(render(&song), render(&song));
    }

    #[test]
    fn inverted_range_renders_nothing() {
        let song = one_note_song();
        let options = RenderOptions {
            range: Some(RenderRange { first_row: 3, last_row: 1, first_col: 0, last_col: 0 }),
            ..RenderOptions::default()
        };
        let mut calls = 0;
        let mix = render_song(&song, &options, |_| calls += 1);
        assert_eq!(mix.frames(), 0);
        assert_eq!(calls, 1);
    }

    #[test]
    fn to_frames_clamps() {
        let mut mix = MixBuffer::new(1);
        mix.samples[0] = 70000;
        mix.samples[1] = -70000;
        assert_eq!(mix.to_frames(), vec![Frame { left: 32767, right: -32767 }]);
        assert_eq!(mix.peak(), 70000);
    }
}
