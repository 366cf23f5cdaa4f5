//! Song structure and sequencing types.

use alloc::vec;
use alloc::vec::Vec;

use crate::instrument::Instrument;
use crate::pattern::Pattern;

/// Sample rate every song is authored against.
pub const SAMPLE_RATE: u32 = 44100;
/// Maximum number of channels (instruments) in a song.
pub const MAX_CHANNELS: usize = 16;
/// Pattern slots per channel.
pub const MAX_PATTERNS: usize = 36;
/// Length of each channel's sequence.
pub const MAX_SONG_ROWS: usize = 500;
/// Largest allowed rows-per-pattern.
pub const MAX_PATTERN_LEN: usize = 256;

/// Samples per row for a tempo: `round(60 * 44100 / 4 / bpm)`.
pub fn row_len_for_bpm(bpm: u32) -> u32 {
    let exact = (60.0 * SAMPLE_RATE as f64 / 4.0) / bpm.max(1) as f64;
    (libm::round(exact) as u32).max(1)
}

/// One channel: an instrument, its sequence and its pattern pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    /// Live parameter vector (mutated by automation during a render).
    pub instrument: Instrument,
    /// Song row -> pattern number (0 = empty, otherwise 1-based).
    pub sequence: Vec<u8>,
    /// Pattern slots, always `MAX_PATTERNS` long.
    pub patterns: Vec<Pattern>,
}

impl Channel {
    /// An empty channel with the given instrument.
    pub fn new(instrument: Instrument, pattern_len: usize) -> Self {
        Self {
            instrument,
            sequence: vec![0; MAX_SONG_ROWS],
            patterns: (0..MAX_PATTERNS).map(|_| Pattern::new(pattern_len)).collect(),
        }
    }

    /// The pattern referenced at a sequence row, if any.
    pub fn pattern_at(&self, song_row: usize) -> Option<&Pattern> {
        let number = *self.sequence.get(song_row)? as usize;
        number.checked_sub(1).and_then(|idx| self.patterns.get(idx))
    }
}

/// A sub-range of the arrangement: inclusive sequence rows and channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderRange {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

impl RenderRange {
    /// Number of sequence rows covered.
    pub fn rows(&self) -> usize {
        self.last_row + 1 - self.first_row
    }

    /// Number of channels covered.
    pub fn cols(&self) -> usize {
        self.last_col + 1 - self.first_col
    }
}

/// A complete song.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    /// Samples per row (derived from BPM), always > 0.
    pub row_len: u32,
    /// Rows per pattern (1-256).
    pub pattern_len: usize,
    /// Last sequence row to play.
    pub end_pattern: usize,
    /// Channels in use (<= MAX_CHANNELS).
    pub num_channels: usize,
    /// All channels, always `MAX_CHANNELS` long.
    pub channels: Vec<Channel>,
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}

impl Song {
    /// A fresh song: 120 BPM, 32 rows per pattern, one channel with
    /// pattern 1 at the first sequence row.
    pub fn new() -> Self {
        let mut song = Self::empty(row_len_for_bpm(120), 32);
        song.num_channels = 1;
        song.channels[0].sequence[0] = 1;
        song
    }

    /// A song with every channel empty and the default instrument.
    pub fn empty(row_len: u32, pattern_len: usize) -> Self {
        Self {
            row_len: row_len.max(1),
            pattern_len,
            end_pattern: 0,
            num_channels: 0,
            channels: (0..MAX_CHANNELS)
                .map(|_| Channel::new(Instrument::default(), pattern_len))
                .collect(),
        }
    }

    /// Tempo implied by the row length.
    pub fn bpm(&self) -> u32 {
        libm::round((60.0 * SAMPLE_RATE as f64 / 4.0) / self.row_len as f64) as u32
    }

    /// Set the tempo. Values outside 10..=1000 are rejected.
    pub fn set_bpm(&mut self, bpm: u32) -> bool {
        if !(10..=1000).contains(&bpm) {
            return false;
        }
        self.row_len = row_len_for_bpm(bpm);
        true
    }

    /// Change rows-per-pattern for every pattern of every channel,
    /// keeping the overlapping rows. Rejects lengths outside 1..=256.
    pub fn set_pattern_length(&mut self, len: usize) -> bool {
        if !(1..=crate::song::MAX_PATTERN_LEN).contains(&len) {
            return false;
        }
        if len == self.pattern_len {
            return true;
        }
        for channel in &mut self.channels {
            for pattern in &mut channel.patterns {
                *pattern = pattern.resized(len);
            }
        }
        self.pattern_len = len;
        true
    }

    /// Recompute `end_pattern` and `num_channels` from the sequences:
    /// the last sequence row with any pattern, and the highest channel used.
    pub fn update_song_ranges(&mut self) {
        let mut max_row = 0;
        let mut max_col = 0;
        for row in 0..MAX_SONG_ROWS {
            for (col, channel) in self.channels.iter().enumerate() {
                if channel.sequence[row] > 0 {
                    max_row = row;
                    max_col = max_col.max(col);
                }
            }
        }
        self.end_pattern = max_row;
        self.num_channels = max_col + 1;
    }

    /// The whole song: every played row of every used channel.
    pub fn default_range(&self) -> RenderRange {
        RenderRange {
            first_row: 0,
            last_row: self.end_pattern,
            first_col: 0,
            last_col: self.num_channels.max(1) - 1,
        }
    }

    /// Frames produced by rendering a range.
    pub fn frames_in_range(&self, range: &RenderRange) -> usize {
        self.row_len as usize * self.pattern_len * range.rows()
    }

    /// Channels currently in use.
    pub fn active_channels(&self) -> &[Channel] {
        &self.channels[..self.num_channels.min(MAX_CHANNELS)]
    }
}
