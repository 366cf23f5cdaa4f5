//! Core song model for the SoundBox synthesizer.
//!
//! Defines instruments (the 29-byte parameter vector), patterns,
//! sequences and songs. The codec emits these types and both renderers
//! consume them.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod edit;
mod instrument;
mod pattern;
pub mod presets;
pub mod song;

pub use edit::Edit;
pub use instrument::{FilterType, Instrument, Param, Waveform, NUM_PARAMS};
pub use pattern::{EffectCommand, Pattern, NOTE_A4, NOTE_COLUMNS};
pub use presets::{Preset, PresetCategory, PRESETS};
pub use song::{
    row_len_for_bpm, Channel, RenderRange, Song, MAX_CHANNELS, MAX_PATTERNS, MAX_PATTERN_LEN,
    MAX_SONG_ROWS, SAMPLE_RATE,
};
