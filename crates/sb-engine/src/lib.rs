//! Synthesis engine for the SoundBox synthesizer.
//!
//! Two renderers share the same voice and effect code: [`Jammer`] fills
//! audio-device buffers for live playing, and [`render_song`] renders a
//! whole arrangement offline.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod effects;
mod envelope;
mod frame;
mod jammer;
mod oscillator;
mod player;
mod polyphony;
mod voice;

pub use effects::{DelayLine, EffectsProcessor, FilterState, FxParams, MAX_DELAY};
pub use envelope::{Envelope, EnvelopePhase};
pub use frame::{Frame, FrameSource};
pub use jammer::{JamCommand, Jammer, JammerConfig, MAX_BLOCK};
pub use oscillator::{note_frequency, oscillate, Noise};
pub use player::{render_song, MixBuffer, RenderOptions, DEFAULT_SEED};
pub use polyphony::{VoicePool, MAX_POLYPHONY};
pub use voice::{render_note, Voice};
