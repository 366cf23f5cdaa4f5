//! Headless controller for the SoundBox synthesizer.
//!
//! Owns a song and ties the codec, the batch renderer and the audio
//! backends together behind one API for the CLI.

mod render_job;

use sb_audio::{AudioError, AudioOutput, CpalOutput, JamHandle, PullOutput};
use sb_engine::{render_song, JammerConfig, MixBuffer, RenderOptions};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

pub use render_job::RenderJob;
pub use sb_engine::{Frame, DEFAULT_SEED};
pub use sb_formats::{CompressionPolicy, FormatError};
pub use sb_ir::{Edit, Instrument, RenderRange, Song, SAMPLE_RATE};

#[cfg(feature = "alloc_check")]
#[global_allocator]
static ALLOC: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

/// Any controller failure.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("channel {0} out of range")]
    NoSuchChannel(usize),
}

/// Headless controller: owns a song, renders it and plays it.
pub struct Controller {
    song: Song,
    playback: Option<PlaybackHandle>,
    jam: Option<JamSession>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    frames_played: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

struct JamSession {
    // Held for its lifetime; dropping it closes the stream
    _output: PullOutput,
    handle: JamHandle,
}

/// Where playback currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackPosition {
    pub song_row: usize,
    pub pattern_row: usize,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            song: Song::new(),
            playback: None,
            jam: None,
        }
    }

    // --- Song management ---

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn set_song(&mut self, song: Song) {
        self.stop();
        self.song = song;
    }

    /// Apply an editor change. Returns false if it was out of range.
    pub fn apply(&mut self, edit: &Edit) -> bool {
        self.song.apply(edit)
    }

    /// Load a song file (SBox or Sonant).
    pub fn load(&mut self, data: &[u8]) -> Result<(), FormatError> {
        let song = sb_formats::load_song(data)?;
        info!(
            bpm = song.bpm(),
            channels = song.num_channels,
            rows = song.end_pattern + 1,
            "song loaded"
        );
        self.set_song(song);
        Ok(())
    }

    /// Load a song from a shareable link or `data:` URI.
    pub fn load_link(&mut self, link: &str) -> Result<(), FormatError> {
        let bytes = sb_formats::link_to_song_bytes(link)?;
        self.load(&bytes)
    }

    /// Encode the song. The played extent is recomputed first, so direct
    /// field edits are saved with a matching end row and channel count.
    pub fn save(&mut self, policy: &CompressionPolicy) -> Vec<u8> {
        self.song.update_song_ranges();
        let bytes = sb_formats::save_sbox(&self.song, policy);
        info!(bytes = bytes.len(), "song saved");
        bytes
    }

    pub fn link(&mut self) -> String {
        sb_formats::song_to_link(&self.save(&CompressionPolicy::default()))
    }

    /// Replace one channel's instrument from an SBxI file.
    pub fn load_instrument(&mut self, channel: usize, data: &[u8]) -> Result<(), ControllerError> {
        let instrument = sb_formats::load_instrument(data)?;
        let slot = self
            .song
            .channels
            .get_mut(channel)
            .ok_or(ControllerError::NoSuchChannel(channel))?;
        slot.instrument = instrument;
        self.sync_jammer(channel);
        Ok(())
    }

    pub fn save_instrument(&self, channel: usize) -> Result<Vec<u8>, ControllerError> {
        let slot = self
            .song
            .channels
            .get(channel)
            .ok_or(ControllerError::NoSuchChannel(channel))?;
        Ok(sb_formats::save_instrument(&slot.instrument, &CompressionPolicy::default()))
    }

    // --- Offline rendering ---

    /// Render on the calling thread.
    pub fn render<F: FnMut(f32)>(&self, options: &RenderOptions, progress: F) -> MixBuffer {
        render_song(&self.song, options, progress)
    }

    /// Render a snapshot of the song on a worker thread.
    pub fn start_render(&self, options: RenderOptions) -> RenderJob {
        RenderJob::spawn(self.song.clone(), options)
    }

    /// Render a range and encode it as WAV.
    pub fn export_wav(&self, options: &RenderOptions) -> Vec<u8> {
        let mix = self.render(options, |p| debug!(progress = p, "rendering"));
        sb_formats::mix_to_wav(&mix, SAMPLE_RATE)
    }

    // --- Song playback ---

    /// Render the range, then stream it to the default device from a
    /// background thread.
    pub fn play(&mut self, options: RenderOptions) {
        self.stop();

        let song = self.song.clone();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let frames_played = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let played = frames_played.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            let mix = render_song(&song, &options, |_| {});
            if let Err(err) = audio_thread(&mix, &stop, &played) {
                warn!(%err, "playback failed");
            }
            done.store(true, Ordering::Relaxed);
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            frames_played,
            finished,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    /// Current playback position, counted from the start of the played range.
    pub fn position(&self) -> Option<PlaybackPosition> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        let frames = pb.frames_played.load(Ordering::Relaxed);
        Some(position_for_frame(&self.song, frames))
    }

    // --- Live playing ---

    /// Open the device for live playing with `channel`'s instrument.
    pub fn start_jammer(&mut self, channel: usize) -> Result<(), ControllerError> {
        let instrument = self
            .song
            .channels
            .get(channel)
            .ok_or(ControllerError::NoSuchChannel(channel))?
            .instrument;
        let (output, mut handle) = PullOutput::start_jammer(JammerConfig {
            row_len: self.song.row_len,
            ..JammerConfig::default()
        })?;
        handle.set_instrument(instrument);
        info!(channel, sample_rate = output.sample_rate(), "jammer started");
        self.jam = Some(JamSession {
            _output: output,
            handle,
        });
        Ok(())
    }

    pub fn stop_jammer(&mut self) {
        self.jam = None;
    }

    /// Send the jammer a channel's current instrument and tempo.
    pub fn sync_jammer(&mut self, channel: usize) {
        let (Some(jam), Some(slot)) = (self.jam.as_mut(), self.song.channels.get(channel)) else {
            return;
        };
        jam.handle.set_instrument(slot.instrument);
        jam.handle.set_row_len(self.song.row_len);
    }

    /// Trigger a note on the jammer. Returns false if the jammer is not
    /// running or its queue is full.
    pub fn jam_note(&mut self, note: u8) -> bool {
        self.jam.as_mut().is_some_and(|jam| jam.handle.note_on(note))
    }

    pub fn jam_clear(&mut self) -> bool {
        self.jam.as_mut().is_some_and(|jam| jam.handle.clear())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn position_for_frame(song: &Song, frame: u64) -> PlaybackPosition {
    let row = (frame / song.row_len.max(1) as u64) as usize;
    let pattern_len = song.pattern_len.max(1);
    PlaybackPosition {
        song_row: row / pattern_len,
        pattern_row: row % pattern_len,
    }
}

/// Frames handed to the output per write.
const PLAY_BLOCK: usize = 1024;

fn audio_thread(mix: &MixBuffer, stop_signal: &AtomicBool, frames_played: &AtomicU64) -> Result<(), AudioError> {
    let mut output = CpalOutput::open()?;
    if output.sample_rate() != SAMPLE_RATE {
        warn!(device = output.sample_rate(), "device rate differs from 44100 Hz, pitch will shift");
    }

    let frames = mix.to_frames();
    let mut blocks = frames.chunks(PLAY_BLOCK);
    // Prime the queue so the stream does not open on an underrun.
    let mut queued = match blocks.next() {
        Some(first) if output.write_all(first, stop_signal)? => first.len(),
        _ => return Ok(()),
    };
    output.start()?;

    for block in blocks {
        frames_played.store(queued as u64, Ordering::Relaxed);
        if !output.write_all(block, stop_signal)? {
            break;
        }
        queued += block.len();
    }

    let tail = vec![Frame::silence(); (output.sample_rate() / 10) as usize];
    output.write_all(&tail, stop_signal)?;
    output.stop()?;

    let underruns = output.underruns();
    if underruns > 0 {
        warn!(underruns, "output queue ran dry during playback");
    } else {
        debug!(frames = queued, "playback complete");
    }
    Ok(())
}
