//! Pull-mode CPAL output: the device callback renders straight from a
//! [`FrameSource`].
//!
//! Live playing runs a [`Jammer`] inside the callback. Note and parameter
//! changes reach it through a lock-free command queue that is drained at
//! the top of every callback.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Stream;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use sb_engine::{Frame, FrameSource, JamCommand, Jammer, JammerConfig, MAX_BLOCK};
use sb_ir::Instrument;
use tracing::{error, info, warn};

use crate::device::{default_stereo_output, write_interleaved};
use crate::traits::AudioError;

/// Pending jammer commands between two callbacks.
pub const COMMAND_QUEUE_LEN: usize = 256;

/// A running pull-mode stream. Dropping it stops playback.
pub struct PullOutput {
    stream: Stream,
    sample_rate: u32,
}

impl PullOutput {
    /// Play `source` on the default device. The source must already be
    /// configured for the device rate, see [`PullOutput::device_rate`].
    pub fn start<S>(mut source: S) -> Result<Self, AudioError>
    where
        S: FrameSource + 'static,
    {
        let (device, config) = default_stereo_output()?;
        let sample_rate = config.sample_rate.0;
        if source.sample_rate() != sample_rate {
            warn!(source = source.sample_rate(), device = sample_rate, "sample rate mismatch");
        }
        let channels = config.channels as usize;
        let mut scratch = vec![Frame::silence(); MAX_BLOCK];

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render_interleaved(&mut source, &mut scratch, data, channels);
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        info!(sample_rate, channels, "pull stream started");
        Ok(Self { stream, sample_rate })
    }

    /// Start a jammer on the default device. `config.sample_rate` is
    /// replaced by the device rate.
    pub fn start_jammer(config: JammerConfig) -> Result<(Self, JamHandle), AudioError> {
        let sample_rate = Self::device_rate()?;
        let jammer = Jammer::new(JammerConfig { sample_rate, ..config });
        let (source, handle) = QueuedJammer::new(jammer);
        Ok((Self::start(source)?, handle))
    }

    /// Sample rate of the default output device.
    pub fn device_rate() -> Result<u32, AudioError> {
        Ok(default_stereo_output()?.1.sample_rate.0)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream.pause().map_err(|e| AudioError::Playback(e.to_string()))
    }

    pub fn resume(&self) -> Result<(), AudioError> {
        self.stream.play().map_err(|e| AudioError::Playback(e.to_string()))
    }
}

/// Fill an interleaved device buffer from `source`, a scratch block at a time.
fn render_interleaved<S: FrameSource>(source: &mut S, scratch: &mut [Frame], data: &mut [f32], channels: usize) {
    if channels == 0 || scratch.is_empty() {
        data.fill(0.0);
        return;
    }
    for chunk in data.chunks_mut(scratch.len() * channels) {
        let frames = &mut scratch[..chunk.len() / channels];
        source.render(frames);
        write_interleaved(frames, chunk, channels);
    }
}

/// Sending half of the jammer command queue.
pub struct JamHandle {
    producer: HeapProd<JamCommand>,
}

impl JamHandle {
    /// Queue a command. Returns false if the queue is full.
    pub fn send(&mut self, command: JamCommand) -> bool {
        self.producer.try_push(command).is_ok()
    }

    pub fn note_on(&mut self, note: u8) -> bool {
        self.send(JamCommand::NoteOn(note))
    }

    pub fn set_instrument(&mut self, instrument: Instrument) -> bool {
        self.send(JamCommand::SetInstrument(instrument))
    }

    pub fn set_row_len(&mut self, row_len: u32) -> bool {
        self.send(JamCommand::SetRowLen(row_len))
    }

    pub fn clear(&mut self) -> bool {
        self.send(JamCommand::Clear)
    }
}

/// A jammer that applies queued commands before each render.
pub struct QueuedJammer {
    jammer: Jammer,
    commands: HeapCons<JamCommand>,
}

impl QueuedJammer {
    pub fn new(jammer: Jammer) -> (Self, JamHandle) {
        let (producer, commands) = HeapRb::<JamCommand>::new(COMMAND_QUEUE_LEN).split();
        (Self { jammer, commands }, JamHandle { producer })
    }

    pub fn jammer(&self) -> &Jammer {
        &self.jammer
    }
}

impl FrameSource for QueuedJammer {
    fn sample_rate(&self) -> u32 {
        self.jammer.sample_rate()
    }

    fn render(&mut self, out: &mut [Frame]) {
        while let Some(command) = self.commands.try_pop() {
            self.jammer.apply(command);
        }
        self.jammer.render(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_ir::presets::PRESETS;

    #[test]
    fn queued_commands_reach_the_jammer() {
        let (mut source, mut handle) = QueuedJammer::new(Jammer::new(JammerConfig::default()));
        assert!(handle.set_instrument(PRESETS[0].instrument));
        assert!(handle.note_on(147));
        assert!(handle.note_on(151));
        assert_eq!(source.jammer().active_voices(), 0);

        let mut out = vec![Frame::silence(); 256];
        source.render(&mut out);
        assert_eq!(source.jammer().active_voices(), 2);
        assert_eq!(source.jammer().instrument(), &PRESETS[0].instrument);
        assert!(out.iter().any(|f| f.left != 0));

        assert!(handle.clear());
        source.render(&mut out);
        assert_eq!(source.jammer().active_voices(), 0);
    }

    #[test]
    fn full_queue_rejects_commands() {
        let (_source, mut handle) = QueuedJammer::new(Jammer::new(JammerConfig::default()));
        for _ in 0..COMMAND_QUEUE_LEN {
            assert!(handle.note_on(140));
        }
        assert!(!handle.note_on(140));
    }

    #[test]
    fn render_interleaved_covers_large_buffers() {
        let (mut source, mut handle) = QueuedJammer::new(Jammer::new(JammerConfig::default()));
        handle.set_instrument(PRESETS[0].instrument);
        handle.note_on(147);
        let mut scratch = vec![Frame::silence(); 64];
        let mut data = vec![f32::NAN; 2 * 200];
        render_interleaved(&mut source, &mut scratch, &mut data, 2);
        assert!(data.iter().all(|s| s.is_finite()));
        assert!(data.iter().any(|&s| s != 0.0));
    }
}
