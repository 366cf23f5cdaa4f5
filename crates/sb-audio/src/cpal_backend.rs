//! Push-mode CPAL output for playing a pre-rendered song.
//!
//! The player thread queues frames into a ring buffer and the device
//! callback drains it. Frames the callback finds missing while playing are
//! counted as underruns and reported by the player once playback ends.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use sb_engine::Frame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use crate::device::{default_stereo_output, write_interleaved};
use crate::traits::{AudioError, AudioOutput};

/// Queued audio, in tenths of a second.
const QUEUE_TENTHS: usize = 2;

/// CPAL output fed through a frame ring buffer.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<Frame>,
    playing: Arc<AtomicBool>,
    underruns: Arc<AtomicU64>,
}

impl CpalOutput {
    /// Open the default device and build a paused stream on it.
    pub fn open() -> Result<Self, AudioError> {
        let (device, config) = default_stereo_output()?;
        let capacity = config.sample_rate.0 as usize * QUEUE_TENTHS / 10;
        let (producer, consumer) = HeapRb::<Frame>::new(capacity.max(1)).split();

        let mut output = Self {
            device,
            config,
            stream: None,
            producer,
            playing: Arc::new(AtomicBool::new(false)),
            underruns: Arc::new(AtomicU64::new(0)),
        };
        output.build_stream(consumer)?;
        debug!(rate = output.sample_rate(), capacity, "push output opened");
        Ok(output)
    }

    fn build_stream(&mut self, mut consumer: HeapCons<Frame>) -> Result<(), AudioError> {
        let playing = self.playing.clone();
        let underruns = self.underruns.clone();
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if playing.load(Ordering::Relaxed) {
                        let missing = drain_queue(&mut consumer, data, channels);
                        if missing > 0 {
                            underruns.fetch_add(missing as u64, Ordering::Relaxed);
                        }
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Frames the device asked for while the queue was empty.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

/// Fill an interleaved device buffer from the queue, padding with silence.
/// Returns the number of frames that had to be padded.
fn drain_queue<C: Consumer<Item = Frame>>(consumer: &mut C, data: &mut [f32], channels: usize) -> usize {
    let mut missing = 0;
    for chunk in data.chunks_mut(channels) {
        match consumer.try_pop() {
            Some(frame) => write_interleaved(&[frame], chunk, channels),
            None => {
                chunk.fill(0.0);
                missing += 1;
            }
        }
    }
    missing
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn write(&mut self, frames: &[Frame]) -> Result<usize, AudioError> {
        Ok(self.producer.push_slice(frames))
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.playing.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.playing.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_pads_and_counts_missing_frames() {
        let (mut prod, mut cons) = HeapRb::<Frame>::new(8).split();
        assert_eq!(prod.push_slice(&[Frame { left: 16384, right: -16384 }; 3]), 3);

        let mut data = [1.0f32; 10];
        assert_eq!(drain_queue(&mut cons, &mut data, 2), 2);
        assert_eq!(&data[..6], &[0.5, -0.5, 0.5, -0.5, 0.5, -0.5]);
        assert!(data[6..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn drain_empty_queue_is_all_underrun() {
        let (_prod, mut cons) = HeapRb::<Frame>::new(4).split();
        let mut data = [1.0f32; 8];
        assert_eq!(drain_queue(&mut cons, &mut data, 2), 4);
        assert!(data.iter().all(|&s| s == 0.0));
    }
}
