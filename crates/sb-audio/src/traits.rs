//! Audio output trait and error types.

use sb_engine::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
}

/// How long `write_all` sleeps when the output queue is full.
const FULL_QUEUE_WAIT: Duration = Duration::from_millis(2);

/// A push-mode output: the caller renders ahead and writes frames in.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Queue as many frames as fit without waiting. Returns how many were
    /// taken; the caller keeps the rest.
    fn write(&mut self, frames: &[Frame]) -> Result<usize, AudioError>;

    /// Queue every frame, waiting for room. Returns `Ok(false)` if `stop`
    /// was raised before everything was queued.
    fn write_all(&mut self, mut frames: &[Frame], stop: &AtomicBool) -> Result<bool, AudioError> {
        while !frames.is_empty() {
            if stop.load(Ordering::Relaxed) {
                return Ok(false);
            }
            let taken = self.write(frames)?;
            frames = &frames[taken..];
            if taken == 0 {
                std::thread::sleep(FULL_QUEUE_WAIT);
            }
        }
        Ok(true)
    }

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Takes at most `room` frames per call, like a device queue that
    /// drains between writes.
    struct SlowOutput {
        room: usize,
        received: Vec<Frame>,
        calls: usize,
    }

    impl AudioOutput for SlowOutput {
        fn sample_rate(&self) -> u32 {
            44100
        }

        fn write(&mut self, frames: &[Frame]) -> Result<usize, AudioError> {
            self.calls += 1;
            // Every other call finds the queue full.
            let room = if self.calls % 2 == 0 { 0 } else { self.room };
            let taken = frames.len().min(room);
            self.received.extend_from_slice(&frames[..taken]);
            Ok(taken)
        }

        fn start(&mut self) -> Result<(), AudioError> {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), AudioError> {
            Ok(())
        }
    }

    fn ramp(n: usize) -> Vec<Frame> {
        (0..n as i16).map(|i| Frame { left: i, right: -i }).collect()
    }

    #[test]
    fn write_all_queues_every_frame_in_order() {
        let mut out = SlowOutput { room: 7, received: Vec::new(), calls: 0 };
        let frames = ramp(30);
        assert!(out.write_all(&frames, &AtomicBool::new(false)).unwrap());
        assert_eq!(out.received, frames);
        assert!(out.calls > 30 / 7);
    }

    #[test]
    fn write_all_gives_up_when_stopped() {
        let mut out = SlowOutput { room: 7, received: Vec::new(), calls: 0 };
        assert!(!out.write_all(&ramp(30), &AtomicBool::new(true)).unwrap());
        assert!(out.received.is_empty());
    }
}
