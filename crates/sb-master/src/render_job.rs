//! Batch render on a worker thread with pollable progress.

use sb_engine::{render_song, MixBuffer, RenderOptions};
use sb_ir::Song;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// A render running in the background.
pub struct RenderJob {
    progress: Arc<AtomicU32>,
    thread: JoinHandle<MixBuffer>,
}

impl RenderJob {
    pub(crate) fn spawn(song: Song, options: RenderOptions) -> Self {
        let progress = Arc::new(AtomicU32::new(0f32.to_bits()));
        let shared = progress.clone();
        let thread = std::thread::spawn(move || {
            let mut last = 0.0f32;
            let mix = render_song(&song, &options, |p| {
                shared.store(p.to_bits(), Ordering::Relaxed);
                if p - last >= 0.1 {
                    debug!(progress = p, "rendering");
                    last = p;
                }
            });
            info!(frames = mix.frames(), "render finished");
            mix
        });
        Self { progress, thread }
    }

    /// Fraction done, 0.0 to 1.0.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the render is done. `None` if the worker panicked.
    pub fn wait(self) -> Option<MixBuffer> {
        self.thread.join().ok()
    }
}
