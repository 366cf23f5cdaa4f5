//! Audio output backends for the SoundBox synthesizer.

mod cpal_backend;
mod device;
mod pull_output;
mod traits;

pub use cpal_backend::CpalOutput;
pub use pull_output::{JamHandle, PullOutput, QueuedJammer, COMMAND_QUEUE_LEN};
pub use traits::{AudioError, AudioOutput};
