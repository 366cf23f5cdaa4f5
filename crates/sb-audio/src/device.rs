//! Default output device lookup and the interleaving shared by both
//! stream kinds.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, StreamConfig};
use sb_engine::Frame;

use crate::traits::AudioError;

/// Open the default output device as a stereo stream config.
pub(crate) fn default_stereo_output() -> Result<(Device, StreamConfig), AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

    let mut config: StreamConfig = config.into();
    // The callbacks write interleaved stereo
    config.channels = 2;
    Ok((device, config))
}

/// Write frames into an interleaved device buffer of `channels` channels,
/// zero-filling any channel past the second.
pub(crate) fn write_interleaved(frames: &[Frame], data: &mut [f32], channels: usize) {
    for (chunk, frame) in data.chunks_mut(channels).zip(frames) {
        let (left, right) = frame.to_f32();
        for (i, sample) in chunk.iter_mut().enumerate() {
            *sample = match i {
                0 => left,
                1 => right,
                _ => 0.0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaves_and_zero_fills() {
        let frames = [Frame { left: 16384, right: -16384 }, Frame { left: 0, right: 8192 }];
        let mut data = [9.0f32; 8];
        write_interleaved(&frames, &mut data, 4);
        assert_eq!(data, [0.5, -0.5, 0.0, 0.0, 0.0, 0.25, 0.0, 0.0]);
    }
}
