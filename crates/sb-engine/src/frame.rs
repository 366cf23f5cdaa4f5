//! Audio frame type and the pull-source trait.

/// A stereo audio frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Convert from the mix range (±32767 full scale), clamping.
    pub fn from_mix(left: i32, right: i32) -> Self {
        Self {
            left: left.clamp(-32767, 32767) as i16,
            right: right.clamp(-32767, 32767) as i16,
        }
    }

    /// Left and right as `f32` in ±1.0.
    pub fn to_f32(self) -> (f32, f32) {
        (self.left as f32 / 32768.0, self.right as f32 / 32768.0)
    }
}

/// Anything an audio device can pull frames from.
pub trait FrameSource: Send {
    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Fill `out` completely. Must not block or allocate.
    fn render(&mut self, out: &mut [Frame]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mix_clamps() {
        assert_eq!(Frame::from_mix(40000, -40000), Frame { left: 32767, right: -32767 });
        assert_eq!(Frame::from_mix(12, -7), Frame { left: 12, right: -7 });
    }

    #[test]
    fn to_f32_is_unit_range() {
        assert_eq!(Frame { left: -32768, right: 16384 }.to_f32(), (-1.0, 0.5));
    }
}
