//! WAV export of rendered audio (16-bit stereo PCM).

use sb_engine::{Frame, MixBuffer};
use std::io::Write;

const NUM_CHANNELS: u16 = 2;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
pub const WAV_HEADER_LEN: usize = 44;

pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let data_size = frames.len() as u32 * BLOCK_ALIGN as u32;
    w.write_all(&wav_header(data_size, sample_rate))?;
    for frame in frames {
        w.write_all(&frame.left.to_le_bytes())?;
        w.write_all(&frame.right.to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let data_size = frames.len() as u32 * BLOCK_ALIGN as u32;
    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);
    buf.extend_from_slice(&wav_header(data_size, sample_rate));
    for frame in frames {
        buf.extend_from_slice(&frame.left.to_le_bytes());
        buf.extend_from_slice(&frame.right.to_le_bytes());
    }
    buf
}

/// Encode a batch render, clamping the mix to ±32767.
pub fn mix_to_wav(mix: &MixBuffer, sample_rate: u32) -> Vec<u8> {
    frames_to_wav(&mix.to_frames(), sample_rate)
}

fn wav_header(data_size: u32, sample_rate: u32) -> [u8; WAV_HEADER_LEN] {
    let mut h = [0u8; WAV_HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&1u16.to_le_bytes());
    h[22..24].copy_from_slice(&NUM_CHANNELS.to_le_bytes());
    h[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&(sample_rate * BLOCK_ALIGN as u32).to_le_bytes());
    h[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    h[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_size.to_le_bytes());
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    }

    #[test]
    fn header_layout() {
        let frames = [Frame { left: 1, right: -1 }, Frame { left: 300, right: -300 }];
        let wav = frames_to_wav(&frames, 44100);
        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(read_u32(&wav, 4), 36 + 8);
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(read_u32(&wav, 24), 44100);
        assert_eq!(read_u32(&wav, 28), 44100 * 4);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(read_u32(&wav, 40), 8);
        assert_eq!(&wav[44..48], &[1, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn writer_matches_buffer_encoder() {
        let frames = vec![Frame { left: -5, right: 7 }; 10];
        let mut out = Vec::new();
        write_wav(&mut out, &frames, 22050).unwrap();
        assert_eq!(out, frames_to_wav(&frames, 22050));
    }

    #[test]
    fn mix_is_clamped() {
        let mut mix = MixBuffer::new(2);
        mix.samples_mut().copy_from_slice(&[40000, -40000, 12, -12]);
        let wav = mix_to_wav(&mix, 44100);
        let sample = |i: usize| i16::from_le_bytes([wav[44 + 2 * i], wav[45 + 2 * i]]);
        assert_eq!(sample(0), 32767);
        assert_eq!(sample(1), -32767);
        assert_eq!(sample(2), 12);
        assert_eq!(sample(3), -12);
    }
}
