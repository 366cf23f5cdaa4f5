//! Sonant song import.
//!
//! Sonant files are a fixed 3333-byte image: a row length, eight
//! instrument records and the last sequence row.

use std::io::Cursor;

use binrw::BinRead;
use sb_ir::{Instrument, Param, Song};
use tracing::info;

use crate::sbox_format::{legacy_envelope, legacy_filter_freq, round_byte};
use crate::FormatError;

pub const SONANT_SIZE: usize = 3333;
const SONANT_CHANNELS: usize = 8;
const SONANT_PATTERN_LEN: usize = 32;

#[derive(BinRead, Debug)]
#[br(little)]
struct SonantOsc {
    octave: u8,
    semi: u8,
    detune: u8,
    xenv: u8,
    volume: u8,
    waveform: u8,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct SonantInstrument {
    osc1: SonantOsc,
    osc2: SonantOsc,
    #[br(pad_after = 3)]
    noise_volume: u8,
    attack: u32,
    sustain: u32,
    release: u32,
    master: u8,
    #[br(pad_after = 2)]
    filter: u8,
    filter_freq: f32,
    resonance: u8,
    delay_time: u8,
    delay_amount: u8,
    pan_freq: u8,
    pan_amount: u8,
    _lfo_osc1_freq: u8,
    lfo_fx_freq: u8,
    lfo_freq: u8,
    lfo_amount: u8,
    lfo_waveform: u8,
    sequence: [u8; 48],
    #[br(pad_after = 2)]
    patterns: [[u8; SONANT_PATTERN_LEN]; 10],
}

#[derive(BinRead, Debug)]
#[br(little)]
struct SonantFile {
    row_len: u32,
    instruments: [SonantInstrument; SONANT_CHANNELS],
    end_pattern: u8,
}

/// Cheap test for the Sonant shape: exact size and a plausible end row.
pub fn is_sonant(data: &[u8]) -> bool {
    data.len() == SONANT_SIZE && data[SONANT_SIZE - 1] <= 48
}

pub fn load_sonant(data: &[u8]) -> Result<Song, FormatError> {
    if !is_sonant(data) {
        return Err(FormatError::InvalidHeader);
    }
    let file = SonantFile::read(&mut Cursor::new(data))?;
    if file.row_len == 0 {
        return Err(FormatError::InvalidHeader);
    }

    let mut song = Song::empty(file.row_len, SONANT_PATTERN_LEN);
    song.end_pattern = file.end_pattern as usize + 2;
    song.num_channels = SONANT_CHANNELS;

    for (channel, src) in song.channels.iter_mut().zip(file.instruments.iter()) {
        channel.instrument = convert_instrument(src);
        channel.sequence[..src.sequence.len()].copy_from_slice(&src.sequence);
        for (pattern, notes) in channel.patterns.iter_mut().zip(src.patterns.iter()) {
            pattern.notes_mut()[..SONANT_PATTERN_LEN].copy_from_slice(notes);
        }
    }

    info!(row_len = song.row_len, end_pattern = song.end_pattern, "imported Sonant song");
    Ok(song)
}

fn fold_semi(osc: &SonantOsc) -> u8 {
    (12 * (osc.octave as i32 - 8) + 128 + osc.semi as i32).clamp(0, 255) as u8
}

fn convert_instrument(src: &SonantInstrument) -> Instrument {
    let mut inst = Instrument::zeroed();
    let master = src.master as f64 / 255.0;
    let saw_scale = |wave: u8| if wave == 2 { 0.5 } else { 1.0 };

    inst.set(Param::Osc1Waveform, src.osc1.waveform);
    inst.set(
        Param::Osc1Volume,
        round_byte(src.osc1.volume as f64 * master * saw_scale(src.osc1.waveform)),
    );
    inst.set(Param::Osc1Semi, fold_semi(&src.osc1));
    inst.set(Param::Osc1Xenv, src.osc1.xenv.saturating_mul(64));

    inst.set(Param::Osc2Waveform, src.osc2.waveform);
    inst.set(
        Param::Osc2Volume,
        round_byte(src.osc2.volume as f64 * master * saw_scale(src.osc2.waveform)),
    );
    inst.set(Param::Osc2Semi, fold_semi(&src.osc2));
    inst.set(Param::Osc2Detune, src.osc2.detune);
    inst.set(Param::Osc2Xenv, src.osc2.xenv.saturating_mul(64));

    inst.set(Param::NoiseVolume, round_byte(src.noise_volume as f64 * master));

    inst.set(Param::EnvAttack, legacy_envelope(src.attack));
    inst.set(Param::EnvSustain, legacy_envelope(src.sustain));
    inst.set(Param::EnvRelease, legacy_envelope(src.release));

    inst.set(Param::LfoWaveform, src.lfo_waveform);
    inst.set(
        Param::LfoAmt,
        round_byte(src.lfo_amount as f64 * saw_scale(src.lfo_waveform)),
    );
    inst.set(Param::LfoFreq, src.lfo_freq);
    inst.set(Param::LfoFxFreq, src.lfo_fx_freq);

    if (1..=3).contains(&src.filter) {
        inst.set(Param::FxFilter, src.filter);
        inst.set(Param::FxFreq, legacy_filter_freq(src.filter_freq as f64));
    } else {
        inst.set(Param::FxFilter, 2);
        inst.set(Param::FxFreq, 255);
    }
    inst.set(Param::FxResonance, 255 - src.resonance);
    inst.set(Param::FxDist, 0);
    inst.set(Param::FxDrive, 32);
    inst.set(Param::FxPanAmt, src.pan_amount);
    inst.set(Param::FxPanFreq, src.pan_freq);
    inst.set(Param::FxDelayAmt, src.delay_amount);
    inst.set(Param::FxDelayTime, src.delay_time);
    inst
}
