//! SoundBox song format ("SBox"), versions 1 to 14.
//!
//! Each format revision is one entry in [`STEPS`]. A reader folds every
//! step up to the file's version into a [`Layout`] and then runs a single
//! linear decoder over it, so no field read is buried in nested version
//! checks.

use sb_ir::{Instrument, Param, Pattern, Song, MAX_CHANNELS, MAX_PATTERNS, MAX_SONG_ROWS};
use tracing::{debug, info};

use crate::compression::{self, CompressionMethod, CompressionPolicy};
use crate::reader::{ByteReader, ByteWriter};
use crate::FormatError;

/// "SBox" read as a little-endian u32.
pub const SBOX_MAGIC: u32 = 0x786F_4253;
/// Version written by [`save_sbox`].
pub const SBOX_VERSION: u8 = 14;

/// One format revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Change {
    /// Four note columns per pattern instead of one.
    NoteColumns,
    /// Saw volumes and drive are stored at their final scale.
    NativeSawScale,
    /// Effect command and value planes follow the notes.
    EffectColumns,
    /// Envelope stored as bytes, filter frequency as a byte.
    ByteEnvelope,
    /// Fields stored in parameter-vector order.
    VectorOrder,
    /// Resonance no longer stored inverted.
    NativeResonance,
    /// Method byte and compressed payload.
    Compressed,
    /// 36 patterns and 128 sequence rows.
    MorePatterns,
    /// Rows per pattern stored in the header.
    PatternLength,
    /// Arpeggio chord and speed fields.
    Arpeggio,
    /// u16 end pattern, stored channel count, trimmed sequences.
    WideHeader,
    /// Exponential decay field.
    ExpDecay,
    /// Oscillator envelope tracking stored as an amount, not a flag.
    XenvAmount,
}

/// `(first version, change)` in ascending version order.
pub(crate) const STEPS: [(u8, Change); 13] = [
    (2, Change::NoteColumns),
    (3, Change::NativeSawScale),
    (4, Change::EffectColumns),
    (5, Change::ByteEnvelope),
    (6, Change::VectorOrder),
    (7, Change::NativeResonance),
    (8, Change::Compressed),
    (9, Change::MorePatterns),
    (10, Change::PatternLength),
    (11, Change::Arpeggio),
    (12, Change::WideHeader),
    (13, Change::ExpDecay),
    (14, Change::XenvAmount),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SequenceRows {
    Fixed(usize),
    ThroughEndPattern,
}

/// Field layout of one format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub version: u8,
    pub compressed: bool,
    pub wide_header: bool,
    pub stored_pattern_len: bool,
    pub vector_order: bool,
    pub byte_envelope: bool,
    pub has_decay: bool,
    pub has_arpeggio: bool,
    pub sequence_rows: SequenceRows,
    pub pattern_slots: usize,
    pub note_columns: usize,
    pub has_effects: bool,
    pub halve_saw: bool,
    pub inverted_resonance: bool,
    pub xenv_flag: bool,
}

impl Layout {
    /// Version 1.
    const FIRST: Layout = Layout {
        version: 1,
        compressed: false,
        wide_header: false,
        stored_pattern_len: false,
        vector_order: false,
        byte_envelope: false,
        has_decay: false,
        has_arpeggio: false,
        sequence_rows: SequenceRows::Fixed(48),
        pattern_slots: 10,
        note_columns: 1,
        has_effects: false,
        halve_saw: true,
        inverted_resonance: true,
        xenv_flag: true,
    };

    pub fn for_version(version: u8) -> Result<Layout, FormatError> {
        if !(1..=SBOX_VERSION).contains(&version) {
            return Err(FormatError::UnsupportedVersion(version));
        }
        Ok(STEPS
            .iter()
            .filter(|(since, _)| *since <= version)
            .fold(Layout { version, ..Self::FIRST }, |layout, (_, change)| layout.with(*change)))
    }

    fn with(mut self, change: Change) -> Layout {
        match change {
            Change::NoteColumns => self.note_columns = 4,
            Change::NativeSawScale => self.halve_saw = false,
            Change::EffectColumns => self.has_effects = true,
            Change::ByteEnvelope => self.byte_envelope = true,
            Change::VectorOrder => self.vector_order = true,
            Change::NativeResonance => self.inverted_resonance = false,
            Change::Compressed => self.compressed = true,
            Change::MorePatterns => {
                self.pattern_slots = MAX_PATTERNS;
                self.sequence_rows = SequenceRows::Fixed(128);
            }
            Change::PatternLength => self.stored_pattern_len = true,
            Change::Arpeggio => self.has_arpeggio = true,
            Change::WideHeader => {
                self.wide_header = true;
                self.sequence_rows = SequenceRows::ThroughEndPattern;
            }
            Change::ExpDecay => self.has_decay = true,
            Change::XenvAmount => self.xenv_flag = false,
        }
        self
    }

    /// Amount added to stored effect command ids `>= 14` to reach the
    /// current parameter numbering.
    pub fn command_shift(&self) -> u8 {
        let mut shift = 0;
        if !self.has_arpeggio {
            shift += 2;
        }
        if !self.has_decay {
            shift += 1;
        }
        shift
    }
}

/// Decode an SBox song. Fails without producing a partial song.
pub fn load_sbox(data: &[u8]) -> Result<Song, FormatError> {
    let mut r = ByteReader::new(data);
    if r.read_u32_le()? != SBOX_MAGIC {
        return Err(FormatError::InvalidHeader);
    }
    let layout = Layout::for_version(r.read_u8()?)?;

    let payload = if layout.compressed {
        let method = CompressionMethod::from_code(r.read_u8()?)?;
        compression::decompress(method, r.tail())?
    } else {
        r.tail().to_vec()
    };

    let song = read_payload(&payload, &layout)?;
    info!(
        version = layout.version,
        channels = song.num_channels,
        end_pattern = song.end_pattern,
        "loaded SBox song"
    );
    Ok(song)
}

fn read_payload(payload: &[u8], layout: &Layout) -> Result<Song, FormatError> {
    let mut r = ByteReader::new(payload);

    let row_len = r.read_u32_le()?;
    let end_pattern = if layout.wide_header {
        r.read_u16_le()? as usize
    } else {
        r.read_u8()? as usize + 2
    };
    let pattern_len = if layout.stored_pattern_len {
        match r.read_u8()? {
            0 => 256,
            n => n as usize,
        }
    } else {
        32
    };
    let num_channels = if layout.wide_header {
        r.read_u8()? as usize
    } else {
        8
    };

    if row_len == 0 || num_channels > MAX_CHANNELS || end_pattern >= MAX_SONG_ROWS {
        return Err(FormatError::InvalidHeader);
    }
    debug!(row_len, end_pattern, pattern_len, num_channels, "SBox header");

    let mut song = Song::empty(row_len, pattern_len);
    song.end_pattern = end_pattern;
    song.num_channels = num_channels;

    let sequence_rows = match layout.sequence_rows {
        SequenceRows::Fixed(rows) => rows,
        SequenceRows::ThroughEndPattern => end_pattern + 1,
    };
    let shift = layout.command_shift();

    for channel in song.channels.iter_mut().take(num_channels) {
        let mut instrument = read_instrument(&mut r, layout)?;

        r.read_into(&mut channel.sequence[..sequence_rows])?;

        for pattern in channel.patterns.iter_mut().take(layout.pattern_slots) {
            read_pattern(&mut r, pattern, pattern_len, layout, shift)?;
        }

        apply_fixups(&mut instrument, layout);
        channel.instrument = instrument;
    }

    Ok(song)
}

/// Read one parameter vector in the layout's field order. Version
/// fixups are not applied here.
pub(crate) fn read_instrument(r: &mut ByteReader<'_>, layout: &Layout) -> Result<Instrument, FormatError> {
    let mut inst = Instrument::zeroed();

    if layout.vector_order {
        read_fields(r, &mut inst, &[Param::Osc1Waveform, Param::Osc1Volume, Param::Osc1Semi, Param::Osc1Xenv])?;
        read_fields(
            r,
            &mut inst,
            &[Param::Osc2Waveform, Param::Osc2Volume, Param::Osc2Semi, Param::Osc2Detune, Param::Osc2Xenv],
        )?;
    } else {
        read_fields(r, &mut inst, &[Param::Osc1Semi, Param::Osc1Xenv, Param::Osc1Volume, Param::Osc1Waveform])?;
        read_fields(
            r,
            &mut inst,
            &[Param::Osc2Semi, Param::Osc2Detune, Param::Osc2Xenv, Param::Osc2Volume, Param::Osc2Waveform],
        )?;
    }
    read_fields(r, &mut inst, &[Param::NoiseVolume])?;

    let envelope = [Param::EnvAttack, Param::EnvSustain, Param::EnvRelease];
    if layout.byte_envelope {
        read_fields(r, &mut inst, &envelope)?;
    } else {
        for p in envelope {
            inst.set(p, legacy_envelope(r.read_u32_le()?));
        }
    }

    if layout.has_decay {
        read_fields(r, &mut inst, &[Param::EnvExpDecay])?;
    }
    if layout.has_arpeggio {
        read_fields(r, &mut inst, &[Param::ArpChord, Param::ArpSpeed])?;
    }

    if layout.vector_order {
        read_fields(
            r,
            &mut inst,
            &[
                Param::LfoWaveform,
                Param::LfoAmt,
                Param::LfoFreq,
                Param::LfoFxFreq,
                Param::FxFilter,
                Param::FxFreq,
                Param::FxResonance,
                Param::FxDist,
                Param::FxDrive,
                Param::FxPanAmt,
                Param::FxPanFreq,
                Param::FxDelayAmt,
                Param::FxDelayTime,
            ],
        )?;
    } else {
        read_fields(r, &mut inst, &[Param::FxFilter])?;
        if layout.byte_envelope {
            read_fields(r, &mut inst, &[Param::FxFreq])?;
        } else {
            inst.set(Param::FxFreq, legacy_filter_freq(r.read_u16_le()? as f64));
        }
        read_fields(
            r,
            &mut inst,
            &[
                Param::FxResonance,
                Param::FxDelayTime,
                Param::FxDelayAmt,
                Param::FxPanFreq,
                Param::FxPanAmt,
                Param::FxDist,
                Param::FxDrive,
                Param::LfoFxFreq,
                Param::LfoFreq,
                Param::LfoAmt,
                Param::LfoWaveform,
            ],
        )?;
    }

    Ok(inst)
}

fn read_fields(r: &mut ByteReader<'_>, inst: &mut Instrument, params: &[Param]) -> Result<(), FormatError> {
    for &p in params {
        inst.set(p, r.read_u8()?);
    }
    Ok(())
}

fn read_pattern(
    r: &mut ByteReader<'_>,
    pattern: &mut Pattern,
    pattern_len: usize,
    layout: &Layout,
    shift: u8,
) -> Result<(), FormatError> {
    r.read_into(&mut pattern.notes_mut()[..layout.note_columns * pattern_len])?;
    if layout.has_effects {
        r.read_into(pattern.commands_mut())?;
        for cmd in pattern.commands_mut() {
            if *cmd >= 14 {
                *cmd = cmd.saturating_add(shift);
            }
        }
        r.read_into(pattern.values_mut())?;
    }
    Ok(())
}

/// Old files stored envelope lengths in samples.
pub(crate) fn legacy_envelope(samples: u32) -> u8 {
    round_byte((samples as f64).sqrt() / 2.0)
}

/// Old files stored the filter cutoff in Hz.
pub(crate) fn legacy_filter_freq(hz: f64) -> u8 {
    round_byte(hz / 43.23529)
}

/// Round half up, saturating into a byte.
pub(crate) fn round_byte(x: f64) -> u8 {
    (x + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Bring an instrument read with `layout` up to current scales.
pub(crate) fn apply_fixups(inst: &mut Instrument, layout: &Layout) {
    if layout.halve_saw {
        halve_for_saw(inst, Param::Osc1Waveform, Param::Osc1Volume);
        halve_for_saw(inst, Param::Osc2Waveform, Param::Osc2Volume);
        halve_for_saw(inst, Param::LfoWaveform, Param::LfoAmt);
        let drive = inst.get(Param::FxDrive);
        inst.set(Param::FxDrive, if drive < 224 { drive + 32 } else { 255 });
    }
    if layout.inverted_resonance {
        inst.set(Param::FxResonance, 255 - inst.get(Param::FxResonance));
    }
    if layout.xenv_flag {
        for p in [Param::Osc1Xenv, Param::Osc2Xenv] {
            inst.set(p, inst.get(p).saturating_mul(64));
        }
    }
}

fn halve_for_saw(inst: &mut Instrument, wave: Param, amount: Param) {
    if inst.get(wave) == 2 {
        inst.set(amount, round_byte(inst.get(amount) as f64 / 2.0));
    }
}

/// Encode a song as the current SBox version.
pub fn save_sbox(song: &Song, policy: &CompressionPolicy) -> Vec<u8> {
    let payload = write_payload(song);
    let (method, packed) = compression::compress(&payload, policy);
    info!(
        method = ?method,
        packed = packed.len(),
        unpacked = payload.len(),
        "saved SBox song"
    );

    let mut w = ByteWriter::new();
    w.put_u32_le(SBOX_MAGIC);
    w.put_u8(SBOX_VERSION);
    w.put_u8(method.code());
    w.put_bytes(&packed);
    w.into_inner()
}

fn write_payload(song: &Song) -> Vec<u8> {
    let end_pattern = song.end_pattern.min(MAX_SONG_ROWS - 1);
    let num_channels = song.num_channels.min(MAX_CHANNELS);

    let mut w = ByteWriter::new();
    w.put_u32_le(song.row_len);
    w.put_u16_le(end_pattern as u16);
    // 256 rows wraps to 0
    w.put_u8(song.pattern_len as u8);
    w.put_u8(num_channels as u8);

    for channel in &song.channels[..num_channels] {
        w.put_bytes(channel.instrument.values());
        w.put_bytes(&channel.sequence[..=end_pattern]);
        for pattern in &channel.patterns {
            w.put_bytes(pattern.notes());
            w.put_bytes(pattern.commands());
            w.put_bytes(pattern.values());
        }
    }
    w.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_ir::presets::PRESETS;

    #[test]
    fn layouts_accumulate_changes() {
        let v1 = Layout::for_version(1).unwrap();
        assert_eq!(v1.note_columns, 1);
        assert!(!v1.has_effects && v1.halve_saw && v1.inverted_resonance);
        assert_eq!(v1.command_shift(), 3);

        let v8 = Layout::for_version(8).unwrap();
        assert!(v8.compressed && v8.vector_order && !v8.inverted_resonance);
        assert_eq!(v8.sequence_rows, SequenceRows::Fixed(48));
        assert_eq!(v8.pattern_slots, 10);

        let v11 = Layout::for_version(11).unwrap();
        assert_eq!(v11.sequence_rows, SequenceRows::Fixed(128));
        assert_eq!(v11.command_shift(), 1);

        let v14 = Layout::for_version(14).unwrap();
        assert_eq!(v14.sequence_rows, SequenceRows::ThroughEndPattern);
        assert_eq!(v14.command_shift(), 0);
        assert!(!v14.xenv_flag);
    }

    #[test]
    fn unsupported_versions() {
        assert_eq!(Layout::for_version(0), Err(FormatError::UnsupportedVersion(0)));
        assert_eq!(Layout::for_version(15), Err(FormatError::UnsupportedVersion(15)));
    }

    #[test]
    fn legacy_conversions() {
        assert_eq!(legacy_envelope(10000), 50);
        assert_eq!(legacy_envelope(0), 0);
        assert_eq!(legacy_filter_freq(11025.0), 255);
        assert_eq!(round_byte(2.5), 3);
    }

    #[test]
    fn fixups_for_version_two() {
        let mut inst = Instrument::zeroed();
        inst.set(Param::Osc1Waveform, 2);
        inst.set(Param::Osc1Volume, 193);
        inst.set(Param::Osc2Volume, 100);
        inst.set(Param::FxDrive, 230);
        inst.set(Param::FxResonance, 15);
        inst.set(Param::Osc2Xenv, 1);
        apply_fixups(&mut inst, &Layout::for_version(2).unwrap());
        assert_eq!(inst.get(Param::Osc1Volume), 97);
        assert_eq!(inst.get(Param::Osc2Volume), 100);
        assert_eq!(inst.get(Param::FxDrive), 255);
        assert_eq!(inst.get(Param::FxResonance), 240);
        assert_eq!(inst.get(Param::Osc2Xenv), 64);
    }

    #[test]
    fn fixups_are_noop_for_current_version() {
        let mut inst = PRESETS[3].instrument;
        apply_fixups(&mut inst, &Layout::for_version(SBOX_VERSION).unwrap());
        assert_eq!(inst, PRESETS[3].instrument);
    }

    #[test]
    fn vector_order_instrument_read() {
        let bytes: Vec<u8> = (1..=29).collect();
        let mut r = ByteReader::new(&bytes);
        let inst = read_instrument(&mut r, &Layout::for_version(14).unwrap()).unwrap();
        assert_eq!(&inst.values()[..], &bytes[..]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        assert_eq!(load_sbox(b"RIFF\x0e\x00"), Err(FormatError::InvalidHeader));
        assert_eq!(load_sbox(b"SB"), Err(FormatError::UnexpectedEof));
    }

    #[test]
    fn writes_version_fourteen_header() {
        let bytes = save_sbox(&Song::new(), &CompressionPolicy::none());
        assert_eq!(&bytes[..4], b"SBox");
        assert_eq!(bytes[4], 14);
        assert_eq!(bytes[5], 0);
        // row length 5513, end pattern 0, 32 rows, 1 channel
        assert_eq!(&bytes[6..14], &[0x89, 0x15, 0, 0, 0, 0, 32, 1]);
        assert_eq!(bytes.len(), 6 + 8 + 29 + 1 + MAX_PATTERNS * 32 * 6);
    }
}
