//! Edit commands for mutating song data.

use crate::instrument::{Instrument, Param};
use crate::pattern::NOTE_COLUMNS;
use crate::song::{Song, MAX_CHANNELS, MAX_PATTERNS, MAX_SONG_ROWS};

/// An edit command that mutates song data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Set a single note in a pattern.
    SetNote {
        channel: u8,
        pattern: u8,
        row: u16,
        column: u8,
        note: u8,
    },
    /// Set the effect command of a pattern row (id 0 clears it).
    SetEffect {
        channel: u8,
        pattern: u8,
        row: u16,
        command: u8,
        value: u8,
    },
    /// Point a sequence slot at a pattern (0 = empty).
    SetSequence {
        channel: u8,
        song_row: u16,
        pattern: u8,
    },
    /// Change one instrument field.
    SetParam {
        channel: u8,
        param: Param,
        value: u8,
    },
    /// Replace a whole instrument.
    SetInstrument {
        channel: u8,
        instrument: Instrument,
    },
}

impl Song {
    /// Apply an edit. Returns false if any coordinate is out of range,
    /// in which case the song is unchanged.
    pub fn apply(&mut self, edit: &Edit) -> bool {
        match *edit {
            Edit::SetNote { channel, pattern, row, column, note } => {
                let rows = self.pattern_len;
                match self.pattern_slot(channel, pattern) {
                    Some(p) if (row as usize) < rows && (column as usize) < NOTE_COLUMNS => {
                        p.set_note(column as usize, row as usize, note);
                        true
                    }
                    _ => false,
                }
            }
            Edit::SetEffect { channel, pattern, row, command, value } => {
                let rows = self.pattern_len;
                match self.pattern_slot(channel, pattern) {
                    Some(p) if (row as usize) < rows => {
                        p.set_command(row as usize, command, value);
                        true
                    }
                    _ => false,
                }
            }
            Edit::SetSequence { channel, song_row, pattern } => {
                if channel as usize >= MAX_CHANNELS
                    || song_row as usize >= MAX_SONG_ROWS
                    || pattern as usize > MAX_PATTERNS
                {
                    return false;
                }
                self.channels[channel as usize].sequence[song_row as usize] = pattern;
                self.update_song_ranges();
                true
            }
            Edit::SetParam { channel, param, value } => match self.channels.get_mut(channel as usize) {
                Some(ch) => {
                    ch.instrument.set(param, value);
                    true
                }
                None => false,
            },
            Edit::SetInstrument { channel, instrument } => {
                match self.channels.get_mut(channel as usize) {
                    Some(ch) => {
                        ch.instrument = instrument;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Pattern slot by 0-based pattern index.
    fn pattern_slot(&mut self, channel: u8, pattern: u8) -> Option<&mut crate::pattern::Pattern> {
        self.channels
            .get_mut(channel as usize)?
            .patterns
            .get_mut(pattern as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_note_and_effect() {
        let mut song = Song::new();
        assert!(song.apply(&Edit::SetNote { channel: 1, pattern: 2, row: 31, column: 3, note: 150 }));
        assert_eq!(song.channels[1].patterns[2].note(3, 31), 150);

        assert!(song.apply(&Edit::SetEffect { channel: 0, pattern: 0, row: 4, command: 22, value: 9 }));
        assert_eq!(song.channels[0].patterns[0].effect(4).map(|e| e.param), Some(Param::FxFreq));
    }

    #[test]
    fn out_of_range_edits_are_rejected() {
        let mut song = Song::new();
        let before = song.clone();
        assert!(!song.apply(&Edit::SetNote { channel: 0, pattern: 0, row: 32, column: 0, note: 1 }));
        assert!(!song.apply(&Edit::SetNote { channel: 0, pattern: 36, row: 0, column: 0, note: 1 }));
        assert!(!song.apply(&Edit::SetNote { channel: 0, pattern: 0, row: 0, column: 4, note: 1 }));
        assert!(!song.apply(&Edit::SetSequence { channel: 16, song_row: 0, pattern: 1 }));
        assert!(!song.apply(&Edit::SetSequence { channel: 0, song_row: 0, pattern: 37 }));
        assert_eq!(song, before);
    }

    #[test]
    fn set_sequence_updates_ranges() {
        let mut song = Song::new();
        assert!(song.apply(&Edit::SetSequence { channel: 2, song_row: 6, pattern: 3 }));
        assert_eq!(song.end_pattern, 6);
        assert_eq!(song.num_channels, 3);
    }

    #[test]
    fn set_param_touches_one_field() {
        let mut song = Song::new();
        let before = song.channels[5].instrument;
        assert!(song.apply(&Edit::SetParam { channel: 5, param: Param::FxDrive, value: 1 }));
        assert_eq!(song.channels[5].instrument.changed_params(&before).len(), 1);
    }
}
