//! Pattern: a block of note rows plus an effect-command track.

use alloc::vec;
use alloc::vec::Vec;

use crate::instrument::Param;

/// Note columns per pattern.
pub const NOTE_COLUMNS: usize = 4;

/// Pitch code of middle A (440 Hz) on oscillators with semi = 128.
pub const NOTE_A4: u8 = 144;

/// An automation event: write `value` into `param` of the live instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectCommand {
    pub param: Param,
    pub value: u8,
}

/// A pattern of `rows` rows.
///
/// Notes are stored column-major (`notes[col * rows + row]`), effects as two
/// parallel planes of command ids and values. This is the on-disk layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    rows: usize,
    notes: Vec<u8>,
    commands: Vec<u8>,
    values: Vec<u8>,
}

impl Pattern {
    /// Create an empty pattern.
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            notes: vec![0; rows * NOTE_COLUMNS],
            commands: vec![0; rows],
            values: vec![0; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Pitch code at (col, row); 0 means no note.
    pub fn note(&self, col: usize, row: usize) -> u8 {
        debug_assert!(col < NOTE_COLUMNS);
        self.notes[col * self.rows + row]
    }

    pub fn set_note(&mut self, col: usize, row: usize, note: u8) {
        debug_assert!(col < NOTE_COLUMNS);
        self.notes[col * self.rows + row] = note;
    }

    /// Raw command id at a row (0 = none, otherwise param index + 1).
    pub fn command_id(&self, row: usize) -> u8 {
        self.commands[row]
    }

    pub fn command_value(&self, row: usize) -> u8 {
        self.values[row]
    }

    /// Decoded effect command at a row. Ids that address no parameter yield `None`.
    pub fn effect(&self, row: usize) -> Option<EffectCommand> {
        Param::from_command(self.commands[row]).map(|param| EffectCommand {
            param,
            value: self.values[row],
        })
    }

    /// Store a raw command id and value.
    pub fn set_command(&mut self, row: usize, command_id: u8, value: u8) {
        self.commands[row] = command_id;
        self.values[row] = value;
    }

    pub fn set_effect(&mut self, row: usize, effect: Option<EffectCommand>) {
        match effect {
            Some(cmd) => self.set_command(row, cmd.param.command(), cmd.value),
            None => self.set_command(row, 0, 0),
        }
    }

    /// Raw note bytes, column-major.
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [u8] {
        &mut self.notes
    }

    /// Raw command-id plane.
    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut [u8] {
        &mut self.commands
    }

    /// Raw value plane.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [u8] {
        &mut self.values
    }

    /// True if the pattern holds no notes and no commands.
    pub fn is_empty(&self) -> bool {
        self.notes.iter().all(|&n| n == 0) && self.commands.iter().all(|&c| c == 0)
    }

    /// Return a copy with `rows` rows, keeping the overlapping rows.
    pub fn resized(&self, rows: usize) -> Pattern {
        let mut out = Pattern::new(rows);
        let keep = self.rows.min(rows);
        for row in 0..keep {
            for col in 0..NOTE_COLUMNS {
                out.set_note(col, row, self.note(col, row));
            }
            out.set_command(row, self.commands[row], self.values[row]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_layout_is_column_major() {
        let mut pattern = Pattern::new(16);
        pattern.set_note(2, 5, 140);
        assert_eq!(pattern.notes()[2 * 16 + 5], 140);
        assert_eq!(pattern.note(2, 5), 140);
        assert_eq!(pattern.note(1, 5), 0);
    }

    #[test]
    fn effect_decodes_command_id() {
        let mut pattern = Pattern::new(8);
        pattern.set_effect(
            3,
            Some(EffectCommand {
                param: Param::FxFreq,
                value: 99,
            }),
        );
        assert_eq!(pattern.command_id(3), 22);
        assert_eq!(
            pattern.effect(3),
            Some(EffectCommand {
                param: Param::FxFreq,
                value: 99
            })
        );
        assert_eq!(pattern.effect(2), None);

        pattern.set_command(4, 200, 1);
        assert_eq!(pattern.effect(4), None);
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut pattern = Pattern::new(4);
        pattern.set_note(0, 0, 120);
        pattern.set_note(3, 3, 130);
        pattern.set_command(1, 5, 77);

        let shorter = pattern.resized(2);
        assert_eq!(shorter.rows(), 2);
        assert_eq!(shorter.note(0, 0), 120);
        assert_eq!(shorter.command_value(1), 77);

        let longer = pattern.resized(8);
        assert_eq!(longer.note(3, 3), 130);
        assert_eq!(longer.note(3, 7), 0);
        assert!(!longer.is_empty());
        assert!(Pattern::new(3).is_empty());
    }
}
