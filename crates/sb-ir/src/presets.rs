//! Factory instrument presets.

use crate::instrument::Instrument;

/// Grouping shown in the preset picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetCategory {
    Lead,
    Pad,
    Drum,
    Fx,
}

impl PresetCategory {
    pub const fn label(self) -> &'static str {
        match self {
            PresetCategory::Lead => "Leads",
            PresetCategory::Pad => "Pads",
            PresetCategory::Drum => "Drums",
            PresetCategory::Fx => "F/X",
        }
    }
}

/// A named instrument.
#[derive(Clone, Copy, Debug)]
pub struct Preset {
    pub name: &'static str,
    pub category: PresetCategory,
    pub instrument: Instrument,
}

/// The factory presets, in picker order.
pub static PRESETS: &[Preset] = &[
    Preset {
        name: "Softy",
        category: PresetCategory::Lead,
        instrument: Instrument::from_values([
            2, 100, 128, 0, 3, 201, 128, 0, 0, 0, 5, 6, 58, 0, 0, 0, 0, 195, 6, 1, 2, 135, 0, 0, 32, 147, 6, 121, 6
        ]),
    },
    Preset {
        name: "Classic 8-bit",
        category: PresetCategory::Lead,
        instrument: Instrument::from_values([
            1, 192, 128, 0, 1, 191, 116, 9, 0, 0, 6, 22, 34, 0, 0, 0, 0, 69, 3, 1, 1, 23, 167, 0, 32, 77, 6, 25, 6
        ]),
    },
    Preset {
        name: "Square",
        category: PresetCategory::Lead,
        instrument: Instrument::from_values([
            1, 255, 128, 0, 1, 154, 128, 9, 0, 0, 7, 5, 52, 0, 0, 0, 0, 0, 0, 0, 2, 255, 0, 0, 32, 47, 3, 146, 2
        ]),
    },
    Preset {
        name: "Bell",
        category: PresetCategory::Lead,
        instrument: Instrument::from_values([
            0, 255, 152, 0, 0, 255, 152, 12, 0, 0, 2, 0, 60, 0, 0, 0, 0, 0, 0, 0, 2, 255, 0, 0, 32, 47, 3, 157, 2
        ]),
    },
    Preset {
        name: "Filter Bass 1",
        category: PresetCategory::Lead,
        instrument: Instrument::from_values([
            2, 100, 128, 0, 3, 201, 128, 0, 0, 0, 0, 6, 29, 0, 0, 0, 0, 195, 4, 1, 3, 50, 184, 119, 244, 147, 6, 84, 6
        ]),
    },
    Preset {
        name: "Base string",
        category: PresetCategory::Pad,
        instrument: Instrument::from_values([
            2, 192, 128, 0, 2, 192, 140, 18, 0, 0, 158, 119, 158, 0, 0, 0, 0, 0, 0, 0, 2, 5, 0, 0, 32, 0, 0, 24, 8
        ]),
    },
    Preset {
        name: "Base string (dist)",
        category: PresetCategory::Pad,
        instrument: Instrument::from_values([
            2, 192, 128, 0, 2, 192, 140, 18, 0, 0, 107, 115, 138, 0, 0, 0, 0, 136, 5, 1, 2, 8, 92, 21, 32, 148, 5, 85, 8
        ]),
    },
    Preset {
        name: "Evil brass",
        category: PresetCategory::Pad,
        instrument: Instrument::from_values([
            3, 146, 140, 0, 1, 224, 128, 3, 0, 0, 92, 0, 95, 0, 0, 0, 3, 179, 5, 1, 2, 124, 135, 11, 32, 150, 3, 157, 6
        ]),
    },
    Preset {
        name: "Stars",
        category: PresetCategory::Pad,
        instrument: Instrument::from_values([
            2, 138, 116, 0, 2, 138, 128, 4, 0, 0, 47, 48, 107, 0, 124, 3, 0, 139, 4, 1, 3, 64, 160, 3, 32, 147, 4, 121, 5
        ]),
    },
    Preset {
        name: "Bass drum 1",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 255, 116, 64, 0, 255, 116, 0, 64, 0, 4, 6, 35, 0, 0, 0, 0, 0, 0, 0, 2, 14, 0, 0, 32, 0, 0, 0, 0
        ]),
    },
    Preset {
        name: "Bass drum 2",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 255, 117, 64, 0, 255, 110, 0, 64, 0, 4, 6, 35, 0, 0, 0, 0, 0, 0, 0, 2, 14, 0, 1, 39, 76, 5, 0, 0
        ]),
    },
    Preset {
        name: "Bass drum 3",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 255, 116, 64, 0, 255, 116, 0, 64, 14, 4, 6, 45, 0, 0, 0, 0, 0, 0, 0, 2, 136, 15, 0, 32, 0, 0, 66, 6
        ]),
    },
    Preset {
        name: "Base tom",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 192, 104, 64, 0, 80, 99, 0, 0, 0, 4, 0, 66, 0, 0, 0, 3, 0, 0, 0, 1, 0, 1, 2, 32, 37, 4, 0, 0
        ]),
    },
    Preset {
        name: "Snare 1",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 160, 128, 64, 0, 160, 128, 0, 64, 210, 4, 7, 41, 0, 0, 0, 0, 60, 4, 1, 2, 255, 0, 0, 32, 61, 5, 32, 6
        ]),
    },
    Preset {
        name: "Snare 2",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 221, 128, 64, 0, 210, 128, 0, 64, 255, 4, 6, 62, 0, 0, 0, 0, 64, 7, 1, 3, 255, 15, 0, 32, 20, 0, 24, 6
        ]),
    },
    Preset {
        name: "Snare 3",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            3, 0, 128, 0, 3, 68, 128, 0, 64, 218, 4, 4, 40, 0, 0, 0, 1, 55, 4, 1, 2, 67, 115, 124, 190, 67, 6, 39, 1
        ]),
    },
    Preset {
        name: "Hihat 1",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 0, 140, 0, 0, 0, 140, 0, 0, 60, 4, 10, 34, 0, 0, 0, 0, 187, 5, 0, 1, 239, 135, 0, 32, 108, 5, 16, 4
        ]),
    },
    Preset {
        name: "Hihat 2",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            2, 40, 140, 64, 0, 0, 140, 0, 0, 255, 5, 0, 48, 0, 0, 0, 0, 0, 0, 0, 3, 161, 192, 0, 32, 0, 0, 71, 1
        ]),
    },
    Preset {
        name: "Open hihat",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 0, 128, 0, 0, 0, 128, 0, 0, 125, 0, 1, 59, 0, 0, 0, 0, 0, 0, 0, 1, 193, 171, 0, 29, 39, 3, 88, 3
        ]),
    },
    Preset {
        name: "Smash",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            0, 214, 104, 64, 0, 204, 104, 0, 64, 229, 4, 40, 21, 0, 0, 0, 0, 231, 6, 1, 3, 183, 15, 0, 32, 232, 4, 74, 6
        ]),
    },
    Preset {
        name: "Pipe hit",
        category: PresetCategory::Drum,
        instrument: Instrument::from_values([
            3, 255, 128, 0, 0, 255, 140, 0, 0, 127, 2, 2, 23, 0, 0, 0, 0, 96, 3, 1, 3, 94, 79, 0, 32, 84, 2, 12, 4
        ]),
    },
    Preset {
        name: "Wind",
        category: PresetCategory::Fx,
        instrument: Instrument::from_values([
            0, 0, 140, 0, 0, 0, 140, 0, 0, 255, 158, 158, 158, 0, 0, 0, 0, 51, 2, 1, 2, 58, 239, 0, 32, 88, 1, 157, 2
        ]),
    },
    Preset {
        name: "Long beat",
        category: PresetCategory::Fx,
        instrument: Instrument::from_values([
            0, 255, 106, 64, 0, 255, 106, 0, 64, 0, 5, 7, 164, 0, 0, 0, 0, 0, 0, 0, 2, 255, 0, 2, 32, 83, 5, 25, 1
        ]),
    },
    Preset {
        name: "Siren",
        category: PresetCategory::Fx,
        instrument: Instrument::from_values([
            1, 0, 128, 0, 1, 0, 128, 0, 0, 255, 158, 100, 158, 0, 0, 0, 3, 67, 4, 1, 3, 57, 254, 85, 171, 88, 1, 157, 2
        ]),
    },
];

/// The instrument new channels start with ("Softy").
pub fn default_instrument() -> Instrument {
    PRESETS[0].instrument
}

/// Find a preset by case-insensitive name.
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
