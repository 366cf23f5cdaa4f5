//! Instrument parameter vector.
//!
//! Every channel owns one [`Instrument`]: 29 byte-sized synthesis and effect
//! settings. Effect commands in patterns address these fields by index
//! (`command id - 1`), so the order of [`Param`] is part of the file format.

use arrayvec::ArrayVec;

/// Number of fields in the parameter vector.
pub const NUM_PARAMS: usize = 29;

/// A named field of the parameter vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Param {
    Osc1Waveform = 0,
    Osc1Volume,
    Osc1Semi,
    Osc1Xenv,
    Osc2Waveform,
    Osc2Volume,
    Osc2Semi,
    Osc2Detune,
    Osc2Xenv,
    NoiseVolume,
    EnvAttack,
    EnvSustain,
    EnvRelease,
    EnvExpDecay,
    ArpChord,
    ArpSpeed,
    LfoWaveform,
    LfoAmt,
    LfoFreq,
    LfoFxFreq,
    FxFilter,
    FxFreq,
    FxResonance,
    FxDist,
    FxDrive,
    FxPanAmt,
    FxPanFreq,
    FxDelayAmt,
    FxDelayTime,
}

impl Param {
    /// All parameters in vector order.
    pub const ALL: [Param; NUM_PARAMS] = [
        Param::Osc1Waveform,
        Param::Osc1Volume,
        Param::Osc1Semi,
        Param::Osc1Xenv,
        Param::Osc2Waveform,
        Param::Osc2Volume,
        Param::Osc2Semi,
        Param::Osc2Detune,
        Param::Osc2Xenv,
        Param::NoiseVolume,
        Param::EnvAttack,
        Param::EnvSustain,
        Param::EnvRelease,
        Param::EnvExpDecay,
        Param::ArpChord,
        Param::ArpSpeed,
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
    ];

    /// Position of this field in the vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a parameter by vector index.
    pub fn from_index(index: usize) -> Option<Param> {
        Self::ALL.get(index).copied()
    }

    /// Look up a parameter by effect command id (`index + 1`, 0 = no command).
    pub fn from_command(command: u8) -> Option<Param> {
        (command as usize).checked_sub(1).and_then(Self::from_index)
    }

    /// Effect command id that writes this parameter.
    pub const fn command(self) -> u8 {
        self as u8 + 1
    }

    /// True for fields that shape the rendered note itself (oscillators,
    /// noise, envelope, arpeggio). Changing one of these invalidates any
    /// cached note waveform; the remaining fields are applied per sample
    /// in the effects pass.
    pub const fn is_tonal(self) -> bool {
        (self as u8) <= Param::ArpSpeed as u8
    }

    /// Short upper-case name, as shown in effect columns.
    pub const fn name(self) -> &'static str {
        match self {
            Param::Osc1Waveform => "OSC1_WAVEFORM",
            Param::Osc1Volume => "OSC1_VOL",
            Param::Osc1Semi => "OSC1_SEMI",
            Param::Osc1Xenv => "OSC1_XENV",
            Param::Osc2Waveform => "OSC2_WAVEFORM",
            Param::Osc2Volume => "OSC2_VOL",
            Param::Osc2Semi => "OSC2_SEMI",
            Param::Osc2Detune => "OSC2_DETUNE",
            Param::Osc2Xenv => "OSC2_XENV",
            Param::NoiseVolume => "NOISE_VOL",
            Param::EnvAttack => "ENV_ATTACK",
            Param::EnvSustain => "ENV_SUSTAIN",
            Param::EnvRelease => "ENV_RELEASE",
            Param::EnvExpDecay => "ENV_EXP_DECAY",
            Param::ArpChord => "ARP_CHORD",
            Param::ArpSpeed => "ARP_SPEED",
            Param::LfoWaveform => "LFO_WAVEFORM",
            Param::LfoAmt => "LFO_AMT",
            Param::LfoFreq => "LFO_FREQ",
            Param::LfoFxFreq => "LFO_FX_FREQ",
            Param::FxFilter => "FX_FILTER",
            Param::FxFreq => "FX_FREQ",
            Param::FxResonance => "FX_RESONANCE",
            Param::FxDist => "FX_DIST",
            Param::FxDrive => "FX_DRIVE",
            Param::FxPanAmt => "FX_PAN_AMT",
            Param::FxPanFreq => "FX_PAN_FREQ",
            Param::FxDelayAmt => "FX_DELAY_AMT",
            Param::FxDelayTime => "FX_DELAY_TIME",
        }
    }
}

/// Oscillator / LFO waveform selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// Decode a waveform byte. Unknown codes play as sine.
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Waveform::Square,
            2 => Waveform::Saw,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Saw => 2,
            Waveform::Triangle => 3,
        }
    }
}

/// Which tap of the state-variable filter feeds the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterType {
    HighPass,
    #[default]
    LowPass,
    BandPass,
}

impl FilterType {
    /// Decode a filter byte: 1 = high-pass, 3 = band-pass, anything else low-pass.
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => FilterType::HighPass,
            3 => FilterType::BandPass,
            _ => FilterType::LowPass,
        }
    }
}

/// An instrument: the full parameter vector of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instrument {
    values: [u8; NUM_PARAMS],
}

impl Default for Instrument {
    fn default() -> Self {
        crate::presets::default_instrument()
    }
}

impl Instrument {
    /// Build an instrument from a raw vector in [`Param`] order.
    pub const fn from_values(values: [u8; NUM_PARAMS]) -> Self {
        Self { values }
    }

    /// An instrument with every field zero (silent).
    pub const fn zeroed() -> Self {
        Self { values: [0; NUM_PARAMS] }
    }

    pub fn values(&self) -> &[u8; NUM_PARAMS] {
        &self.values
    }

    pub fn get(&self, param: Param) -> u8 {
        self.values[param.index()]
    }

    pub fn set(&mut self, param: Param, value: u8) {
        self.values[param.index()] = value;
    }

    /// Write a field by raw vector index (effect command dispatch).
    /// Returns false and leaves the vector untouched for an unknown index.
    pub fn set_by_index(&mut self, index: usize, value: u8) -> bool {
        match Param::from_index(index) {
            Some(param) => {
                self.set(param, value);
                true
            }
            None => false,
        }
    }

    /// Fields whose value differs from `other`, in vector order.
    pub fn changed_params(&self, other: &Instrument) -> ArrayVec<Param, NUM_PARAMS> {
        Param::ALL
            .iter()
            .copied()
            .filter(|p| self.get(*p) != other.get(*p))
            .collect()
    }

    pub fn osc1_waveform(&self) -> Waveform {
        Waveform::from_code(self.get(Param::Osc1Waveform))
    }

    pub fn osc2_waveform(&self) -> Waveform {
        Waveform::from_code(self.get(Param::Osc2Waveform))
    }

    pub fn lfo_waveform(&self) -> Waveform {
        Waveform::from_code(self.get(Param::LfoWaveform))
    }

    pub fn filter_type(&self) -> FilterType {
        FilterType::from_code(self.get(Param::FxFilter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_order_matches_vector_layout() {
        for (i, p) in Param::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
            assert_eq!(Param::from_index(i), Some(*p));
        }
        assert_eq!(Param::FxDelayTime.index(), NUM_PARAMS - 1);
    }

    #[test]
    fn command_ids_are_one_based() {
        assert_eq!(Param::from_command(0), None);
        assert_eq!(Param::from_command(1), Some(Param::Osc1Waveform));
        assert_eq!(Param::from_command(29), Some(Param::FxDelayTime));
        assert_eq!(Param::from_command(30), None);
        assert_eq!(Param::FxFreq.command(), 22);
    }

    #[test]
    fn tonal_boundary_is_command_seventeen() {
        for p in Param::ALL {
            assert_eq!(p.is_tonal(), p.command() < 17, "{:?}", p);
        }
        assert!(Param::ArpSpeed.is_tonal());
        assert!(!Param::LfoWaveform.is_tonal());
    }

    #[test]
    fn set_by_index_ignores_out_of_range() {
        let mut inst = Instrument::zeroed();
        assert!(inst.set_by_index(21, 200));
        assert_eq!(inst.get(Param::FxFreq), 200);
        assert!(!inst.set_by_index(NUM_PARAMS, 1));
        assert_eq!(inst, {
            let mut expected = Instrument::zeroed();
            expected.set(Param::FxFreq, 200);
            expected
        });
    }

    #[test]
    fn changed_params_lists_differing_fields() {
        let a = Instrument::zeroed();
        let mut b = a;
        assert!(a.changed_params(&b).is_empty());
        b.set(Param::Osc1Volume, 10);
        b.set(Param::FxDrive, 32);
        assert_eq!(
            b.changed_params(&a).as_slice(),
            &[Param::Osc1Volume, Param::FxDrive]
        );
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(Waveform::from_code(7), Waveform::Sine);
        assert_eq!(FilterType::from_code(0), FilterType::LowPass);
        assert_eq!(FilterType::from_code(2), FilterType::LowPass);
        assert_eq!(FilterType::from_code(1), FilterType::HighPass);
        assert_eq!(FilterType::from_code(3), FilterType::BandPass);
    }
}
