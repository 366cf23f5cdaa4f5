//! Allocation-free realtime path tests.
//!
//! These tests verify that `Jammer::render()` and command handling do not
//! allocate once the jammer is built. They play several presets for a few
//! seconds with voice stealing, tempo changes and clears mixed in.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::assert_no_alloc;

#[cfg(all(debug_assertions, not(feature = "alloc_check")))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

use sb_engine::{Frame, JamCommand, Jammer, JammerConfig, MAX_POLYPHONY};
use sb_ir::presets::{self, PRESETS};

/// Play `commands` interleaved with `duration_frames` of rendering,
/// aborting on any heap allocation.
fn assert_jam_alloc_free(config: JammerConfig, commands: &[JamCommand], duration_frames: usize) {
    let mut jammer = Jammer::new(config);
    let mut out = vec![Frame::silence(); 512];
    let blocks = duration_frames / out.len();

    assert_no_alloc(|| {
        for block in 0..blocks {
            if block % 4 == 0 {
                if let Some(cmd) = commands.get(block / 4) {
                    jammer.apply(*cmd);
                }
            }
            jammer.render(&mut out);
        }
    });
}

#[test]
fn lead_chords_alloc_free() {
    let lead = presets::find("Evil brass").unwrap().instrument;
    let mut commands = vec![JamCommand::SetInstrument(lead)];
    commands.extend((0..(MAX_POLYPHONY as u8 + 4)).map(|i| JamCommand::NoteOn(135 + i)));
    assert_jam_alloc_free(JammerConfig::default(), &commands, 44100 * 3);
}

#[test]
fn every_preset_alloc_free() {
    let mut commands = Vec::new();
    for preset in PRESETS {
        commands.push(JamCommand::SetInstrument(preset.instrument));
        commands.push(JamCommand::NoteOn(147));
        commands.push(JamCommand::SetRowLen(3000));
        commands.push(JamCommand::Clear);
    }
    assert_jam_alloc_free(JammerConfig::default(), &commands, 44100 * 5);
}

#[test]
fn resampled_device_rate_alloc_free() {
    let config = JammerConfig {
        sample_rate: 48000,
        ..JammerConfig::default()
    };
    let pad = presets::find("Stars").unwrap().instrument;
    let commands = [JamCommand::SetInstrument(pad), JamCommand::NoteOn(140), JamCommand::NoteOn(144)];
    assert_jam_alloc_free(config, &commands, 48000 * 3);
}
