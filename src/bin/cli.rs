//! SoundBox CLI: inspect, render, convert and play songs.
//!
//! Usage:
//!   sb-cli info song.sbx
//!   sb-cli render song.sbx -o song.wav
//!   sb-cli convert old.snt -o new.sbx
//!   sb-cli preview "Evil brass" --note 140 -o brass.wav

use clap::{Parser, Subcommand};
use sb_engine::{Frame, Jammer, JammerConfig, RenderOptions};
use sb_ir::{presets, Param, RenderRange, Song, NOTE_A4, SAMPLE_RATE};
use sb_master::{CompressionPolicy, Controller};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, process};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

/// SoundBox song tool
#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print song properties and instruments
    Info {
        /// Song file (SBox or Sonant)
        input: PathBuf,
    },

    /// Render a song (or part of it) to WAV
    Render {
        input: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        range: RangeArgs,

        /// Noise and dither seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Re-save a song in the current format
    Convert {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Compression to try
        #[arg(long, default_value = "auto", value_parser = ["auto", "rle", "none"])]
        compression: String,
    },

    /// Print a shareable link for a song, or decode one back into a file
    Link {
        /// Song file to encode
        input: Option<PathBuf>,

        /// Link or data URI to decode
        #[arg(long, conflicts_with = "input")]
        decode: Option<String>,

        /// Where to write a decoded song
        #[arg(short, long, requires = "decode")]
        output: Option<PathBuf>,
    },

    /// Render one note of an instrument to WAV
    Preview {
        /// Preset name or index
        preset: String,

        /// Note code (144 = A4)
        #[arg(long, default_value_t = NOTE_A4)]
        note: u8,

        /// Row length in samples (sets arpeggio and LFO speed)
        #[arg(long, default_value_t = 5513)]
        row_len: u32,

        /// Length of the rendered clip in seconds
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the factory presets
    Presets,

    /// Play a song on the default audio device
    Play {
        input: PathBuf,

        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// First sequence row
    #[arg(long)]
    first_row: Option<usize>,

    /// Last sequence row (inclusive)
    #[arg(long)]
    last_row: Option<usize>,

    /// First channel
    #[arg(long)]
    first_channel: Option<usize>,

    /// Last channel (inclusive)
    #[arg(long)]
    last_channel: Option<usize>,
}

impl RangeArgs {
    /// `None` when no bound is given, so the whole song renders.
    fn to_range(&self, song: &Song) -> Option<RenderRange> {
        if self.first_row.is_none()
            && self.last_row.is_none()
            && self.first_channel.is_none()
            && self.last_channel.is_none()
        {
            return None;
        }
        let full = song.default_range();
        Some(RenderRange {
            first_row: self.first_row.unwrap_or(full.first_row),
            last_row: self.last_row.unwrap_or(full.last_row),
            first_col: self.first_channel.unwrap_or(full.first_col),
            last_col: self.last_channel.unwrap_or(full.last_col),
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Info { input } => info_cmd(&input),
        Commands::Render { input, output, range, seed } => render_cmd(&input, &output, &range, seed),
        Commands::Convert { input, output, compression } => convert_cmd(&input, &output, &compression),
        Commands::Link { input, decode, output } => link_cmd(input.as_deref(), decode.as_deref(), output.as_deref()),
        Commands::Preview { preset, note, row_len, seconds, output } => {
            preview_cmd(&preset, note, row_len, seconds, &output)
        }
        Commands::Presets => {
            presets_cmd();
            Ok(())
        }
        Commands::Play { input, range } => play_cmd(&input, &range),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load(path: &Path) -> Result<Controller, Box<dyn Error>> {
    let data = fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let mut ctrl = Controller::new();
    ctrl.load(&data)?;
    Ok(ctrl)
}

fn write(path: &Path, bytes: &[u8]) -> CliResult {
    fs::write(path, bytes).map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
    Ok(())
}

fn info_cmd(path: &Path) -> CliResult {
    let ctrl = load(path)?;
    let song = ctrl.song();
    let range = song.default_range();
    let seconds = song.frames_in_range(&range) as f64 / SAMPLE_RATE as f64;

    println!("Tempo:    {} BPM (row length {})", song.bpm(), song.row_len);
    println!("Rows:     {} per pattern", song.pattern_len);
    println!("Sequence: {} rows", song.end_pattern + 1);
    println!("Channels: {}", song.num_channels);
    println!("Length:   {:.1} s", seconds);
    println!();

    for (i, channel) in song.active_channels().iter().enumerate() {
        let inst = &channel.instrument;
        let name = presets::PRESETS
            .iter()
            .find(|p| p.instrument == *inst)
            .map_or("custom", |p| p.name);
        let used = channel.patterns.iter().filter(|p| !p.is_empty()).count();
        println!(
            "{:2}: {:<20} osc {:?}/{:?}  filter {:?} @ {:3}  delay {:3}x{}  patterns {}",
            i,
            name,
            inst.osc1_waveform(),
            inst.osc2_waveform(),
            inst.filter_type(),
            inst.get(Param::FxFreq),
            inst.get(Param::FxDelayAmt),
            inst.get(Param::FxDelayTime),
            used,
        );
    }
    Ok(())
}

fn render_cmd(input: &Path, output: &Path, range: &RangeArgs, seed: Option<u64>) -> CliResult {
    let ctrl = load(input)?;
    let options = RenderOptions {
        range: range.to_range(ctrl.song()),
        seed: seed.unwrap_or(sb_master::DEFAULT_SEED),
    };

    let job = ctrl.start_render(options);
    while !job.is_finished() {
        print!("\rRendering... {:3.0}%", job.progress() * 100.0);
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(50));
    }
    println!("\rRendering... 100%");

    let mix = job.wait().ok_or("render thread panicked")?;
    if mix.frames() == 0 {
        return Err("empty render range".into());
    }
    let wav = sb_formats::mix_to_wav(&mix, SAMPLE_RATE);
    write(output, &wav)?;
    info!(frames = mix.frames(), peak = mix.peak(), path = %output.display(), "wrote WAV");
    Ok(())
}

fn convert_cmd(input: &Path, output: &Path, compression: &str) -> CliResult {
    let mut ctrl = load(input)?;
    let policy = match compression {
        "rle" => CompressionPolicy { deflate_levels: Vec::new(), allow_rle: true },
        "none" => CompressionPolicy::none(),
        _ => CompressionPolicy::default(),
    };
    let bytes = ctrl.save(&policy);
    write(output, &bytes)?;
    println!("Wrote {} bytes", bytes.len());
    Ok(())
}

fn link_cmd(input: Option<&Path>, decode: Option<&str>, output: Option<&Path>) -> CliResult {
    match (input, decode) {
        (Some(path), _) => {
            println!("{}", load(path)?.link());
            Ok(())
        }
        (None, Some(link)) => {
            let bytes = sb_formats::link_to_song_bytes(link)?;
            let song = sb_formats::load_song(&bytes)?;
            println!("{} BPM, {} channels, {} sequence rows", song.bpm(), song.num_channels, song.end_pattern + 1);
            match output {
                Some(path) => write(path, &bytes),
                None => Ok(()),
            }
        }
        (None, None) => Err("give a song file or --decode <link>".into()),
    }
}

fn find_preset(key: &str) -> Option<&'static presets::Preset> {
    match key.parse::<usize>() {
        Ok(index) => presets::PRESETS.get(index),
        Err(_) => presets::find(key),
    }
}

fn preview_cmd(preset: &str, note: u8, row_len: u32, seconds: f32, output: &Path) -> CliResult {
    let preset = find_preset(preset).ok_or_else(|| format!("unknown preset '{}'", preset))?;

    let mut jammer = Jammer::new(JammerConfig {
        sample_rate: SAMPLE_RATE,
        row_len,
        ..JammerConfig::default()
    });
    jammer.set_instrument(&preset.instrument);
    jammer.note_on(note);

    let frames = (seconds.max(0.0) * SAMPLE_RATE as f32) as usize;
    let mut out = vec![Frame::silence(); frames];
    jammer.render(&mut out);

    write(output, &sb_formats::frames_to_wav(&out, SAMPLE_RATE))?;
    println!("{}: note {} -> {}", preset.name, note, output.display());
    Ok(())
}

fn presets_cmd() {
    let mut category = None;
    for (i, preset) in presets::PRESETS.iter().enumerate() {
        if category != Some(preset.category) {
            category = Some(preset.category);
            println!("{}", preset.category.label());
        }
        println!("  {:2}  {}", i, preset.name);
    }
}

fn play_cmd(input: &Path, range: &RangeArgs) -> CliResult {
    let mut ctrl = load(input)?;
    let options = RenderOptions {
        range: range.to_range(ctrl.song()),
        ..RenderOptions::default()
    };
    ctrl.play(options);
    println!("Playing...");

    while !ctrl.is_finished() {
        if let Some(pos) = ctrl.position() {
            print!("\rRow: {:03} | Step: {:02}", pos.song_row, pos.pattern_row);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    println!("\rDone.              ");
    Ok(())
}
