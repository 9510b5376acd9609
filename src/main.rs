// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use pcmix::audio::{
    self, decoder::DecoderFactory, wav::write_wav_file, waveform::Waveform, AudioEngine,
    SampleProvider, VoiceHandle,
};
use pcmix::config;
use pcmix::util::{duration_minutes_seconds, filename_display, frames_to_duration};
use tracing::info;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A PCM voice mixer."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Prints the format of an audio file.
    Info {
        /// The file to inspect.
        file: PathBuf,
    },
    /// Decodes an audio file to a 16-bit WAV file at the output sample rate.
    Decode {
        /// The file to decode.
        input: PathBuf,
        /// The WAV file to write.
        output: PathBuf,
    },
    /// Prints the waveform peaks of an audio file.
    Waveform {
        /// The file to sample.
        file: PathBuf,
        /// The number of pixels to print.
        #[arg(short, long, default_value_t = 80)]
        width: usize,
        /// The time covered by one pixel in milliseconds.
        #[arg(short, long, default_value_t = 10)]
        scale_ms: u64,
        /// The channel to sample.
        #[arg(short, long, default_value_t = 0)]
        channel: u32,
    },
    /// Plays one or more files together until they finish.
    Play {
        /// The files to play.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// The engine config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// The device to play through. Overrides the config file.
        #[arg(short, long)]
        device: Option<String>,
        /// The master volume between 0 and 1.
        #[arg(short, long)]
        volume: Option<f32>,
        /// How many times to play the files.
        #[arg(short, long, default_value_t = 1)]
        loop_count: u32,
        /// Captures the mixed output to this WAV file.
        #[arg(long)]
        capture: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Info { file } => {
            let bytes = std::fs::read(&file)?;
            let factory = DecoderFactory::new();
            let name = file.to_string_lossy();
            let decoder = factory
                .find_decoder(&name)
                .ok_or_else(|| format!("no decoder for {}", filename_display(&file)))?
                .name();
            let output = factory.decode_bytes(&name, &bytes)?;
            let duration = frames_to_duration(output.frame_count() as i64, output.sample_rate);

            println!("{}:", filename_display(&file));
            println!("- decoder: {}", decoder);
            println!("- channels: {}", output.channel_count);
            println!("- sample rate: {}", output.sample_rate);
            println!("- frames: {}", output.frame_count());
            println!("- duration: {}", duration_minutes_seconds(duration));
        }
        Commands::Decode { input, output } => {
            let provider = DecoderFactory::new().load(&input)?;
            write_wav_file(
                &output,
                provider.samples(),
                provider.sample_rate(),
                provider.channel_count(),
            )?;
            println!(
                "Wrote {} frames to {}",
                provider.frame_count(),
                output.display()
            );
        }
        Commands::Waveform {
            file,
            width,
            scale_ms,
            channel,
        } => {
            let provider = DecoderFactory::new().load(&file)?;
            if channel >= provider.channel_count() {
                return Err(format!(
                    "channel {} out of range, {} has {} channels",
                    channel,
                    filename_display(&file),
                    provider.channel_count()
                )
                .into());
            }

            let mut waveform = Waveform::new();
            waveform.set_source(std::sync::Arc::new(provider));
            waveform.set_scale(Duration::from_millis(scale_ms));
            let width = width.min(waveform.pixel_count());
            for peak in waveform.peaks(channel, width) {
                let bar = (peak * 60.0).round() as usize;
                println!("{:>6.3} {}", peak, "#".repeat(bar));
            }
        }
        Commands::Play {
            files,
            config,
            device,
            volume,
            loop_count,
            capture,
        } => {
            let mut engine_config = match &config {
                Some(path) => config::Engine::deserialize(path)?,
                None => config::Engine::default(),
            };
            if let Some(device) = &device {
                engine_config.set_device(device);
            }

            let engine = AudioEngine::from_config(&engine_config)?;
            if let Some(volume) = volume {
                engine.set_master_volume(volume);
            }
            if capture.is_some() {
                engine.debug_set_output_capture_enabled(true);
            }

            let voices = load_voices(&engine, &files)?;
            engine.ensure_stream_running()?;
            for iteration in 0..loop_count.max(1) {
                info!(iteration, voices = voices.len(), "Playing");
                for handle in &voices {
                    let voice = engine.voice(*handle);
                    voice.set_frame_position(0);
                    voice.set_playing(true);
                }
                while !engine.all_voices_are_idle() {
                    thread::sleep(IDLE_POLL_INTERVAL);
                }
            }
            engine.stop_stream()?;

            if let Some(path) = &capture {
                engine.debug_flush_capture_to_wav_file(path)?;
            }
        }
    }

    Ok(())
}

/// Loads each file and adds a paused voice for it.
fn load_voices(
    engine: &AudioEngine,
    files: &[PathBuf],
) -> Result<Vec<VoiceHandle>, Box<dyn Error>> {
    let mut voices = Vec::with_capacity(files.len());
    for file in files {
        let source = engine.load_source(file);
        if !source.is_valid() {
            return Err(format!("unable to load {}", filename_display(file)).into());
        }
        let handle = engine.add_voice(source, &voice_name(file), false, 1.0, false);
        if !handle.is_valid() {
            return Err("too many files to play at once".into());
        }
        voices.push(handle);
    }
    Ok(voices)
}

fn voice_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
