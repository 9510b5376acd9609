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
use std::{any::Any, fmt, sync::Arc};

pub mod channel_mixer;
pub mod cpal;
pub mod decoder;
pub mod engine;
pub mod interpolation;
pub mod mock;
pub mod resample;
pub mod sample_mixer;
pub mod sample_provider;
pub mod stream;
pub mod thread_priority;
pub mod waveform;
pub mod wav;

pub use channel_mixer::{ChannelMixer, MixingBehavior};
pub use engine::{AudioEngine, SourceHandle, VoiceHandle};
pub use interpolation::Interpolation;
pub use resample::ResampleQuality;
pub use sample_provider::{MemorySampleProvider, SampleProvider};
pub use stream::{OutputStream, Renderer, StreamConfig, StreamMode};

/// The engine mixes to a fixed stereo layout.
pub const OUTPUT_CHANNEL_COUNT: u32 = 2;
/// The engine mixes at a fixed rate; decoders resample to it.
pub const OUTPUT_SAMPLE_RATE: u32 = 44100;

pub const MAX_SIMULTANEOUS_VOICES: usize = 64;

pub const DEFAULT_BUFFER_FRAME_COUNT: usize = 64;
pub const MIN_BUFFER_FRAME_COUNT: usize = 4;
pub const MAX_BUFFER_FRAME_COUNT: usize = 1024;

pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;

pub const CALLBACK_DURATION_RING_BUFFER_SIZE: usize = 64;
pub const LAST_PLAYED_SAMPLES_RING_FRAME_COUNT: usize = 2048;

/// Error for enumerated settings that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported {kind}: {value}")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

impl ParseSettingError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Errors raised by output backends.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no device found with name {0}")]
    NoDevice(String),

    #[error("unsupported device sample format {0}")]
    UnsupportedSampleFormat(String),

    #[error("failed to open mock stream on {0}")]
    MockOpenFailed(String),

    #[error("stream thread exited")]
    StreamThreadGone,

    #[error("failed to build stream: {0}")]
    BuildStream(#[from] ::cpal::BuildStreamError),

    #[error("failed to play stream: {0}")]
    PlayStream(#[from] ::cpal::PlayStreamError),

    #[error("failed to pause stream: {0}")]
    PauseStream(#[from] ::cpal::PauseStreamError),

    #[error("unable to query default output config: {0}")]
    DefaultConfig(#[from] ::cpal::DefaultStreamConfigError),

    #[error("unable to enumerate devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("unable to read device name: {0}")]
    DeviceName(#[from] ::cpal::DeviceNameError),

    #[error("unable to query supported configs: {0}")]
    SupportedConfigs(#[from] ::cpal::SupportedStreamConfigsError),

    #[error("host unavailable: {0}")]
    HostUnavailable(#[from] ::cpal::HostUnavailable),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// An output device the engine can open streams on.
pub trait Device: Any + fmt::Display + Send + Sync {
    /// The device name as used in configuration.
    fn name(&self) -> &str;

    /// Opens a stream that calls `renderer` from the audio thread with an
    /// interleaved buffer to fill. The stream starts stopped.
    fn open_stream(
        &self,
        config: StreamConfig,
        renderer: Renderer,
    ) -> Result<Box<dyn OutputStream>, BackendError>;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, BackendError> {
    cpal::Device::list()
}

/// Gets a device with the given name. Names starting with `mock` give a mock
/// device; `default` gives the host's default output.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, BackendError> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    }

    Ok(Arc::new(cpal::Device::get(name)?))
}
