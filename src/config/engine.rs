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
use std::{path::Path, str::FromStr, time::Duration};

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::ConfigError;
use crate::audio::{
    engine::EngineSettings, MixingBehavior, ResampleQuality, StreamMode,
    DEFAULT_BUFFER_FRAME_COUNT, MAX_BUFFER_FRAME_COUNT, MAX_VOLUME, MIN_BUFFER_FRAME_COUNT,
    MIN_VOLUME,
};

pub const DEFAULT_DEVICE: &str = "default";
pub const DEFAULT_CAPTURE_RESERVE: Duration = Duration::from_secs(60);

/// A YAML representation of the engine configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Engine {
    /// The output device. Names starting with "mock" select the mock device.
    device: Option<String>,

    /// "shared" or "exclusive".
    stream_mode: Option<String>,

    /// Frames per callback (clamped to the supported range).
    buffer_frame_size: Option<usize>,

    /// Master volume between 0 and 1.
    master_volume: Option<f32>,

    /// How 4-channel sources fold down to stereo.
    channel_mixing: Option<String>,

    /// "nearest", "linear", "cosine" or "sinc".
    resampler: Option<String>,

    /// How much output the debug capture pre-allocates, e.g. "60s".
    capture_reserve: Option<String>,
}

impl Engine {
    /// Deserializes the file from the given path into an engine configuration.
    pub fn deserialize(path: &Path) -> Result<Engine, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Engine>()?)
    }

    /// Returns a configuration using only the given device.
    pub fn with_device(device: &str) -> Engine {
        Engine {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    /// Overrides the configured device.
    pub fn set_device(&mut self, device: &str) {
        self.device = Some(device.to_string());
    }

    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    pub fn stream_mode(&self) -> Result<StreamMode, ConfigError> {
        parse_or_default(self.stream_mode.as_deref())
    }

    pub fn buffer_frame_size(&self) -> usize {
        self.buffer_frame_size
            .unwrap_or(DEFAULT_BUFFER_FRAME_COUNT)
            .clamp(MIN_BUFFER_FRAME_COUNT, MAX_BUFFER_FRAME_COUNT)
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
            .filter(|volume| !volume.is_nan())
            .unwrap_or(MAX_VOLUME)
            .clamp(MIN_VOLUME, MAX_VOLUME)
    }

    pub fn channel_mixing(&self) -> Result<MixingBehavior, ConfigError> {
        parse_or_default(self.channel_mixing.as_deref())
    }

    pub fn resampler(&self) -> Result<ResampleQuality, ConfigError> {
        parse_or_default(self.resampler.as_deref())
    }

    pub fn capture_reserve(&self) -> Result<Duration, ConfigError> {
        match &self.capture_reserve {
            Some(reserve) => Ok(DurationString::from_string(reserve.clone())?.into()),
            None => Ok(DEFAULT_CAPTURE_RESERVE),
        }
    }

    /// Resolves every setting into engine settings.
    pub fn settings(&self) -> Result<EngineSettings, ConfigError> {
        Ok(EngineSettings {
            stream_mode: self.stream_mode()?,
            buffer_frame_size: self.buffer_frame_size(),
            master_volume: self.master_volume(),
            channel_mixing: self.channel_mixing()?,
            resample_quality: self.resampler()?,
            capture_reserve: self.capture_reserve()?,
        })
    }
}

fn parse_or_default<T>(value: Option<&str>) -> Result<T, ConfigError>
where
    T: FromStr<Err = crate::audio::ParseSettingError> + Default,
{
    match value {
        Some(value) => Ok(value.parse()?),
        None => Ok(T::default()),
    }
}
