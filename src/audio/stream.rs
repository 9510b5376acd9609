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
use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use super::{BackendError, ParseSettingError};

/// Fills one interleaved buffer. Called from the audio thread.
pub type Renderer = Arc<dyn Fn(&mut [i16]) + Send + Sync>;

/// How the stream shares the hardware.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// The host picks the period and may mix with other clients.
    #[default]
    Shared,
    /// Request a fixed period equal to the engine buffer size.
    Exclusive,
}

impl StreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Shared => "shared",
            StreamMode::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamMode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(StreamMode::Shared),
            "exclusive" => Ok(StreamMode::Exclusive),
            _ => Err(ParseSettingError::new("stream mode", s)),
        }
    }
}

/// Parameters for opening an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub channels: u32,
    pub sample_rate: u32,
    pub buffer_frames: usize,
    pub mode: StreamMode,
}

impl StreamConfig {
    /// The wall-clock length of one buffer.
    pub fn buffer_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.buffer_frames as f64 / f64::from(self.sample_rate))
    }

    pub fn buffer_samples(&self) -> usize {
        self.buffer_frames * self.channels as usize
    }
}

/// An open output stream. Dropping it closes the stream.
pub trait OutputStream: Send {
    fn start(&mut self) -> Result<(), BackendError>;
    fn stop(&mut self) -> Result<(), BackendError>;
}
