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
//! Sample reconstruction at fractional frame offsets.
//!
//! Samples are normalized against `i16::MAX` before interpolating, so `i16::MIN`
//! round trips to `-i16::MAX`. Frames outside the buffer read as silence.

use std::{f64::consts::PI, fmt, str::FromStr};

use super::ParseSettingError;

const MAX_SAMPLE_VALUE: f64 = i16::MAX as f64;

/// The interpolation used to reconstruct a sample between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    NearestNeighbor,
    #[default]
    Linear,
    Cosine,
}

impl Interpolation {
    /// Interpolates between `start` and `end`, where `t` is in [0, 1].
    #[inline]
    pub fn interpolate(self, start: f64, end: f64, t: f64) -> f64 {
        match self {
            Interpolation::NearestNeighbor => {
                if t <= 0.5 {
                    start
                } else {
                    end
                }
            }
            Interpolation::Linear => (1.0 - t) * start + t * end,
            Interpolation::Cosine => {
                let weight = (1.0 - (t * PI).cos()) * 0.5;
                start * (1.0 - weight) + end * weight
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::NearestNeighbor => "nearest",
            Interpolation::Linear => "linear",
            Interpolation::Cosine => "cosine",
        }
    }
}

impl FromStr for Interpolation {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "nearest-neighbor" => Ok(Interpolation::NearestNeighbor),
            "linear" => Ok(Interpolation::Linear),
            "cosine" => Ok(Interpolation::Cosine),
            _ => Err(ParseSettingError::new("interpolation", s)),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the sample of `channel` at `frame`, or 0 when the frame is out of range.
#[inline]
pub fn sample_at_frame(samples: &[i16], frame: i64, channel: u32, channel_count: u32) -> i16 {
    let index = frame * i64::from(channel_count) + i64::from(channel);
    if index < 0 {
        return 0;
    }
    samples.get(index as usize).copied().unwrap_or(0)
}

/// Reconstructs the sample of `channel` at the given time in seconds.
pub fn sample_at_time(
    samples: &[i16],
    seconds: f64,
    channel: u32,
    sample_rate: f64,
    channel_count: u32,
    interpolation: Interpolation,
) -> i16 {
    let frame_fraction = seconds * sample_rate;

    let start_frame = frame_fraction as i64;
    let end_frame = start_frame + 1;

    let start = sample_at_frame(samples, start_frame, channel, channel_count);
    let end = sample_at_frame(samples, end_frame, channel, channel_count);
    let t = frame_fraction - start_frame as f64;

    let normalized_start = f64::from(start) / MAX_SAMPLE_VALUE;
    let normalized_end = f64::from(end) / MAX_SAMPLE_VALUE;

    let result = interpolation
        .interpolate(normalized_start, normalized_end, t)
        .clamp(-1.0, 1.0);
    (result * MAX_SAMPLE_VALUE) as i16
}
