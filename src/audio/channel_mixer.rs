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
//! Converts a source's channel layout to the output layout.
//!
//! Mono is spread to N channels. Sources with four or more channels fold their
//! first four channels down to stereo. Every other combination is rendered as
//! silence for the requested frame count.

use std::{fmt, str::FromStr};

use super::sample_mixer::mix_samples;
use super::sample_provider::SampleProvider;
use super::ParseSettingError;

/// Fewest source channels handled by the downmix path. Channels past the
/// fourth are dropped.
const QUAD_CHANNELS: u32 = 4;
/// Target layout handled by the downmix path.
const STEREO_CHANNELS: u32 = 2;

/// How a source with four or more channels is folded down to stereo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixingBehavior {
    /// Keep channels 1/2 and drop channels 3/4.
    IgnoreTrailing,
    /// Keep channels 3/4 and drop channels 1/2.
    IgnoreLeading,
    /// Saturating-add channel 1 with 3 and channel 2 with 4.
    #[default]
    Combine,
}

impl MixingBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            MixingBehavior::IgnoreTrailing => "ignore-trailing",
            MixingBehavior::IgnoreLeading => "ignore-leading",
            MixingBehavior::Combine => "combine",
        }
    }
}

impl FromStr for MixingBehavior {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" | "ignore-trailing" => Ok(MixingBehavior::IgnoreTrailing),
            "ignore-leading" => Ok(MixingBehavior::IgnoreLeading),
            "combine" | "mix" => Ok(MixingBehavior::Combine),
            _ => Err(ParseSettingError::new("channel mixing behavior", s)),
        }
    }
}

impl fmt::Display for MixingBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reads from a provider with a mismatched channel count and writes frames in
/// the target layout.
pub struct ChannelMixer {
    target_channels: u32,
    behavior: MixingBehavior,
    /// Scratch space for the source-layout frames.
    mix_buffer: Vec<i16>,
}

impl ChannelMixer {
    /// Creates a new channel mixer. `reserve_samples` sizes the scratch buffer
    /// up front so the audio thread doesn't have to allocate.
    pub fn new(target_channels: u32, behavior: MixingBehavior, reserve_samples: usize) -> Self {
        Self {
            target_channels,
            behavior,
            mix_buffer: vec![0; reserve_samples],
        }
    }

    pub fn target_channels(&self) -> u32 {
        self.target_channels
    }

    pub fn set_target_channels(&mut self, target_channels: u32) {
        self.target_channels = target_channels;
    }

    pub fn behavior(&self) -> MixingBehavior {
        self.behavior
    }

    pub fn set_behavior(&mut self, behavior: MixingBehavior) {
        self.behavior = behavior;
    }

    /// Whether a source with the given channel count can be converted.
    pub fn supports(&self, source_channels: u32) -> bool {
        (source_channels == 1 && self.target_channels > 1)
            || (source_channels >= QUAD_CHANNELS && self.target_channels == STEREO_CHANNELS)
    }

    /// Reads `frames_to_read` frames at `frame_offset` from the provider and
    /// writes them to `destination` in the target layout. Returns the number
    /// of frames written.
    pub fn mix_channels(
        &mut self,
        provider: &dyn SampleProvider,
        destination: &mut [i16],
        frame_offset: i64,
        frames_to_read: i64,
    ) -> i64 {
        let source_channels = provider.channel_count();
        let target = self.target_channels as usize;
        let frames_to_read = frames_to_read
            .max(0)
            .min((destination.len() / target.max(1)) as i64);

        if !self.supports(source_channels) {
            destination[..frames_to_read as usize * target].fill(0);
            return frames_to_read;
        }

        let needed = frames_to_read as usize * source_channels as usize;
        if self.mix_buffer.len() < needed {
            self.mix_buffer.resize(needed, 0);
        }

        let mut mix_buffer = std::mem::take(&mut self.mix_buffer);
        let frames_read = provider.read_samples(
            &mut mix_buffer[..needed],
            frame_offset,
            frames_to_read,
            source_channels,
        );
        let written = self.convert(
            source_channels,
            &mix_buffer,
            frames_read,
            destination,
            frames_to_read,
        );
        self.mix_buffer = mix_buffer;
        written
    }

    /// Converts `frames_read` frames of `source_channels` layout in `source`
    /// into `destination`.
    pub fn convert(
        &self,
        source_channels: u32,
        source: &[i16],
        frames_read: i64,
        destination: &mut [i16],
        frames_to_read: i64,
    ) -> i64 {
        let target = self.target_channels as usize;
        if !self.supports(source_channels) {
            let silent = (frames_to_read.max(0) as usize * target).min(destination.len());
            destination[..silent].fill(0);
            return frames_to_read;
        }

        let frames = frames_read.max(0) as usize;
        let source_channels = source_channels as usize;
        let frames_in = source.chunks_exact(source_channels).take(frames);
        let frames_out = destination.chunks_exact_mut(target);

        if source_channels == 1 {
            for (out_frame, in_frame) in frames_out.zip(frames_in) {
                out_frame.fill(in_frame[0]);
            }
            return frames_read;
        }

        for (out_frame, in_frame) in frames_out.zip(frames_in) {
            let (left, right) = match self.behavior {
                MixingBehavior::IgnoreTrailing => (in_frame[0], in_frame[1]),
                MixingBehavior::IgnoreLeading => (in_frame[2], in_frame[3]),
                MixingBehavior::Combine => (
                    mix_samples(in_frame[0], in_frame[2]),
                    mix_samples(in_frame[1], in_frame[3]),
                ),
            };
            out_frame[0] = left;
            out_frame[1] = right;
        }
        frames_read
    }
}
