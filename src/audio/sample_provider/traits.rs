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
use std::time::Duration;

/// Random access to a decoded block of interleaved 16-bit PCM.
///
/// Providers are immutable once constructed and are shared between the
/// engine's source table, voices and visualization through `Arc`.
pub trait SampleProvider: Send + Sync {
    /// Get the number of interleaved channels.
    fn channel_count(&self) -> u32;

    /// Get the sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Get the number of frames (samples per channel).
    fn frame_count(&self) -> i64;

    /// Reads `frame_count` frames starting at `frame_offset` into `destination`,
    /// writing `channel_count` samples per frame.
    ///
    /// Frames before the start or past the end of the provider, and channels
    /// the provider doesn't have, are written as silence. Returns the number of
    /// frames written, which is `frame_count` unless `destination` is shorter.
    fn read_samples(
        &self,
        destination: &mut [i16],
        frame_offset: i64,
        frame_count: i64,
        channel_count: u32,
    ) -> i64;

    /// Get the duration of the provider at its own sample rate.
    fn duration(&self) -> Duration {
        let sample_rate = self.sample_rate();
        if sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count().max(0) as f64 / f64::from(sample_rate))
    }
}
