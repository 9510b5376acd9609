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
use super::traits::SampleProvider;

/// A sample provider backed by an in-memory interleaved buffer.
pub struct MemorySampleProvider {
    samples: Vec<i16>,
    channel_count: u32,
    sample_rate: u32,
}

impl MemorySampleProvider {
    /// Creates a new provider from interleaved samples. Trailing samples that
    /// don't make up a full frame are ignored when reading.
    pub fn new(samples: Vec<i16>, channel_count: u32, sample_rate: u32) -> Self {
        Self {
            samples,
            channel_count,
            sample_rate,
        }
    }

    /// Returns the raw interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
}

impl SampleProvider for MemorySampleProvider {
    fn channel_count(&self) -> u32 {
        self.channel_count
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_count(&self) -> i64 {
        if self.channel_count == 0 {
            return 0;
        }
        (self.samples.len() / self.channel_count as usize) as i64
    }

    fn read_samples(
        &self,
        destination: &mut [i16],
        frame_offset: i64,
        frame_count: i64,
        channel_count: u32,
    ) -> i64 {
        if channel_count == 0 || frame_count <= 0 {
            return 0;
        }
        let out_channels = channel_count as usize;
        let frame_count = frame_count.min((destination.len() / out_channels) as i64);
        let destination = &mut destination[..frame_count as usize * out_channels];

        let total_frames = self.frame_count();
        let source_channels = self.channel_count as usize;

        // Frames of the request that overlap the stored buffer.
        let first = frame_offset.clamp(0, total_frames);
        let last = (frame_offset + frame_count).clamp(0, total_frames);

        if first >= last {
            destination.fill(0);
            return frame_count;
        }

        let lead = (first - frame_offset) as usize;
        let overlap = (last - first) as usize;

        destination[..lead * out_channels].fill(0);
        destination[(lead + overlap) * out_channels..].fill(0);

        let written = &mut destination[lead * out_channels..(lead + overlap) * out_channels];
        let stored = &self.samples
            [first as usize * source_channels..(first as usize + overlap) * source_channels];

        if source_channels == out_channels {
            written.copy_from_slice(stored);
        } else {
            for (out_frame, in_frame) in written
                .chunks_exact_mut(out_channels)
                .zip(stored.chunks_exact(source_channels))
            {
                for (channel, sample) in out_frame.iter_mut().enumerate() {
                    *sample = in_frame.get(channel).copied().unwrap_or(0);
                }
            }
        }

        frame_count
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn stereo_ramp(frames: i16) -> MemorySampleProvider {
        let samples = (0..frames).flat_map(|i| [i + 1, -(i + 1)]).collect();
        MemorySampleProvider::new(samples, 2, 44100)
    }

    #[test]
    fn test_metadata() {
        let provider = stereo_ramp(10);
        assert_eq!(provider.channel_count(), 2);
        assert_eq!(provider.sample_rate(), 44100);
        assert_eq!(provider.frame_count(), 10);

        let provider = MemorySampleProvider::new(vec![0; 44100], 1, 44100);
        assert_eq!(provider.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_read_within_range() {
        let provider = stereo_ramp(10);
        let mut buffer = [0i16; 6];
        assert_eq!(provider.read_samples(&mut buffer, 2, 3, 2), 3);
        assert_eq!(buffer, [3, -3, 4, -4, 5, -5]);
    }

    #[test]
    fn test_read_past_end_pads_with_silence() {
        let provider = stereo_ramp(4);
        let mut buffer = [99i16; 8];
        assert_eq!(provider.read_samples(&mut buffer, 2, 4, 2), 4);
        assert_eq!(buffer, [3, -3, 4, -4, 0, 0, 0, 0]);

        let mut buffer = [99i16; 4];
        assert_eq!(provider.read_samples(&mut buffer, 100, 2, 2), 2);
        assert_eq!(buffer, [0; 4]);
    }

    #[test]
    fn test_read_negative_offset_leads_with_silence() {
        let provider = stereo_ramp(4);
        let mut buffer = [99i16; 8];
        assert_eq!(provider.read_samples(&mut buffer, -2, 4, 2), 4);
        assert_eq!(buffer, [0, 0, 0, 0, 1, -1, 2, -2]);
    }

    #[test]
    fn test_read_clamps_to_destination() {
        let provider = stereo_ramp(10);
        let mut buffer = [0i16; 4];
        assert_eq!(provider.read_samples(&mut buffer, 0, 10, 2), 2);
        assert_eq!(buffer, [1, -1, 2, -2]);
    }

    #[test]
    fn test_read_with_different_channel_count() {
        let provider = stereo_ramp(3);
        let mut buffer = [99i16; 9];
        assert_eq!(provider.read_samples(&mut buffer, 0, 3, 3), 3);
        assert_eq!(buffer, [1, -1, 0, 2, -2, 0, 3, -3, 0]);

        let mut buffer = [99i16; 3];
        assert_eq!(provider.read_samples(&mut buffer, 0, 3, 1), 3);
        assert_eq!(buffer, [1, 2, 3]);
    }

    #[test]
    fn test_zero_channels_is_empty() {
        let provider = MemorySampleProvider::new(vec![1, 2, 3], 0, 44100);
        assert_eq!(provider.frame_count(), 0);
        let mut buffer = [7i16; 2];
        assert_eq!(provider.read_samples(&mut buffer, 0, 1, 0), 0);
    }
}
