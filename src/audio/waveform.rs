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
//! Peak amplitudes of a source, one value per display pixel.

use std::{sync::Arc, time::Duration};

use super::{
    interpolation::{sample_at_time, Interpolation},
    sample_provider::SampleProvider,
};

/// Points sampled inside each pixel's time window.
pub const SAMPLES_PER_PIXEL: usize = 64;

const DEFAULT_TIME_PER_PIXEL: Duration = Duration::from_millis(10);

pub struct Waveform {
    source: Option<Arc<dyn SampleProvider>>,
    time_per_pixel: Duration,
    interpolation: Interpolation,
    scratch: Vec<i16>,
}

impl Default for Waveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Waveform {
    pub fn new() -> Self {
        Self {
            source: None,
            time_per_pixel: DEFAULT_TIME_PER_PIXEL,
            interpolation: Interpolation::Linear,
            scratch: Vec::new(),
        }
    }

    pub fn source(&self) -> Option<&Arc<dyn SampleProvider>> {
        self.source.as_ref()
    }

    pub fn set_source(&mut self, source: Arc<dyn SampleProvider>) {
        self.source = Some(source);
    }

    pub fn clear_source(&mut self) {
        self.source = None;
    }

    pub fn time_per_pixel(&self) -> Duration {
        self.time_per_pixel
    }

    /// Sets how much time one pixel covers. Zero is ignored.
    pub fn set_scale(&mut self, time_per_pixel: Duration) {
        if !time_per_pixel.is_zero() {
            self.time_per_pixel = time_per_pixel;
        }
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    /// Number of pixels needed to cover the whole source.
    pub fn pixel_count(&self) -> usize {
        let Some(source) = &self.source else {
            return 0;
        };
        let duration = source.duration().as_nanos();
        let per_pixel = self.time_per_pixel.as_nanos();
        duration.div_ceil(per_pixel) as usize
    }

    /// Peak absolute amplitude of `channel` within the pixel's time window,
    /// in [0, 1]. Wide windows are sampled at `SAMPLES_PER_PIXEL` points.
    /// Pixels outside the source and missing channels are 0.
    pub fn normalized_pcm_for_pixel(&mut self, pixel: i64, channel: u32) -> f32 {
        let Some(source) = &self.source else {
            return 0.0;
        };
        let sample_rate = f64::from(source.sample_rate());
        let channel_count = source.channel_count();
        if sample_rate == 0.0 || channel >= channel_count || pixel < 0 {
            return 0.0;
        }

        let pixel_seconds = self.time_per_pixel.as_secs_f64();
        let start_frame = (pixel as f64 * pixel_seconds * sample_rate).round() as i64;
        if start_frame >= source.frame_count() {
            return 0.0;
        }

        let window_frames = ((pixel_seconds * sample_rate).round() as i64).max(1);
        let channels = channel_count as usize;
        // One extra frame so the last point has a neighbor to interpolate with.
        self.scratch.resize((window_frames as usize + 1) * channels, 0);
        source.read_samples(&mut self.scratch, start_frame, window_frames + 1, channel_count);

        let peak = if window_frames as usize <= SAMPLES_PER_PIXEL {
            self.scratch[..window_frames as usize * channels]
                .iter()
                .skip(channel as usize)
                .step_by(channels)
                .map(|&sample| i32::from(sample).abs())
                .max()
                .unwrap_or(0)
        } else {
            let step = window_frames as f64 / SAMPLES_PER_PIXEL as f64;
            (0..SAMPLES_PER_PIXEL)
                .map(|point| {
                    let sample = sample_at_time(
                        &self.scratch,
                        point as f64 * step / sample_rate,
                        channel,
                        sample_rate,
                        channel_count,
                        self.interpolation,
                    );
                    i32::from(sample).abs()
                })
                .max()
                .unwrap_or(0)
        };

        (peak as f32 / f32::from(i16::MAX)).min(1.0)
    }

    /// Peaks for `width` consecutive pixels starting at zero.
    pub fn peaks(&mut self, channel: u32, width: usize) -> Vec<f32> {
        (0..width as i64)
            .map(|pixel| self.normalized_pcm_for_pixel(pixel, channel))
            .collect()
    }
}
