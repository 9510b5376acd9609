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
//! Whole-buffer sample rate conversion.

use std::{fmt, str::FromStr};

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::warn;

use super::interpolation::{sample_at_time, Interpolation};
use super::ParseSettingError;

/// Input block size for the sinc resampler.
const SINC_CHUNK_FRAMES: usize = 1024;

/// Errors from the band-limited resampler.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error("unable to build resampler for {0}Hz -> {1}Hz: {2}")]
    Construction(u32, u32, rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
}

/// How decoded audio is converted to the output sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleQuality {
    /// Per-frame reconstruction with one of the interpolators. No low pass filter.
    Interpolated(Interpolation),
    /// Band-limited sinc resampling.
    Sinc,
}

impl Default for ResampleQuality {
    fn default() -> Self {
        ResampleQuality::Interpolated(Interpolation::default())
    }
}

impl FromStr for ResampleQuality {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("sinc") {
            return Ok(ResampleQuality::Sinc);
        }
        s.parse::<Interpolation>()
            .map(ResampleQuality::Interpolated)
            .map_err(|_| ParseSettingError::new("resampler", s))
    }
}

impl fmt::Display for ResampleQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleQuality::Interpolated(interpolation) => write!(f, "{}", interpolation),
            ResampleQuality::Sinc => write!(f, "sinc"),
        }
    }
}

/// Number of output frames produced when converting `in_frames` between the given rates.
pub fn output_frame_count(in_frames: usize, source_rate: u32, target_rate: u32) -> usize {
    (in_frames as f64 * f64::from(target_rate) / f64::from(source_rate) + 0.5) as usize
}

/// Regenerates every output frame by sampling the source at the frame's time.
pub fn resample(
    samples: &[i16],
    source_rate: u32,
    target_rate: u32,
    channel_count: u32,
    interpolation: Interpolation,
) -> Vec<i16> {
    if channel_count == 0 || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let in_frames = samples.len() / channel_count as usize;
    let out_frames = output_frame_count(in_frames, source_rate, target_rate);

    let source_rate = f64::from(source_rate);
    let seconds_per_frame = 1.0 / f64::from(target_rate);

    let mut output = Vec::with_capacity(out_frames * channel_count as usize);
    for frame in 0..out_frames {
        let second = frame as f64 * seconds_per_frame;
        for channel in 0..channel_count {
            output.push(sample_at_time(
                samples,
                second,
                channel,
                source_rate,
                channel_count,
                interpolation,
            ));
        }
    }
    output
}

/// Resamples with a windowed sinc filter. The output has the same length as
/// [`resample`] and lines up with the input.
pub fn resample_sinc(
    samples: &[i16],
    source_rate: u32,
    target_rate: u32,
    channel_count: u32,
) -> Result<Vec<i16>, ResampleError> {
    let channels = channel_count as usize;
    if channels == 0 || source_rate == 0 || target_rate == 0 {
        return Ok(Vec::new());
    }
    let in_frames = samples.len() / channels;
    if in_frames == 0 {
        return Ok(Vec::new());
    }
    let out_frames = output_frame_count(in_frames, source_rate, target_rate);

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, SINC_CHUNK_FRAMES, channels)
        .map_err(|e| ResampleError::Construction(source_rate, target_rate, e))?;

    let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(in_frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in frame.iter().enumerate() {
            planar[channel].push(f32::from(sample) / 32768.0);
        }
    }

    // SincFixedIn starts half a filter length before the first input frame,
    // so output frame 0 already sits on input frame 0. Its reported
    // output_delay must not be trimmed again.
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(out_frames); channels];
    let append = |output: &mut Vec<Vec<f32>>, processed: Vec<Vec<f32>>| {
        for (out, chunk) in output.iter_mut().zip(processed) {
            out.extend_from_slice(&chunk);
        }
    };

    let mut position = 0;
    loop {
        let next = resampler.input_frames_next();
        if in_frames - position < next {
            break;
        }
        let chunk: Vec<&[f32]> = planar
            .iter()
            .map(|c| &c[position..position + next])
            .collect();
        let processed = resampler.process(&chunk, None)?;
        append(&mut output, processed);
        position += next;
    }

    if position < in_frames {
        let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[position..]).collect();
        let processed = resampler.process_partial(Some(chunk.as_slice()), None)?;
        append(&mut output, processed);
    }

    // Flush whatever is still held back by the filter.
    while output[0].len() < out_frames {
        let processed = resampler.process_partial::<Vec<f32>>(None, None)?;
        if processed.first().map_or(true, |c| c.is_empty()) {
            break;
        }
        append(&mut output, processed);
    }

    let mut interleaved = Vec::with_capacity(out_frames * channels);
    for frame in 0..out_frames {
        for channel in output.iter() {
            let value = channel.get(frame).copied().unwrap_or(0.0);
            interleaved.push((value * 32768.0).clamp(-32768.0, 32767.0) as i16);
        }
    }
    Ok(interleaved)
}

/// Converts between sample rates with the requested quality. A failing sinc
/// resampler falls back to linear interpolation.
pub fn resample_with_quality(
    samples: &[i16],
    source_rate: u32,
    target_rate: u32,
    channel_count: u32,
    quality: ResampleQuality,
) -> Vec<i16> {
    match quality {
        ResampleQuality::Interpolated(interpolation) => {
            resample(samples, source_rate, target_rate, channel_count, interpolation)
        }
        ResampleQuality::Sinc => {
            match resample_sinc(samples, source_rate, target_rate, channel_count) {
                Ok(resampled) => resampled,
                Err(e) => {
                    warn!(
                        err = %e,
                        source_rate,
                        target_rate,
                        "Sinc resampling failed, falling back to linear interpolation"
                    );
                    resample(
                        samples,
                        source_rate,
                        target_rate,
                        channel_count,
                        Interpolation::Linear,
                    )
                }
            }
        }
    }
}
