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
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes interleaved 16-bit PCM to a WAV file.
pub fn write_wav_file(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
    channel_count: u32,
) -> Result<(), hound::Error> {
    let channels = u16::try_from(channel_count)
        .ok()
        .filter(|&channels| channels > 0)
        .ok_or(hound::Error::Unsupported)?;
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
