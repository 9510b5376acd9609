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
//! The `VAGp` ADPCM container: a 48-byte big-endian header followed by
//! 16-byte blocks of 28 4-bit samples each, block-interleaved per channel.

use super::error::DecoderError;
use super::{Decoder, DecoderOutput};

pub const HEADER_SIZE: usize = 0x30;
pub const BLOCK_SIZE: usize = 16;
pub const SAMPLES_PER_BLOCK: usize = 28;

const SIGNATURE: &[u8; 4] = b"VAGp";
const NAME_SIZE: usize = 16;
const MAX_COEFFICIENT_INDEX: usize = 127;
const DEFAULT_SHIFT: u8 = 9;
const MAX_SHIFT: u8 = 12;
const END_FLAG: u8 = 7;

/// Predictor coefficients in 13-bit fixed point. Blocks selecting a row
/// past this table are rejected rather than decoded without prediction.
// TODO: add the extended rows 5..127 once a verified copy of the hardware
// coefficient table is available.
const COEFFICIENTS: [[i32; 4]; 5] = [
    [0, 0, 0, 0],
    [7680, 0, 0, 0],
    [14720, -6656, 0, 0],
    [12544, -7040, 0, 0],
    [15616, -7680, 0, 0],
];

/// Per-channel predictor history, most recent sample first.
pub type History = [i32; 4];

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HevagHeader {
    pub version: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub data_size: u32,
    pub sample_rate: u32,
    pub channel_count: u32,
    /// Frame count from version 3 headers. Zero or absent means derive from
    /// the data size.
    pub sample_count: Option<u32>,
    pub name: String,
}

impl HevagHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, DecoderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DecoderError::Truncated {
                expected: HEADER_SIZE,
                found: bytes.len(),
            });
        }
        if &bytes[0..4] != SIGNATURE {
            return Err(DecoderError::InvalidSignature("VAGp"));
        }

        let version = read_u32_be(bytes, 0x04);
        let major = version >> 16;
        if major != 2 && major != 3 {
            return Err(DecoderError::UnsupportedVersion(version));
        }

        let sample_count = match read_u32_be(bytes, 0x18) {
            count if major >= 3 && count > 0 => Some(count),
            _ => None,
        };
        let channel_count = u32::from(bytes[0x1E]).max(1);

        let name_bytes = &bytes[0x20..0x20 + NAME_SIZE];
        let name_length = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_SIZE);

        Ok(Self {
            version,
            loop_start: read_u32_be(bytes, 0x08),
            data_size: read_u32_be(bytes, 0x0C),
            sample_rate: read_u32_be(bytes, 0x10),
            loop_end: read_u32_be(bytes, 0x14),
            channel_count,
            sample_count,
            name: String::from_utf8_lossy(&name_bytes[..name_length]).into_owned(),
        })
    }
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Decodes one 16-byte block into 28 samples, updating the channel history.
/// Fails without touching the history when the block selects a predictor row
/// that has no coefficients.
pub fn decode_block(
    block: &[u8; BLOCK_SIZE],
    history: &mut History,
    output: &mut [i16; SAMPLES_PER_BLOCK],
) -> Result<(), DecoderError> {
    let shift = match block[0] & 0x0F {
        shift if shift > MAX_SHIFT => DEFAULT_SHIFT,
        shift => shift,
    };
    let index = usize::from((block[1] & 0xF0) | (block[0] >> 4)).min(MAX_COEFFICIENT_INDEX);
    let flag = block[1] & 0x0F;

    if flag == END_FLAG {
        output.fill(0);
        for _ in 0..SAMPLES_PER_BLOCK {
            push_history(history, 0);
        }
        return Ok(());
    }

    let coefficients = COEFFICIENTS
        .get(index)
        .ok_or(DecoderError::UnsupportedPredictor(index))?;
    for (i, sample) in output.iter_mut().enumerate() {
        let byte = block[2 + i / 2];
        let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        let scaled = i32::from(((u16::from(nibble) << 12) as i16) >> shift);
        let predicted = history
            .iter()
            .zip(coefficients.iter())
            .map(|(h, c)| h * c)
            .sum::<i32>()
            >> 13;
        let value = (scaled + predicted).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
        *sample = value as i16;
        push_history(history, value);
    }
    Ok(())
}

fn push_history(history: &mut History, value: i32) {
    history.rotate_right(1);
    history[0] = value;
}

/// Decodes `VAGp` files.
pub struct HevagDecoder;

impl Decoder for HevagDecoder {
    fn name(&self) -> &'static str {
        "hevag"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["vag"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecoderOutput, DecoderError> {
        if bytes.is_empty() {
            return Err(DecoderError::EmptyInput);
        }
        let header = HevagHeader::parse(bytes)?;

        let data_size = header.data_size as usize;
        let data = &bytes[HEADER_SIZE..];
        if data.len() < data_size {
            return Err(DecoderError::Truncated {
                expected: HEADER_SIZE + data_size,
                found: bytes.len(),
            });
        }

        let channels = header.channel_count as usize;
        let blocks_per_channel = data_size / (BLOCK_SIZE * channels);
        let mut frame_count = blocks_per_channel * SAMPLES_PER_BLOCK;
        if let Some(sample_count) = header.sample_count {
            frame_count = frame_count.min(sample_count as usize);
        }

        let mut samples = vec![0i16; blocks_per_channel * SAMPLES_PER_BLOCK * channels];
        let mut histories = vec![History::default(); channels];
        let mut decoded = [0i16; SAMPLES_PER_BLOCK];
        for (block_index, chunk) in data[..blocks_per_channel * channels * BLOCK_SIZE]
            .chunks_exact(BLOCK_SIZE)
            .enumerate()
        {
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(chunk);
            let channel = block_index % channels;
            let first_frame = (block_index / channels) * SAMPLES_PER_BLOCK;

            decode_block(&block, &mut histories[channel], &mut decoded)?;
            for (i, &sample) in decoded.iter().enumerate() {
                samples[(first_frame + i) * channels + channel] = sample;
            }
        }
        samples.truncate(frame_count * channels);

        Ok(DecoderOutput {
            channel_count: header.channel_count,
            sample_rate: header.sample_rate,
            samples,
        })
    }
}
