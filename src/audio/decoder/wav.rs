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
use std::io::Cursor;

use hound::WavReader;

use super::error::DecoderError;
use super::{Decoder, DecoderOutput};

/// Decodes RIFF/WAVE PCM with hound. Integer samples of any width are
/// rescaled to 16 bits; 32-bit float samples are clamped and scaled.
pub struct WavDecoder;

impl Decoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["wav", "wave"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecoderOutput, DecoderError> {
        if bytes.is_empty() {
            return Err(DecoderError::EmptyInput);
        }

        let mut reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(DecoderError::UnsupportedFormat(
                "zero channel WAV".to_string(),
            ));
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => {
                if spec.bits_per_sample != 32 {
                    return Err(DecoderError::UnsupportedFormat(format!(
                        "{}-bit float",
                        spec.bits_per_sample
                    )));
                }
                reader
                    .samples::<f32>()
                    .map(|sample| sample.map(float_to_i16))
                    .collect::<Result<Vec<i16>, hound::Error>>()?
            }
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                if bits == 0 || bits > 32 {
                    return Err(DecoderError::UnsupportedFormat(format!(
                        "{}-bit integer",
                        bits
                    )));
                }
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| int_to_i16(value, bits)))
                    .collect::<Result<Vec<i16>, hound::Error>>()?
            }
        };

        Ok(DecoderOutput {
            channel_count: u32::from(spec.channels),
            sample_rate: spec.sample_rate,
            samples,
        })
    }
}

/// Rescales a signed integer sample of the given bit width to 16 bits.
fn int_to_i16(value: i32, bits: u16) -> i16 {
    if bits >= 16 {
        (value >> (bits - 16)) as i16
    } else {
        (value << (16 - bits)) as i16
    }
}

fn float_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_rescaling() {
        assert_eq!(int_to_i16(0x7FFFFF, 24), 0x7FFF);
        assert_eq!(int_to_i16(-0x800000, 24), i16::MIN);
        assert_eq!(int_to_i16(i32::MAX, 32), i16::MAX);
        assert_eq!(int_to_i16(1234, 16), 1234);
        assert_eq!(int_to_i16(127, 8), 127 << 8);
        assert_eq!(int_to_i16(-128, 8), i16::MIN);
    }

    #[test]
    fn test_float_scaling() {
        assert_eq!(float_to_i16(0.0), 0);
        assert_eq!(float_to_i16(1.0), i16::MAX);
        assert_eq!(float_to_i16(-1.0), -i16::MAX);
        assert_eq!(float_to_i16(4.0), i16::MAX);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(WavDecoder.decode(b"definitely not a wave file").is_err());
        assert!(matches!(
            WavDecoder.decode(&[]),
            Err(DecoderError::EmptyInput)
        ));
    }
}
