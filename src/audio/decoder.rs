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
//! Format decoders that normalize audio files into interleaved 16-bit PCM.

pub mod compressed;
pub mod error;
pub mod factory;
pub mod hevag;
pub mod wav;


pub use compressed::SymphoniaDecoder;
pub use error::DecoderError;
pub use factory::DecoderFactory;
pub use hevag::HevagDecoder;
pub use wav::WavDecoder;

/// Decoded audio in interleaved 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOutput {
    pub channel_count: u32,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl DecoderOutput {
    /// Get the number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        if self.channel_count == 0 {
            return 0;
        }
        self.samples.len() / self.channel_count as usize
    }
}

/// A decoder for one container or codec.
pub trait Decoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// File extensions this decoder handles, lowercase and without the dot.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Decodes a complete file held in memory.
    fn decode(&self, bytes: &[u8]) -> Result<DecoderOutput, DecoderError>;

    /// Whether the given extension is one of this decoder's extensions.
    fn matches_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.file_extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    }
}
