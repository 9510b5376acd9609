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
use std::{path::Path, sync::Arc};

use tracing::{debug, error, info};

use super::{
    compressed::SymphoniaDecoder, error::DecoderError, hevag::HevagDecoder, wav::WavDecoder,
    Decoder, DecoderOutput,
};
use crate::audio::{
    resample::{resample_with_quality, ResampleQuality},
    sample_provider::{MemorySampleProvider, SampleProvider},
    OUTPUT_SAMPLE_RATE,
};
use crate::util::filename_display;

/// Picks a decoder by file extension and normalizes its output to the
/// engine's sample rate.
pub struct DecoderFactory {
    decoders: Vec<Box<dyn Decoder>>,
    resample_quality: ResampleQuality,
    output_sample_rate: u32,
}

impl Default for DecoderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderFactory {
    /// Creates a factory with every built-in decoder registered.
    pub fn new() -> Self {
        let decoders: Vec<Box<dyn Decoder>> = vec![
            Box::new(SymphoniaDecoder::flac()),
            Box::new(HevagDecoder),
            Box::new(SymphoniaDecoder::mp3()),
            Box::new(SymphoniaDecoder::vorbis()),
            Box::new(WavDecoder),
        ];
        Self {
            decoders,
            resample_quality: ResampleQuality::default(),
            output_sample_rate: OUTPUT_SAMPLE_RATE,
        }
    }

    pub fn with_resample_quality(mut self, quality: ResampleQuality) -> Self {
        self.resample_quality = quality;
        self
    }

    pub fn resample_quality(&self) -> ResampleQuality {
        self.resample_quality
    }

    pub fn decoders(&self) -> impl Iterator<Item = &dyn Decoder> {
        self.decoders.iter().map(|decoder| decoder.as_ref())
    }

    /// The first registered decoder whose extensions match the file name.
    pub fn find_decoder(&self, file_name: &str) -> Option<&dyn Decoder> {
        let extension = Path::new(file_name).extension()?.to_str()?;
        self.decoders()
            .find(|decoder| decoder.matches_extension(extension))
    }

    /// Decodes without resampling.
    pub fn decode_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DecoderOutput, DecoderError> {
        let decoder = self
            .find_decoder(file_name)
            .ok_or_else(|| DecoderError::NoMatchingDecoder(file_name.to_string()))?;
        debug!(file = file_name, decoder = decoder.name(), "Decoding");
        decoder.decode(bytes)
    }

    /// Resamples to the output rate if needed.
    pub fn normalize(&self, output: DecoderOutput) -> MemorySampleProvider {
        if output.sample_rate == self.output_sample_rate || output.sample_rate == 0 {
            return MemorySampleProvider::new(
                output.samples,
                output.channel_count,
                output.sample_rate,
            );
        }

        let samples = resample_with_quality(
            &output.samples,
            output.sample_rate,
            self.output_sample_rate,
            output.channel_count,
            self.resample_quality,
        );
        MemorySampleProvider::new(samples, output.channel_count, self.output_sample_rate)
    }

    /// Reads, decodes and normalizes a file.
    pub fn load(&self, path: &Path) -> Result<MemorySampleProvider, DecoderError> {
        let file_name = path.to_string_lossy();
        // Check for a decoder before reading the whole file.
        if self.find_decoder(&file_name).is_none() {
            return Err(DecoderError::NoMatchingDecoder(file_name.into_owned()));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            DecoderError::IoError(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        let output = self.decode_bytes(&file_name, &bytes)?;
        Ok(self.normalize(output))
    }

    /// Decodes a file into a shareable provider. Failures are logged and
    /// give `None`.
    pub fn decode_file(&self, path: &Path) -> Option<Arc<dyn SampleProvider>> {
        match self.load(path) {
            Ok(provider) => {
                info!(
                    file = %filename_display(path),
                    channels = provider.channel_count(),
                    sample_rate = provider.sample_rate(),
                    frames = provider.frame_count(),
                    "Decoded audio file"
                );
                Some(Arc::new(provider))
            }
            Err(e) => {
                error!(file = %filename_display(path), err = %e, "Unable to decode audio file");
                None
            }
        }
    }

    /// Like `decode_file` for a file already in memory.
    pub fn decode_file_content(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Option<Arc<dyn SampleProvider>> {
        match self.decode_bytes(file_name, bytes) {
            Ok(output) => Some(Arc::new(self.normalize(output))),
            Err(e) => {
                error!(file = file_name, err = %e, "Unable to decode audio data");
                None
            }
        }
    }

    /// Decodes WAV bytes regardless of name.
    pub fn decode_wav(&self, bytes: &[u8]) -> Option<Arc<dyn SampleProvider>> {
        match WavDecoder.decode(bytes) {
            Ok(output) => Some(Arc::new(self.normalize(output))),
            Err(e) => {
                error!(err = %e, "Unable to decode WAV data");
                None
            }
        }
    }
}
