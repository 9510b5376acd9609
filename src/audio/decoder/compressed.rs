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

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::warn;

use super::error::DecoderError;
use super::{Decoder, DecoderOutput};

/// Decodes a whole compressed file through symphonia's probe and codec
/// registries. One instance exists per registered format so that extension
/// matching stays per format.
pub struct SymphoniaDecoder {
    name: &'static str,
    extensions: &'static [&'static str],
}

impl SymphoniaDecoder {
    pub(crate) const fn new(name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self { name, extensions }
    }

    /// FLAC, native or in an Ogg container.
    pub const fn flac() -> Self {
        Self::new("flac", &["flac"])
    }

    /// MPEG-1/2 layer III.
    pub const fn mp3() -> Self {
        Self::new("mp3", &["mp3"])
    }

    /// Ogg Vorbis.
    pub const fn vorbis() -> Self {
        Self::new("vorbis", &["ogg", "oga"])
    }
}

impl Decoder for SymphoniaDecoder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecoderOutput, DecoderError> {
        if bytes.is_empty() {
            return Err(DecoderError::EmptyInput);
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
        let mut hint = Hint::new();
        if let Some(extension) = self.extensions.first() {
            hint.with_extension(extension);
        }

        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoAudioTrack)?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let mut sample_rate = params.sample_rate;
        let mut channel_count = params.channels.map(|c| c.count() as u32);
        let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;

        let mut samples: Vec<i16> = Vec::new();
        if let (Some(frames), Some(channels)) = (params.n_frames, channel_count) {
            samples.reserve(frames as usize * channels as usize);
        }

        let mut sample_buffer: Option<SampleBuffer<i16>> = None;
        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(err)) => {
                    warn!(decoder = self.name, err, "Skipping undecodable packet");
                    continue;
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();
            let needed = capacity * spec.channels.count();
            sample_rate.get_or_insert(spec.rate);
            channel_count.get_or_insert(spec.channels.count() as u32);

            if sample_buffer
                .as_ref()
                .map_or(true, |buffer| buffer.capacity() < needed)
            {
                sample_buffer = Some(SampleBuffer::new(capacity as u64, spec));
            }
            if let Some(buffer) = sample_buffer.as_mut() {
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
        }

        let channel_count = channel_count.ok_or(DecoderError::MissingParameter("channels"))?;
        let sample_rate = sample_rate.ok_or(DecoderError::MissingParameter("sample rate"))?;
        if channel_count == 0 {
            return Err(DecoderError::MissingParameter("channels"));
        }

        Ok(DecoderOutput {
            channel_count,
            sample_rate,
            samples,
        })
    }
}
