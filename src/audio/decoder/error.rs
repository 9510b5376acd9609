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
/// Error types for decoding audio files
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid signature, expected {0:?}")]
    InvalidSignature(&'static str),

    #[error("Unsupported version {0:#010x}")]
    UnsupportedVersion(u32),

    #[error("Truncated data: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("Unsupported predictor row {0}")]
    UnsupportedPredictor(usize),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Stream parameter not specified: {0}")]
    MissingParameter(&'static str),

    #[error("No decoder registered for {0}")]
    NoMatchingDecoder(String),

    #[error("Input is empty")]
    EmptyInput,

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),

    #[error("Audio file error: {0}")]
    AudioError(#[from] symphonia::core::errors::Error),

    #[error("Resampling error: {0}")]
    ResampleError(#[from] crate::audio::resample::ResampleError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
