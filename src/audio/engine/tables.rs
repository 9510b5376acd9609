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
use std::sync::Arc;

use super::handle::{SourceHandle, VoiceHandle};
use super::voice::{Voice, VoiceSlot};
use crate::audio::{
    channel_mixer::{ChannelMixer, MixingBehavior},
    sample_mixer::mix_into,
    sample_provider::SampleProvider,
    MAX_BUFFER_FRAME_COUNT, MAX_SIMULTANEOUS_VOICES, OUTPUT_CHANNEL_COUNT,
};

const INITIAL_SOURCE_CAPACITY: usize = 64;

/// Everything the mix callback and the table-mutating operations share.
/// Always accessed under the engine's table mutex.
pub(super) struct Tables {
    pub voices: [VoiceSlot; MAX_SIMULTANEOUS_VOICES],
    pub sources: Vec<Option<Arc<dyn SampleProvider>>>,
    pub channel_mixer: ChannelMixer,
    voice_buffer: Vec<i16>,
}

/// Source channel count the downmix scratch buffer is sized for up front.
/// Wider sources grow it on first use.
const MAX_PREALLOCATED_SOURCE_CHANNELS: usize = 8;

impl Tables {
    pub fn new(behavior: MixingBehavior) -> Self {
        let chunk_samples = MAX_BUFFER_FRAME_COUNT * OUTPUT_CHANNEL_COUNT as usize;
        Self {
            voices: [VoiceSlot::Dead; MAX_SIMULTANEOUS_VOICES],
            sources: Vec::with_capacity(INITIAL_SOURCE_CAPACITY),
            channel_mixer: ChannelMixer::new(
                OUTPUT_CHANNEL_COUNT,
                behavior,
                MAX_BUFFER_FRAME_COUNT * MAX_PREALLOCATED_SOURCE_CHANNELS,
            ),
            voice_buffer: vec![0; chunk_samples],
        }
    }

    pub fn source(&self, handle: SourceHandle) -> Option<&Arc<dyn SampleProvider>> {
        handle
            .index()
            .and_then(|index| self.sources.get(index))
            .and_then(Option::as_ref)
    }

    /// Puts the provider in the first free slot, growing the table if
    /// there is none.
    pub fn insert_source(&mut self, provider: Arc<dyn SampleProvider>) -> SourceHandle {
        if let Some(index) = self.sources.iter().position(Option::is_none) {
            self.sources[index] = Some(provider);
            return SourceHandle::from_index(index);
        }

        let handle = SourceHandle::from_index(self.sources.len());
        if handle.is_valid() {
            self.sources.push(Some(provider));
        }
        handle
    }

    /// Clears the slot and detaches every voice that referenced it. Returns
    /// the provider, which stays alive for anyone else holding it.
    pub fn remove_source(&mut self, handle: SourceHandle) -> Option<Arc<dyn SampleProvider>> {
        let provider = self.sources.get_mut(handle.index()?)?.take()?;
        for voice in self.voices.iter_mut().filter_map(VoiceSlot::voice_mut) {
            if voice.source == handle {
                voice.source = SourceHandle::INVALID;
            }
        }
        Some(provider)
    }

    pub fn insert_voice(&mut self, voice: Voice) -> VoiceHandle {
        match self.voices.iter().position(|slot| !slot.is_alive()) {
            Some(index) => {
                self.voices[index] = VoiceSlot::Alive(voice);
                VoiceHandle::from_index(index)
            }
            None => VoiceHandle::INVALID,
        }
    }

    pub fn remove_voice(&mut self, handle: VoiceHandle) {
        if let Some(slot) = handle.index().and_then(|index| self.voices.get_mut(index)) {
            *slot = VoiceSlot::Dead;
        }
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.voices.get(handle.index()?)?.voice()
    }

    pub fn voice_mut(&mut self, handle: VoiceHandle) -> Option<&mut Voice> {
        self.voices.get_mut(handle.index()?)?.voice_mut()
    }

    /// The source attached to a live voice.
    pub fn voice_source(&self, handle: VoiceHandle) -> Option<&Arc<dyn SampleProvider>> {
        self.source(self.voice(handle)?.source)
    }

    /// Mixes every playing voice into `output`, which holds at most
    /// `MAX_BUFFER_FRAME_COUNT` interleaved output frames.
    ///
    /// End-of-stream policy is checked before the playing flag: a voice that
    /// is already past its end with `remove_on_end` set is removed without
    /// being mixed, and one with `pause_on_end` is paused. A voice that
    /// reaches its end during this call is handled after its last frames
    /// are mixed.
    pub fn mix_voices(&mut self, output: &mut [i16]) {
        let channels = OUTPUT_CHANNEL_COUNT as usize;
        let frames = (output.len() / channels).min(MAX_BUFFER_FRAME_COUNT);
        let samples = frames * channels;
        let Tables {
            voices,
            sources,
            channel_mixer,
            voice_buffer,
        } = self;

        for slot in voices.iter_mut() {
            let VoiceSlot::Alive(voice) = slot else {
                continue;
            };

            let source = voice
                .source
                .index()
                .and_then(|index| sources.get(index))
                .and_then(Option::as_ref);
            let frame_count = source.map_or(0, |source| source.frame_count());
            let reached_end = source.is_some() && voice.frame_position >= frame_count;

            if !voice.play_past_end && voice.remove_on_end && reached_end {
                *slot = VoiceSlot::Dead;
                continue;
            }
            if voice.pause_on_end && reached_end {
                voice.playing = false;
                continue;
            }
            if !voice.playing {
                continue;
            }

            let Some(source) = source else {
                // Placeholder voices keep time without producing sound.
                voice.frame_position += frames as i64;
                continue;
            };
            if reached_end && !voice.play_past_end {
                voice.frame_position = if voice.looping { 0 } else { frame_count };
            }

            let buffer = &mut voice_buffer[..samples];
            let start_position = voice.frame_position;
            let frames_read = if source.channel_count() == OUTPUT_CHANNEL_COUNT {
                source.read_samples(buffer, start_position, frames as i64, OUTPUT_CHANNEL_COUNT)
            } else {
                channel_mixer.mix_channels(&**source, buffer, start_position, frames as i64)
            };
            voice.frame_position += frames_read;

            let mixed = (frames_read.max(0) as usize * channels).min(samples);
            match voice.volume_map {
                None => mix_into(&mut output[..mixed], &buffer[..mixed], voice.volume),
                Some(_) => {
                    for (frame, (out, src)) in output[..mixed]
                        .chunks_exact_mut(channels)
                        .zip(buffer[..mixed].chunks_exact(channels))
                        .enumerate()
                    {
                        mix_into(out, src, voice.gain_at(start_position + frame as i64));
                    }
                }
            }

            if voice.frame_position >= frame_count && !voice.play_past_end {
                if voice.remove_on_end {
                    *slot = VoiceSlot::Dead;
                } else if voice.pause_on_end {
                    voice.frame_position = frame_count;
                    voice.playing = false;
                } else if voice.looping {
                    voice.frame_position = 0;
                } else {
                    voice.frame_position = frame_count;
                }
            }
        }
    }

    /// True when no live voice is playing a source it hasn't finished.
    pub fn all_voices_idle(&self) -> bool {
        self.voices
            .iter()
            .filter_map(VoiceSlot::voice)
            .all(|voice| {
                if !voice.playing {
                    return true;
                }
                match self.source(voice.source) {
                    Some(source) => {
                        !voice.looping
                            && !voice.play_past_end
                            && voice.frame_position >= source.frame_count()
                    }
                    None => true,
                }
            })
    }
}
