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
use std::time::Duration;

use super::{
    handle::{SourceHandle, VoiceHandle},
    voice::VolumeMap,
    AudioEngine,
};
use crate::audio::{MAX_VOLUME, MIN_VOLUME, OUTPUT_SAMPLE_RATE};
use crate::util::{duration_to_frames, frames_to_duration};

/// A borrowed view of one voice.
///
/// Times convert to frames at the attached source's sample rate, or at the
/// output rate when there is no source.
#[derive(Clone, Copy)]
pub struct VoiceRef<'a> {
    engine: &'a AudioEngine,
    handle: VoiceHandle,
}

impl<'a> VoiceRef<'a> {
    pub(super) fn new(engine: &'a AudioEngine, handle: VoiceHandle) -> Self {
        Self { engine, handle }
    }

    pub fn handle(&self) -> VoiceHandle {
        self.handle
    }

    /// True while the handle refers to a live voice.
    pub fn is_valid(&self) -> bool {
        self.engine.with_voice(self.handle, |_, _| ()).is_some()
    }

    pub fn name(&self) -> String {
        self.engine
            .with_voice(self.handle, |voice, _| voice.name.to_string())
            .unwrap_or_default()
    }

    pub fn volume(&self) -> f32 {
        self.engine
            .with_voice(self.handle, |voice, _| voice.volume)
            .unwrap_or(MIN_VOLUME)
    }

    pub fn set_volume(&self, volume: f32) {
        self.engine.with_voice_mut(self.handle, |voice, _| {
            voice.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        });
    }

    pub fn source(&self) -> SourceHandle {
        self.engine
            .with_voice(self.handle, |voice, _| voice.source)
            .unwrap_or(SourceHandle::INVALID)
    }

    pub fn set_source(&self, source: SourceHandle) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.source = source);
    }

    /// Length of the attached source, or zero.
    pub fn duration(&self) -> Duration {
        self.engine
            .with_voice(self.handle, |_, source| {
                source.map_or(Duration::ZERO, |source| source.duration())
            })
            .unwrap_or(Duration::ZERO)
    }

    pub fn frame_position(&self) -> i64 {
        self.engine
            .with_voice(self.handle, |voice, _| voice.frame_position)
            .unwrap_or(0)
    }

    pub fn set_frame_position(&self, frame: i64) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.frame_position = frame);
    }

    /// Playback position. Negative frame positions read as zero.
    pub fn position(&self) -> Duration {
        self.engine
            .with_voice(self.handle, |voice, source| {
                let sample_rate = source.map_or(OUTPUT_SAMPLE_RATE, |source| source.sample_rate());
                frames_to_duration(voice.frame_position, sample_rate)
            })
            .unwrap_or(Duration::ZERO)
    }

    pub fn set_position(&self, position: Duration) {
        self.engine.with_voice_mut(self.handle, |voice, sample_rate| {
            voice.frame_position = duration_to_frames(position, sample_rate);
        });
    }

    pub fn is_playing(&self) -> bool {
        self.flag(|voice| voice.playing)
    }

    pub fn set_playing(&self, playing: bool) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.playing = playing);
    }

    pub fn is_looping(&self) -> bool {
        self.flag(|voice| voice.looping)
    }

    pub fn set_looping(&self, looping: bool) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.looping = looping);
    }

    pub fn play_past_end(&self) -> bool {
        self.flag(|voice| voice.play_past_end)
    }

    pub fn set_play_past_end(&self, play_past_end: bool) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.play_past_end = play_past_end);
    }

    pub fn remove_on_end(&self) -> bool {
        self.flag(|voice| voice.remove_on_end)
    }

    pub fn set_remove_on_end(&self, remove_on_end: bool) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.remove_on_end = remove_on_end);
    }

    pub fn pause_on_end(&self) -> bool {
        self.flag(|voice| voice.pause_on_end)
    }

    pub fn set_pause_on_end(&self, pause_on_end: bool) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.pause_on_end = pause_on_end);
    }

    /// Ramps the voice volume linearly from `start_volume` at `start` to
    /// `end_volume` at `end`. The ramp multiplies the voice volume.
    pub fn set_volume_map(
        &self,
        start: Duration,
        end: Duration,
        start_volume: f32,
        end_volume: f32,
    ) {
        self.engine.with_voice_mut(self.handle, |voice, sample_rate| {
            voice.volume_map = Some(VolumeMap {
                start_frame: duration_to_frames(start, sample_rate),
                end_frame: duration_to_frames(end, sample_rate),
                start_volume: start_volume.clamp(MIN_VOLUME, MAX_VOLUME),
                end_volume: end_volume.clamp(MIN_VOLUME, MAX_VOLUME),
            });
        });
    }

    pub fn reset_volume_map(&self) {
        self.engine
            .with_voice_mut(self.handle, |voice, _| voice.volume_map = None);
    }

    fn flag(&self, get: impl FnOnce(&super::Voice) -> bool) -> bool {
        self.engine
            .with_voice(self.handle, |voice, _| get(voice))
            .unwrap_or(false)
    }
}
