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
use std::fmt;

use super::handle::SourceHandle;

/// Voice names are stored inline, NUL terminated.
pub const VOICE_NAME_CAPACITY: usize = 64;

/// A fixed-size voice name. Longer names are cut at a character boundary.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VoiceName {
    bytes: [u8; VOICE_NAME_CAPACITY],
    len: u8,
}

impl VoiceName {
    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(VOICE_NAME_CAPACITY - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0u8; VOICE_NAME_CAPACITY];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or_default()
    }

    /// The raw buffer including the terminator and padding.
    pub fn as_bytes_with_nul(&self) -> &[u8; VOICE_NAME_CAPACITY] {
        &self.bytes
    }
}

impl Default for VoiceName {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear volume ramp between two frame positions. Frames before the start
/// use the start volume, frames past the end use the end volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMap {
    pub start_frame: i64,
    pub end_frame: i64,
    pub start_volume: f32,
    pub end_volume: f32,
}

impl VolumeMap {
    pub fn volume_at(&self, frame: i64) -> f32 {
        if frame <= self.start_frame {
            return self.start_volume;
        }
        if frame >= self.end_frame {
            return self.end_volume;
        }
        let t = (frame - self.start_frame) as f32 / (self.end_frame - self.start_frame) as f32;
        self.start_volume + (self.end_volume - self.start_volume) * t
    }
}

/// Playback state of one live voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub source: SourceHandle,
    pub name: VoiceName,
    pub volume: f32,
    /// May be negative, in which case the voice plays silence until it
    /// reaches frame zero.
    pub frame_position: i64,
    pub playing: bool,
    pub looping: bool,
    pub play_past_end: bool,
    pub remove_on_end: bool,
    pub pause_on_end: bool,
    pub volume_map: Option<VolumeMap>,
}

impl Voice {
    pub fn new(
        source: SourceHandle,
        name: &str,
        playing: bool,
        volume: f32,
        play_past_end: bool,
    ) -> Self {
        Self {
            source,
            name: VoiceName::new(name),
            volume,
            frame_position: 0,
            playing,
            looping: false,
            play_past_end,
            remove_on_end: false,
            pause_on_end: false,
            volume_map: None,
        }
    }

    /// The effective gain for the given frame.
    pub fn gain_at(&self, frame: i64) -> f32 {
        match &self.volume_map {
            Some(map) => self.volume * map.volume_at(frame),
            None => self.volume,
        }
    }
}

/// One slot of the voice pool.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum VoiceSlot {
    #[default]
    Dead,
    Alive(Voice),
}

impl VoiceSlot {
    pub fn is_alive(&self) -> bool {
        matches!(self, VoiceSlot::Alive(_))
    }

    pub fn voice(&self) -> Option<&Voice> {
        match self {
            VoiceSlot::Alive(voice) => Some(voice),
            VoiceSlot::Dead => None,
        }
    }

    pub fn voice_mut(&mut self) -> Option<&mut Voice> {
        match self {
            VoiceSlot::Alive(voice) => Some(voice),
            VoiceSlot::Dead => None,
        }
    }
}
