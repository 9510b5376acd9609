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
use std::{
    sync::atomic::{AtomicI16, AtomicU64, AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::audio::{CALLBACK_DURATION_RING_BUFFER_SIZE, LAST_PLAYED_SAMPLES_RING_FRAME_COUNT};

/// Profiling and visualization state written by the audio thread.
///
/// The rings are plain atomics with relaxed ordering: readers may see a
/// ring mid-update, which only affects what gets displayed.
pub(super) struct Diagnostics {
    channels: usize,
    epoch: Instant,
    last_callback_nanos: AtomicU64,
    callback_period_nanos: AtomicU64,
    durations: [AtomicU64; CALLBACK_DURATION_RING_BUFFER_SIZE],
    duration_index: AtomicUsize,
    last_played: Box<[AtomicI16]>,
    last_played_index: AtomicUsize,
    capture: Mutex<Capture>,
}

struct Capture {
    enabled: bool,
    reserve: usize,
    samples: Vec<i16>,
}

impl Diagnostics {
    pub fn new(channels: usize, capture_reserve_samples: usize) -> Self {
        Self {
            channels,
            epoch: Instant::now(),
            last_callback_nanos: AtomicU64::new(0),
            callback_period_nanos: AtomicU64::new(0),
            durations: std::array::from_fn(|_| AtomicU64::new(0)),
            duration_index: AtomicUsize::new(0),
            last_played: (0..LAST_PLAYED_SAMPLES_RING_FRAME_COUNT * channels)
                .map(|_| AtomicI16::new(0))
                .collect(),
            last_played_index: AtomicUsize::new(0),
            capture: Mutex::new(Capture {
                enabled: false,
                reserve: capture_reserve_samples,
                samples: Vec::new(),
            }),
        }
    }

    /// Records the start of a callback and the time since the previous one.
    pub fn record_callback_start(&self, now: Instant) {
        // Offset by one so that zero means "no callback yet".
        let nanos = now.duration_since(self.epoch).as_nanos() as u64 + 1;
        let previous = self.last_callback_nanos.swap(nanos, Ordering::Relaxed);
        if previous != 0 {
            self.callback_period_nanos
                .store(nanos.saturating_sub(previous), Ordering::Relaxed);
        }
    }

    pub fn callback_frequency(&self) -> Duration {
        Duration::from_nanos(self.callback_period_nanos.load(Ordering::Relaxed))
    }

    pub fn record_duration(&self, duration: Duration) {
        let index = self.duration_index.fetch_add(1, Ordering::Relaxed);
        self.durations[index % CALLBACK_DURATION_RING_BUFFER_SIZE]
            .store(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Callback durations, oldest first.
    pub fn callback_durations(&self) -> Vec<Duration> {
        let next = self.duration_index.load(Ordering::Relaxed);
        (0..CALLBACK_DURATION_RING_BUFFER_SIZE)
            .map(|offset| {
                let slot = (next + offset) % CALLBACK_DURATION_RING_BUFFER_SIZE;
                Duration::from_nanos(self.durations[slot].load(Ordering::Relaxed))
            })
            .collect()
    }

    /// Copies the final output into the last-played ring and, if enabled,
    /// the capture buffer.
    pub fn record_output(&self, output: &[i16]) {
        if self.channels == 0 {
            return;
        }
        for frame in output.chunks_exact(self.channels) {
            let index = self.last_played_index.fetch_add(1, Ordering::Relaxed)
                % LAST_PLAYED_SAMPLES_RING_FRAME_COUNT;
            let base = index * self.channels;
            for (channel, &sample) in frame.iter().enumerate() {
                self.last_played[base + channel].store(sample, Ordering::Relaxed);
            }
        }

        let mut capture = self.capture.lock();
        if capture.enabled {
            capture.samples.extend_from_slice(output);
        }
    }

    /// Last played samples of one channel, oldest first.
    pub fn last_played_samples(&self, channel: usize) -> Vec<i16> {
        if channel >= self.channels {
            return Vec::new();
        }
        let next = self.last_played_index.load(Ordering::Relaxed);
        (0..LAST_PLAYED_SAMPLES_RING_FRAME_COUNT)
            .map(|offset| {
                let frame = (next + offset) % LAST_PLAYED_SAMPLES_RING_FRAME_COUNT;
                self.last_played[frame * self.channels + channel].load(Ordering::Relaxed)
            })
            .collect()
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture.lock().enabled
    }

    pub fn set_capture_enabled(&self, enabled: bool) {
        let mut capture = self.capture.lock();
        if enabled && !capture.enabled {
            let additional = capture.reserve.saturating_sub(capture.samples.len());
            capture.samples.reserve(additional);
        }
        capture.enabled = enabled;
    }

    /// Takes everything captured so far, leaving the capture empty.
    pub fn take_capture(&self) -> Vec<i16> {
        std::mem::take(&mut self.capture.lock().samples)
    }
}
