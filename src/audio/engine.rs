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
//! The mixing engine: a fixed voice pool over a growable source table,
//! driven by an output stream's callback.

use std::{
    mem,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

mod diagnostics;
mod error;
mod handle;
mod pending;
mod tables;
mod voice;
mod voice_ref;

#[cfg(test)]
mod tests;

pub use error::EngineError;
pub use handle::{ReceiverHandle, SourceHandle, VoiceHandle};
pub use pending::PendingSource;
pub use voice::{Voice, VoiceName, VoiceSlot, VolumeMap, VOICE_NAME_CAPACITY};
pub use voice_ref::VoiceRef;

use self::{diagnostics::Diagnostics, tables::Tables};
use super::{
    channel_mixer::MixingBehavior,
    decoder::DecoderFactory,
    resample::ResampleQuality,
    sample_mixer::apply_gain,
    sample_provider::SampleProvider,
    stream::{OutputStream, Renderer, StreamConfig, StreamMode},
    wav::write_wav_file,
    Device, MAX_BUFFER_FRAME_COUNT, MAX_VOLUME, MIN_BUFFER_FRAME_COUNT, MIN_VOLUME,
    OUTPUT_CHANNEL_COUNT, OUTPUT_SAMPLE_RATE,
};
use crate::util::filename_display;

/// Called at the start of every audio callback, before mixing.
pub type CallbackReceiver = Arc<dyn Fn() + Send + Sync>;

/// Initial engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub stream_mode: StreamMode,
    pub buffer_frame_size: usize,
    pub master_volume: f32,
    pub channel_mixing: MixingBehavior,
    pub resample_quality: ResampleQuality,
    /// Output capture pre-reserves this much audio when enabled.
    pub capture_reserve: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stream_mode: StreamMode::default(),
            buffer_frame_size: super::DEFAULT_BUFFER_FRAME_COUNT,
            master_volume: MAX_VOLUME,
            channel_mixing: MixingBehavior::default(),
            resample_quality: ResampleQuality::default(),
            capture_reserve: Duration::from_secs(60),
        }
    }
}

/// State shared with the audio thread.
struct Shared {
    tables: Mutex<Tables>,
    master_volume: AtomicU32,
    receivers: RwLock<Vec<Option<CallbackReceiver>>>,
    diagnostics: Diagnostics,
}

impl Shared {
    fn master_volume(&self) -> f32 {
        f32::from_bits(self.master_volume.load(Ordering::Relaxed))
    }

    fn render(&self, output: &mut [i16]) {
        let started = Instant::now();
        self.diagnostics.record_callback_start(started);

        for receiver in self.receivers.read().iter().flatten() {
            receiver();
        }

        output.fill(0);
        let chunk_samples = MAX_BUFFER_FRAME_COUNT * OUTPUT_CHANNEL_COUNT as usize;
        {
            let mut tables = self.tables.lock();
            for chunk in output.chunks_mut(chunk_samples) {
                tables.mix_voices(chunk);
            }
        }

        apply_gain(output, self.master_volume());
        self.diagnostics.record_output(output);
        self.diagnostics.record_duration(started.elapsed());
    }
}

enum StreamState {
    Closed,
    Open(Box<dyn OutputStream>),
    Running(Box<dyn OutputStream>),
}

struct StreamControl {
    state: StreamState,
    mode: StreamMode,
    buffer_frames: usize,
}

/// The audio engine.
pub struct AudioEngine {
    shared: Arc<Shared>,
    device: Arc<dyn Device>,
    stream: Mutex<StreamControl>,
    decoders: Arc<DecoderFactory>,
}

impl AudioEngine {
    /// Creates an engine on the given device. No stream is opened until
    /// `open_stream` or `ensure_stream_running` is called.
    pub fn new(device: Arc<dyn Device>, settings: EngineSettings) -> Self {
        let channels = OUTPUT_CHANNEL_COUNT as usize;
        let capture_reserve_samples =
            (settings.capture_reserve.as_secs_f64() * f64::from(OUTPUT_SAMPLE_RATE)) as usize
                * channels;

        let shared = Arc::new(Shared {
            tables: Mutex::new(Tables::new(settings.channel_mixing)),
            master_volume: AtomicU32::new(
                settings.master_volume.clamp(MIN_VOLUME, MAX_VOLUME).to_bits(),
            ),
            receivers: RwLock::new(Vec::new()),
            diagnostics: Diagnostics::new(channels, capture_reserve_samples),
        });

        AudioEngine {
            shared,
            device,
            stream: Mutex::new(StreamControl {
                state: StreamState::Closed,
                mode: settings.stream_mode,
                buffer_frames: clamp_buffer_frames(settings.buffer_frame_size),
            }),
            decoders: Arc::new(
                DecoderFactory::new().with_resample_quality(settings.resample_quality),
            ),
        }
    }

    /// Creates an engine from a configuration file's settings.
    pub fn from_config(config: &crate::config::Engine) -> Result<Self, EngineError> {
        let device = super::get_device(config.device())?;
        Ok(Self::new(device, config.settings()?))
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn decoders(&self) -> &DecoderFactory {
        &self.decoders
    }

    pub fn channel_count(&self) -> u32 {
        OUTPUT_CHANNEL_COUNT
    }

    pub fn sample_rate(&self) -> u32 {
        OUTPUT_SAMPLE_RATE
    }

    /// Fills `output` with the next interleaved buffer. This is what the
    /// output stream calls from the audio thread.
    pub fn render(&self, output: &mut [i16]) {
        self.shared.render(output);
    }

    fn renderer(&self) -> Renderer {
        let shared = self.shared.clone();
        Arc::new(move |output: &mut [i16]| shared.render(output))
    }

    // Stream lifecycle.

    pub fn open_stream(&self) -> Result<(), EngineError> {
        let mut control = self.stream.lock();
        self.open_locked(&mut control)
    }

    pub fn close_stream(&self) {
        let mut control = self.stream.lock();
        self.close_locked(&mut control);
    }

    pub fn start_stream(&self) -> Result<(), EngineError> {
        let mut control = self.stream.lock();
        self.start_locked(&mut control)
    }

    pub fn stop_stream(&self) -> Result<(), EngineError> {
        let mut control = self.stream.lock();
        self.stop_locked(&mut control)
    }

    /// Opens and starts the stream as needed.
    pub fn ensure_stream_running(&self) -> Result<(), EngineError> {
        let mut control = self.stream.lock();
        self.open_locked(&mut control)?;
        self.start_locked(&mut control)
    }

    pub fn is_stream_open(&self) -> bool {
        !matches!(self.stream.lock().state, StreamState::Closed)
    }

    pub fn is_stream_running(&self) -> bool {
        matches!(self.stream.lock().state, StreamState::Running(_))
    }

    pub fn buffer_frame_size(&self) -> usize {
        self.stream.lock().buffer_frames
    }

    /// Sets the buffer size, clamped to the supported range. An open stream
    /// is reopened with the new size and restarted if it was running.
    pub fn set_buffer_frame_size(&self, frames: usize) -> Result<(), EngineError> {
        let frames = clamp_buffer_frames(frames);
        self.reconfigure(|control| control.buffer_frames = frames)
    }

    pub fn stream_mode(&self) -> StreamMode {
        self.stream.lock().mode
    }

    /// Switches between shared and exclusive mode, reopening as needed.
    pub fn set_stream_mode(&self, mode: StreamMode) -> Result<(), EngineError> {
        self.reconfigure(|control| control.mode = mode)
    }

    fn reconfigure(&self, update: impl FnOnce(&mut StreamControl)) -> Result<(), EngineError> {
        let mut control = self.stream.lock();
        let was_open = !matches!(control.state, StreamState::Closed);
        let was_running = matches!(control.state, StreamState::Running(_));

        self.close_locked(&mut control);
        update(&mut control);

        if was_open {
            self.open_locked(&mut control)?;
        }
        if was_running {
            self.start_locked(&mut control)?;
        }
        Ok(())
    }

    fn open_locked(&self, control: &mut StreamControl) -> Result<(), EngineError> {
        if !matches!(control.state, StreamState::Closed) {
            return Ok(());
        }

        let config = StreamConfig {
            channels: OUTPUT_CHANNEL_COUNT,
            sample_rate: OUTPUT_SAMPLE_RATE,
            buffer_frames: control.buffer_frames,
            mode: control.mode,
        };
        match self.device.open_stream(config, self.renderer()) {
            Ok(stream) => {
                control.state = StreamState::Open(stream);
                Ok(())
            }
            Err(e) => {
                error!(device = %self.device, err = %e, "Unable to open output stream");
                Err(e.into())
            }
        }
    }

    fn close_locked(&self, control: &mut StreamControl) {
        if let StreamState::Running(mut stream) =
            mem::replace(&mut control.state, StreamState::Closed)
        {
            if let Err(e) = stream.stop() {
                warn!(device = %self.device, err = %e, "Unable to stop stream before closing");
            }
        }
    }

    fn start_locked(&self, control: &mut StreamControl) -> Result<(), EngineError> {
        match mem::replace(&mut control.state, StreamState::Closed) {
            StreamState::Open(mut stream) => match stream.start() {
                Ok(()) => {
                    control.state = StreamState::Running(stream);
                    Ok(())
                }
                Err(e) => {
                    error!(device = %self.device, err = %e, "Unable to start output stream");
                    control.state = StreamState::Open(stream);
                    Err(e.into())
                }
            },
            other => {
                control.state = other;
                Ok(())
            }
        }
    }

    fn stop_locked(&self, control: &mut StreamControl) -> Result<(), EngineError> {
        match mem::replace(&mut control.state, StreamState::Closed) {
            StreamState::Running(mut stream) => match stream.stop() {
                Ok(()) => {
                    control.state = StreamState::Open(stream);
                    Ok(())
                }
                Err(e) => {
                    error!(device = %self.device, err = %e, "Unable to stop output stream");
                    control.state = StreamState::Running(stream);
                    Err(e.into())
                }
            },
            other => {
                control.state = other;
                Ok(())
            }
        }
    }

    // Volume and mixing.

    pub fn master_volume(&self) -> f32 {
        self.shared.master_volume()
    }

    pub fn set_master_volume(&self, volume: f32) {
        let volume = if volume.is_nan() {
            MIN_VOLUME
        } else {
            volume.clamp(MIN_VOLUME, MAX_VOLUME)
        };
        self.shared
            .master_volume
            .store(volume.to_bits(), Ordering::Relaxed);
    }

    pub fn channel_mixing_behavior(&self) -> MixingBehavior {
        self.shared.tables.lock().channel_mixer.behavior()
    }

    pub fn set_channel_mixing_behavior(&self, behavior: MixingBehavior) {
        self.shared.tables.lock().channel_mixer.set_behavior(behavior);
    }

    /// Measured period between the two most recent callbacks.
    pub fn callback_frequency(&self) -> Duration {
        self.shared.diagnostics.callback_frequency()
    }

    // Callback receivers.

    pub fn register_callback_receiver(&self, receiver: CallbackReceiver) -> ReceiverHandle {
        let mut receivers = self.shared.receivers.write();
        match receivers.iter().position(Option::is_none) {
            Some(index) => {
                receivers[index] = Some(receiver);
                ReceiverHandle(index)
            }
            None => {
                receivers.push(Some(receiver));
                ReceiverHandle(receivers.len() - 1)
            }
        }
    }

    pub fn unregister_callback_receiver(&self, handle: ReceiverHandle) {
        if let Some(slot) = self.shared.receivers.write().get_mut(handle.0) {
            *slot = None;
        }
    }

    // Sources.

    /// Decodes the file and adds it to the source table.
    pub fn load_source(&self, path: impl AsRef<Path>) -> SourceHandle {
        let path = path.as_ref();
        match self.decoders.decode_file(path) {
            Some(provider) => self.load_source_from_provider(provider),
            None => SourceHandle::INVALID,
        }
    }

    /// Decodes a file held in memory. The name selects the decoder.
    pub fn load_source_from_memory(&self, file_name: &str, bytes: &[u8]) -> SourceHandle {
        match self.decoders.decode_file_content(file_name, bytes) {
            Some(provider) => self.load_source_from_provider(provider),
            None => SourceHandle::INVALID,
        }
    }

    pub fn load_source_from_wav(&self, bytes: &[u8]) -> SourceHandle {
        match self.decoders.decode_wav(bytes) {
            Some(provider) => self.load_source_from_provider(provider),
            None => SourceHandle::INVALID,
        }
    }

    /// Adds an already decoded provider to the source table.
    pub fn load_source_from_provider(&self, provider: Arc<dyn SampleProvider>) -> SourceHandle {
        let handle = self.shared.tables.lock().insert_source(provider);
        if !handle.is_valid() {
            warn!("Source table is full");
        }
        handle
    }

    /// Decodes on a background thread.
    pub fn load_source_async(&self, path: impl Into<PathBuf>) -> PendingSource {
        let path = path.into();
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let shared = self.shared.clone();
        let decoders = self.decoders.clone();

        let spawned = thread::Builder::new()
            .name("pcmix-loader".to_string())
            .spawn(move || {
                let handle = match decoders.decode_file(&path) {
                    Some(provider) => shared.tables.lock().insert_source(provider),
                    None => SourceHandle::INVALID,
                };
                // The caller may have dropped the pending handle.
                let _ = sender.send(handle);
            });
        if let Err(e) = spawned {
            error!(err = %e, "Unable to spawn loader thread");
        }

        PendingSource::new(receiver)
    }

    /// Removes the source from the table and detaches it from every voice.
    /// Voices and other holders of the provider keep their reference.
    pub fn unload_source(&self, handle: SourceHandle) {
        if !handle.is_valid() {
            return;
        }
        // The provider is dropped outside the table lock.
        let removed = self.shared.tables.lock().remove_source(handle);
        drop(removed);
    }

    /// The provider behind a handle, shared with the table.
    pub fn shared_source(&self, handle: SourceHandle) -> Option<Arc<dyn SampleProvider>> {
        self.shared.tables.lock().source(handle).cloned()
    }

    pub fn loaded_source_count(&self) -> usize {
        self.shared
            .tables
            .lock()
            .sources
            .iter()
            .filter(|source| source.is_some())
            .count()
    }

    // Voices.

    /// Adds a persistent voice. Returns `VoiceHandle::INVALID` when the pool
    /// is full.
    pub fn add_voice(
        &self,
        source: SourceHandle,
        name: &str,
        playing: bool,
        volume: f32,
        play_past_end: bool,
    ) -> VoiceHandle {
        let voice = Voice::new(source, name, playing, volume, play_past_end);
        let handle = self.shared.tables.lock().insert_voice(voice);
        if !handle.is_valid() {
            warn!(name, "No free voice slot");
        }
        handle
    }

    pub fn remove_voice(&self, handle: VoiceHandle) {
        self.shared.tables.lock().remove_voice(handle);
    }

    /// Plays a source once; the voice removes itself at the end.
    pub fn play_sound(&self, source: SourceHandle, name: &str, volume: f32) -> VoiceHandle {
        let mut voice = Voice::new(source, name, true, volume, false);
        voice.remove_on_end = true;
        let handle = self.shared.tables.lock().insert_voice(voice);
        if !handle.is_valid() {
            warn!(name, "No free voice slot");
        }
        handle
    }

    /// A view of one voice. Accessors on an invalid or dead handle read
    /// defaults and ignore writes.
    pub fn voice(&self, handle: VoiceHandle) -> VoiceRef<'_> {
        VoiceRef::new(self, handle)
    }

    pub fn all_voices_are_idle(&self) -> bool {
        self.shared.tables.lock().all_voices_idle()
    }

    fn with_voice<R>(
        &self,
        handle: VoiceHandle,
        f: impl FnOnce(&Voice, Option<&Arc<dyn SampleProvider>>) -> R,
    ) -> Option<R> {
        let tables = self.shared.tables.lock();
        let voice = tables.voice(handle)?;
        Some(f(voice, tables.source(voice.source)))
    }

    fn with_voice_mut<R>(
        &self,
        handle: VoiceHandle,
        f: impl FnOnce(&mut Voice, u32) -> R,
    ) -> Option<R> {
        let mut tables = self.shared.tables.lock();
        let sample_rate = tables
            .voice_source(handle)
            .map_or(OUTPUT_SAMPLE_RATE, |source| source.sample_rate());
        tables.voice_mut(handle).map(|voice| f(voice, sample_rate))
    }

    // Debug.

    pub fn debug_all_voices(&self) -> Vec<(VoiceHandle, Voice)> {
        self.shared
            .tables
            .lock()
            .voices
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.voice()
                    .map(|voice| (VoiceHandle::from_index(index), *voice))
            })
            .collect()
    }

    /// Recent callback durations, oldest first.
    pub fn debug_callback_durations(&self) -> Vec<Duration> {
        self.shared.diagnostics.callback_durations()
    }

    /// Recently played samples of one output channel, oldest first.
    pub fn debug_last_played_samples(&self, channel: usize) -> Vec<i16> {
        self.shared.diagnostics.last_played_samples(channel)
    }

    pub fn debug_output_capture_enabled(&self) -> bool {
        self.shared.diagnostics.capture_enabled()
    }

    pub fn debug_set_output_capture_enabled(&self, enabled: bool) {
        self.shared.diagnostics.set_capture_enabled(enabled);
    }

    /// Writes everything captured so far to a WAV file and clears the
    /// capture.
    pub fn debug_flush_capture_to_wav_file(&self, path: &Path) -> Result<(), EngineError> {
        let samples = self.shared.diagnostics.take_capture();
        if let Err(e) = write_wav_file(path, &samples, OUTPUT_SAMPLE_RATE, OUTPUT_CHANNEL_COUNT) {
            error!(file = %filename_display(path), err = %e, "Unable to write capture");
            return Err(e.into());
        }
        info!(
            file = %filename_display(path),
            frames = samples.len() / OUTPUT_CHANNEL_COUNT as usize,
            "Wrote output capture"
        );
        Ok(())
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let state = mem::replace(&mut self.stream.get_mut().state, StreamState::Closed);
        if let StreamState::Running(mut stream) = state {
            let _ = stream.stop();
        }
    }
}

fn clamp_buffer_frames(frames: usize) -> usize {
    frames.clamp(MIN_BUFFER_FRAME_COUNT, MAX_BUFFER_FRAME_COUNT)
}
