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
    error::Error,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use tempfile::tempdir;

use super::*;
use crate::audio::{
    mock, BackendError, Device, MemorySampleProvider, CALLBACK_DURATION_RING_BUFFER_SIZE,
    DEFAULT_BUFFER_FRAME_COUNT, LAST_PLAYED_SAMPLES_RING_FRAME_COUNT, MAX_SIMULTANEOUS_VOICES,
};
use crate::testutil::{eventually, write_wav, write_wav_with_bits};

fn engine() -> AudioEngine {
    AudioEngine::new(
        Arc::new(mock::Device::get("mock")),
        EngineSettings::default(),
    )
}

fn mock_engine(settings: EngineSettings) -> (AudioEngine, Arc<mock::Device>) {
    let mock = Arc::new(mock::Device::get("mock"));
    let device: Arc<dyn Device> = mock.clone();
    (AudioEngine::new(device, settings), mock)
}

/// A stereo source whose left channel counts frames from 1 and whose right
/// channel is the negated left.
fn counting_source(frames: i16) -> Arc<dyn SampleProvider> {
    let samples = (1..=frames).flat_map(|i| [i * 100, -i * 100]).collect();
    Arc::new(MemorySampleProvider::new(samples, 2, OUTPUT_SAMPLE_RATE))
}

fn constant_source(frames: usize, value: i16) -> Arc<dyn SampleProvider> {
    Arc::new(MemorySampleProvider::new(
        vec![value; frames * 2],
        2,
        OUTPUT_SAMPLE_RATE,
    ))
}

fn render_frames(engine: &AudioEngine, frames: usize) -> Vec<i16> {
    let mut output = vec![0x55i16; frames * OUTPUT_CHANNEL_COUNT as usize];
    engine.render(&mut output);
    output
}

#[test]
fn test_empty_engine_renders_silence() {
    let engine = engine();
    assert_eq!(render_frames(&engine, 16), vec![0; 32]);
    assert!(engine.all_voices_are_idle());
}

#[test]
fn test_voice_pool_capacity_and_reuse() {
    let engine = engine();
    let handles: Vec<VoiceHandle> = (0..MAX_SIMULTANEOUS_VOICES)
        .map(|i| engine.add_voice(SourceHandle::INVALID, &format!("v{i}"), false, 1.0, false))
        .collect();
    assert!(handles.iter().all(|handle| handle.is_valid()));

    let overflow = engine.add_voice(SourceHandle::INVALID, "extra", false, 1.0, false);
    assert!(!overflow.is_valid());

    engine.remove_voice(handles[10]);
    let reused = engine.add_voice(SourceHandle::INVALID, "extra", false, 1.0, false);
    assert_eq!(reused, handles[10]);
    assert_eq!(engine.voice(reused).name(), "extra");
}

#[test]
fn test_removed_voice_is_dead() {
    let engine = engine();
    let handle = engine.add_voice(SourceHandle::INVALID, "gone", true, 1.0, false);
    assert!(engine.voice(handle).is_valid());
    engine.remove_voice(handle);
    assert!(!engine.voice(handle).is_valid());
    assert_eq!(engine.voice(handle).name(), "");
    assert!(engine.debug_all_voices().is_empty());

    // Writes through a dead handle are ignored.
    engine.voice(handle).set_playing(true);
    assert!(!engine.voice(handle).is_playing());
}

#[test]
fn test_single_voice_is_copied_to_output() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(8));
    engine.add_voice(source, "counter", true, 1.0, false);

    let output = render_frames(&engine, 4);
    assert_eq!(output, vec![100, -100, 200, -200, 300, -300, 400, -400]);
    let output = render_frames(&engine, 2);
    assert_eq!(output, vec![500, -500, 600, -600]);
}

#[test]
fn test_paused_voice_is_silent_and_does_not_advance() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(8));
    let handle = engine.add_voice(source, "paused", false, 1.0, false);

    assert_eq!(render_frames(&engine, 4), vec![0; 8]);
    assert_eq!(engine.voice(handle).frame_position(), 0);
}

#[test]
fn test_voices_are_summed_with_saturation() {
    let engine = engine();
    let loud = engine.load_source_from_provider(constant_source(4, 30000));
    let quiet = engine.load_source_from_provider(constant_source(4, 1000));
    engine.add_voice(loud, "a", true, 1.0, false);
    engine.add_voice(loud, "b", true, 1.0, false);
    engine.add_voice(quiet, "c", true, 1.0, false);

    assert_eq!(render_frames(&engine, 2), vec![i16::MAX; 4]);

    let engine = self::engine();
    let quiet = engine.load_source_from_provider(constant_source(4, 1000));
    engine.add_voice(quiet, "a", true, 1.0, false);
    engine.add_voice(quiet, "b", true, 0.5, false);
    assert_eq!(render_frames(&engine, 2), vec![1500; 4]);
}

#[test]
fn test_play_sound_removes_itself_after_last_frame() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(10));
    let handle = engine.play_sound(source, "once", 1.0);
    assert!(engine.voice(handle).remove_on_end());
    engine.voice(handle).set_frame_position(9);

    // Only the final source frame is mixed.
    let output = render_frames(&engine, 4);
    assert_eq!(output, vec![1000, -1000, 0, 0, 0, 0, 0, 0]);
    assert!(!engine.voice(handle).is_valid());
    assert!(engine.all_voices_are_idle());
}

#[test]
fn test_remove_on_end_voice_past_end_is_removed_without_mixing() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(4));
    let handle = engine.add_voice(source, "late", false, 1.0, false);
    engine.voice(handle).set_remove_on_end(true);
    engine.voice(handle).set_frame_position(4);

    // Removal happens even though the voice is not playing.
    assert_eq!(render_frames(&engine, 2), vec![0; 4]);
    assert!(!engine.voice(handle).is_valid());
}

#[test]
fn test_play_past_end_keeps_voice_alive() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(2));
    let handle = engine.add_voice(source, "tail", true, 1.0, true);
    engine.voice(handle).set_remove_on_end(true);

    let output = render_frames(&engine, 4);
    assert_eq!(output, vec![100, -100, 200, -200, 0, 0, 0, 0]);
    assert!(engine.voice(handle).is_valid());
    assert_eq!(engine.voice(handle).frame_position(), 4);
    assert!(!engine.all_voices_are_idle());
}

#[test]
fn test_looping_voice_wraps_to_start() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(4));
    let handle = engine.add_voice(source, "loop", true, 1.0, false);
    engine.voice(handle).set_looping(true);
    engine.voice(handle).set_frame_position(2);

    let output = render_frames(&engine, 4);
    assert_eq!(output, vec![300, -300, 400, -400, 0, 0, 0, 0]);
    assert_eq!(engine.voice(handle).frame_position(), 0);
    assert!(engine.voice(handle).is_playing());

    let output = render_frames(&engine, 1);
    assert_eq!(output, vec![100, -100]);
    assert!(!engine.all_voices_are_idle());
}

#[test]
fn test_pause_on_end() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(4));
    let handle = engine.add_voice(source, "pause", true, 1.0, false);
    engine.voice(handle).set_pause_on_end(true);
    engine.voice(handle).set_frame_position(2);

    render_frames(&engine, 4);
    let voice = engine.voice(handle);
    assert!(voice.is_valid());
    assert!(!voice.is_playing());
    assert_eq!(voice.frame_position(), 4);

    // Resuming at the end pauses again without mixing.
    voice.set_playing(true);
    assert_eq!(render_frames(&engine, 2), vec![0; 4]);
    assert!(!voice.is_playing());
}

#[test]
fn test_finished_voice_stays_at_end() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(3));
    let handle = engine.add_voice(source, "done", true, 1.0, false);

    render_frames(&engine, 8);
    assert_eq!(engine.voice(handle).frame_position(), 3);
    assert!(engine.voice(handle).is_playing());
    assert!(engine.all_voices_are_idle());
    assert_eq!(render_frames(&engine, 2), vec![0; 4]);
}

#[test]
fn test_voice_without_source_keeps_time() {
    let engine = engine();
    let handle = engine.add_voice(SourceHandle::INVALID, "placeholder", true, 1.0, false);
    assert_eq!(render_frames(&engine, 8), vec![0; 16]);
    assert_eq!(engine.voice(handle).frame_position(), 8);
    assert!(engine.all_voices_are_idle());
}

#[test]
fn test_negative_position_plays_silence_first() {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(4));
    let handle = engine.add_voice(source, "delayed", true, 1.0, false);
    engine.voice(handle).set_frame_position(-2);

    let output = render_frames(&engine, 4);
    assert_eq!(output, vec![0, 0, 0, 0, 100, -100, 200, -200]);
    assert_eq!(engine.voice(handle).frame_position(), 2);
}

#[test]
fn test_mono_source_is_spread_to_both_channels() {
    let engine = engine();
    let mono = Arc::new(MemorySampleProvider::new(
        vec![100, 200, 300],
        1,
        OUTPUT_SAMPLE_RATE,
    ));
    let source = engine.load_source_from_provider(mono);
    engine.add_voice(source, "mono", true, 1.0, false);

    let output = render_frames(&engine, 3);
    assert_eq!(output, vec![100, 100, 200, 200, 300, 300]);
}

#[test]
fn test_six_channel_source_is_folded_to_stereo() {
    let engine = engine();
    let surround = Arc::new(MemorySampleProvider::new(
        vec![100, 200, 300, 400, 500, 600, 10, 20, 30, 40, 50, 60],
        6,
        OUTPUT_SAMPLE_RATE,
    ));
    let source = engine.load_source_from_provider(surround);
    engine.add_voice(source, "surround", true, 1.0, false);

    let output = render_frames(&engine, 2);
    assert_eq!(output, vec![400, 600, 40, 60]);
}

#[test]
fn test_volume_map_ramps_voice_gain() {
    let engine = engine();
    let source = engine.load_source_from_provider(constant_source(8, 1000));
    let handle = engine.add_voice(source, "fade", true, 1.0, false);
    let four_frames = Duration::from_secs_f64(4.0 / f64::from(OUTPUT_SAMPLE_RATE));
    engine
        .voice(handle)
        .set_volume_map(Duration::ZERO, four_frames, 0.0, 1.0);

    let output = render_frames(&engine, 6);
    let left: Vec<i16> = output.iter().step_by(2).copied().collect();
    assert_eq!(left, vec![0, 250, 500, 750, 1000, 1000]);

    engine.voice(handle).reset_volume_map();
    engine.voice(handle).set_volume(0.5);
    engine.voice(handle).set_frame_position(0);
    assert_eq!(render_frames(&engine, 1), vec![500, 500]);
}

#[test]
fn test_master_volume_scales_output() {
    let engine = engine();
    let source = engine.load_source_from_provider(constant_source(4, 1000));
    engine.add_voice(source, "a", true, 1.0, false);

    engine.set_master_volume(0.25);
    assert_eq!(engine.master_volume(), 0.25);
    assert_eq!(render_frames(&engine, 1), vec![250, 250]);

    engine.set_master_volume(4.0);
    assert_eq!(engine.master_volume(), MAX_VOLUME);
    engine.set_master_volume(f32::NAN);
    assert_eq!(engine.master_volume(), MIN_VOLUME);
    assert_eq!(render_frames(&engine, 1), vec![0, 0]);
}

#[test]
fn test_large_buffers_are_mixed_in_chunks() {
    let engine = engine();
    let frames = MAX_BUFFER_FRAME_COUNT * 2 + 10;
    let source = engine.load_source_from_provider(constant_source(frames, 7));
    let handle = engine.add_voice(source, "long", true, 1.0, false);

    let output = render_frames(&engine, frames);
    assert!(output.iter().all(|&sample| sample == 7));
    assert_eq!(engine.voice(handle).frame_position(), frames as i64);
}

#[test]
fn test_unload_source_detaches_voices() {
    let engine = engine();
    let provider = counting_source(4);
    let source = engine.load_source_from_provider(provider.clone());
    let handle = engine.add_voice(source, "orphan", true, 1.0, false);
    assert_eq!(engine.loaded_source_count(), 1);
    assert!(engine.shared_source(source).is_some());

    engine.unload_source(source);
    assert_eq!(engine.loaded_source_count(), 0);
    assert!(engine.shared_source(source).is_none());
    assert_eq!(engine.voice(handle).source(), SourceHandle::INVALID);
    assert_eq!(render_frames(&engine, 4), vec![0; 8]);

    // The provider outlives the table entry and the slot is reused.
    assert_eq!(provider.frame_count(), 4);
    let again = engine.load_source_from_provider(provider);
    assert_eq!(again, source);

    engine.unload_source(SourceHandle::INVALID);
}

#[test]
fn test_channel_mixing_behavior() {
    let engine = AudioEngine::new(
        Arc::new(mock::Device::get("mock")),
        EngineSettings {
            channel_mixing: MixingBehavior::IgnoreLeading,
            ..Default::default()
        },
    );
    assert_eq!(engine.channel_mixing_behavior(), MixingBehavior::IgnoreLeading);

    let quad = Arc::new(MemorySampleProvider::new(
        vec![1, 2, 3, 4],
        4,
        OUTPUT_SAMPLE_RATE,
    ));
    let source = engine.load_source_from_provider(quad);
    let handle = engine.add_voice(source, "quad", true, 1.0, false);
    assert_eq!(render_frames(&engine, 1), vec![3, 4]);

    engine.set_channel_mixing_behavior(MixingBehavior::IgnoreTrailing);
    engine.voice(handle).set_frame_position(0);
    assert_eq!(render_frames(&engine, 1), vec![1, 2]);
}

#[test]
fn test_callback_receivers() {
    let engine = engine();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handle = engine.register_callback_receiver(Arc::new(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    }));

    render_frames(&engine, 4);
    render_frames(&engine, 4);
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    engine.unregister_callback_receiver(handle);
    render_frames(&engine, 4);
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    // The freed slot is handed out again.
    let reused = engine.register_callback_receiver(Arc::new(|| {}));
    assert_eq!(reused, handle);
}

#[test]
fn test_callback_diagnostics() {
    let engine = engine();
    let source = engine.load_source_from_provider(constant_source(16, 42));
    engine.add_voice(source, "a", true, 1.0, false);

    assert_eq!(engine.callback_frequency(), Duration::ZERO);
    render_frames(&engine, 4);
    std::thread::sleep(Duration::from_millis(2));
    render_frames(&engine, 4);
    assert!(engine.callback_frequency() >= Duration::from_millis(2));

    let durations = engine.debug_callback_durations();
    assert_eq!(durations.len(), CALLBACK_DURATION_RING_BUFFER_SIZE);

    let left = engine.debug_last_played_samples(0);
    assert_eq!(left.len(), LAST_PLAYED_SAMPLES_RING_FRAME_COUNT);
    assert!(left[left.len() - 8..].iter().all(|&sample| sample == 42));
    assert!(engine.debug_last_played_samples(2).is_empty());
}

#[test]
fn test_capture_flush_to_wav() -> Result<(), Box<dyn Error>> {
    let engine = engine();
    let source = engine.load_source_from_provider(counting_source(8));
    engine.add_voice(source, "captured", true, 1.0, false);

    // Output rendered before capture is enabled is not recorded.
    render_frames(&engine, 2);
    assert!(!engine.debug_output_capture_enabled());
    engine.debug_set_output_capture_enabled(true);
    assert!(engine.debug_output_capture_enabled());
    render_frames(&engine, 2);
    render_frames(&engine, 1);

    let dir = tempdir()?;
    let path = dir.path().join("capture.wav");
    engine.debug_flush_capture_to_wav_file(&path)?;

    let mut reader = hound::WavReader::open(&path)?;
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, OUTPUT_SAMPLE_RATE);
    let samples: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    assert_eq!(samples, vec![300, -300, 400, -400, 500, -500]);

    // Flushing clears the capture.
    let path = dir.path().join("empty.wav");
    engine.debug_flush_capture_to_wav_file(&path)?;
    assert_eq!(hound::WavReader::open(&path)?.len(), 0);
    Ok(())
}

#[test]
fn test_debug_all_voices() {
    let engine = engine();
    let first = engine.add_voice(SourceHandle::INVALID, "first", false, 0.5, false);
    let second = engine.add_voice(SourceHandle::INVALID, "second", true, 1.0, true);
    engine.remove_voice(first);

    let voices = engine.debug_all_voices();
    assert_eq!(voices.len(), 1);
    let (handle, voice) = &voices[0];
    assert_eq!(*handle, second);
    assert_eq!(voice.name.as_str(), "second");
    assert!(voice.playing);
    assert!(voice.play_past_end);
}

#[test]
fn test_voice_ref_accessors() {
    let engine = engine();
    let half_rate = Arc::new(MemorySampleProvider::new(vec![0; 22050], 1, 22050));
    let source = engine.load_source_from_provider(half_rate);
    let handle = engine.add_voice(source, "accessors", false, 0.8, false);
    let voice = engine.voice(handle);

    assert_eq!(voice.handle(), handle);
    assert_eq!(voice.name(), "accessors");
    assert_eq!(voice.volume(), 0.8);
    voice.set_volume(2.0);
    assert_eq!(voice.volume(), MAX_VOLUME);
    assert_eq!(voice.source(), source);
    assert_eq!(voice.duration(), Duration::from_secs(1));

    // Times use the source's own rate.
    voice.set_position(Duration::from_millis(500));
    assert_eq!(voice.frame_position(), 11025);
    assert_eq!(voice.position(), Duration::from_millis(500));

    voice.set_looping(true);
    voice.set_play_past_end(true);
    voice.set_remove_on_end(true);
    voice.set_pause_on_end(true);
    voice.set_playing(true);
    assert!(voice.is_looping());
    assert!(voice.play_past_end());
    assert!(voice.remove_on_end());
    assert!(voice.pause_on_end());
    assert!(voice.is_playing());

    voice.set_source(SourceHandle::INVALID);
    assert_eq!(voice.duration(), Duration::ZERO);

    let invalid = engine.voice(VoiceHandle::INVALID);
    assert!(!invalid.is_valid());
    assert_eq!(invalid.volume(), MIN_VOLUME);
    assert_eq!(invalid.position(), Duration::ZERO);
}

#[test]
fn test_load_sources_from_files() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("click.wav");
    write_wav(path.clone(), vec![vec![1i16, 2, 3]], OUTPUT_SAMPLE_RATE)?;

    let engine = engine();
    let source = engine.load_source(&path);
    assert!(source.is_valid());
    assert_eq!(engine.shared_source(source).map(|s| s.frame_count()), Some(3));

    let bytes = std::fs::read(&path)?;
    assert!(engine.load_source_from_memory("click.wav", &bytes).is_valid());
    assert!(engine.load_source_from_wav(&bytes).is_valid());
    assert!(!engine.load_source_from_memory("click.xyz", &bytes).is_valid());
    assert!(!engine.load_source(dir.path().join("missing.wav")).is_valid());
    assert_eq!(engine.loaded_source_count(), 3);
    Ok(())
}

#[test]
fn test_load_source_async() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("async.wav");
    write_wav_with_bits(path.clone(), vec![vec![5i16; 64]], OUTPUT_SAMPLE_RATE, 16)?;

    let engine = engine();
    let handle = engine.load_source_async(path).wait();
    assert!(handle.is_valid());
    assert_eq!(engine.shared_source(handle).map(|s| s.frame_count()), Some(64));

    let mut missing = engine.load_source_async(dir.path().join("missing.wav"));
    let missing_handle = loop {
        if let Some(handle) = missing.try_get() {
            break handle;
        }
        std::thread::sleep(Duration::from_millis(1));
    };
    assert!(!missing_handle.is_valid());
    assert!(missing.is_ready());
    Ok(())
}

#[test]
fn test_stream_lifecycle() -> Result<(), Box<dyn Error>> {
    let (engine, mock) = mock_engine(EngineSettings::default());
    assert!(!engine.is_stream_open());
    assert!(!engine.is_stream_running());

    // Starting a closed stream does nothing.
    engine.start_stream()?;
    assert!(!engine.is_stream_running());

    engine.open_stream()?;
    assert!(engine.is_stream_open());
    assert!(!engine.is_stream_running());
    engine.open_stream()?;
    assert_eq!(mock.open_count(), 1);

    engine.start_stream()?;
    assert!(engine.is_stream_running());
    assert!(mock.is_running());
    eventually(|| mock.callback_count() > 0, "Mock stream never rendered");

    engine.stop_stream()?;
    assert!(engine.is_stream_open());
    assert!(!engine.is_stream_running());
    assert!(!mock.is_running());

    engine.close_stream();
    assert!(!engine.is_stream_open());

    engine.ensure_stream_running()?;
    assert!(engine.is_stream_running());
    assert_eq!(mock.open_count(), 2);

    drop(engine);
    assert!(!mock.is_running());
    Ok(())
}

#[test]
fn test_reconfigure_reopens_running_stream() -> Result<(), Box<dyn Error>> {
    let (engine, mock) = mock_engine(EngineSettings::default());
    assert_eq!(engine.buffer_frame_size(), DEFAULT_BUFFER_FRAME_COUNT);

    // A closed stream only records the new values.
    engine.set_buffer_frame_size(1)?;
    assert_eq!(engine.buffer_frame_size(), MIN_BUFFER_FRAME_COUNT);
    engine.set_buffer_frame_size(100_000)?;
    assert_eq!(engine.buffer_frame_size(), MAX_BUFFER_FRAME_COUNT);
    assert_eq!(mock.open_count(), 0);

    engine.ensure_stream_running()?;
    engine.set_buffer_frame_size(128)?;
    assert_eq!(engine.buffer_frame_size(), 128);
    assert_eq!(mock.open_count(), 2);
    assert!(engine.is_stream_running());

    engine.stop_stream()?;
    engine.set_stream_mode(StreamMode::Exclusive)?;
    assert_eq!(engine.stream_mode(), StreamMode::Exclusive);
    assert_eq!(mock.open_count(), 3);
    assert!(engine.is_stream_open());
    assert!(!engine.is_stream_running());
    Ok(())
}

#[test]
fn test_failed_open_leaves_stream_closed() {
    let (engine, mock) = mock_engine(EngineSettings::default());
    mock.set_fail_open(true);
    assert!(matches!(
        engine.open_stream(),
        Err(EngineError::Backend(BackendError::MockOpenFailed(_)))
    ));
    assert!(engine.ensure_stream_running().is_err());
    assert!(!engine.is_stream_open());

    mock.set_fail_open(false);
    assert!(engine.ensure_stream_running().is_ok());
    assert!(engine.is_stream_running());
}

#[test]
fn test_from_config() -> Result<(), Box<dyn Error>> {
    let config = crate::config::Engine::with_device("mock-config");
    let engine = AudioEngine::from_config(&config)?;
    assert_eq!(engine.device().name(), "mock-config");
    assert_eq!(engine.channel_count(), 2);
    assert_eq!(engine.sample_rate(), OUTPUT_SAMPLE_RATE);
    assert_eq!(engine.buffer_frame_size(), DEFAULT_BUFFER_FRAME_COUNT);
    assert_eq!(engine.master_volume(), MAX_VOLUME);
    Ok(())
}
