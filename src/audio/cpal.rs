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
use std::{fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info};

use super::{
    stream::{OutputStream, Renderer, StreamConfig, StreamMode},
    thread_priority::{
        callback_thread_priority, configure_audio_thread_priority, rt_audio_enabled,
    },
    BackendError, Device as AudioDevice,
};

/// A cpal output device.
pub struct Device {
    name: String,
    max_channels: u16,
    host_id: cpal::HostId,
    device: cpal::Device,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, BackendError> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices that have at least one output configuration.
    fn list_cpal_devices() -> Result<Vec<Device>, BackendError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|config| config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(Device {
                        name: device.name()?,
                        max_channels,
                        host_id,
                        device,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the given cpal device. `default` selects the default host's
    /// default output device.
    pub fn get(name: &str) -> Result<Device, BackendError> {
        if name == "default" {
            let host = cpal::default_host();
            if let Some(device) = host.default_output_device() {
                let max_channels = device
                    .supported_output_configs()
                    .map(|configs| configs.map(|config| config.channels()).max().unwrap_or(0))
                    .unwrap_or(0);
                return Ok(Device {
                    name: device.name()?,
                    max_channels,
                    host_id: host.id(),
                    device,
                });
            }
        }

        Device::list_cpal_devices()?
            .into_iter()
            .find(|device| device.name.trim() == name)
            .ok_or_else(|| BackendError::NoDevice(name.to_string()))
    }
}

impl AudioDevice for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_stream(
        &self,
        config: StreamConfig,
        renderer: Renderer,
    ) -> Result<Box<dyn OutputStream>, BackendError> {
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<Command>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), BackendError>>(1);
        let device = self.device.clone();

        // cpal streams are not Send, so the stream lives on its own thread
        // and is driven through commands.
        let thread = thread::Builder::new()
            .name("pcmix-output".to_string())
            .spawn(move || {
                let stream = match build_stream(&device, &config, renderer) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run_commands(&stream, command_rx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(BackendError::StreamThreadGone);
            }
        }

        info!(
            device = self.name,
            buffer_frames = config.buffer_frames,
            mode = %config.mode,
            "Opened output stream"
        );
        Ok(Box::new(Stream {
            commands: Some(command_tx),
            thread: Some(thread),
        }))
    }
}

enum Command {
    Play(Sender<Result<(), BackendError>>),
    Pause(Sender<Result<(), BackendError>>),
}

/// Runs until every command sender is dropped, then drops the stream.
fn run_commands(stream: &cpal::Stream, commands: Receiver<Command>) {
    for command in commands.iter() {
        match command {
            Command::Play(reply) => {
                let _ = reply.send(stream.play().map_err(BackendError::from));
            }
            Command::Pause(reply) => {
                let _ = reply.send(stream.pause().map_err(BackendError::from));
            }
        }
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    renderer: Renderer,
) -> Result<cpal::Stream, BackendError> {
    let sample_format = device.default_output_config()?.sample_format();
    let stream_config = cpal::StreamConfig {
        channels: config.channels as u16,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: match config.mode {
            StreamMode::Exclusive => cpal::BufferSize::Fixed(config.buffer_frames as u32),
            StreamMode::Shared => cpal::BufferSize::Default,
        },
    };

    let stream = match sample_format {
        cpal::SampleFormat::I16 => device.build_output_stream(
            &stream_config,
            create_i16_callback(renderer),
            |err| error!("CPAL output stream error: {}", err),
            None,
        )?,
        cpal::SampleFormat::I32 => device.build_output_stream(
            &stream_config,
            create_converting_callback::<i32>(renderer, config.buffer_samples()),
            |err| error!("CPAL output stream error: {}", err),
            None,
        )?,
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            create_converting_callback::<f32>(renderer, config.buffer_samples()),
            |err| error!("CPAL output stream error: {}", err),
            None,
        )?,
        other => return Err(BackendError::UnsupportedSampleFormat(other.to_string())),
    };
    Ok(stream)
}

/// i16 callback: render directly into the cpal buffer.
fn create_i16_callback(
    renderer: Renderer,
) -> impl FnMut(&mut [i16], &cpal::OutputCallbackInfo) + Send + 'static {
    let priority = callback_thread_priority();
    let rt_audio = rt_audio_enabled();
    let mut priority_set = false;
    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
        configure_audio_thread_priority(priority, rt_audio, &mut priority_set);
        renderer(data);
    }
}

/// Other formats: render into a scratch buffer and convert.
fn create_converting_callback<T: cpal::SizedSample + cpal::FromSample<i16>>(
    renderer: Renderer,
    expected_samples: usize,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static {
    let priority = callback_thread_priority();
    let rt_audio = rt_audio_enabled();
    let mut priority_set = false;
    let mut scratch = vec![0i16; expected_samples];
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        configure_audio_thread_priority(priority, rt_audio, &mut priority_set);
        // Only grows if the host hands us more than the configured period.
        if scratch.len() < data.len() {
            scratch.resize(data.len(), 0);
        }
        let scratch = &mut scratch[..data.len()];
        renderer(scratch);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

/// Handle to a stream living on its output thread.
struct Stream {
    commands: Option<Sender<Command>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Stream {
    fn send(
        &self,
        command: impl FnOnce(Sender<Result<(), BackendError>>) -> Command,
    ) -> Result<(), BackendError> {
        let commands = self.commands.as_ref().ok_or(BackendError::StreamThreadGone)?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        commands
            .send(command(reply_tx))
            .map_err(|_| BackendError::StreamThreadGone)?;
        reply_rx.recv().map_err(|_| BackendError::StreamThreadGone)?
    }
}

impl OutputStream for Stream {
    fn start(&mut self) -> Result<(), BackendError> {
        self.send(Command::Play)
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.send(Command::Pause)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // Closing the command channel ends the output thread, which drops
        // the cpal stream.
        self.commands.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
