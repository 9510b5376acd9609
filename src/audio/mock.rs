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
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use crossbeam_channel::{RecvTimeoutError, Sender};
use tracing::info;

use super::{
    stream::{OutputStream, Renderer, StreamConfig},
    BackendError,
};

#[derive(Default)]
struct Stats {
    opens: AtomicUsize,
    callbacks: AtomicU64,
    running: AtomicBool,
    fail_open: AtomicBool,
}

/// A mock device. Drives the renderer from a plain thread at the configured
/// buffer period and discards the output.
#[derive(Clone)]
pub struct Device {
    name: String,
    stats: Arc<Stats>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            stats: Arc::new(Stats::default()),
        }
    }

    /// Makes subsequent `open_stream` calls fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.stats.fail_open.store(fail, Ordering::Relaxed);
    }

    /// Number of streams opened so far.
    pub fn open_count(&self) -> usize {
        self.stats.opens.load(Ordering::Relaxed)
    }

    /// Number of renderer invocations across all streams.
    pub fn callback_count(&self) -> u64 {
        self.stats.callbacks.load(Ordering::Relaxed)
    }

    /// Returns true if a stream on this device is started.
    pub fn is_running(&self) -> bool {
        self.stats.running.load(Ordering::Relaxed)
    }
}

impl super::Device for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_stream(
        &self,
        config: StreamConfig,
        renderer: Renderer,
    ) -> Result<Box<dyn OutputStream>, BackendError> {
        if self.stats.fail_open.load(Ordering::Relaxed) {
            return Err(BackendError::MockOpenFailed(self.name.clone()));
        }
        self.stats.opens.fetch_add(1, Ordering::Relaxed);

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let stats = self.stats.clone();
        let period = config.buffer_duration();
        let mut buffer = vec![0i16; config.buffer_samples()];

        let thread = thread::Builder::new()
            .name("pcmix-mock-output".to_string())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if stats.running.load(Ordering::Relaxed) {
                            renderer(&mut buffer);
                            stats.callbacks.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            })?;

        info!(
            device = self.name,
            buffer_frames = config.buffer_frames,
            "Opened mock output stream"
        );
        Ok(Box::new(Stream {
            stats: self.stats.clone(),
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

struct Stream {
    stats: Arc<Stats>,
    shutdown: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl OutputStream for Stream {
    fn start(&mut self) -> Result<(), BackendError> {
        self.stats.running.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.stats.running.store(false, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.stats.running.store(false, Ordering::Relaxed);
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
