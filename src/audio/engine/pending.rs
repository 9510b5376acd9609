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
use crossbeam_channel::{Receiver, TryRecvError};

use super::handle::SourceHandle;

/// A source being decoded on a background thread.
///
/// Dropping it does not cancel the decode; the source is still inserted
/// into the table when decoding finishes.
pub struct PendingSource {
    receiver: Receiver<SourceHandle>,
    result: Option<SourceHandle>,
}

impl PendingSource {
    pub(super) fn new(receiver: Receiver<SourceHandle>) -> Self {
        Self {
            receiver,
            result: None,
        }
    }

    fn poll(&mut self) {
        if self.result.is_some() {
            return;
        }
        match self.receiver.try_recv() {
            Ok(handle) => self.result = Some(handle),
            Err(TryRecvError::Disconnected) => self.result = Some(SourceHandle::INVALID),
            Err(TryRecvError::Empty) => {}
        }
    }

    pub fn is_ready(&mut self) -> bool {
        self.poll();
        self.result.is_some()
    }

    /// The handle if loading has finished. Failed loads give
    /// `SourceHandle::INVALID`.
    pub fn try_get(&mut self) -> Option<SourceHandle> {
        self.poll();
        self.result
    }

    /// Blocks until loading finishes.
    pub fn wait(self) -> SourceHandle {
        match self.result {
            Some(handle) => handle,
            None => self.receiver.recv().unwrap_or(SourceHandle::INVALID),
        }
    }
}
