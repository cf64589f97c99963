// Copyright (C) 2026 the midikey authors
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
use std::error::Error;

use parking_lot::Mutex;
use rdev::{simulate, EventType, Key};
use tracing::trace;

/// Sends key events to the OS through rdev. The internal lock serializes the
/// simulate calls only; it is independent of the engine state lock so a slow
/// OS call never stalls MIDI ingestion.
pub struct Simulator {
    output_lock: Mutex<()>,
}

impl Simulator {
    pub fn new() -> Simulator {
        Simulator {
            output_lock: Mutex::new(()),
        }
    }
}

impl super::Keyboard for Simulator {
    fn hold(&self, key: Key) -> Result<(), Box<dyn Error>> {
        let _guard = self.output_lock.lock();
        trace!(key = format!("{:?}", key), "Key down.");
        simulate(&EventType::KeyPress(key))?;
        Ok(())
    }

    fn release(&self, key: Key) -> Result<(), Box<dyn Error>> {
        let _guard = self.output_lock.lock();
        trace!(key = format!("{:?}", key), "Key up.");
        simulate(&EventType::KeyRelease(key))?;
        Ok(())
    }
}
