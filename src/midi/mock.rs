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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use tokio::sync::mpsc::Sender;

/// A mock device. Never connects to hardware; tests inject raw event bytes
/// through it.
#[derive(Clone)]
pub struct Device {
    name: String,
    sender: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
    watch_count: Arc<AtomicUsize>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            sender: Arc::new(Mutex::new(None)),
            watch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[cfg(test)]
    /// Sends the raw bytes through to the watcher, as if the device had
    /// delivered them. Does nothing when no watch is active.
    pub fn mock_event(&self, raw: &[u8]) {
        let sender = self.sender.lock().expect("unable to get sender lock");
        if let Some(sender) = sender.as_ref() {
            sender.try_send(raw.to_vec()).expect("error sending event");
        }
    }

    #[cfg(test)]
    /// How many times a watch has been started.
    pub fn watch_count(&self) -> usize {
        self.watch_count.load(Ordering::Relaxed)
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    /// Watches MIDI input for events and sends them to the given sender.
    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), Box<dyn Error>> {
        let mut stored = self.sender.lock().expect("unable to get sender lock");
        if stored.is_some() {
            return Err("Already watching events.".into());
        }
        *stored = Some(sender);
        self.watch_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stops watching events.
    fn stop_watch_events(&self) {
        self.sender
            .lock()
            .expect("unable to get sender lock")
            .take();
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
