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
use std::{sync::Arc, thread, time::Duration};

use rdev::Key;
use tracing::{info, span, warn, Level};

use crate::{
    cancel::CancelHandle,
    engine::{Engine, SlotAction, KEY_COUNT, PEDAL_KEY},
    keysim::Keyboard,
};

/// The synchronizer period.
const TICK: Duration = Duration::from_millis(5);
/// How long the pedal's synthetic key is held per trigger. The pulse runs
/// outside the engine state lock so note ingestion is never stalled by it.
const PEDAL_PULSE: Duration = Duration::from_millis(3);

/// Reconciles engine slot activity into key hold/release actions on a fixed
/// tick. This is the single writer of physical output state; no other
/// component calls the keyboard directly.
pub struct Synchronizer {
    engine: Arc<Engine>,
    keyboard: Arc<dyn Keyboard>,
    keys: [Key; KEY_COUNT],
}

impl Synchronizer {
    pub fn new(
        engine: Arc<Engine>,
        keyboard: Arc<dyn Keyboard>,
        keys: [Key; KEY_COUNT],
    ) -> Synchronizer {
        Synchronizer {
            engine,
            keyboard,
            keys,
        }
    }

    /// Spawns the synchronizer loop on its own thread. The thread runs until
    /// the cancel handle trips, releasing all keys on the way out.
    pub fn start(self, cancel: CancelHandle) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let span = span!(Level::INFO, "output synchronizer");
            let _enter = span.enter();

            info!("Output synchronizer started.");
            loop {
                if cancel.is_cancelled() {
                    self.release_all();
                    info!("Output synchronizer stopped.");
                    return;
                }
                self.tick();
                spin_sleep::sleep(TICK);
            }
        })
    }

    /// Runs a single reconcile pass. Output failures are best-effort; a
    /// failed hold or release is logged and not retried.
    pub fn tick(&self) {
        let (actions, pedal_pulse) = self.engine.sync_tick();

        for action in actions {
            let result = match action {
                SlotAction::Hold(slot) => self.keyboard.hold(self.keys[slot]),
                SlotAction::Release(slot) => self.keyboard.release(self.keys[slot]),
            };
            if let Err(e) = result {
                warn!(
                    err = e.to_string(),
                    action = format!("{:?}", action),
                    "Key action failed."
                );
            }
        }

        if pedal_pulse {
            let pedal_key = self.keys[PEDAL_KEY];
            if let Err(e) = self.keyboard.hold(pedal_key) {
                warn!(err = e.to_string(), "Pedal key press failed.");
            }
            spin_sleep::sleep(PEDAL_PULSE);
            if let Err(e) = self.keyboard.release(pedal_key) {
                warn!(err = e.to_string(), "Pedal key release failed.");
            }
        }
    }

    /// Releases every configured key. Releasing an already-released key is
    /// harmless, so this doesn't consult the shadow state.
    fn release_all(&self) {
        for key in self.keys {
            if let Err(e) = self.keyboard.release(key) {
                warn!(
                    err = e.to_string(),
                    key = format!("{:?}", key),
                    "Key release failed."
                );
            }
        }
    }
}
