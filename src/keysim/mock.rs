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
use std::{error::Error, sync::Arc};

use parking_lot::Mutex;
use rdev::Key;

/// A key action recorded by the mock keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Hold(Key),
    Release(Key),
}

/// A mock keyboard. Doesn't press anything, just records the actions so
/// tests can assert on exactly what the synchronizer emitted.
#[derive(Clone, Default)]
pub struct Keyboard {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl Keyboard {
    pub fn new() -> Keyboard {
        Keyboard::default()
    }

    /// Returns a copy of the actions recorded so far.
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    /// Drops all recorded actions.
    pub fn clear(&self) {
        self.actions.lock().clear();
    }
}

impl super::Keyboard for Keyboard {
    fn hold(&self, key: Key) -> Result<(), Box<dyn Error>> {
        self.actions.lock().push(Action::Hold(key));
        Ok(())
    }

    fn release(&self, key: Key) -> Result<(), Box<dyn Error>> {
        self.actions.lock().push(Action::Release(key));
        Ok(())
    }
}
