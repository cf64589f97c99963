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

use rdev::Key;

#[cfg(test)]
pub mod mock;
mod simulator;

/// A keyboard that synthetic key events can be sent to. Holding an
/// already-held key or releasing an already-released key must be harmless;
/// calls are fire-and-forget and expected not to block.
pub trait Keyboard: Send + Sync {
    /// Starts holding the given key down.
    fn hold(&self, key: Key) -> Result<(), Box<dyn Error>>;

    /// Releases the given key.
    fn release(&self, key: Key) -> Result<(), Box<dyn Error>>;
}

/// Gets the OS-level keyboard simulator.
pub fn get_keyboard() -> Arc<dyn Keyboard> {
    Arc::new(simulator::Simulator::new())
}
