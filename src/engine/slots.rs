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
use crate::engine::SLOT_COUNT;

/// Per-slot overlap counters plus the shadow counters of the last
/// synchronized output. A slot is held while at least one physical note maps
/// onto it, so activity is a count rather than a flag.
#[derive(Default)]
pub struct Slots {
    counters: [u8; SLOT_COUNT],
    emitted: [u8; SLOT_COUNT],
}

impl Slots {
    pub fn new() -> Slots {
        Slots::default()
    }

    /// Registers a note landing on the given slot.
    pub fn note_on(&mut self, slot: usize) {
        self.counters[slot] = self.counters[slot].saturating_add(1);
    }

    /// Registers a note leaving the given slot. A note-off for a note that
    /// was never registered (device glitch, layout change mid-flight) must
    /// not drive the counter negative, so the decrement saturates at zero.
    pub fn note_off(&mut self, slot: usize) {
        self.counters[slot] = self.counters[slot].saturating_sub(1);
    }

    /// Whether the slot should currently be held.
    pub fn is_active(&self, slot: usize) -> bool {
        self.counters[slot] > 0
    }

    /// Whether the last synchronized output holds this slot.
    pub fn last_emitted_active(&self, slot: usize) -> bool {
        self.emitted[slot] > 0
    }

    /// Records the current counter as the last synchronized output.
    pub fn mark_emitted(&mut self, slot: usize) {
        self.emitted[slot] = self.counters[slot];
    }

    /// Zeroes the overlap counters. The emitted shadows are left alone so the
    /// synchronizer still releases any key that is physically down.
    pub fn reset_counters(&mut self) {
        self.counters = [0; SLOT_COUNT];
    }
}
