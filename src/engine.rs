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
use std::time::{Duration, Instant};

use midly::{live::LiveEvent, MidiMessage};
use parking_lot::Mutex;
use tracing::debug;

use self::layout::{slot_for_note, Layout};
use self::pedal::PedalDetector;
use self::slots::Slots;

pub mod layout;
pub mod pedal;
pub mod slots;
pub mod sync;

/// The number of musical output slots.
pub const SLOT_COUNT: usize = 12;
/// The number of configured key codes: twelve musical slots plus the pedal.
pub const KEY_COUNT: usize = 13;
/// The key-map index of the pedal's synthetic key.
pub const PEDAL_KEY: usize = 12;

/// An output action for a musical slot, produced by the tick diff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotAction {
    Hold(usize),
    Release(usize),
}

/// State guarded by the engine's exclusive lock. The lock is held for one
/// ingested message or one tick diff, never across a simulated key action.
struct State {
    slots: Slots,
    pedal: PedalDetector,
    last_pedal_value: u8,
}

/// The translation engine. Raw MIDI messages go in on the device's callback
/// context via [`Engine::handle_message`]; the output synchronizer drains the
/// resulting slot activity on its own clock via [`Engine::sync_tick`].
pub struct Engine {
    layout: Layout,
    cut_point: u8,
    pedal_controller: u8,
    state: Mutex<State>,
    last_event: Mutex<Instant>,
}

impl Engine {
    pub fn new(
        layout: Layout,
        cut_point: u8,
        pedal_controller: u8,
        trigger_on_push: bool,
        trigger_on_release: bool,
    ) -> Engine {
        Engine {
            layout,
            cut_point,
            pedal_controller,
            state: Mutex::new(State {
                slots: Slots::new(),
                pedal: PedalDetector::new(trigger_on_push, trigger_on_release),
                last_pedal_value: 0,
            }),
            last_event: Mutex::new(Instant::now()),
        }
    }

    /// Ingests one raw MIDI message. Malformed or unrecognized messages are
    /// dropped silently; nothing here is fatal.
    pub fn handle_message(&self, raw: &[u8]) {
        self.touch();

        let event = match LiveEvent::parse(raw) {
            Ok(event) => event,
            Err(_) => return,
        };
        let LiveEvent::Midi { message, .. } = event else {
            return;
        };

        let mut state = self.state.lock();
        match message {
            // A note-on with velocity zero is the running-status idiom for a
            // release and must decrement, not increment.
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let slot = slot_for_note(key.as_int(), self.layout, self.cut_point);
                state.slots.note_on(slot);
                debug!(note = key.as_int(), slot, "Note on.");
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let slot = slot_for_note(key.as_int(), self.layout, self.cut_point);
                state.slots.note_off(slot);
                debug!(note = key.as_int(), slot, "Note off.");
            }
            MidiMessage::Controller { controller, value } => {
                if controller.as_int() != self.pedal_controller {
                    return;
                }
                let old = state.last_pedal_value;
                let new = value.as_int();
                if state.pedal.observe(old, new, Instant::now()) {
                    debug!(controller = controller.as_int(), value = new, "Pedal triggered.");
                }
                state.last_pedal_value = new;
            }
            _ => {}
        }
    }

    /// Diffs the current slot activity against the last emitted output and
    /// consumes a pending pedal trigger. Returns the slot actions to perform
    /// and whether the pedal key should be pulsed, both of which the caller
    /// executes outside the state lock.
    pub fn sync_tick(&self) -> (Vec<SlotAction>, bool) {
        let mut state = self.state.lock();
        let mut actions = Vec::new();

        for slot in 0..SLOT_COUNT {
            let active = state.slots.is_active(slot);
            let was_active = state.slots.last_emitted_active(slot);
            if active && !was_active {
                actions.push(SlotAction::Hold(slot));
            } else if !active && was_active {
                actions.push(SlotAction::Release(slot));
            }
            state.slots.mark_emitted(slot);
        }

        (actions, state.pedal.take_latched())
    }

    /// Resets the engine after a reconnect or stop. Overlap counts implied by
    /// the previous connection can no longer be trusted, and a stale pedal
    /// latch would pulse a key unrelated to player action. The emitted
    /// shadows survive so the next tick releases whatever is still held.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.slots.reset_counters();
        state.pedal.reset();
        state.last_pedal_value = 0;
    }

    /// Refreshes the liveness timestamp.
    pub fn touch(&self) {
        *self.last_event.lock() = Instant::now();
    }

    /// How long ago the last raw message (or connect) was seen. The watchdog
    /// reads this; it never touches the slot or pedal state.
    pub fn idle_for(&self) -> Duration {
        self.last_event.lock().elapsed()
    }

    #[cfg(test)]
    pub fn is_slot_active(&self, slot: usize) -> bool {
        self.state.lock().slots.is_active(slot)
    }

    #[cfg(test)]
    pub fn pedal_latched(&self) -> bool {
        self.state.lock().pedal.is_latched()
    }
}
