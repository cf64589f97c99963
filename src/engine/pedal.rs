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

/// Minimum spacing between two accepted pedal triggers. Continuous
/// controllers ramp through many intermediate values per physical press;
/// without the window a single stomp would fire several times.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// Turns continuous pedal-controller changes into discrete trigger events.
///
/// The detector has two states, idle and latched. It latches when a value
/// change matches the trigger policy, and stays latched until the output
/// synchronizer consumes the trigger via [`PedalDetector::take_latched`]. The
/// detector never clears itself: the synchronizer owns the output pulse
/// width, not MIDI timing.
pub struct PedalDetector {
    trigger_on_push: bool,
    trigger_on_release: bool,
    latched: bool,
    last_trigger: Option<Instant>,
}

impl PedalDetector {
    pub fn new(trigger_on_push: bool, trigger_on_release: bool) -> PedalDetector {
        PedalDetector {
            trigger_on_push,
            trigger_on_release,
            latched: false,
            last_trigger: None,
        }
    }

    /// Evaluates a controller value change. Returns true if the change was
    /// accepted as a new trigger.
    pub fn observe(&mut self, old: u8, new: u8, now: Instant) -> bool {
        let triggers = match (self.trigger_on_push, self.trigger_on_release) {
            (true, true) => new != old,
            (true, false) => new > old,
            (false, true) => new < old,
            (false, false) => false,
        };

        if !triggers || self.latched {
            return false;
        }
        if let Some(last) = self.last_trigger {
            if now.duration_since(last) <= DEBOUNCE_WINDOW {
                return false;
            }
        }

        self.latched = true;
        self.last_trigger = Some(now);
        true
    }

    #[cfg(test)]
    /// Whether a trigger is waiting to be consumed.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Consumes a pending trigger, returning whether one was pending.
    pub fn take_latched(&mut self) -> bool {
        std::mem::take(&mut self.latched)
    }

    /// Clears the latch and the debounce clock. A stale latch surviving a
    /// reconnect would pulse a key unrelated to anything the player did.
    pub fn reset(&mut self) {
        self.latched = false;
        self.last_trigger = None;
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use super::PedalDetector;

    #[test]
    fn both_flags_trigger_on_any_change() {
        let mut pedal = PedalDetector::new(true, true);
        let now = Instant::now();

        assert!(pedal.observe(0, 1, now));
        assert!(pedal.take_latched());
        assert!(pedal.observe(1, 0, now + Duration::from_millis(100)));
        assert!(!pedal.observe(0, 0, now + Duration::from_millis(200)));
    }

    #[test]
    fn push_only_ignores_releases() {
        let mut pedal = PedalDetector::new(true, false);
        let now = Instant::now();

        assert!(pedal.observe(0, 127, now));
        assert!(pedal.take_latched());
        assert!(!pedal.observe(127, 0, now + Duration::from_millis(100)));
        assert!(!pedal.is_latched());
    }

    #[test]
    fn release_only_ignores_pushes() {
        let mut pedal = PedalDetector::new(false, true);
        let now = Instant::now();

        assert!(!pedal.observe(0, 127, now));
        assert!(pedal.observe(127, 0, now));
        assert!(pedal.take_latched());
    }

    #[test]
    fn disabled_pedal_never_triggers() {
        let mut pedal = PedalDetector::new(false, false);
        assert!(!pedal.observe(0, 127, Instant::now()));
        assert!(!pedal.is_latched());
    }

    #[test]
    fn triggers_within_the_debounce_window_collapse() {
        let mut pedal = PedalDetector::new(true, true);
        let now = Instant::now();

        assert!(pedal.observe(0, 64, now));
        assert!(pedal.take_latched());

        // Still inside the window, even though the latch was consumed.
        assert!(!pedal.observe(64, 127, now + Duration::from_millis(10)));
        assert!(!pedal.observe(127, 0, now + Duration::from_millis(50)));

        // Outside the window the next change is accepted again.
        assert!(pedal.observe(0, 64, now + Duration::from_millis(51)));
    }

    #[test]
    fn latched_detector_swallows_further_changes() {
        let mut pedal = PedalDetector::new(true, true);
        let now = Instant::now();

        assert!(pedal.observe(0, 64, now));
        assert!(!pedal.observe(64, 127, now + Duration::from_millis(100)));
        assert!(pedal.is_latched());
        assert!(pedal.take_latched());
        assert!(!pedal.take_latched());
    }

    #[test]
    fn reset_clears_latch_and_debounce_clock() {
        let mut pedal = PedalDetector::new(true, true);
        let now = Instant::now();

        assert!(pedal.observe(0, 64, now));
        pedal.reset();
        assert!(!pedal.is_latched());

        // The debounce clock restarted, so an immediate change triggers.
        assert!(pedal.observe(0, 1, now + Duration::from_millis(1)));
    }
}
