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

/// How incoming note numbers are folded onto the twelve musical slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Each pitch class gets its own slot: note -> note % 12.
    Chromatic,
    /// The octave is compressed into six slots per keyboard half. Notes below
    /// the cut point land on slots 0..5, notes at or above it on slots 6..11.
    /// Two adjacent pitch classes share a slot, which is why slot activity is
    /// counted rather than toggled.
    SplitWhiteBlack,
}

/// Maps a note number to a slot in [0, 11]. Total for any note; the cut point
/// is ignored in chromatic mode.
pub fn slot_for_note(note: u8, layout: Layout, cut_point: u8) -> usize {
    let pitch_class = (note % 12) as usize;
    match layout {
        Layout::Chromatic => pitch_class,
        Layout::SplitWhiteBlack => {
            if note < cut_point {
                pitch_class / 2
            } else {
                6 + pitch_class / 2
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::{slot_for_note, Layout};

    #[test]
    fn chromatic_is_a_bijection_on_pitch_classes() {
        let slots: HashSet<usize> = (60..72)
            .map(|note| slot_for_note(note, Layout::Chromatic, 64))
            .collect();
        assert_eq!(slots.len(), 12);
        assert!(slots.iter().all(|slot| *slot < 12));

        // Octaves collapse onto the same slot.
        assert_eq!(
            slot_for_note(24, Layout::Chromatic, 64),
            slot_for_note(96, Layout::Chromatic, 64)
        );
    }

    #[test]
    fn split_maps_below_and_above_the_cut_point() {
        assert_eq!(slot_for_note(60, Layout::SplitWhiteBlack, 64), 0);
        assert_eq!(slot_for_note(61, Layout::SplitWhiteBlack, 64), 0);
        assert_eq!(slot_for_note(63, Layout::SplitWhiteBlack, 64), 1);
        assert_eq!(slot_for_note(65, Layout::SplitWhiteBlack, 64), 8);
        assert_eq!(slot_for_note(71, Layout::SplitWhiteBlack, 64), 6 + 5);
    }

    #[test]
    fn split_boundary_note_counts_as_upper_half() {
        assert_eq!(slot_for_note(64, Layout::SplitWhiteBlack, 64), 6 + 2);
        assert_eq!(slot_for_note(63, Layout::SplitWhiteBlack, 64), 1);
    }

    #[test]
    fn split_slots_stay_in_range() {
        for note in 0..=127u8 {
            let slot = slot_for_note(note, Layout::SplitWhiteBlack, 64);
            assert!(slot < 12, "note {} mapped out of range to {}", note, slot);
        }
    }
}
