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
#[cfg(test)]
pub mod test {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    /// Polls the predicate every 10 ms until it holds, panicking with the
    /// given message if it still doesn't after three seconds.
    pub fn eventually<F>(predicate: F, error_msg: &str)
    where
        F: Fn() -> bool,
    {
        let tick = Duration::from_millis(10);
        let deadline = Instant::now() + Duration::from_secs(3);

        while !predicate() {
            if Instant::now() >= deadline {
                panic!("{}", error_msg);
            }
            thread::sleep(tick);
        }
    }
}
