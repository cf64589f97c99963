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

/// Typed error for config load/parse failures so callers can distinguish
/// e.g. a missing file from an invalid key assignment without string
/// matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid layout mode {0}, expected 1 (chromatic) or 2 (split white/black)")]
    InvalidLayoutMode(u8),
    #[error("Expected {expected} key codes, found {found}")]
    KeyCount { expected: usize, found: usize },
    #[error("Unknown key name '{0}'")]
    UnknownKey(String),
}
