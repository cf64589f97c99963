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
use std::{fs, io, path::Path, thread, time::Duration};

use rand::Rng;
use rdev::Key;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::{layout::Layout, KEY_COUNT};

pub use self::error::ConfigError;
pub use self::keys::parse_key;

mod error;
mod keys;

/// Bounded attempts for the load/save retry wrappers.
const MAX_RETRIES: usize = 100;
/// Randomized backoff between retries, in milliseconds. The jitter keeps
/// midikey from fighting in lockstep with whatever briefly holds the file.
const MIN_RETRY_DELAY_MS: u64 = 20;
const MAX_RETRY_DELAY_MS: u64 = 40;

/// A YAML representation of the midikey configuration. Loaded once at
/// startup and treated as an immutable snapshot for the whole run.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// The layout mode: 1 = chromatic, 2 = split white/black.
    pub layout_mode: u8,
    /// The controller index carrying the sustain pedal.
    pub pedal_controller_index: u8,
    /// The note number splitting the keyboard halves in split mode.
    pub keyboard_cut_point: u8,
    /// Whether pressing the pedal triggers the pedal key.
    pub trigger_pedal_on_push: bool,
    /// Whether releasing the pedal triggers the pedal key.
    pub trigger_pedal_on_release: bool,
    /// The thirteen output key names: twelve musical slots plus the pedal.
    pub key_codes: Vec<String>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            layout_mode: 2,
            pedal_controller_index: 64,
            keyboard_cut_point: 64,
            trigger_pedal_on_push: true,
            trigger_pedal_on_release: true,
            key_codes: [
                "A", "S", "D", "F", "G", "H", "J", "K", "L", "BackQuote", "Quote", "Slash",
                "Space",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Config {
    /// Returns the layout policy from the configuration.
    pub fn layout(&self) -> Result<Layout, ConfigError> {
        match self.layout_mode {
            1 => Ok(Layout::Chromatic),
            2 => Ok(Layout::SplitWhiteBlack),
            mode => Err(ConfigError::InvalidLayoutMode(mode)),
        }
    }

    /// Returns the slot-to-key assignments from the configuration.
    pub fn keys(&self) -> Result<[Key; KEY_COUNT], ConfigError> {
        if self.key_codes.len() != KEY_COUNT {
            return Err(ConfigError::KeyCount {
                expected: KEY_COUNT,
                found: self.key_codes.len(),
            });
        }

        let mut keys = [Key::Space; KEY_COUNT];
        for (slot, name) in self.key_codes.iter().enumerate() {
            keys[slot] = parse_key(name)?;
        }
        Ok(keys)
    }

    /// Loads the configuration from the given path, writing and returning
    /// the defaults when no file exists yet.
    pub fn load_or_create(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            return Config::load(path);
        }

        let config = Config::default();
        config.save(path)?;
        info!(path = path.display().to_string(), "Wrote default configuration.");
        Ok(config)
    }

    /// Loads and parses the configuration file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = with_retry(|| fs::read_to_string(path))?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Persists the configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_yaml::to_string(self)?;
        with_retry(|| fs::write(path, &contents))?;
        Ok(())
    }
}

/// Runs the given file operation, retrying transient I/O failures with a
/// randomized backoff. Gives up after the attempts are exhausted, returning
/// the last error.
fn with_retry<T, F>(mut op: F) -> Result<T, io::Error>
where
    F: FnMut() -> Result<T, io::Error>,
{
    let mut rng = rand::thread_rng();
    let mut last_err = None;

    for _ in 0..MAX_RETRIES {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(err = e.to_string(), "Config file access failed, retrying.");
                last_err = Some(e);
                let delay = rng.gen_range(MIN_RETRY_DELAY_MS..=MAX_RETRY_DELAY_MS);
                thread::sleep(Duration::from_millis(delay));
            }
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("retries exhausted")))
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use rdev::Key;

    use crate::engine::layout::Layout;

    use super::{Config, ConfigError};

    #[test]
    fn default_config_matches_reference_layout() -> Result<(), Box<dyn Error>> {
        let config = Config::default();

        assert_eq!(config.layout()?, Layout::SplitWhiteBlack);
        assert_eq!(config.pedal_controller_index, 64);
        assert_eq!(config.keyboard_cut_point, 64);
        assert!(config.trigger_pedal_on_push);
        assert!(config.trigger_pedal_on_release);

        let keys = config.keys()?;
        assert_eq!(keys[0], Key::KeyA);
        assert_eq!(keys[9], Key::BackQuote);
        assert_eq!(keys[12], Key::Space);
        Ok(())
    }

    #[test]
    fn round_trip_through_disk() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("midikey.yaml");

        let mut config = Config::default();
        config.layout_mode = 1;
        config.keyboard_cut_point = 60;
        config.save(&path)?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.layout()?, Layout::Chromatic);
        assert_eq!(loaded.keyboard_cut_point, 60);
        assert_eq!(loaded.key_codes, config.key_codes);
        Ok(())
    }

    #[test]
    fn load_or_create_writes_defaults_once() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("midikey.yaml");

        let created = Config::load_or_create(&path)?;
        assert!(path.exists());

        let loaded = Config::load_or_create(&path)?;
        assert_eq!(created.key_codes, loaded.key_codes);
        Ok(())
    }

    #[test]
    fn partial_config_backfills_defaults() -> Result<(), Box<dyn Error>> {
        let config: Config = serde_yaml::from_str("layout_mode: 1")?;
        assert_eq!(config.layout()?, Layout::Chromatic);
        assert_eq!(config.pedal_controller_index, 64);
        assert_eq!(config.key_codes.len(), 13);
        Ok(())
    }

    #[test]
    fn invalid_layout_mode_is_rejected() {
        let mut config = Config::default();
        config.layout_mode = 3;
        assert!(matches!(
            config.layout(),
            Err(ConfigError::InvalidLayoutMode(3))
        ));
    }

    #[test]
    fn wrong_key_count_is_rejected() {
        let mut config = Config::default();
        config.key_codes.pop();
        assert!(matches!(
            config.keys(),
            Err(ConfigError::KeyCount {
                expected: 13,
                found: 12
            })
        ));
    }

    #[test]
    fn unknown_key_name_is_rejected() {
        let mut config = Config::default();
        config.key_codes[0] = "NotAKey".to_string();
        assert!(matches!(config.keys(), Err(ConfigError::UnknownKey(_))));
    }
}
