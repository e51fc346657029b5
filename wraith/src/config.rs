//! Front end settings, stored as TOML.
//!
//! ```toml
//! rom_base = "https://example.com/public/roms"
//! roms = ["Donkey Kong"]
//! clock_hz = 10000
//! fps = 60
//!
//! [keys]
//! a = "A"
//! Enter = "START"
//! ```
//!
//! Every field is optional. A missing file is the same as an empty one.

use std::collections::BTreeMap;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::Buttons;
use crate::display::Display;
use crate::input::{KeyMap, KeyMapError};
use crate::rom::{InvalidRomBase, RomLocation};
use crate::scheduler::Scheduler;

/// Both clocks default to 10 kHz.
const DEFAULT_RATE: NonZeroU32 = NonZeroU32::new(10_000).unwrap();
/// Three times the native NES resolution.
const DEFAULT_WIDTH: NonZeroU32 = NonZeroU32::new(768).unwrap();
const DEFAULT_HEIGHT: NonZeroU32 = NonZeroU32::new(720).unwrap();

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("can not access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("can not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[display("can not write the config: {_0}")]
    Serialize(toml::ser::Error),
    #[display("{_0}")]
    Keys(KeyMapError),
    #[display("{_0}")]
    RomBase(InvalidRomBase),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where ROMs are fetched from: an `http(s)://` URL or a directory.
    pub rom_base: String,
    /// The ROMs offered for selection. If empty, the `rom_base` directory is scanned.
    pub roms: Vec<String>,
    /// Rate of the emulation clock.
    pub clock_hz: NonZeroU32,
    /// Rate of the render clock.
    pub fps: NonZeroU32,
    pub output_width: NonZeroU32,
    pub output_height: NonZeroU32,
    /// Reset each core to its power-on state right after its ROM is loaded.
    pub reset_on_load: bool,
    /// Key identifier to controller button.
    pub keys: BTreeMap<String, Buttons>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rom_base: "public/roms".to_owned(),
            roms: Vec::new(),
            clock_hz: DEFAULT_RATE,
            fps: DEFAULT_RATE,
            output_width: DEFAULT_WIDTH,
            output_height: DEFAULT_HEIGHT,
            reset_on_load: true,
            keys: KeyMap::default()
                .bindings()
                .map(|(key, buttons)| (key.to_owned(), buttons))
                .collect(),
        }
    }
}

impl Config {
    /// Reads the config at `path`, falling back to the defaults if there is no such file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(data) => toml::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config found, using the defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_owned(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, data).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })
    }

    pub fn key_map(&self) -> Result<KeyMap, ConfigError> {
        KeyMap::new(self.keys.iter().map(|(key, buttons)| (key.as_str(), *buttons)))
            .map_err(ConfigError::Keys)
    }

    pub fn rom_location(&self) -> Result<RomLocation, ConfigError> {
        RomLocation::parse(&self.rom_base).map_err(ConfigError::RomBase)
    }

    pub fn scheduler(&self) -> Result<Scheduler, ConfigError> {
        Ok(Scheduler::new(self.clock_hz, self.fps, self.key_map()?))
    }

    pub fn display(&self) -> Display {
        Display::nes(self.output_width.get(), self.output_height.get())
    }
}
