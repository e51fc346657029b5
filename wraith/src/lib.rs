//! Wraith is the front end half of the specters NES player. It drives an emulation core it knows
//! nothing about beyond the [`EmulatorCore`] trait: ROMs are fetched and loaded, the core is
//! stepped by one clock and its frames are put on screen by another, and keyboard input is
//! forwarded as controller buttons.
//!
//! Nothing here depends on a windowing system. A [`Frontend`] supplies the actual screen and the
//! visual feedback for held keys; `ghast` is the desktop one.
//!
//! # Layout
//! - [`core`]: the contract a core implements.
//! - [`display`]: copies frames into a native raster and scales them for the screen.
//! - [`input`]: maps key identifiers to controller buttons.
//! - [`driver`]: owns the live core and tracks whether a game is running.
//! - [`scheduler`]: runs the emulation and render clocks and routes events.
//! - [`rom`]: fetches ROM images over HTTP or from disk.
//! - [`config`]: the TOML settings everything above is built from.

pub mod config;
pub mod core;
pub mod display;
pub mod driver;
pub mod input;
pub mod rom;
pub mod scheduler;

pub use crate::config::{Config, ConfigError};
pub use crate::core::{Buttons, CoreFault, EmulatorCore, RomLoadError};
pub use crate::display::{Display, Raster};
pub use crate::driver::{Driver, PlayError, PlayOutcome, PlayTicket, RenderOutcome};
pub use crate::input::{KeyEdge, KeyMap, KeyMapError};
pub use crate::rom::{
    DirRomSource, HttpRomSource, Rom, RomCatalog, RomFetchError, RomLocation, RomSource,
};
pub use crate::scheduler::{Event, Frontend, RunStats, Scheduler};
