//! The contract between the front end and an emulation core. The core is a black box; everything
//! the front end knows about it goes through [`EmulatorCore`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::rom::Rom;

bitflags! {
    /// The buttons of a single NES controller, one bit per button. This is the same layout the
    /// controller shift register uses, so masks can be forwarded to a core untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Buttons: u8 {
        const RIGHT  = 0x01;
        const LEFT   = 0x02;
        const DOWN   = 0x04;
        const UP     = 0x08;
        const START  = 0x10;
        const SELECT = 0x20;
        const B      = 0x40;
        const A      = 0x80;
    }
}

impl Buttons {
    /// Returns true if exactly one button bit is set.
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }
}

/// The core refused a ROM image, most likely because it is malformed or uses hardware the core
/// does not support.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("ROM rejected by the core: {reason}")]
pub struct RomLoadError {
    reason: String,
}

impl RomLoadError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// An unrecoverable fault inside the core. Once a core reports one of these, its state is
/// corrupted and emulation can not continue.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("emulator core fault: {reason}")]
pub struct CoreFault {
    reason: String,
}

impl CoreFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// An emulation core as seen by the front end.
pub trait EmulatorCore {
    /// Hands the ROM image to the core. The image is consumed; the front end keeps no copy.
    fn load_rom(&mut self, rom: Rom) -> Result<(), RomLoadError>;

    /// Puts the core into its power-on state.
    fn reset(&mut self);

    /// Advances the core by one scheduling tick.
    fn tick(&mut self) -> Result<(), CoreFault>;

    /// Returns the most recently completed frame, if one was finished since the last call.
    ///
    /// The frame is only borrowed, so it can not outlive the render tick that asked for it.
    fn frame(&mut self) -> Option<&[u8]>;

    /// Presses the given buttons. Pressing a held button again must be harmless.
    fn button_down(&mut self, buttons: Buttons);

    /// Releases the given buttons. Releasing a button that is not held must be harmless.
    fn button_up(&mut self, buttons: Buttons);
}

#[cfg(test)]
mod tests {
    use super::Buttons;

    #[test]
    fn button_bits_match_the_controller_layout() {
        assert_eq!(Buttons::A.bits(), 0x80);
        assert_eq!(Buttons::B.bits(), 0x40);
        assert_eq!(Buttons::SELECT.bits(), 0x20);
        assert_eq!(Buttons::START.bits(), 0x10);
        assert_eq!(Buttons::all().bits(), 0xFF);
    }

    #[test]
    fn single_button_masks() {
        assert!(Buttons::UP.is_single());
        assert!(!(Buttons::UP | Buttons::A).is_single());
        assert!(!Buttons::empty().is_single());
    }
}
