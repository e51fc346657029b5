//! The state the scheduler thread shares with the window.
//!
//! The scheduler writes into a [`SharedScreen`] through the [`Frontend`] trait and the window
//! takes a [`Snapshot`] of it every time it redraws.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use iced::widget::image::Handle;
use wraith::{CoreFault, Frontend, PlayError, PlayOutcome, Raster};

#[derive(Debug, Default)]
struct Screen {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// Set when `pixels` changed since the last snapshot.
    dirty: bool,
    pressed: BTreeSet<String>,
    status: String,
    fault: Option<String>,
}

/// What the window needs to draw itself.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// A new image, if a frame was presented since the last snapshot.
    pub frame: Option<Handle>,
    pub pressed: BTreeSet<String>,
    pub status: String,
    pub fault: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedScreen(Arc<Mutex<Screen>>);

impl SharedScreen {
    fn lock(&self) -> MutexGuard<'_, Screen> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.lock().status = status.into();
    }

    /// Records the fault that stopped the scheduler.
    pub fn fault(&self, fault: &CoreFault) {
        let mut screen = self.lock();
        screen.status = format!("Emulation stopped: {}", fault.reason());
        screen.fault = Some(fault.reason().to_owned());
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut screen = self.lock();
        let frame = std::mem::take(&mut screen.dirty)
            .then(|| Handle::from_rgba(screen.width, screen.height, screen.pixels.clone()));
        Snapshot {
            frame,
            pressed: screen.pressed.clone(),
            status: screen.status.clone(),
            fault: screen.fault.clone(),
        }
    }
}

impl Frontend for SharedScreen {
    fn present(&mut self, raster: &Raster) {
        let mut screen = self.lock();
        screen.width = raster.width();
        screen.height = raster.height();
        screen.pixels.clear();
        screen.pixels.extend_from_slice(raster.pixels());
        screen.dirty = true;
    }

    fn key_indicator(&mut self, key: &str, pressed: bool) {
        let mut screen = self.lock();
        if pressed {
            screen.pressed.insert(key.to_owned());
        } else {
            screen.pressed.remove(key);
        }
    }

    fn play_finished(&mut self, rom: &str, result: &Result<PlayOutcome, PlayError>) {
        match result {
            Ok(PlayOutcome::Started) => self.set_status(format!("Playing {rom}")),
            Ok(PlayOutcome::Superseded) => {}
            Err(err) => self.set_status(format!("Could not start {rom}: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_handed_out_once() {
        let mut screen = SharedScreen::default();
        assert!(screen.snapshot().frame.is_none());

        screen.present(&Raster::new(2, 2, 4));
        assert!(screen.snapshot().frame.is_some());
        assert!(screen.snapshot().frame.is_none());
    }

    #[test]
    fn pressed_keys_follow_the_indicator() {
        let mut screen = SharedScreen::default();
        screen.key_indicator("a", true);
        screen.key_indicator("ArrowUp", true);
        screen.key_indicator("a", false);
        // Releasing a key that was never pressed is harmless
        screen.key_indicator("z", false);
        let pressed: Vec<_> = screen.snapshot().pressed.into_iter().collect();
        assert_eq!(pressed, ["ArrowUp"]);
    }

    #[test]
    fn status_reports_play_results() {
        let mut screen = SharedScreen::default();
        screen.play_finished("Tetris", &Ok(PlayOutcome::Started));
        assert_eq!(screen.snapshot().status, "Playing Tetris");

        screen.play_finished("Donkey Kong", &Ok(PlayOutcome::Superseded));
        assert_eq!(screen.snapshot().status, "Playing Tetris");

        screen.fault(&CoreFault::new("jammed CPU"));
        let snapshot = screen.snapshot();
        assert_eq!(snapshot.fault.as_deref(), Some("jammed CPU"));
        assert_eq!(snapshot.status, "Emulation stopped: jammed CPU");
    }
}
