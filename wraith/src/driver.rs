//! The emulation driver owns the one live core and guards every call into it.
//!
//! The driver is either idle (no ROM has been loaded yet) or running a core. While idle, every
//! operation is a no-op. Starting a game is split in two so the ROM fetch can run elsewhere:
//! [`Driver::begin_play`] hands out a [`PlayTicket`] and [`Driver::complete_play`] swaps the new
//! core in. Only the latest ticket may complete; older ones are discarded, so the most recent
//! selection wins no matter the order the fetches finish in.

use tracing::{debug, info};

use crate::core::{Buttons, CoreFault, EmulatorCore, RomLoadError};
use crate::display::Display;
use crate::rom::{Rom, RomFetchError, RomSource};

/// A ROM could not be started. The driver keeps doing whatever it did before.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PlayError {
    #[display("{_0}")]
    Fetch(RomFetchError),
    #[display("{_0}")]
    Load(RomLoadError),
}

/// Identifies one play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTicket {
    generation: u64,
    name: String,
}

impl PlayTicket {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The new core is now running.
    Started,
    /// A newer request was made while this one was in flight; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No ROM is loaded.
    Idle,
    /// The core has not finished a frame since the last render.
    Skipped,
    /// A frame was transferred to the display.
    Presented,
}

enum State<C> {
    Idle,
    Running { core: C, rom: String },
}

/// Owns the live core. `F` builds a fresh core for every play request.
pub struct Driver<C, F> {
    factory: F,
    state: State<C>,
    generation: u64,
    reset_on_load: bool,
}

impl<C, F> Driver<C, F>
where
    C: EmulatorCore,
    F: FnMut() -> C,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: State::Idle,
            generation: 0,
            reset_on_load: true,
        }
    }

    /// Whether a freshly loaded core is reset to its power-on state. On by default.
    pub fn reset_on_load(mut self, reset: bool) -> Self {
        self.reset_on_load = reset;
        self
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// The name of the ROM that is running, if any.
    pub fn rom_name(&self) -> Option<&str> {
        match &self.state {
            State::Idle => None,
            State::Running { rom, .. } => Some(rom),
        }
    }

    pub fn core(&self) -> Option<&C> {
        match &self.state {
            State::Idle => None,
            State::Running { core, .. } => Some(core),
        }
    }

    /// Registers a play request. Any ticket handed out earlier becomes stale.
    pub fn begin_play(&mut self, name: impl Into<String>) -> PlayTicket {
        self.generation += 1;
        PlayTicket {
            generation: self.generation,
            name: name.into(),
        }
    }

    /// Whether the ticket belongs to the latest play request.
    pub fn is_current(&self, ticket: &PlayTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Finishes a play request with the result of its fetch.
    ///
    /// For the latest ticket, a fresh core is built and loaded, then replaces the running one in a
    /// single assignment. If the fetch or the load fails, the previous state is left untouched.
    /// Stale tickets are dropped without looking at their result.
    pub fn complete_play(
        &mut self,
        ticket: PlayTicket,
        fetched: Result<Rom, RomFetchError>,
    ) -> Result<PlayOutcome, PlayError> {
        if !self.is_current(&ticket) {
            debug!(
                rom = %ticket.name,
                generation = ticket.generation,
                latest = self.generation,
                "Dropping superseded ROM"
            );
            return Ok(PlayOutcome::Superseded);
        }
        let rom = fetched?;
        let mut core = (self.factory)();
        core.load_rom(rom)?;
        if self.reset_on_load {
            core.reset();
        }
        info!(rom = %ticket.name, "Starting ROM");
        self.state = State::Running {
            core,
            rom: ticket.name,
        };
        Ok(PlayOutcome::Started)
    }

    /// Fetches a ROM from `source` and starts it.
    pub async fn play<R: RomSource>(
        &mut self,
        source: &R,
        name: &str,
    ) -> Result<PlayOutcome, PlayError> {
        let ticket = self.begin_play(name);
        let fetched = source.fetch(name).await;
        self.complete_play(ticket, fetched)
    }

    /// Advances the core by one tick. A fault means the core is unusable and is passed on.
    pub fn step(&mut self) -> Result<(), CoreFault> {
        match &mut self.state {
            State::Idle => Ok(()),
            State::Running { core, .. } => core.tick(),
        }
    }

    /// Moves the core's latest frame, if there is one, onto the display.
    pub fn render_frame(&mut self, display: &mut Display) -> RenderOutcome {
        let State::Running { core, .. } = &mut self.state else {
            return RenderOutcome::Idle;
        };
        match core.frame() {
            Some(frame) => {
                display.update(frame);
                RenderOutcome::Presented
            }
            None => RenderOutcome::Skipped,
        }
    }

    pub fn button_down(&mut self, buttons: Buttons) {
        if let State::Running { core, .. } = &mut self.state {
            core.button_down(buttons)
        }
    }

    pub fn button_up(&mut self, buttons: Buttons) {
        if let State::Running { core, .. } = &mut self.state {
            core.button_up(buttons)
        }
    }
}
