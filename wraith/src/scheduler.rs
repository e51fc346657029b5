//! The scheduler drives a [`Driver`] from two independent clocks: the emulation clock calls
//! [`Driver::step`] and the render clock calls [`Driver::render_frame`]. The rates are unrelated;
//! a core may be stepped many times between renders, or a render may find no new frame.
//!
//! Everything runs in a single task. Each timer tick, keyboard event, and finished ROM fetch is
//! handled to completion before the next one is looked at, so the driver needs no locking. Only
//! the ROM fetches themselves run elsewhere; while one is in flight, the current game keeps
//! running and responding to input.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info, trace, warn};

use crate::core::{CoreFault, EmulatorCore};
use crate::display::{Display, Raster};
use crate::driver::{Driver, PlayError, PlayOutcome, PlayTicket, RenderOutcome};
use crate::input::{KeyEdge, KeyMap};
use crate::rom::{Rom, RomFetchError, RomSource};

/// Input fed into a running scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A physical key changed state. `key` is a browser-style key identifier.
    Key { key: String, edge: KeyEdge },
    /// The user picked a ROM.
    SelectRom(String),
    Shutdown,
}

impl Event {
    pub fn key_down(key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            edge: KeyEdge::Down,
        }
    }

    pub fn key_up(key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            edge: KeyEdge::Up,
        }
    }
}

/// The side effects the embedding application provides.
pub trait Frontend {
    /// Shows the scaled raster.
    fn present(&mut self, raster: &Raster);

    /// A bound key was pressed or released. Only called for keys in the key map.
    fn key_indicator(&mut self, _key: &str, _pressed: bool) {}

    /// A play request finished, successfully or not.
    fn play_finished(&mut self, _rom: &str, _result: &Result<PlayOutcome, PlayError>) {}
}

/// Counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Clock ticks, i.e. calls to [`Driver::step`].
    pub steps: u64,
    /// Render ticks, i.e. calls to [`Driver::render_frame`].
    pub renders: u64,
    /// Render ticks that put a frame on screen.
    pub presented: u64,
    /// Render ticks that found no new frame.
    pub skipped: u64,
    /// Render ticks while no ROM was loaded.
    pub idle: u64,
}

type Fetched = (PlayTicket, Result<Rom, RomFetchError>);

#[derive(Debug, Clone)]
pub struct Scheduler {
    clock_period: Duration,
    render_period: Duration,
    max_steps: Option<u64>,
    max_renders: Option<u64>,
    key_map: KeyMap,
}

impl Scheduler {
    pub fn new(clock_hz: NonZeroU32, fps: NonZeroU32, key_map: KeyMap) -> Self {
        Self {
            clock_period: period(clock_hz),
            render_period: period(fps),
            max_steps: None,
            max_renders: None,
            key_map,
        }
    }

    /// Stops the emulation clock after `steps` ticks.
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Stops the render clock after `renders` ticks.
    pub fn max_renders(mut self, renders: u64) -> Self {
        self.max_renders = Some(renders);
        self
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    pub fn clock_period(&self) -> Duration {
        self.clock_period
    }

    pub fn render_period(&self) -> Duration {
        self.render_period
    }

    /// Runs until a [`Event::Shutdown`] arrives, the event channel closes, or both clocks have
    /// used up their tick limits. Neither clock starts before `ready` resolves.
    ///
    /// A [`CoreFault`] ends the run immediately and is returned.
    pub async fn run<C, F, R, U>(
        &self,
        ready: impl Future<Output = ()>,
        driver: &mut Driver<C, F>,
        display: &mut Display,
        source: Arc<R>,
        frontend: &mut U,
        mut events: UnboundedReceiver<Event>,
    ) -> Result<RunStats, CoreFault>
    where
        C: EmulatorCore,
        F: FnMut() -> C,
        R: RomSource + 'static,
        U: Frontend,
    {
        ready.await;
        info!(
            clock = ?self.clock_period,
            render = ?self.render_period,
            "Starting clocks"
        );
        let mut clock = ticker(self.clock_period);
        let mut render = ticker(self.render_period);
        let mut fetches: JoinSet<Fetched> = JoinSet::new();
        let mut stats = RunStats::default();

        loop {
            let clock_open = self.max_steps.is_none_or(|max| stats.steps < max);
            let render_open = self.max_renders.is_none_or(|max| stats.renders < max);
            if !clock_open && !render_open {
                break;
            }
            tokio::select! {
                _ = clock.tick(), if clock_open => {
                    stats.steps += 1;
                    if let Err(fault) = driver.step() {
                        error!(%fault, rom = ?driver.rom_name(), "Emulation can not continue");
                        return Err(fault);
                    }
                }
                _ = render.tick(), if render_open => {
                    stats.renders += 1;
                    match driver.render_frame(display) {
                        RenderOutcome::Presented => {
                            stats.presented += 1;
                            frontend.present(display.output());
                        }
                        RenderOutcome::Skipped => {
                            stats.skipped += 1;
                            trace!("No new frame");
                        }
                        RenderOutcome::Idle => stats.idle += 1,
                    }
                }
                Some(joined) = fetches.join_next(), if !fetches.is_empty() => match joined {
                    Ok((ticket, fetched)) => finish_play(driver, frontend, ticket, fetched),
                    Err(err) => warn!(%err, "ROM fetch task failed"),
                },
                event = events.recv() => match event {
                    Some(Event::Key { key, edge }) => self.on_key(driver, frontend, &key, edge),
                    Some(Event::SelectRom(name)) => {
                        info!(rom = %name, "Fetching ROM");
                        let ticket = driver.begin_play(name);
                        let source = Arc::clone(&source);
                        fetches.spawn(async move {
                            let fetched = source.fetch(ticket.name()).await;
                            (ticket, fetched)
                        });
                    }
                    Some(Event::Shutdown) | None => break,
                },
            }
        }

        info!(?stats, "Clocks stopped");
        Ok(stats)
    }

    fn on_key<C, F, U>(&self, driver: &mut Driver<C, F>, frontend: &mut U, key: &str, edge: KeyEdge)
    where
        C: EmulatorCore,
        F: FnMut() -> C,
        U: Frontend,
    {
        let Some((key, buttons)) = self.key_map.binding(key) else {
            return;
        };
        match edge {
            KeyEdge::Down => driver.button_down(buttons),
            KeyEdge::Up => driver.button_up(buttons),
        }
        frontend.key_indicator(key, edge.is_down());
    }
}

fn finish_play<C, F, U>(
    driver: &mut Driver<C, F>,
    frontend: &mut U,
    ticket: PlayTicket,
    fetched: Result<Rom, RomFetchError>,
) where
    C: EmulatorCore,
    F: FnMut() -> C,
    U: Frontend,
{
    let name = ticket.name().to_owned();
    let result = driver.complete_play(ticket, fetched);
    if let Err(err) = &result {
        warn!(rom = %name, %err, "Could not start ROM");
    }
    frontend.play_finished(&name, &result);
}

fn period(hz: NonZeroU32) -> Duration {
    Duration::from_secs(1) / hz.get()
}

/// An interval that, like a browser timer, drops the ticks it missed rather than bursting.
fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hz(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap()
    }

    #[test]
    fn periods_follow_the_rates() {
        let scheduler = Scheduler::new(hz(10_000), hz(60), KeyMap::default());
        assert_eq!(scheduler.clock_period(), Duration::from_micros(100));
        assert_eq!(scheduler.render_period(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn key_events() {
        assert_eq!(
            Event::key_down("a"),
            Event::Key {
                key: "a".to_owned(),
                edge: KeyEdge::Down
            }
        );
        assert_eq!(
            Event::key_up("ArrowUp"),
            Event::Key {
                key: "ArrowUp".to_owned(),
                edge: KeyEdge::Up
            }
        );
    }
}
