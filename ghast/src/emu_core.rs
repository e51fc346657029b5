use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use wraith::{Config, CoreFault, Driver, Event, KeyEdge, RomCatalog, RunStats};

use crate::Error;
use crate::screen::SharedScreen;
use crate::test_card::TestCard;

/// The window's side of the emulation thread.
///
/// The scheduler is launched into its own thread, with its own runtime, as soon as the handle is
/// built, but its clocks only start once its [`Barrier`] has been released.
pub struct EmuHandle {
    send: UnboundedSender<Event>,
    ready: Option<oneshot::Sender<()>>,
    thread: JoinHandle<Result<RunStats, CoreFault>>,
}

/// Holds the scheduler's clocks until released.
#[derive(Debug)]
pub struct Barrier(oneshot::Sender<()>);

impl Barrier {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

/// A cheap, cloneable way to feed events to the scheduler.
#[derive(Debug, Clone)]
pub struct EmuSender(UnboundedSender<Event>);

impl EmuSender {
    pub fn key(&self, key: String, edge: KeyEdge) {
        self.send(Event::Key { key, edge })
    }

    pub fn select_rom(&self, name: String) {
        self.send(Event::SelectRom(name))
    }

    fn send(&self, event: Event) {
        if let Err(err) = self.0.send(event) {
            debug!(event = ?err.0, "Emulation has stopped, dropping event");
        }
    }
}

impl EmuHandle {
    /// Builds the scheduler from the config and launches it. Also returns the ROM catalog for the
    /// selection control.
    pub fn construct_and_launch(
        config: &Config,
        screen: SharedScreen,
    ) -> Result<(Self, RomCatalog), Error> {
        let scheduler = config.scheduler().map_err(Error::Config)?;
        let location = config.rom_location().map_err(Error::Config)?;
        let mut display = config.display();
        let reset_on_load = config.reset_on_load;
        let ticks_per_frame = TestCard::ticks_per_frame(config.clock_hz);

        let runtime = Runtime::new().map_err(Error::Runtime)?;
        let catalog = match runtime.block_on(location.catalog(&config.roms)) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(%err, "Could not list ROMs");
                RomCatalog::default()
            }
        };

        let (send, events) = unbounded_channel();
        let (ready, is_ready) = oneshot::channel();
        let thread = std::thread::spawn(move || {
            let mut screen = screen;
            let mut driver =
                Driver::new(move || TestCard::new(ticks_per_frame)).reset_on_load(reset_on_load);
            let ready = async {
                // A dropped sender means the window never came up. Start anyway; the shutdown
                // follows right behind.
                is_ready.await.ok();
            };
            let result = runtime.block_on(scheduler.run(
                ready,
                &mut driver,
                &mut display,
                Arc::new(location),
                &mut screen,
                events,
            ));
            if let Err(fault) = &result {
                screen.fault(fault);
            }
            result
        });

        let handle = Self {
            send,
            ready: Some(ready),
            thread,
        };
        Ok((handle, catalog))
    }

    pub fn sender(&self) -> EmuSender {
        EmuSender(self.send.clone())
    }

    /// Hands out the setup barrier. Only the first call returns it.
    pub fn barrier(&mut self) -> Option<Barrier> {
        self.ready.take().map(Barrier)
    }

    /// Stops the scheduler and waits for its thread to finish.
    pub fn shutdown(self) -> Result<RunStats, Error> {
        let Self {
            send,
            ready,
            thread,
        } = self;
        drop(ready);
        let _ = send.send(Event::Shutdown);
        thread
            .join()
            .map_err(|_| Error::Panicked)?
            .map_err(Error::Fault)
    }
}
