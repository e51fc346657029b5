#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wraith::{
    Buttons, CoreFault, EmulatorCore, PlayError, PlayOutcome, Raster, Rom, RomFetchError,
    RomLoadError, RomSource,
};

pub const INES: &[u8] = b"NES\x1A\x01\x01\x00\x00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Load(String),
    Reset,
    Down(Buttons),
    Up(Buttons),
}

/// Everything the fake cores did, shared across every core a driver builds.
#[derive(Debug, Default)]
pub struct Record {
    pub cores: usize,
    /// Ticks per core, indexed by core id.
    pub ticks: HashMap<usize, u64>,
    pub calls: Vec<(usize, Call)>,
}

pub type Shared<T> = Arc<Mutex<T>>;

/// A core that finishes a frame every `frame_every` ticks and can be told to fault.
pub struct FakeCore {
    id: usize,
    record: Shared<Record>,
    frame_every: u64,
    fault_after: Option<u64>,
    ticks: u64,
    ready: bool,
    frame: Vec<u8>,
}

impl FakeCore {
    pub fn factory(
        record: &Shared<Record>,
        frame_every: u64,
        fault_after: Option<u64>,
    ) -> impl FnMut() -> FakeCore {
        let record = Arc::clone(record);
        move || {
            let id = {
                let mut record = record.lock().unwrap();
                record.cores += 1;
                record.cores
            };
            FakeCore {
                id,
                record: Arc::clone(&record),
                frame_every,
                fault_after,
                ticks: 0,
                ready: false,
                frame: Vec::new(),
            }
        }
    }

    fn call(&self, call: Call) {
        self.record.lock().unwrap().calls.push((self.id, call));
    }
}

impl EmulatorCore for FakeCore {
    fn load_rom(&mut self, rom: Rom) -> Result<(), RomLoadError> {
        if !rom.bytes().starts_with(b"NES\x1A") {
            return Err(RomLoadError::new("missing iNES magic"));
        }
        self.call(Call::Load(rom.name().to_owned()));
        Ok(())
    }

    fn reset(&mut self) {
        self.call(Call::Reset)
    }

    fn tick(&mut self) -> Result<(), CoreFault> {
        self.ticks += 1;
        *self.record.lock().unwrap().ticks.entry(self.id).or_default() += 1;
        if self.fault_after.is_some_and(|after| self.ticks > after) {
            return Err(CoreFault::new("jammed CPU"));
        }
        if self.ticks % self.frame_every == 0 {
            self.frame = vec![self.ticks as u8; 256 * 240 * 4];
            self.ready = true;
        }
        Ok(())
    }

    fn frame(&mut self) -> Option<&[u8]> {
        if !std::mem::take(&mut self.ready) {
            return None;
        }
        Some(self.frame.as_slice())
    }

    fn button_down(&mut self, buttons: Buttons) {
        self.call(Call::Down(buttons))
    }

    fn button_up(&mut self, buttons: Buttons) {
        self.call(Call::Up(buttons))
    }
}

/// Serves ROMs from memory, each after its own delay, and records every request.
#[derive(Debug, Default)]
pub struct FakeSource {
    roms: HashMap<String, (Vec<u8>, Duration)>,
    pub requests: Shared<Vec<String>>,
}

impl FakeSource {
    pub fn with_rom(mut self, name: &str, bytes: &[u8], delay: Duration) -> Self {
        self.roms.insert(name.to_owned(), (bytes.to_vec(), delay));
        self
    }
}

impl RomSource for FakeSource {
    async fn fetch(&self, name: &str) -> Result<Rom, RomFetchError> {
        self.requests.lock().unwrap().push(name.to_owned());
        let Some((bytes, delay)) = self.roms.get(name) else {
            return Err(RomFetchError::Io {
                path: PathBuf::from(format!("roms/{name}.nes")),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        };
        tokio::time::sleep(*delay).await;
        Ok(Rom::new(name, bytes.clone()))
    }
}

/// Remembers what the scheduler asked it to show.
#[derive(Debug, Default)]
pub struct FakeFrontend {
    pub presented: u64,
    pub last_len: usize,
    pub indicators: Vec<(String, bool)>,
    pub plays: Vec<(String, Result<PlayOutcome, String>)>,
}

impl wraith::Frontend for FakeFrontend {
    fn present(&mut self, raster: &Raster) {
        self.presented += 1;
        self.last_len = raster.len();
    }

    fn key_indicator(&mut self, key: &str, pressed: bool) {
        self.indicators.push((key.to_owned(), pressed));
    }

    fn play_finished(&mut self, rom: &str, result: &Result<PlayOutcome, PlayError>) {
        let result = match result {
            Ok(outcome) => Ok(*outcome),
            Err(err) => Err(err.to_string()),
        };
        self.plays.push((rom.to_owned(), result));
    }
}
