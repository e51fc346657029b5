//! Runs the emulation without a window for a fixed number of ticks, optionally leaving a
//! screenshot of the last frame behind.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Builder;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};
use wraith::{Config, Driver, Event, Frontend, PlayError, PlayOutcome, Raster, RunStats};

use crate::Error;
use crate::test_card::TestCard;
use crate::utils::write_png;

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub rom: Option<String>,
    /// Clock ticks to run for. Defaults to one emulated second.
    pub steps: Option<u64>,
    /// Render ticks to run for. Defaults to one second of renders.
    pub renders: Option<u64>,
    pub screenshot: Option<PathBuf>,
}

/// Logs what a window would have shown.
#[derive(Debug, Default)]
struct Log {
    presented: u64,
}

impl Frontend for Log {
    fn present(&mut self, _raster: &Raster) {
        self.presented += 1;
    }

    fn play_finished(&mut self, rom: &str, result: &Result<PlayOutcome, PlayError>) {
        if let Ok(PlayOutcome::Started) = result {
            info!(rom, "Playing");
        }
    }
}

pub fn run(config: &Config, options: Options) -> Result<RunStats, Error> {
    let scheduler = config
        .scheduler()
        .map_err(Error::Config)?
        .max_steps(options.steps.unwrap_or(config.clock_hz.get().into()))
        .max_renders(options.renders.unwrap_or(config.fps.get().into()));
    let source = Arc::new(config.rom_location().map_err(Error::Config)?);
    let mut display = config.display();
    let ticks_per_frame = TestCard::ticks_per_frame(config.clock_hz);
    let mut driver =
        Driver::new(move || TestCard::new(ticks_per_frame)).reset_on_load(config.reset_on_load);
    let mut frontend = Log::default();

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;
    // The sender stays alive for the whole run, so only the tick limits end it
    let (send, events) = unbounded_channel();
    match &options.rom {
        Some(rom) => {
            let _ = send.send(Event::SelectRom(rom.clone()));
        }
        None => warn!("No ROM selected, the run will stay idle"),
    }
    let stats = runtime
        .block_on(scheduler.run(
            async {},
            &mut driver,
            &mut display,
            source,
            &mut frontend,
            events,
        ))
        .map_err(Error::Fault)?;
    drop(send);
    info!(?stats, presented = frontend.presented, "Headless run finished");

    if let Some(path) = &options.screenshot {
        write_png(path, display.native())?;
        info!(path = %path.display(), "Wrote screenshot");
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ghast_headless_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let mut rom = vec![0; 16 + 16 * 1024];
        rom[..4].copy_from_slice(b"NES\x1A");
        rom[4] = 1;
        std::fs::write(dir.join("Test Card.nes"), rom).unwrap();
        dir
    }

    fn config(dir: &std::path::Path) -> Config {
        Config {
            rom_base: dir.display().to_string(),
            clock_hz: 1000.try_into().unwrap(),
            fps: 100.try_into().unwrap(),
            ..Config::default()
        }
    }

    #[test_log::test]
    fn runs_the_test_card_and_takes_a_screenshot() {
        let dir = rom_dir("screenshot");
        let screenshot = dir.join("last.png");
        let options = Options {
            rom: Some("Test Card".to_owned()),
            steps: Some(200),
            renders: Some(20),
            screenshot: Some(screenshot.clone()),
        };

        let stats = run(&config(&dir), options).unwrap();

        assert_eq!(stats.steps, 200);
        assert_eq!(stats.renders, 20);
        assert!(stats.presented > 0, "{stats:?}");
        assert!(screenshot.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test_log::test]
    fn missing_rom_stays_idle() {
        let dir = rom_dir("missing");
        let options = Options {
            rom: Some("Tetris".to_owned()),
            steps: Some(50),
            renders: Some(5),
            screenshot: None,
        };

        let stats = run(&config(&dir), options).unwrap();

        assert_eq!(stats.idle, 5);
        assert_eq!(stats.presented, 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
