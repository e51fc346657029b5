//! Ghast is the desktop front end: a window around the `wraith` scheduler, plus a headless mode
//! for scripted runs.

pub mod emu_core;
pub mod headless;
pub mod keys;
pub mod screen;
pub mod state;
pub mod test_card;
pub mod utils;

use std::path::PathBuf;

use wraith::{ConfigError, CoreFault};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum Error {
    #[display("{_0}")]
    Config(ConfigError),
    #[display("can not start the emulation runtime: {_0}")]
    Runtime(std::io::Error),
    #[display("the window failed: {_0}")]
    Window(iced::Error),
    #[display("{_0}")]
    Fault(CoreFault),
    #[display("the emulation thread panicked")]
    Panicked,
    #[display("can not write {}: {source}", path.display())]
    Screenshot {
        path: PathBuf,
        source: png::EncodingError,
    },
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use wraith::Config;

    #[test]
    fn shipped_config_is_the_default() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("ghast.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
