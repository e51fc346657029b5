//! A stand-in core that lets the front end run without a real emulator.
//!
//! The test card checks that a ROM is a plausible iNES image and then draws colour bars that
//! scroll one pixel per frame. Along the bottom, one box per controller button lights up while
//! the button is held. Nothing about the NES hardware is emulated.

use std::num::NonZeroU32;

use wraith::display::{BYTES_PER_PIXEL, NATIVE_HEIGHT, NATIVE_WIDTH};
use wraith::{Buttons, CoreFault, EmulatorCore, Rom, RomLoadError};

const INES_MAGIC: &[u8; 4] = b"NES\x1A";
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK: usize = 16 * 1024;
const CHR_BANK: usize = 8 * 1024;

/// Frames per emulated second, the NTSC refresh rate.
const FRAME_RATE: u32 = 60;

const WIDTH: usize = NATIVE_WIDTH as usize;
const HEIGHT: usize = NATIVE_HEIGHT as usize;

/// The classic SMPTE bar colours.
const BARS: [[u8; 3]; 8] = [
    [0xC0, 0xC0, 0xC0],
    [0xC0, 0xC0, 0x00],
    [0x00, 0xC0, 0xC0],
    [0x00, 0xC0, 0x00],
    [0xC0, 0x00, 0xC0],
    [0xC0, 0x00, 0x00],
    [0x00, 0x00, 0xC0],
    [0x10, 0x10, 0x10],
];

/// Height of the button strip at the bottom of the card.
const STRIP: usize = 32;
const BOX: usize = 24;

/// What the header of a loaded ROM declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub prg_len: usize,
    pub chr_len: usize,
    pub mapper: u8,
    pub trainer: bool,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, RomLoadError> {
        if bytes.len() < HEADER_LEN || !bytes.starts_with(INES_MAGIC) {
            return Err(RomLoadError::new("not an iNES image"));
        }
        let header = Self {
            prg_len: bytes[4] as usize * PRG_BANK,
            chr_len: bytes[5] as usize * CHR_BANK,
            mapper: (bytes[7] & 0xF0) | (bytes[6] >> 4),
            trainer: bytes[6] & 0x04 != 0,
        };
        if header.prg_len == 0 {
            return Err(RomLoadError::new("the image has no PRG ROM"));
        }
        let trainer = if header.trainer { TRAINER_LEN } else { 0 };
        let needed = HEADER_LEN + trainer + header.prg_len + header.chr_len;
        if bytes.len() < needed {
            return Err(RomLoadError::new(format!(
                "the header declares {needed} bytes but the image has {}",
                bytes.len()
            )));
        }
        Ok(header)
    }
}

#[derive(Debug, Clone)]
pub struct TestCard {
    ticks_per_frame: u64,
    header: Option<Header>,
    ticks: u64,
    frames: u64,
    held: Buttons,
    fresh: bool,
    frame: Vec<u8>,
}

impl TestCard {
    pub fn new(ticks_per_frame: u64) -> Self {
        Self {
            ticks_per_frame: ticks_per_frame.max(1),
            header: None,
            ticks: 0,
            frames: 0,
            held: Buttons::empty(),
            fresh: false,
            frame: vec![0; WIDTH * HEIGHT * BYTES_PER_PIXEL],
        }
    }

    /// Spreads the clock so that the card finishes 60 frames per emulated second.
    pub fn ticks_per_frame(clock_hz: NonZeroU32) -> u64 {
        u64::from((clock_hz.get() / FRAME_RATE).max(1))
    }

    pub fn header(&self) -> Option<Header> {
        self.header
    }

    pub fn held(&self) -> Buttons {
        self.held
    }

    fn draw(&mut self) {
        let shift = self.frames as usize;
        let bar_width = WIDTH / BARS.len();
        for (y, row) in self
            .frame
            .chunks_exact_mut(WIDTH * BYTES_PER_PIXEL)
            .enumerate()
        {
            for (x, pixel) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let color = if y < HEIGHT - STRIP {
                    BARS[((x + shift) / bar_width) % BARS.len()]
                } else {
                    strip_color(self.held, x, y - (HEIGHT - STRIP))
                };
                pixel[..3].copy_from_slice(&color);
                pixel[3] = 0xFF;
            }
        }
    }
}

/// The button boxes, in bit order from Right (bit 0) to A (bit 7).
fn strip_color(held: Buttons, x: usize, y: usize) -> [u8; 3] {
    let slot = WIDTH / 8;
    let margin_x = (slot - BOX) / 2;
    let margin_y = (STRIP - BOX) / 2;
    let (bit, inner) = (x / slot, x % slot);
    let inside = (margin_x..margin_x + BOX).contains(&inner) && (margin_y..margin_y + BOX).contains(&y);
    if !inside {
        return [0, 0, 0];
    }
    if held.bits() & (1 << bit) != 0 {
        [0xFF, 0xFF, 0xFF]
    } else {
        [0x40, 0x40, 0x40]
    }
}

impl EmulatorCore for TestCard {
    fn load_rom(&mut self, rom: Rom) -> Result<(), RomLoadError> {
        self.header = Some(Header::parse(rom.bytes())?);
        Ok(())
    }

    fn reset(&mut self) {
        self.ticks = 0;
        self.frames = 0;
        self.held = Buttons::empty();
        self.fresh = false;
    }

    fn tick(&mut self) -> Result<(), CoreFault> {
        if self.header.is_none() {
            return Err(CoreFault::new("ticked without a ROM"));
        }
        self.ticks += 1;
        if self.ticks % self.ticks_per_frame == 0 {
            self.draw();
            self.frames += 1;
            self.fresh = true;
        }
        Ok(())
    }

    fn frame(&mut self) -> Option<&[u8]> {
        if !std::mem::take(&mut self.fresh) {
            return None;
        }
        Some(&self.frame)
    }

    fn button_down(&mut self, buttons: Buttons) {
        self.held |= buttons;
    }

    fn button_up(&mut self, buttons: Buttons) {
        self.held -= buttons;
    }
}
