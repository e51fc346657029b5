//! Moves frames from the core onto the screen.
//!
//! A frame is copied byte for byte into a raster at the console's native resolution, which is then
//! blitted onto a second, scaled raster with nearest-neighbour sampling. The scaled raster is what
//! a [`Frontend`](crate::scheduler::Frontend) presents.

/// Width of a NES frame in pixels.
pub const NATIVE_WIDTH: u32 = 256;
/// Height of a NES frame in pixels.
pub const NATIVE_HEIGHT: u32 = 240;
/// RGBA, the layout of a browser image buffer.
pub const BYTES_PER_PIXEL: usize = 4;

/// A flat, row-major pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// Creates a zeroed (transparent black) raster.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        let len = width as usize * height as usize * bytes_per_pixel;
        Self {
            width,
            height,
            bytes_per_pixel,
            pixels: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    fn row_len(&self) -> usize {
        self.width as usize * self.bytes_per_pixel
    }
}

/// The native raster and its scaled copy.
#[derive(Debug, Clone)]
pub struct Display {
    native: Raster,
    output: Raster,
    /// For every output column, the byte offset of the source pixel within a native row.
    columns: Vec<usize>,
    /// For every output row, the native row it samples.
    rows: Vec<usize>,
    updates: u64,
}

impl Display {
    /// Sets up both rasters. The scale factor (`output / native`, per axis, possibly fractional)
    /// is fixed here; frames never change it.
    pub fn new(native: Raster, output_width: u32, output_height: u32) -> Self {
        let bpp = native.bytes_per_pixel;
        let output = Raster::new(output_width, output_height, bpp);
        let columns = nearest(native.width, output_width)
            .map(|x| x * bpp)
            .collect();
        let rows = nearest(native.height, output_height).collect();
        Self {
            native,
            output,
            columns,
            rows,
            updates: 0,
        }
    }

    /// A display for NES frames scaled to the given output size.
    pub fn nes(output_width: u32, output_height: u32) -> Self {
        Self::new(
            Raster::new(NATIVE_WIDTH, NATIVE_HEIGHT, BYTES_PER_PIXEL),
            output_width,
            output_height,
        )
    }

    pub fn native(&self) -> &Raster {
        &self.native
    }

    pub fn output(&self) -> &Raster {
        &self.output
    }

    /// How many frames have been transferred so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Copies a frame into the native raster and redraws the scaled raster.
    ///
    /// Frames are not validated. A short frame only overwrites its prefix, so the trailing pixels
    /// keep whatever the previous frame left there; bytes past the end of the raster are ignored.
    pub fn update(&mut self, frame: &[u8]) {
        let len = frame.len().min(self.native.pixels.len());
        self.native.pixels[..len].copy_from_slice(&frame[..len]);
        self.blit();
        self.updates += 1;
    }

    fn blit(&mut self) {
        let bpp = self.native.bytes_per_pixel;
        let src_row_len = self.native.row_len();
        let dst_row_len = self.output.row_len();
        let mut previous: Option<usize> = None;
        for (y, &src_y) in self.rows.iter().enumerate() {
            let dst_start = y * dst_row_len;
            // Upscaled rows repeat; copy the finished row instead of resampling it
            if previous == Some(src_y) {
                self.output
                    .pixels
                    .copy_within(dst_start - dst_row_len..dst_start, dst_start);
                continue;
            }
            let src = &self.native.pixels[src_y * src_row_len..(src_y + 1) * src_row_len];
            let dst = &mut self.output.pixels[dst_start..dst_start + dst_row_len];
            for (pixel, &offset) in dst.chunks_exact_mut(bpp).zip(&self.columns) {
                pixel.copy_from_slice(&src[offset..offset + bpp]);
            }
            previous = Some(src_y);
        }
    }
}

/// The source index sampled by each of the `dst` destination indices.
fn nearest(src: u32, dst: u32) -> impl Iterator<Item = usize> {
    let (src, dst) = (src as u64, dst as u64);
    (0..dst).map(move |i| ((i * src) / dst).min(src.saturating_sub(1)) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A frame where every byte of pixel `i` is `i` (mod 256).
    fn numbered_frame(width: u32, height: u32, bpp: usize) -> Vec<u8> {
        (0..(width * height) as usize)
            .flat_map(|i| std::iter::repeat_n(i as u8, bpp))
            .collect()
    }

    #[test]
    fn full_frame_writes_every_pixel() {
        let mut display = Display::nes(NATIVE_WIDTH, NATIVE_HEIGHT);
        let frame = vec![0xAB; display.native().len()];
        display.update(&frame);
        assert!(display.native().pixels().iter().all(|&b| b == 0xAB));
        assert_eq!(display.output().pixels(), display.native().pixels());
        assert_eq!(display.updates(), 1);
    }

    #[test]
    fn short_frame_overwrites_only_its_prefix() {
        let mut display = Display::nes(NATIVE_WIDTH, NATIVE_HEIGHT);
        display.update(&vec![0x11; display.native().len()]);
        display.update(&[0x22; 100]);
        let pixels = display.native().pixels();
        assert!(pixels[..100].iter().all(|&b| b == 0x22));
        assert!(pixels[100..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn long_frame_is_truncated() {
        let mut display = Display::nes(NATIVE_WIDTH, NATIVE_HEIGHT);
        let len = display.native().len();
        display.update(&vec![0x33; len + 1024]);
        assert_eq!(display.native().len(), len);
        assert!(display.native().pixels().iter().all(|&b| b == 0x33));
    }

    #[test]
    fn integer_upscale_repeats_pixels() {
        let native = Raster::new(2, 2, 1);
        let mut display = Display::new(native, 4, 4);
        display.update(&[1, 2, 3, 4]);
        #[rustfmt::skip]
        let expected = [
            1, 1, 2, 2,
            1, 1, 2, 2,
            3, 3, 4, 4,
            3, 3, 4, 4,
        ];
        assert_eq!(display.output().pixels(), expected);
    }

    #[test]
    fn fractional_scale_uses_nearest_neighbour() {
        let native = Raster::new(4, 1, 2);
        let mut display = Display::new(native, 6, 1);
        display.update(&numbered_frame(4, 1, 2));
        // 6 / 4 = 1.5, so columns 0..6 sample 0, 0, 1, 2, 2, 3
        assert_eq!(display.output().pixels(), [0, 0, 0, 0, 1, 1, 2, 2, 2, 2, 3, 3]);
    }

    #[test]
    fn downscale_drops_pixels() {
        let native = Raster::new(4, 4, 1);
        let mut display = Display::new(native, 2, 2);
        display.update(&numbered_frame(4, 4, 1));
        assert_eq!(display.output().pixels(), [0, 2, 8, 10]);
    }

    #[test]
    fn nes_output_is_scaled_from_the_native_raster() {
        let mut display = Display::nes(NATIVE_WIDTH * 3, NATIVE_HEIGHT * 3);
        let frame = numbered_frame(NATIVE_WIDTH, NATIVE_HEIGHT, BYTES_PER_PIXEL);
        display.update(&frame);
        let output = display.output();
        assert_eq!(output.width(), 768);
        assert_eq!(output.height(), 720);
        // Output pixel (x, y) samples native pixel (x / 3, y / 3)
        for (x, y) in [(0, 0), (767, 719), (300, 5), (5, 300)] {
            let out = (y * 768 + x) * BYTES_PER_PIXEL;
            let src = ((y / 3) * 256 + x / 3) * BYTES_PER_PIXEL;
            assert_eq!(
                output.pixels()[out..out + BYTES_PER_PIXEL],
                display.native().pixels()[src..src + BYTES_PER_PIXEL],
                "pixel ({x}, {y})"
            );
        }
    }
}
