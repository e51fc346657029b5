use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use wraith::Raster;

use crate::Error;

/// Writes an RGBA raster out as a PNG.
pub fn write_png(path: &Path, raster: &Raster) -> Result<(), Error> {
    encode_png(path, raster).map_err(|source| Error::Screenshot {
        path: path.to_owned(),
        source,
    })
}

fn encode_png(path: &Path, raster: &Raster) -> Result<(), png::EncodingError> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, raster.width(), raster.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(raster.pixels())?;
    writer.finish()
}
