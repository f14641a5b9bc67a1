use std::{fs::File, io::BufWriter, path::Path};

use crate::{Error, Result};

/// Transparent RGBA color.
pub const TRANSPARENCY: u32 = 0x0000_0000;

/// The 16 colors (in RGBA format) used by the game graphics.
pub const COLOR_PALETTE: [u32; 16] = [
    0x000000ff, //  0 = black
    0x0000aaff, //  1 = blue
    0x00aa00ff, //  2 = green
    0x00aaaaff, //  3 = cyan
    0xaa0000ff, //  4 = red
    0xaa00aaff, //  5 = magenta
    0xaa5500ff, //  6 = brown
    0xaaaaaaff, //  7 = light gray
    0x555555ff, //  8 = gray
    0x5555ffff, //  9 = light blue
    0x55ff55ff, // 10 = light green
    0x55ffffff, // 11 = light cyan
    0xff5555ff, // 12 = light red
    0xff55ffff, // 13 = light magenta
    0xffff55ff, // 14 = yellow
    0xffffffff, // 15 = white
];

/// A fixed-size image addressed by palette lookups.
pub trait IndexedImage {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Returns the RGBA color at the given pixel position.
    fn color_at(&self, x: usize, y: usize) -> Result<u32>;

    /// Renders the image into a flat RGBA byte buffer, row by row.
    fn to_rgba(&self) -> Result<Vec<u8>> {
        let mut rgba = Vec::with_capacity(self.width() * self.height() * 4);
        for y in 0..self.height() {
            for x in 0..self.width() {
                rgba.extend_from_slice(&self.color_at(x, y)?.to_be_bytes());
            }
        }
        Ok(rgba)
    }

    /// Blits the image into an RGBA target buffer at the given position.
    /// Transparent pixels leave the target untouched.
    fn blit(&self, target: &mut [u8], target_width: usize, left: usize, top: usize) -> Result<()> {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let color = self.color_at(x, y)?;
                if color == TRANSPARENCY {
                    continue;
                }
                let i = ((top + y) * target_width + left + x) * 4;
                if i + 4 > target.len() {
                    return Err(Error::OutOfRange(format!(
                        "blit position {}, {}",
                        left + x,
                        top + y
                    )));
                }
                target[i..i + 4].copy_from_slice(&color.to_be_bytes());
            }
        }
        Ok(())
    }

    fn write_png(&self, filename: &str) -> Result<()> {
        let path = Path::new(&filename);
        let file = File::create(path)?;
        let w = &mut BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, self.width() as u32, self.height() as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgba()?)?;

        Ok(())
    }
}

/// An image in pic layout, where each byte holds two 4-bit colors. The
/// high nibble is the left pixel of the pair.
pub struct PicImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl PicImage {
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// The raw pic data, two 4-bit colors per byte.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

impl IndexedImage for PicImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn color_at(&self, x: usize, y: usize) -> Result<u32> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfRange(format!("pixel position {}, {}", x, y)));
        }
        let pair = self.data[(y * self.width + x) >> 1];
        let pixel = if x & 1 == 1 { pair & 0xf } else { pair >> 4 };
        Ok(COLOR_PALETTE[pixel as usize])
    }
}
