use crate::{
    image::{IndexedImage, COLOR_PALETTE},
    Error, Result,
};

const CHAR_SIZE: usize = 32;
const NUM_CHARS: usize = 172;

/// A single 8x8 font character in planar layout. Each byte holds one color
/// component for a full row: bytes 0-7 are the blue plane, 8-15 green,
/// 16-23 red and 24-31 intensity.
pub struct FontChar {
    data: Vec<u8>,
}

impl FontChar {
    pub fn read(data: &[u8], offset: usize) -> Result<FontChar> {
        let end = offset + CHAR_SIZE;
        if end > data.len() {
            return Err(Error::EndOfData);
        }
        Ok(FontChar {
            data: data[offset..end].to_vec(),
        })
    }
}

impl IndexedImage for FontChar {
    fn width(&self) -> usize {
        8
    }

    fn height(&self) -> usize {
        8
    }

    fn color_at(&self, x: usize, y: usize) -> Result<u32> {
        if x > 7 || y > 7 {
            return Err(Error::OutOfRange(format!("pixel position {}, {}", x, y)));
        }
        let bit = 7 - (x & 7);
        let data = &self.data;
        let pixel = ((data[y] >> bit) & 1)          // blue
            | (((data[y + 8] >> bit) & 1) << 1)     // green
            | (((data[y + 16] >> bit) & 1) << 2)    // red
            | (((data[y + 24] >> bit) & 1) << 3); // intensity
        Ok(COLOR_PALETTE[pixel as usize])
    }
}

/// The 172 characters of the COLORF.FNT file.
pub struct Font {
    chars: Vec<FontChar>,
}

impl Font {
    /// Parses the font from the COLORF.FNT file content.
    pub fn parse(data: &[u8]) -> Result<Font> {
        let mut chars = Vec::with_capacity(NUM_CHARS);
        for i in 0..NUM_CHARS {
            chars.push(FontChar::read(data, i * CHAR_SIZE)?);
        }
        Ok(Font { chars })
    }

    pub fn chars(&self) -> &[FontChar] {
        self.chars.as_slice()
    }

    pub fn char(&self, index: usize) -> Result<&FontChar> {
        self.chars
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("font character index {}", index)))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}
