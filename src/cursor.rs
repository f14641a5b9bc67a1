use crate::{
    image::{IndexedImage, COLOR_PALETTE, TRANSPARENCY},
    Error, Result,
};

const CURSOR_SIZE: usize = 256;
const NUM_CURSORS: usize = 8;

/// A single 16x16 mouse cursor image in masked bitplane layout.
pub struct Cursor {
    data: Vec<u8>,
}

impl Cursor {
    pub fn read(data: &[u8], offset: usize) -> Result<Cursor> {
        let end = offset + CURSOR_SIZE;
        if end > data.len() {
            return Err(Error::EndOfData);
        }
        Ok(Cursor {
            data: data[offset..end].to_vec(),
        })
    }
}

impl IndexedImage for Cursor {
    fn width(&self) -> usize {
        16
    }

    fn height(&self) -> usize {
        16
    }

    fn color_at(&self, x: usize, y: usize) -> Result<u32> {
        if x > 15 || y > 15 {
            return Err(Error::OutOfRange(format!("pixel position {}, {}", x, y)));
        }

        let data = &self.data;
        let i = (y << 2) + 3 - (x >> 3);
        let b = 7 - (x & 7);

        // The transparency mask has one bit per color component but the game
        // always sets all four to the same value, so checking the blue plane
        // mask bit is enough.
        if (data[i - 2] >> b) & 1 == 1 {
            let pixel = ((data[i] >> b) & 1)            // blue
                | (((data[i + 64] >> b) & 1) << 1)      // green
                | (((data[i + 128] >> b) & 1) << 2)     // red
                | (((data[i + 192] >> b) & 1) << 3); // intensity
            Ok(COLOR_PALETTE[pixel as usize])
        } else {
            Ok(TRANSPARENCY)
        }
    }
}

/// The 8 mouse cursors of the CURS file.
pub struct Cursors {
    cursors: Vec<Cursor>,
}

impl Cursors {
    /// Parses the mouse cursor images from the CURS file content.
    pub fn parse(data: &[u8]) -> Result<Cursors> {
        let mut cursors = Vec::with_capacity(NUM_CURSORS);
        for i in 0..NUM_CURSORS {
            cursors.push(Cursor::read(data, i * CURSOR_SIZE)?);
        }
        Ok(Cursors { cursors })
    }

    pub fn cursors(&self) -> &[Cursor] {
        self.cursors.as_slice()
    }

    pub fn cursor(&self, index: usize) -> Result<&Cursor> {
        self.cursors
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("cursor index {}", index)))
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Builds a 256-byte cursor record with a single pixel at (x, y) set to
    // the given 4-bit color, opaque only at that pixel.
    fn cursor_record(x: usize, y: usize, color: u8) -> Vec<u8> {
        let mut data = vec![0u8; CURSOR_SIZE];
        let i = (y << 2) + 3 - (x >> 3);
        let b = 7 - (x & 7);
        data[i - 2] |= 1 << b;
        for plane in 0..4 {
            if (color >> plane) & 1 == 1 {
                data[i + plane * 64] |= 1 << b;
            }
        }
        data
    }

    #[test]
    fn opaque_pixel_resolves_through_planes() {
        let cursor = Cursor::read(&cursor_record(0, 0, 12), 0).unwrap();
        assert_eq!(cursor.color_at(0, 0).unwrap(), COLOR_PALETTE[12]);
        assert_eq!(cursor.color_at(1, 0).unwrap(), TRANSPARENCY);
        assert_eq!(cursor.color_at(15, 15).unwrap(), TRANSPARENCY);
    }

    #[test]
    fn pixels_beyond_byte_seven_use_lower_plane_bytes() {
        let cursor = Cursor::read(&cursor_record(10, 3, 5), 0).unwrap();
        assert_eq!(cursor.color_at(10, 3).unwrap(), COLOR_PALETTE[5]);
        assert_eq!(cursor.color_at(9, 3).unwrap(), TRANSPARENCY);
    }

    #[test]
    fn file_holds_eight_cursors() {
        let mut data = Vec::new();
        for i in 0..8 {
            data.extend_from_slice(&cursor_record(i, i, 15));
        }
        let cursors = Cursors::parse(&data).unwrap();
        assert_eq!(cursors.len(), 8);
        assert_eq!(cursors.cursor(3).unwrap().color_at(3, 3).unwrap(), COLOR_PALETTE[15]);
        assert!(matches!(cursors.cursor(8), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn short_file_is_rejected() {
        assert!(matches!(Cursors::parse(&[0u8; 255]), Err(Error::EndOfData)));
    }
}
