use crate::{
    image::{IndexedImage, COLOR_PALETTE, TRANSPARENCY},
    Error, Result,
};

const SPRITE_SIZE: usize = 128;
const MASK_SIZE: usize = 32;
const NUM_SPRITES: usize = 10;

/// A single 16x16 sprite image with a separate transparency mask.
pub struct Sprite {
    data: Vec<u8>,
    mask: Vec<u8>,
}

impl Sprite {
    pub fn read(data: &[u8], mask: &[u8], data_offset: usize, mask_offset: usize) -> Result<Sprite> {
        let data_end = data_offset + SPRITE_SIZE;
        let mask_end = mask_offset + MASK_SIZE;
        if data_end > data.len() || mask_end > mask.len() {
            return Err(Error::EndOfData);
        }
        Ok(Sprite {
            data: data[data_offset..data_end].to_vec(),
            mask: mask[mask_offset..mask_end].to_vec(),
        })
    }
}

impl IndexedImage for Sprite {
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
        let i = (y << 1) + (x >> 3);
        let b = 7 - (x % 8);
        if (self.mask[i] >> b) & 1 != 0 {
            return Ok(TRANSPARENCY);
        }
        let data = &self.data;
        let pixel = ((data[i] >> b) & 1)            // blue
            | (((data[i + 32] >> b) & 1) << 1)      // green
            | (((data[i + 64] >> b) & 1) << 2)      // red
            | (((data[i + 96] >> b) & 1) << 3); // intensity
        Ok(COLOR_PALETTE[pixel as usize])
    }
}

/// The 10 sprites of the IC0_9.WLF file together with their transparency
/// masks from MASKS.WLF.
pub struct Sprites {
    sprites: Vec<Sprite>,
}

impl Sprites {
    /// Parses the sprites from the contents of the image and mask files.
    pub fn parse(data: &[u8], masks: &[u8]) -> Result<Sprites> {
        let mut sprites = Vec::with_capacity(NUM_SPRITES);
        for i in 0..NUM_SPRITES {
            sprites.push(Sprite::read(data, masks, i * SPRITE_SIZE, i * MASK_SIZE)?);
        }
        Ok(Sprites { sprites })
    }

    pub fn sprites(&self) -> &[Sprite] {
        self.sprites.as_slice()
    }

    pub fn sprite(&self, index: usize) -> Result<&Sprite> {
        self.sprites
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("sprite index {}", index)))
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite_record(x: usize, y: usize, color: u8) -> (Vec<u8>, Vec<u8>) {
        let mut data = vec![0u8; SPRITE_SIZE];
        // Everything transparent except the single test pixel.
        let mut mask = vec![0xffu8; MASK_SIZE];
        let i = (y << 1) + (x >> 3);
        let b = 7 - (x % 8);
        mask[i] &= !(1 << b);
        for plane in 0..4 {
            if (color >> plane) & 1 == 1 {
                data[i + plane * 32] |= 1 << b;
            }
        }
        (data, mask)
    }

    #[test]
    fn mask_bit_hides_pixel() {
        let (data, mask) = sprite_record(12, 7, 11);
        let sprite = Sprite::read(&data, &mask, 0, 0).unwrap();
        assert_eq!(sprite.color_at(12, 7).unwrap(), COLOR_PALETTE[11]);
        assert_eq!(sprite.color_at(11, 7).unwrap(), TRANSPARENCY);
        assert_eq!(sprite.color_at(0, 0).unwrap(), TRANSPARENCY);
    }

    #[test]
    fn file_holds_ten_sprites() {
        let mut data = Vec::new();
        let mut masks = Vec::new();
        for _ in 0..NUM_SPRITES {
            let (d, m) = sprite_record(0, 0, 14);
            data.extend_from_slice(&d);
            masks.extend_from_slice(&m);
        }
        let sprites = Sprites::parse(&data, &masks).unwrap();
        assert_eq!(sprites.len(), 10);
        assert_eq!(sprites.sprite(9).unwrap().color_at(0, 0).unwrap(), COLOR_PALETTE[14]);
        assert!(matches!(sprites.sprite(10), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn short_mask_file_is_rejected() {
        let data = vec![0u8; NUM_SPRITES * SPRITE_SIZE];
        let masks = vec![0u8; NUM_SPRITES * MASK_SIZE - 1];
        assert!(matches!(Sprites::parse(&data, &masks), Err(Error::EndOfData)));
    }
}
