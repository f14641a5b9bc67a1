use crate::{
    huffman::decode_huffman,
    image::PicImage,
    player::{Animation, Player},
    reader::BinaryReader,
    vxor::decode_vxor,
    Error, Result,
};

const WIDTH: usize = 288;
const HEIGHT: usize = 128;
const LINE_SIZE: usize = WIDTH / 2;

/// A single patch of an ending animation update. The raw offset counts
/// 8-pixel blocks on a 320 pixel wide virtual screen; the patch carries
/// four literal bytes (eight 4-bit colors) to write at that position.
pub struct EndingPatch {
    offset: u16,
    data: [u8; 4],
}

impl EndingPatch {
    fn read(reader: &mut BinaryReader) -> Result<Option<EndingPatch>> {
        let offset = reader.read_u16()?;
        if offset == 0xffff {
            return Ok(None);
        }
        let mut data = [0u8; 4];
        for b in data.iter_mut() {
            *b = reader.read_u8()?;
        }
        Ok(Some(EndingPatch { offset, data }))
    }

    /// The raw offset in 8-pixel blocks on the 320 pixel virtual screen.
    pub fn raw_offset(&self) -> u16 {
        self.offset
    }

    /// The horizontal patch position in image pixels.
    pub fn x(&self) -> usize {
        self.offset as usize * 8 % 320
    }

    /// The vertical patch position in image pixels.
    pub fn y(&self) -> usize {
        self.offset as usize * 8 / 320
    }

    /// The byte offset in the image data to patch.
    pub fn data_offset(&self) -> usize {
        self.y() * LINE_SIZE + (self.x() >> 1)
    }

    pub fn data(&self) -> &[u8; 4] {
        &self.data
    }
}

/// One ending animation update: a delay in animation time units followed
/// by the patches to apply after it.
pub struct EndingUpdate {
    delay: u16,
    patches: Vec<EndingPatch>,
}

impl EndingUpdate {
    fn read(reader: &mut BinaryReader) -> Result<Option<EndingUpdate>> {
        let delay = reader.read_u16()?;
        if delay == 0xffff {
            return Ok(None);
        }
        let mut patches = Vec::new();
        while let Some(patch) = EndingPatch::read(reader)? {
            patches.push(patch);
        }
        Ok(Some(EndingUpdate { delay, patches }))
    }

    pub fn delay(&self) -> u16 {
        self.delay
    }

    pub fn patches(&self) -> &[EndingPatch] {
        self.patches.as_slice()
    }
}

/// The end animation of the END.CPA file: a vxor-coded base frame MSQ
/// block followed by a second block holding the animation updates.
pub struct Ending {
    base_frame: Vec<u8>,
    updates: Vec<EndingUpdate>,
}

impl Ending {
    pub fn parse(data: &[u8]) -> Result<Ending> {
        let mut reader = BinaryReader::new(data);

        // Base frame block.
        let image_size = reader.read_u32()? as usize;
        let magic = reader.read_str(3)?;
        let image_disk = reader.read_u8()?;
        if magic != "msq" || image_disk != 0 {
            return Err(Error::Format("invalid base frame data block"));
        }
        let base_frame = decode_vxor(&decode_huffman(&mut reader, image_size)?, LINE_SIZE);

        // Animation block. Its header bytes differ from a plain MSQ block.
        let anim_size = reader.read_u32()? as usize;
        let m = reader.read_u8()?;
        let s = reader.read_u8()?;
        let q = reader.read_u8()?;
        let anim_disk = reader.read_u8()?;
        if m != 0x08 || s != 0x67 || q != 0x01 || anim_disk != 0 {
            return Err(Error::Format("invalid animation data block"));
        }
        let anim_data = decode_huffman(&mut reader, anim_size)?;
        let mut anim_reader = BinaryReader::new(&anim_data);
        if anim_reader.read_u16()? as usize != anim_size - 4 {
            return Err(Error::Format("invalid animation data block size"));
        }
        let mut updates = Vec::new();
        while let Some(update) = EndingUpdate::read(&mut anim_reader)? {
            updates.push(update);
        }
        if anim_reader.read_u16()? != 0 {
            return Err(Error::Format("invalid animation data block end"));
        }

        Ok(Ending {
            base_frame,
            updates,
        })
    }

    /// The vxor-decoded base frame.
    pub fn base_frame(&self) -> PicImage {
        PicImage::new(self.base_frame.clone(), WIDTH, HEIGHT)
    }

    pub fn updates(&self) -> &[EndingUpdate] {
        self.updates.as_slice()
    }

    pub fn update(&self, index: usize) -> Result<&EndingUpdate> {
        self.updates
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("update index {}", index)))
    }

    pub fn create_player(self) -> Player<Ending> {
        Player::new(self)
    }
}

impl Animation for Ending {
    type Frame = PicImage;
    type Cursor = usize;

    fn width(&self) -> usize {
        WIDTH
    }

    fn height(&self) -> usize {
        HEIGHT
    }

    fn init(&self) -> (PicImage, usize) {
        (self.base_frame(), 0)
    }

    fn advance(&self, frame: &mut PicImage, cursor: &mut usize) {
        *cursor += 1;
        // The animation plays through once and then loops its tail.
        if *cursor == 15 {
            *cursor = 11;
        }
        if let Some(update) = self.updates.get(*cursor) {
            let mut data = frame.data().to_vec();
            for patch in &update.patches {
                let offset = patch.data_offset();
                if offset + 4 <= data.len() {
                    data[offset..offset + 4].copy_from_slice(&patch.data);
                }
            }
            *frame = PicImage::new(data, WIDTH, HEIGHT);
        }
    }

    fn next_delay(&self, cursor: &usize) -> u32 {
        self.updates.get(*cursor).map_or(0, |u| u.delay as u32)
    }
}
