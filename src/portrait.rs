use crate::{
    huffman::decode_huffman,
    image::PicImage,
    player::{Animation, Player},
    reader::BinaryReader,
    vxor::decode_vxor,
    Error, Result,
};

const WIDTH: usize = 96;
const HEIGHT: usize = 84;
const LINE_SIZE: usize = WIDTH / 2;

/// A single portrait animation patch: XOR bytes applied at a byte offset
/// in the image data. The offset and patch size are packed into one word
/// with size-1 in the top nibble and the offset in the low 12 bits.
pub struct PortraitPatch {
    offset: u16,
    data: Vec<u8>,
}

impl PortraitPatch {
    fn read(reader: &mut BinaryReader) -> Result<Option<PortraitPatch>> {
        let word = reader.read_u16()?;
        if word == 0xffff {
            return Ok(None);
        }
        let size = (word >> 12) as usize + 1;
        let offset = word & 0x0fff;
        let data = reader.read_u8s(size)?;
        Ok(Some(PortraitPatch { offset, data }))
    }

    /// The byte offset in the image data to patch.
    pub fn offset(&self) -> u16 {
        self.offset
    }

    /// The horizontal patch position in pixels.
    pub fn x(&self) -> usize {
        self.offset as usize % LINE_SIZE
    }

    /// The vertical patch position in pixels.
    pub fn y(&self) -> usize {
        self.offset as usize / LINE_SIZE
    }

    /// The XOR bytes to apply. Applying a patch twice restores the frame.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

/// One portrait animation update, a group of patches applied together.
pub struct PortraitUpdate {
    patches: Vec<PortraitPatch>,
}

impl PortraitUpdate {
    fn read(reader: &mut BinaryReader) -> Result<PortraitUpdate> {
        let mut patches = Vec::new();
        while let Some(patch) = PortraitPatch::read(reader)? {
            patches.push(patch);
        }
        Ok(PortraitUpdate { patches })
    }

    pub fn patches(&self) -> &[PortraitPatch] {
        self.patches.as_slice()
    }
}

/// One line of a portrait animation script: wait `delay` time units, then
/// apply the update with the given index.
pub struct PortraitScriptLine {
    delay: u8,
    update: u8,
}

impl PortraitScriptLine {
    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn update(&self) -> u8 {
        self.update
    }
}

/// A looping portrait animation script track.
pub struct PortraitScript {
    lines: Vec<PortraitScriptLine>,
}

impl PortraitScript {
    fn read(reader: &mut BinaryReader) -> Result<PortraitScript> {
        let mut lines = Vec::new();
        loop {
            let delay = reader.read_u8()?;
            if delay == 0xff {
                break;
            }
            let update = reader.read_u8()?;
            lines.push(PortraitScriptLine { delay, update });
        }
        Ok(PortraitScript { lines })
    }

    pub fn lines(&self) -> &[PortraitScriptLine] {
        self.lines.as_slice()
    }
}

/// Playback position of one script track.
pub struct PortraitCursor {
    lines: Vec<usize>,
    delays: Vec<u32>,
}

/// An animated 96x84 portrait: a vxor-coded base frame MSQ block followed
/// by an MSQ block holding the animation scripts and updates.
pub struct Portrait {
    base_frame: Vec<u8>,
    scripts: Vec<PortraitScript>,
    updates: Vec<PortraitUpdate>,
}

impl Portrait {
    pub fn read(reader: &mut BinaryReader) -> Result<Portrait> {
        // Base frame block.
        let image_size = reader.read_u32()? as usize;
        let magic = reader.read_str(3)?;
        let image_disk = reader.read_u8()?;
        if magic != "msq" || image_disk > 1 {
            return Err(Error::Format("invalid base frame data block"));
        }
        let base_frame = decode_vxor(&decode_huffman(reader, image_size)?, LINE_SIZE);

        // Animation block.
        let anim_size = reader.read_u32()? as usize;
        let anim_magic = reader.read_str(3)?;
        let anim_disk = reader.read_u8()?;
        if anim_magic != "msq" || anim_disk != 0 {
            return Err(Error::Format("invalid animation data block"));
        }
        let anim_data = decode_huffman(reader, anim_size)?;
        let mut anim_reader = BinaryReader::new(&anim_data);

        let scripts_size = anim_reader.read_u16()? as usize;
        let mut scripts = Vec::new();
        while anim_reader.byte_index() - 2 < scripts_size {
            scripts.push(PortraitScript::read(&mut anim_reader)?);
        }

        let updates_size = anim_reader.read_u16()? as usize;
        let start_index = anim_reader.byte_index();
        let mut updates = Vec::new();
        while anim_reader.byte_index() - start_index < updates_size {
            updates.push(PortraitUpdate::read(&mut anim_reader)?);
        }

        Ok(Portrait {
            base_frame,
            scripts,
            updates,
        })
    }

    /// The vxor-decoded base frame.
    pub fn base_frame(&self) -> PicImage {
        PicImage::new(self.base_frame.clone(), WIDTH, HEIGHT)
    }

    pub fn scripts(&self) -> &[PortraitScript] {
        self.scripts.as_slice()
    }

    pub fn updates(&self) -> &[PortraitUpdate] {
        self.updates.as_slice()
    }

    pub fn create_player(self) -> Player<Portrait> {
        Player::new(self)
    }

    fn apply(&self, frame: &mut PicImage, update_index: usize) {
        if let Some(update) = self.updates.get(update_index) {
            let mut data = frame.data().to_vec();
            for patch in &update.patches {
                let offset = patch.offset as usize;
                for (i, value) in patch.data.iter().enumerate() {
                    if let Some(b) = data.get_mut(offset + i) {
                        *b ^= value;
                    }
                }
            }
            *frame = PicImage::new(data, WIDTH, HEIGHT);
        }
    }
}

impl Animation for Portrait {
    type Frame = PicImage;
    type Cursor = PortraitCursor;

    fn width(&self) -> usize {
        WIDTH
    }

    fn height(&self) -> usize {
        HEIGHT
    }

    fn init(&self) -> (PicImage, PortraitCursor) {
        let lines = vec![0; self.scripts.len()];
        let delays = self
            .scripts
            .iter()
            .map(|script| script.lines.first().map_or(u32::MAX, |l| l.delay as u32))
            .collect();
        (self.base_frame(), PortraitCursor { lines, delays })
    }

    fn advance(&self, frame: &mut PicImage, cursor: &mut PortraitCursor) {
        let delta = self.next_delay(cursor);
        if delta == 0 && cursor.delays.iter().all(|&d| d == u32::MAX) {
            return;
        }
        for (i, script) in self.scripts.iter().enumerate() {
            if script.lines.is_empty() {
                continue;
            }
            cursor.delays[i] = cursor.delays[i].saturating_sub(delta);
            if cursor.delays[i] == 0 {
                let line = &script.lines[cursor.lines[i]];
                self.apply(frame, line.update as usize);
                cursor.lines[i] = (cursor.lines[i] + 1) % script.lines.len();
                cursor.delays[i] = script.lines[cursor.lines[i]].delay as u32;
            }
        }
    }

    fn next_delay(&self, cursor: &PortraitCursor) -> u32 {
        cursor
            .delays
            .iter()
            .copied()
            .filter(|&d| d != u32::MAX)
            .min()
            .unwrap_or(0)
    }
}

/// The portraits of an ALLPICS1 or ALLPICS2 file.
pub struct Portraits {
    portraits: Vec<Portrait>,
}

impl Portraits {
    pub fn parse(data: &[u8]) -> Result<Portraits> {
        let mut reader = BinaryReader::new(data);
        let mut portraits = Vec::new();
        while reader.has_data(1, 0) {
            portraits.push(Portrait::read(&mut reader)?);
        }
        Ok(Portraits { portraits })
    }

    pub fn portraits(&self) -> &[Portrait] {
        self.portraits.as_slice()
    }

    pub fn portrait(&self, index: usize) -> Result<&Portrait> {
        self.portraits
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("portrait index {}", index)))
    }

    pub fn len(&self) -> usize {
        self.portraits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portraits.is_empty()
    }

    pub fn into_portraits(self) -> Vec<Portrait> {
        self.portraits
    }
}
