use crate::{
    huffman::decode_huffman,
    image::PicImage,
    reader::BinaryReader,
    vxor::decode_vxor,
    Error, Result,
};

const TILE_SIZE: usize = 128;

/// A single 16x16 tile. The raw record is vertically xor-coded with a line
/// width of 8 bytes (16 pixels at two per byte).
pub struct Tile {
    image: PicImage,
}

impl Tile {
    pub fn read(data: &[u8], offset: usize) -> Result<Tile> {
        let end = offset + TILE_SIZE;
        if end > data.len() {
            return Err(Error::EndOfData);
        }
        Ok(Tile {
            image: PicImage::new(decode_vxor(&data[offset..end], 8), 16, 16),
        })
    }

    pub fn image(&self) -> &PicImage {
        &self.image
    }
}

/// One tileset block of an ALLHTDS file.
pub struct Tileset {
    tiles: Vec<Tile>,
    disk: u8,
}

impl Tileset {
    pub fn tiles(&self) -> &[Tile] {
        self.tiles.as_slice()
    }

    pub fn tile(&self, index: usize) -> Result<&Tile> {
        self.tiles
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("tile index {}", index)))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn disk(&self) -> u8 {
        self.disk
    }
}

/// The tilesets of an ALLHTDS1 or ALLHTDS2 file. Each block starts with a
/// u32 uncompressed size, the string "msq" and a disk number, followed by
/// the Huffman-compressed tile records.
pub struct Tilesets {
    tilesets: Vec<Tileset>,
}

impl Tilesets {
    pub fn parse(data: &[u8]) -> Result<Tilesets> {
        let mut reader = BinaryReader::new(data);
        let mut tilesets = Vec::new();
        while reader.has_data(1, 0) {
            let block_size = reader.read_u32()? as usize;
            if reader.read_str(3)? != "msq" {
                return Err(Error::Format("invalid tileset block header"));
            }
            let disk = reader.read_u8()?;
            let decoded = decode_huffman(&mut reader, block_size)?;
            let num_tiles = block_size >> 7;
            let mut tiles = Vec::with_capacity(num_tiles);
            for i in 0..num_tiles {
                tiles.push(Tile::read(&decoded, i * TILE_SIZE)?);
            }
            tilesets.push(Tileset { tiles, disk });
        }
        Ok(Tilesets { tilesets })
    }

    pub fn tilesets(&self) -> &[Tileset] {
        self.tilesets.as_slice()
    }

    pub fn tileset(&self, index: usize) -> Result<&Tileset> {
        self.tilesets
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("tileset index {}", index)))
    }

    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }
}
