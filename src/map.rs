use log::debug;

use crate::{
    decrypt::Decrypter,
    exe::Exe,
    huffman::decode_huffman,
    mob::Mob,
    reader::BinaryReader,
    strings::decode_string_groups,
    Error, Result,
};

// Offsets in the section directory are relative to the MSQ block start;
// the decrypted plaintext begins after the 4-byte magic and 2 seed bytes.
const PLAINTEXT_BASE: usize = 6;

/// Offset and size of one MSQ block inside a GAME file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsqBlock {
    pub offset: usize,
    pub size: usize,
}

/// Scans a GAME file for its MSQ blocks and returns the disk number along
/// with the block locations. A block starts at each "msq"+disk marker and
/// runs to the next marker or the end of the file.
pub fn scan_msq_blocks(data: &[u8]) -> Result<(u8, Vec<MsqBlock>)> {
    if data.len() < 4 || &data[0..3] != b"msq" {
        return Err(Error::Format("invalid GAME file header"));
    }
    let disk_char = data[3];
    let disk = match disk_char {
        b'0' => 0,
        b'1' => 1,
        _ => return Err(Error::Format("invalid GAME file disk number")),
    };

    let mut blocks = Vec::new();
    let mut start = 0;
    for i in 4..data.len() {
        if data[i] == disk_char && &data[i - 3..i] == b"msq" && i - 3 > start {
            blocks.push(MsqBlock {
                offset: start,
                size: i - 3 - start,
            });
            start = i - 3;
        }
    }
    blocks.push(MsqBlock {
        offset: start,
        size: data.len() - start,
    });
    Ok((disk, blocks))
}

/// The action class nibble grid of a map. Each square carries a 4-bit
/// class selecting which action table interprets its action byte.
pub struct ActionClassMap {
    classes: Vec<u8>,
    size: usize,
}

impl ActionClassMap {
    fn read(reader: &mut BinaryReader, size: usize) -> Result<ActionClassMap> {
        let mut classes = Vec::with_capacity(size * size);
        for _ in 0..size * size / 2 {
            let value = reader.read_u8()?;
            classes.push(value >> 4);
            classes.push(value & 0xf);
        }
        Ok(ActionClassMap { classes, size })
    }

    /// The action class at the given square, 0 for positions off the map.
    pub fn action_class(&self, x: usize, y: usize) -> u8 {
        if x < self.size && y < self.size {
            self.classes[y * self.size + x]
        } else {
            0
        }
    }
}

/// The action byte grid of a map.
pub struct ActionMap {
    actions: Vec<u8>,
    size: usize,
}

impl ActionMap {
    fn read(reader: &mut BinaryReader, size: usize) -> Result<ActionMap> {
        Ok(ActionMap {
            actions: reader.read_u8s(size * size)?,
            size,
        })
    }

    /// The action byte at the given square, 0 for positions off the map.
    pub fn action(&self, x: usize, y: usize) -> u8 {
        if x < self.size && y < self.size {
            self.actions[y * self.size + x]
        } else {
            0
        }
    }
}

/// The central directory of a map's MSQ block: byte offsets (relative to
/// the block start) of the variable-length sections.
pub struct SectionDirectory {
    strings: u16,
    monster_names: u16,
    monster_data: u16,
    action_class_tables: [u16; 16],
    special_actions: u16,
    npc_table: u16,
}

impl SectionDirectory {
    fn read(reader: &mut BinaryReader) -> Result<SectionDirectory> {
        let strings = reader.read_u16()?;
        let monster_names = reader.read_u16()?;
        let monster_data = reader.read_u16()?;
        let mut action_class_tables = [0u16; 16];
        for entry in action_class_tables.iter_mut() {
            *entry = reader.read_u16()?;
        }
        let special_actions = reader.read_u16()?;
        let npc_table = reader.read_u16()?;
        Ok(SectionDirectory {
            strings,
            monster_names,
            monster_data,
            action_class_tables,
            special_actions,
            npc_table,
        })
    }

    pub fn strings(&self) -> u16 {
        self.strings
    }

    pub fn monster_names(&self) -> u16 {
        self.monster_names
    }

    pub fn monster_data(&self) -> u16 {
        self.monster_data
    }

    pub fn action_class_tables(&self) -> &[u16; 16] {
        &self.action_class_tables
    }

    pub fn special_actions(&self) -> u16 {
        self.special_actions
    }

    pub fn npc_table(&self) -> u16 {
        self.npc_table
    }
}

/// The fixed 50-byte map info record following the section directory.
pub struct MapInfo {
    unknown_00: u8,
    unknown_01: u8,
    map_size: u8,
    unknown_03: u8,
    unknown_04: u8,
    encounter_frequency: u8,
    tileset: u8,
    random_monster_types: u8,
    max_random_encounters: u8,
    border_tile: u8,
    time_per_step: u16,
    heal_rate: u8,
    combat_string_ids: Vec<u8>,
}

impl MapInfo {
    fn read(reader: &mut BinaryReader) -> Result<MapInfo> {
        Ok(MapInfo {
            unknown_00: reader.read_u8()?,
            unknown_01: reader.read_u8()?,
            map_size: reader.read_u8()?,
            unknown_03: reader.read_u8()?,
            unknown_04: reader.read_u8()?,
            encounter_frequency: reader.read_u8()?,
            tileset: reader.read_u8()?,
            random_monster_types: reader.read_u8()?,
            max_random_encounters: reader.read_u8()?,
            border_tile: reader.read_u8()?,
            time_per_step: reader.read_u16()?,
            heal_rate: reader.read_u8()?,
            combat_string_ids: reader.read_u8s(37)?,
        })
    }

    /// The map size, 32 or 64 squares per side.
    pub fn map_size(&self) -> u8 {
        self.map_size
    }

    pub fn encounter_frequency(&self) -> u8 {
        self.encounter_frequency
    }

    /// The tileset index across ALLHTDS1 and ALLHTDS2.
    pub fn tileset(&self) -> u8 {
        self.tileset
    }

    pub fn random_monster_types(&self) -> u8 {
        self.random_monster_types
    }

    pub fn max_random_encounters(&self) -> u8 {
        self.max_random_encounters
    }

    /// The tile drawn around the map border.
    pub fn border_tile(&self) -> u8 {
        self.border_tile
    }

    /// Game time per step, in 1/256 minutes.
    pub fn time_per_step(&self) -> u16 {
        self.time_per_step
    }

    pub fn heal_rate(&self) -> u8 {
        self.heal_rate
    }

    pub fn combat_string_ids(&self) -> &[u8] {
        self.combat_string_ids.as_slice()
    }

    pub fn unknown_bytes(&self) -> [u8; 4] {
        [
            self.unknown_00,
            self.unknown_01,
            self.unknown_03,
            self.unknown_04,
        ]
    }
}

/// The Huffman-compressed tile index grid at the end of a map block.
pub struct TileMap {
    size: usize,
    unknown: u32,
    tiles: Vec<u8>,
}

impl TileMap {
    fn read(reader: &mut BinaryReader, expected_size: usize) -> Result<TileMap> {
        let byte_size = reader.read_u32()? as usize;
        let size = (byte_size as f64).sqrt() as usize;
        if size * size != byte_size || (size != 32 && size != 64) {
            return Err(Error::Format("invalid tile map size"));
        }
        if size != expected_size {
            return Err(Error::Format("tile map size mismatch"));
        }
        let unknown = reader.read_u32()?;
        let tiles = decode_huffman(reader, byte_size)?;
        Ok(TileMap {
            size,
            unknown,
            tiles,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn unknown(&self) -> u32 {
        self.unknown
    }

    /// The tile index at the given square, 0 for positions off the map.
    pub fn tile(&self, x: usize, y: usize) -> u8 {
        if x < self.size && y < self.size {
            self.tiles[y * self.size + x]
        } else {
            0
        }
    }
}

/// One fully decoded game map.
pub struct GameMap {
    index: usize,
    action_class_map: ActionClassMap,
    action_map: ActionMap,
    directory: SectionDirectory,
    info: MapInfo,
    monster_names: Vec<String>,
    mobs: Vec<Mob>,
    strings: Vec<Vec<String>>,
    tile_map: TileMap,
}

impl GameMap {
    fn read(
        reader: &mut BinaryReader,
        disk: u8,
        index: usize,
        map_size: usize,
        tile_map_offset: usize,
    ) -> Result<GameMap> {
        let magic = reader.read_str(3)?;
        let disk_char = reader.read_u8()?;
        if magic != "msq" || disk_char != b'0' + disk {
            return Err(Error::Format("invalid map block header"));
        }

        let mut decrypter = Decrypter::new(reader)?;
        let plaintext = if tile_map_offset > PLAINTEXT_BASE {
            decrypter.read_bytes(tile_map_offset - PLAINTEXT_BASE)?
        } else {
            // Without a known tile map offset the encrypted region ends at
            // its checksum marker.
            decrypter.read_until_checksum()?
        };

        let mut plain = BinaryReader::new(&plaintext);
        let action_class_map = ActionClassMap::read(&mut plain, map_size)?;
        let action_map = ActionMap::read(&mut plain, map_size)?;
        let directory = SectionDirectory::read(&mut plain)?;
        let info = MapInfo::read(&mut plain)?;
        if info.map_size() as usize != map_size {
            return Err(Error::Format("map info size mismatch"));
        }

        let monster_names = Self::read_monster_names(&mut plain, &directory)?;
        let mobs = Self::read_mobs(&mut plain, &directory, &monster_names)?;
        let strings = Self::read_strings(&plaintext, &directory)?;

        // The tile map follows the encrypted region.
        let tile_map = TileMap::read(reader, map_size)?;

        debug!(
            "map {}: size {}, tileset {}, {} mobs, {} string groups",
            index,
            map_size,
            info.tileset(),
            mobs.len(),
            strings.len()
        );

        Ok(GameMap {
            index,
            action_class_map,
            action_map,
            directory,
            info,
            monster_names,
            mobs,
            strings,
            tile_map,
        })
    }

    fn read_monster_names(
        plain: &mut BinaryReader,
        directory: &SectionDirectory,
    ) -> Result<Vec<String>> {
        let start = directory.monster_names as usize;
        let end = directory.monster_data as usize;
        if start < PLAINTEXT_BASE || end <= start {
            return Ok(Vec::new());
        }
        plain.seek(start - PLAINTEXT_BASE, 0)?;
        let mut names = Vec::new();
        while plain.byte_index() < end - PLAINTEXT_BASE {
            names.push(plain.read_null_str()?);
        }
        Ok(names)
    }

    fn read_mobs(
        plain: &mut BinaryReader,
        directory: &SectionDirectory,
        names: &[String],
    ) -> Result<Vec<Mob>> {
        let start = directory.monster_data as usize;
        if start < PLAINTEXT_BASE || names.is_empty() {
            return Ok(Vec::new());
        }
        plain.seek(start - PLAINTEXT_BASE, 0)?;
        names
            .iter()
            .map(|name| Mob::read(plain, name.clone()))
            .collect()
    }

    fn read_strings(plaintext: &[u8], directory: &SectionDirectory) -> Result<Vec<Vec<String>>> {
        let start = directory.strings as usize;
        if start < PLAINTEXT_BASE || start - PLAINTEXT_BASE >= plaintext.len() {
            return Ok(Vec::new());
        }
        let offset = start - PLAINTEXT_BASE;
        decode_string_groups(plaintext, offset, plaintext.len() - offset)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn action_class_map(&self) -> &ActionClassMap {
        &self.action_class_map
    }

    pub fn action_map(&self) -> &ActionMap {
        &self.action_map
    }

    pub fn directory(&self) -> &SectionDirectory {
        &self.directory
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    pub fn monster_names(&self) -> &[String] {
        self.monster_names.as_slice()
    }

    pub fn mobs(&self) -> &[Mob] {
        self.mobs.as_slice()
    }

    pub fn strings(&self) -> &[Vec<String>] {
        self.strings.as_slice()
    }

    pub fn tile_map(&self) -> &TileMap {
        &self.tile_map
    }
}

/// A decoded GAME1 or GAME2 file.
pub struct Game {
    disk: u8,
    maps: Vec<GameMap>,
}

impl Game {
    /// Parses a GAME file. Map sizes and tile map offsets come from the
    /// unpacked executable's per-location tables.
    pub fn parse(data: &[u8], exe: &Exe) -> Result<Game> {
        let (disk, blocks) = scan_msq_blocks(data)?;
        let mut maps = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            let mut reader = BinaryReader::with_range(data, block.offset, block.size)?;
            let map_size = exe.map_size(disk, index)?;
            let tile_map_offset = exe.tile_map_offset(disk, index)?;
            maps.push(GameMap::read(
                &mut reader,
                disk,
                index,
                map_size,
                tile_map_offset,
            )?);
        }
        Ok(Game { disk, maps })
    }

    pub fn disk(&self) -> u8 {
        self.disk
    }

    pub fn maps(&self) -> &[GameMap] {
        self.maps.as_slice()
    }

    pub fn map(&self, index: usize) -> Result<&GameMap> {
        self.maps
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("map index {}", index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exe::Exe;
    use crate::testutil::bits;

    const MAP_SIZE: usize = 32;

    // Mirrors the map cipher: key from the two seed bytes, then a rotating
    // XOR over the plaintext.
    fn encrypt(plaintext: &[u8]) -> Vec<u8> {
        let sum = plaintext
            .iter()
            .fold(0u16, |sum, &b| sum.wrapping_add(b as u16));
        let target = 0u16.wrapping_sub(sum);
        let e1 = (target & 0xff) as u8;
        let e2 = (target >> 8) as u8;
        let mut out = vec![e1, e2];
        let mut key = e1 ^ e2;
        for &b in plaintext {
            out.push(b ^ key);
            key = key.wrapping_add(0x1f);
        }
        out
    }

    // Plaintext layout: 512-byte action class grid, 1024-byte action grid,
    // 42-byte directory, 50-byte map info, 4 bytes of monster names and
    // one 8-byte monster record.
    fn plaintext() -> Vec<u8> {
        let mut plain = Vec::new();
        plain.resize(512, 0x12);
        plain.resize(512 + 1024, 0x07);
        // Directory, offsets relative to the block start.
        plain.extend_from_slice(&0u16.to_le_bytes()); // strings
        plain.extend_from_slice(&((1628 + PLAINTEXT_BASE) as u16).to_le_bytes());
        plain.extend_from_slice(&((1632 + PLAINTEXT_BASE) as u16).to_le_bytes());
        for _ in 0..16 {
            plain.extend_from_slice(&0u16.to_le_bytes());
        }
        plain.extend_from_slice(&0u16.to_le_bytes()); // special actions
        plain.extend_from_slice(&0u16.to_le_bytes()); // npc table
        // Map info.
        let mut info = vec![0, 0, MAP_SIZE as u8, 0, 0, 5, 1, 2, 3, 31];
        info.extend_from_slice(&256u16.to_le_bytes());
        info.push(4);
        info.extend_from_slice(&[0u8; 37]);
        assert_eq!(info.len(), 50);
        plain.extend_from_slice(&info);
        assert_eq!(plain.len(), 1628);
        plain.extend_from_slice(b"RAT\0");
        plain.extend_from_slice(&[0x40, 0x00, 60, 2, 0x53, 0x12, 1, 9]);
        plain
    }

    fn tile_map_block() -> Vec<u8> {
        let mut block = Vec::new();
        block.extend_from_slice(&((MAP_SIZE * MAP_SIZE) as u32).to_le_bytes());
        block.extend_from_slice(&0u32.to_le_bytes());
        // Single-leaf tree filling the whole grid with tile 0x1f.
        block.extend_from_slice(&bits(&format!("1{:08b}", 0x1f)));
        block
    }

    fn game_file() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"msq0");
        data.extend_from_slice(&encrypt(&plaintext()));
        data.extend_from_slice(&tile_map_block());
        data
    }

    fn test_exe(tile_map_offset: u16) -> Exe {
        let mut data = vec![0u8; 0x1b600];
        let index = Exe::location_index(0, 0);
        data[0x1b2c0 + index] = MAP_SIZE as u8;
        let offset = 0x1b380 + index * 2;
        data[offset..offset + 2].copy_from_slice(&tile_map_offset.to_le_bytes());
        Exe::from_unpacked(data)
    }

    #[test]
    fn block_scan_includes_the_final_block() {
        let mut data = game_file();
        let first_len = data.len();
        data.extend_from_slice(b"msq0");
        data.extend_from_slice(&[0xaa; 20]);
        let (disk, blocks) = scan_msq_blocks(&data).unwrap();
        assert_eq!(disk, 0);
        assert_eq!(
            blocks,
            vec![
                MsqBlock {
                    offset: 0,
                    size: first_len
                },
                MsqBlock {
                    offset: first_len,
                    size: 24
                },
            ]
        );
    }

    #[test]
    fn bad_header_is_rejected() {
        assert!(matches!(
            scan_msq_blocks(b"msq2aaaa"),
            Err(Error::Format(_))
        ));
        assert!(matches!(scan_msq_blocks(b"xyz0"), Err(Error::Format(_))));
    }

    #[test]
    fn map_decodes_with_known_tile_map_offset() {
        let plain_len = plaintext().len();
        let game = Game::parse(&game_file(), &test_exe((PLAINTEXT_BASE + plain_len) as u16)).unwrap();
        assert_eq!(game.disk(), 0);
        assert_eq!(game.maps().len(), 1);
        let map = game.map(0).unwrap();
        assert_eq!(map.action_class_map().action_class(0, 0), 1);
        assert_eq!(map.action_class_map().action_class(1, 0), 2);
        assert_eq!(map.action_class_map().action_class(32, 0), 0);
        assert_eq!(map.action_map().action(5, 5), 7);
        assert_eq!(map.info().map_size(), 32);
        assert_eq!(map.info().encounter_frequency(), 5);
        assert_eq!(map.info().tileset(), 1);
        assert_eq!(map.info().border_tile(), 31);
        assert_eq!(map.info().time_per_step(), 256);
        assert_eq!(map.monster_names(), &["RAT".to_string()]);
        assert_eq!(map.mobs().len(), 1);
        let mob = &map.mobs()[0];
        assert_eq!(mob.name(), "RAT");
        assert_eq!(mob.hit_points(), 0x40);
        assert_eq!(mob.max_group_size(), 5);
        assert_eq!(mob.armor_class(), 3);
        assert_eq!(map.tile_map().size(), 32);
        assert_eq!(map.tile_map().tile(0, 0), 0x1f);
        assert_eq!(map.tile_map().tile(31, 31), 0x1f);
        assert!(map.strings().is_empty());
    }

    #[test]
    fn map_decodes_through_checksum_fallback() {
        // Offset table entry 0 forces the checksum-terminated decrypt.
        let game = Game::parse(&game_file(), &test_exe(0)).unwrap();
        let map = game.map(0).unwrap();
        assert_eq!(map.monster_names(), &["RAT".to_string()]);
        assert_eq!(map.tile_map().tile(0, 0), 0x1f);
    }

    #[test]
    fn map_info_size_mismatch_is_rejected() {
        let plain_len = plaintext().len();
        let mut exe_data = vec![0u8; 0x1b600];
        let index = Exe::location_index(0, 0);
        exe_data[0x1b2c0 + index] = 64;
        let offset = 0x1b380 + index * 2;
        exe_data[offset..offset + 2]
            .copy_from_slice(&((PLAINTEXT_BASE + plain_len) as u16).to_le_bytes());
        let exe = Exe::from_unpacked(exe_data);
        assert!(Game::parse(&game_file(), &exe).is_err());
    }
}
