use crate::{exepack::unpack_exe, strings::decode_string_groups, Error, Result};

// String table offsets and sizes inside the unpacked executable.
const INTRO: (usize, usize) = (0x17723, 527);
const MESSAGES: (usize, usize) = (0x17b5e, 1661);
const INVENTORY: (usize, usize) = (0x18290, 1847);
const CREATE_CHARACTER: (usize, usize) = (0x19e6b, 210);
const PROMOTION: (usize, usize) = (0x1a642, 1136);
const LIBRARY: (usize, usize) = (0x1aaec, 277);
const SHOP: (usize, usize) = (0x1ac18, 229);
const INFIRMARY: (usize, usize) = (0x1ad0d, 369);

// Per-location tables: one size byte and one little-endian u16 tile map
// offset per location index.
const MAP_SIZES_TABLE: usize = 0x1b2c0;
const MAP_OFFSETS_TABLE: usize = 0x1b380;
const NUM_LOCATIONS: usize = 192;

/// The unpacked WL.EXE executable with its embedded resource tables.
pub struct Exe {
    data: Vec<u8>,
}

impl Exe {
    /// Unpacks the EXEPACK-compressed executable and wraps the result.
    pub fn parse(data: &[u8]) -> Result<Exe> {
        Ok(Exe {
            data: unpack_exe(data)?,
        })
    }

    /// Wraps an already unpacked executable image.
    pub fn from_unpacked(data: Vec<u8>) -> Exe {
        Exe { data }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Reads the null-terminated string at the given offset.
    pub fn string_at(&self, offset: usize) -> String {
        self.data[offset.min(self.data.len())..]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    fn string_table(&self, table: (usize, usize)) -> Result<Vec<Vec<String>>> {
        decode_string_groups(&self.data, table.0, table.1)
    }

    pub fn intro_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(INTRO)
    }

    pub fn message_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(MESSAGES)
    }

    pub fn inventory_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(INVENTORY)
    }

    pub fn create_character_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(CREATE_CHARACTER)
    }

    pub fn promotion_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(PROMOTION)
    }

    pub fn library_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(LIBRARY)
    }

    pub fn shop_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(SHOP)
    }

    pub fn infirmary_strings(&self) -> Result<Vec<Vec<String>>> {
        self.string_table(INFIRMARY)
    }

    /// The table index of a map on the given disk. The executable keeps one
    /// table slot per location, addressed by this derived index.
    pub fn location_index(disk: u8, map: usize) -> usize {
        ((disk as usize + 1) ^ 3) << 6 | map
    }

    /// The size (32 or 64) of the given map.
    pub fn map_size(&self, disk: u8, map: usize) -> Result<usize> {
        let index = Self::location_index(disk, map);
        if index >= NUM_LOCATIONS {
            return Err(Error::OutOfRange(format!("location index {}", index)));
        }
        self.data
            .get(MAP_SIZES_TABLE + index)
            .map(|&size| size as usize)
            .ok_or(Error::EndOfData)
    }

    /// The offset of the Huffman tile map inside the given map's MSQ block.
    pub fn tile_map_offset(&self, disk: u8, map: usize) -> Result<usize> {
        let index = Self::location_index(disk, map);
        if index >= NUM_LOCATIONS {
            return Err(Error::OutOfRange(format!("location index {}", index)));
        }
        let offset = MAP_OFFSETS_TABLE + index * 2;
        match self.data.get(offset..offset + 2) {
            Some(bytes) => Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as usize),
            None => Err(Error::EndOfData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::LsbWriter;

    // A 60-byte dictionary: NUL then lowercase letters, padded with spaces.
    fn dictionary() -> Vec<u8> {
        let mut dict = vec![0u8];
        dict.extend_from_slice(b"abcdefghijklmnopqrstuvwxyz");
        dict.resize(60, b' ');
        dict
    }

    fn code(c: char) -> u16 {
        (c as u8 - b'a' + 1) as u16
    }

    // A minimal string block holding one group with one string.
    fn string_block(s: &str) -> Vec<u8> {
        let mut block = dictionary();
        block.extend_from_slice(&2u16.to_le_bytes());
        let mut w = LsbWriter::new();
        for c in s.chars() {
            w.push(code(c), 5);
        }
        w.push(0, 5);
        block.extend_from_slice(&w.finish());
        block
    }

    fn test_exe() -> Exe {
        let mut data = vec![0u8; 0x1b600];
        let block = string_block("hi");
        data[INTRO.0..INTRO.0 + block.len()].copy_from_slice(&block);
        data[0x100..0x105].copy_from_slice(b"pool\0");
        let index = Exe::location_index(0, 1);
        data[MAP_SIZES_TABLE + index] = 32;
        let offset = MAP_OFFSETS_TABLE + index * 2;
        data[offset..offset + 2].copy_from_slice(&0x0662u16.to_le_bytes());
        Exe::from_unpacked(data)
    }

    #[test]
    fn location_index_is_derived_from_disk_and_map() {
        assert_eq!(Exe::location_index(0, 0), 128);
        assert_eq!(Exe::location_index(0, 5), 133);
        assert_eq!(Exe::location_index(1, 0), 64);
        assert_eq!(Exe::location_index(1, 63), 127);
    }

    #[test]
    fn string_tables_decode_at_fixed_offsets() {
        let exe = test_exe();
        let groups = exe.intro_strings().unwrap();
        assert_eq!(groups[0][0], "hi");
    }

    #[test]
    fn raw_strings_stop_at_nul() {
        let exe = test_exe();
        assert_eq!(exe.string_at(0x100), "pool");
        assert_eq!(exe.string_at(0x104), "");
    }

    #[test]
    fn map_tables_resolve_per_location() {
        let exe = test_exe();
        assert_eq!(exe.map_size(0, 1).unwrap(), 32);
        assert_eq!(exe.tile_map_offset(0, 1).unwrap(), 0x0662);
        assert_eq!(exe.map_size(0, 0).unwrap(), 0);
        assert!(matches!(exe.map_size(0, 64), Err(Error::OutOfRange(_))));
    }
}
