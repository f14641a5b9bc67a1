use crate::error::{Error, Result};

/// Bit-precise reader over a borrowed byte window.
///
/// The cursor is a (byte, bit) pair. Bit reads default to MSB-first order;
/// the `_reversed` variants read LSB-first, which the 5-bit string codec
/// needs. Byte reads have a fast path when the cursor is byte-aligned and
/// stitch two adjacent bytes together when it is not.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u32,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BinaryReader { data, byte: 0, bit: 0 }
    }

    /// Creates a reader over a sub-window of `data`.
    pub fn with_range(data: &'a [u8], offset: usize, size: usize) -> Result<Self> {
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| Error::OutOfRange(format!("window {}+{}", offset, size)))?;
        Ok(BinaryReader { data: &data[offset..end], byte: 0, bit: 0 })
    }

    pub fn byte_index(&self) -> usize {
        self.byte
    }

    pub fn bit_index(&self) -> u32 {
        self.bit
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Advances the cursor to the next byte boundary if it is not already on
    /// one. Trailing bits of the current byte are discarded.
    pub fn sync(&mut self) {
        if self.bit != 0 {
            self.byte += 1;
            self.bit = 0;
        }
    }

    /// Seeks to the given byte/bit position. A bit index above 7 is
    /// normalized into the byte index.
    pub fn seek(&mut self, byte: usize, bit: u32) -> Result<()> {
        let byte = byte + (bit >> 3) as usize;
        let bit = bit & 7;
        if byte > self.data.len() || (byte == self.data.len() && bit != 0) {
            return Err(Error::OutOfRange(format!("seek to byte {} bit {}", byte, bit)));
        }
        self.byte = byte;
        self.bit = bit;
        Ok(())
    }

    /// Checks whether at least `bytes` whole bytes plus `bits` extra bits
    /// remain. A read of that size fails when this returns false.
    pub fn has_data(&self, bytes: usize, bits: usize) -> bool {
        let available = (self.data.len() - self.byte) * 8 - self.bit as usize;
        available >= bytes * 8 + bits
    }

    pub fn read_bit(&mut self) -> Result<u32> {
        if self.byte >= self.data.len() {
            return Err(Error::EndOfData);
        }
        let result = (self.data[self.byte] >> (7 - self.bit)) as u32 & 1;
        self.advance_bit();
        Ok(result)
    }

    pub fn read_bit_reversed(&mut self) -> Result<u32> {
        if self.byte >= self.data.len() {
            return Err(Error::EndOfData);
        }
        let result = (self.data[self.byte] >> self.bit) as u32 & 1;
        self.advance_bit();
        Ok(result)
    }

    fn advance_bit(&mut self) {
        self.bit += 1;
        if self.bit > 7 {
            self.bit = 0;
            self.byte += 1;
        }
    }

    /// Reads `count` bits, composing them MSB-first.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        let mut result = 0;
        for _ in 0..count {
            result = result << 1 | self.read_bit()?;
        }
        Ok(result)
    }

    /// Reads `count` bits, composing them LSB-first.
    pub fn read_bits_reversed(&mut self, count: u32) -> Result<u32> {
        let mut result = 0;
        for i in 0..count {
            result |= self.read_bit_reversed()? << i;
        }
        Ok(result)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.bit != 0 {
            // Slow lane: stitch the value together from two adjacent bytes.
            if self.byte + 1 >= self.data.len() {
                return Err(Error::EndOfData);
            }
            let value = self.data[self.byte] << self.bit
                | self.data[self.byte + 1] >> (8 - self.bit);
            self.byte += 1;
            Ok(value)
        } else {
            // Fast lane: return the byte directly.
            if self.byte >= self.data.len() {
                return Err(Error::EndOfData);
            }
            let value = self.data[self.byte];
            self.byte += 1;
            Ok(value)
        }
    }

    pub fn read_u8s(&mut self, count: usize) -> Result<Vec<u8>> {
        if self.bit != 0 {
            let mut result = Vec::with_capacity(count);
            for _ in 0..count {
                result.push(self.read_u8()?);
            }
            Ok(result)
        } else {
            if self.byte + count > self.data.len() {
                return Err(Error::EndOfData);
            }
            let result = self.data[self.byte..self.byte + count].to_vec();
            self.byte += count;
            Ok(result)
        }
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_u8()? as u16 | (self.read_u8()? as u16) << 8)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        Ok(self.read_u16()? as u32 | (self.read_u8()? as u32) << 16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_u16()? as u32 | (self.read_u16()? as u32) << 16)
    }

    /// Reads `len` bytes as a string, one character per byte.
    pub fn read_str(&mut self, len: usize) -> Result<String> {
        let mut result = String::with_capacity(len);
        for _ in 0..len {
            result.push(self.read_u8()? as char);
        }
        Ok(result)
    }

    /// Reads `len` bytes and returns the string up to the first NUL byte.
    pub fn read_fixed_str(&mut self, len: usize) -> Result<String> {
        let mut result = String::new();
        let mut terminated = false;
        for _ in 0..len {
            let c = self.read_u8()?;
            if c == 0 {
                terminated = true;
            } else if !terminated {
                result.push(c as char);
            }
        }
        Ok(result)
    }

    pub fn read_null_str(&mut self) -> Result<String> {
        let mut result = String::new();
        loop {
            let c = self.read_u8()?;
            if c == 0 {
                return Ok(result);
            }
            result.push(c as char);
        }
    }

    pub fn read_null_strs(&mut self, count: usize) -> Result<Vec<String>> {
        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            result.push(self.read_null_str()?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_bit_reads_compose() {
        let data = [0xa5, 0x3c, 0x71, 0xf0, 0x0f];
        for n in 1..=16u32 {
            let mut a = BinaryReader::new(&data);
            let hi = a.read_bits(n).unwrap();
            let lo = a.read_bits(n).unwrap();
            let mut b = BinaryReader::new(&data);
            assert_eq!(hi << n | lo, b.read_bits(2 * n).unwrap(), "n = {}", n);
        }
    }

    #[test]
    fn sync_advances_to_byte_boundary() {
        let data = [0xff, 0x00, 0xff];
        let mut r = BinaryReader::new(&data);
        r.read_bits(3).unwrap();
        r.sync();
        assert_eq!(r.byte_index(), 1);
        assert_eq!(r.bit_index(), 0);
        // Already aligned, sync is a no-op.
        r.sync();
        assert_eq!(r.byte_index(), 1);
    }

    #[test]
    fn misaligned_u8_stitches_adjacent_bytes() {
        let data = [0b1010_1011, 0b1100_0000];
        let mut r = BinaryReader::new(&data);
        r.read_bits(4).unwrap();
        assert_eq!(r.read_u8().unwrap(), 0b1011_1100);
    }

    #[test]
    fn reversed_bits_start_at_lowest_bit() {
        let data = [0b0000_0101];
        let mut r = BinaryReader::new(&data);
        assert_eq!(r.read_bits_reversed(3).unwrap(), 0b101);
    }

    #[test]
    fn little_endian_integers() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut r = BinaryReader::new(&data);
        assert_eq!(r.read_u16().unwrap(), 0x0201);
        assert_eq!(r.read_u24().unwrap(), 0x05_0403);
        assert_eq!(r.read_u8().unwrap(), 0x06);
    }

    #[test]
    fn seek_normalizes_bit_overflow() {
        let data = [0u8; 8];
        let mut r = BinaryReader::new(&data);
        r.seek(1, 19).unwrap();
        assert_eq!(r.byte_index(), 3);
        assert_eq!(r.bit_index(), 3);
        assert!(r.seek(9, 0).is_err());
        assert!(r.seek(8, 1).is_err());
        r.seek(8, 0).unwrap();
    }

    #[test]
    fn reads_past_window_fail() {
        let data = [1u8, 2, 3];
        let mut r = BinaryReader::with_range(&data, 1, 1).unwrap();
        assert_eq!(r.read_u8().unwrap(), 2);
        assert!(matches!(r.read_u8(), Err(Error::EndOfData)));
        assert!(!r.has_data(1, 0));
    }

    #[test]
    fn null_strings() {
        let data = b"ab\0cd\0";
        let mut r = BinaryReader::new(data);
        let strs = r.read_null_strs(2).unwrap();
        assert_eq!(strs, vec!["ab".to_string(), "cd".to_string()]);
        let data = b"xy\0zzz";
        let mut r = BinaryReader::new(data);
        assert_eq!(r.read_fixed_str(6).unwrap(), "xy");
        assert_eq!(r.byte_index(), 6);
    }

    #[test]
    fn has_data_counts_bits() {
        let data = [0u8; 2];
        let mut r = BinaryReader::new(&data);
        r.read_bits(9).unwrap();
        assert!(r.has_data(0, 7));
        assert!(!r.has_data(1, 0));
    }
}
