use crate::error::{Error, Result};
use crate::reader::BinaryReader;

/// Decrypter for the rotating-xor encryption of the game maps.
///
/// The two header bytes combine into the initial key and, as a little-endian
/// word, into the end checksum. Each byte is xored with the key, the key then
/// rotates by 0x1f. The running checksum subtracts every plaintext byte; when
/// the encrypted region's length is not known in advance, decryption stops
/// once the checksum matches the header-declared value.
pub struct Decrypter<'r, 'a> {
    reader: &'r mut BinaryReader<'a>,
    key: u8,
    checksum: u16,
    end_checksum: u16,
}

impl<'r, 'a> Decrypter<'r, 'a> {
    pub fn new(reader: &'r mut BinaryReader<'a>) -> Result<Self> {
        let e1 = reader.read_u8()?;
        let e2 = reader.read_u8()?;
        Ok(Decrypter {
            reader,
            key: e1 ^ e2,
            checksum: 0,
            end_checksum: e1 as u16 | (e2 as u16) << 8,
        })
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let encrypted = self.reader.read_u8()?;
        let decrypted = encrypted ^ self.key;
        self.checksum = self.checksum.wrapping_sub(decrypted as u16);
        self.key = self.key.wrapping_add(0x1f);
        Ok(decrypted)
    }

    /// Decrypts a fixed number of bytes.
    pub fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(size);
        for _ in 0..size {
            result.push(self.read_byte()?);
        }
        Ok(result)
    }

    /// Decrypts until the running checksum equals the end checksum declared
    /// in the header bytes.
    pub fn read_until_checksum(&mut self) -> Result<Vec<u8>> {
        let mut result = Vec::new();
        loop {
            if !self.reader.has_data(1, 0) {
                return Err(Error::Format("checksum end marker never reached"));
            }
            result.push(self.read_byte()?);
            if self.checksum == self.end_checksum {
                return Ok(result);
            }
        }
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn end_checksum(&self) -> u16 {
        self.end_checksum
    }
}
