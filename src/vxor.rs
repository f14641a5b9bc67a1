use crate::error::{Error, Result};

/// Decodes a vertical-xor encoded block into a new buffer. Every byte is
/// xored with the decoded byte one line (`width` bytes) above it; the first
/// line is copied verbatim.
pub fn decode_vxor(data: &[u8], width: usize) -> Vec<u8> {
    let mut result = vec![0u8; data.len()];
    for i in 0..data.len() {
        result[i] = if i < width {
            data[i]
        } else {
            data[i] ^ result[i - width]
        };
    }
    result
}

/// In-place variant of [`decode_vxor`] operating on `size` bytes starting at
/// `offset`, for regions that sit inside a larger shared buffer.
pub fn decode_vxor_inplace(data: &mut [u8], width: usize, offset: usize, size: usize) -> Result<()> {
    let end = offset
        .checked_add(size)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| Error::OutOfRange(format!("vxor region {}+{}", offset, size)))?;
    for i in offset + width..end {
        data[i] ^= data[i - width];
    }
    Ok(())
}
