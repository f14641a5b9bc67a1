use crate::error::{Error, Result};

const MZ_SIGNATURE: u16 = 0x5a4d;
const EXEPACK_SIGNATURE: u16 = 0x4252;

/// Size of the MZ header written into the reconstructed executable.
const MZ_HEADER_SIZE: usize = 28;

/// Size of the unpacker variable block in front of the decompressor stub.
const UNPACKER_VARS_LEN: usize = 18;

/// Size of the decompressor stub code and of the "Packed file is corrupt"
/// message following it.
const UNPACKER_SIZE: usize = 0x105;
const ERROR_MSG_LEN: usize = 0x16;

fn get_u16(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = data.get(offset..offset + 2).ok_or(Error::EndOfData)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn put_u16(data: &mut [u8], index: usize, value: u16) {
    data[index * 2..index * 2 + 2].copy_from_slice(&value.to_le_bytes());
}

/// Decompresses the packed body. Commands are read backward from the end of
/// the packed data and write backward into the output: 0xb0 fills a run with
/// a value, 0xb2 copies source bytes verbatim. The low command bit marks the
/// final command.
fn unpack_body(src: &[u8], final_size: usize) -> Result<Vec<u8>> {
    if src.len() > final_size {
        return Err(Error::Format("packed body larger than unpacked size"));
    }
    let mut dst = vec![0xffu8; final_size];
    dst[..src.len()].copy_from_slice(src);

    let mut src_pos = src.len();
    let mut dst_pos = final_size;
    let last_pos = src.len();

    // Skip the 0xff bytes padding the packed body to a paragraph boundary.
    while src_pos > 0 && src[src_pos - 1] == 0xff {
        src_pos -= 1;
    }

    let mut take = |pos: &mut usize| -> Result<u8> {
        *pos = pos.checked_sub(1).ok_or(Error::EndOfData)?;
        Ok(src[*pos])
    };

    loop {
        let command = take(&mut src_pos)?;
        match command & 0xfe {
            0xb0 => {
                let length = (take(&mut src_pos)? as usize) * 0x100 + take(&mut src_pos)? as usize;
                let value = take(&mut src_pos)?;
                if dst_pos < length {
                    return Err(Error::Format("unpacked data exceeds declared size"));
                }
                for _ in 0..length {
                    dst_pos -= 1;
                    dst[dst_pos] = value;
                }
            }
            0xb2 => {
                let length = (take(&mut src_pos)? as usize) * 0x100 + take(&mut src_pos)? as usize;
                if dst_pos < length {
                    return Err(Error::Format("unpacked data exceeds declared size"));
                }
                for _ in 0..length {
                    dst_pos -= 1;
                    dst[dst_pos] = take(&mut src_pos)?;
                }
            }
            _ => {
                // Position counts back from the end of the packed body to
                // the offending command byte.
                return Err(Error::Corrupt {
                    command,
                    position: last_pos - src_pos,
                });
            }
        }
        if command & 1 == 1 {
            break;
        }
    }
    Ok(dst)
}

/// Expands the stub's compact per-64K-segment relocation table into a flat
/// list of little-endian (offset, segment) pairs.
fn expand_relocations(pbuffer: &[u8]) -> Result<Vec<u8>> {
    let mut table = Vec::new();
    let mut p = UNPACKER_SIZE + ERROR_MSG_LEN;
    for section in 0..16u16 {
        let num_entries = get_u16(pbuffer, p)?;
        p += 2;
        if num_entries == 0 {
            break;
        }
        let segment = 0x1000 * section;
        for _ in 0..num_entries {
            let offset = get_u16(pbuffer, p)?;
            p += 2;
            table.extend_from_slice(&offset.to_le_bytes());
            table.extend_from_slice(&segment.to_le_bytes());
        }
    }
    Ok(table)
}

/// Unpacks an EXEPACK-compressed DOS executable. The result is a fresh,
/// self-consistent MZ image (header, relocation table, body) whose resource
/// data sits at the same offsets the original unpacker would produce, which
/// the executable table readers rely on.
pub fn unpack_exe(data: &[u8]) -> Result<Vec<u8>> {
    if get_u16(data, 0)? != MZ_SIGNATURE {
        return Err(Error::Format("missing MZ signature"));
    }
    let header_paragraphs = get_u16(data, 8)? as usize;
    let cs = get_u16(data, 22)? as usize;

    let exe_data_start = header_paragraphs * 16;
    let exe_len = cs * 16;
    let stub = exe_data_start + exe_len;

    let real_start_offset = get_u16(data, stub)?;
    let real_start_segment = get_u16(data, stub + 2)?;
    let unpacker_len = get_u16(data, stub + 6)? as usize;
    let real_stack_offset = get_u16(data, stub + 8)?;
    let real_stack_segment = get_u16(data, stub + 10)?;
    let dest_len = get_u16(data, stub + 12)? as usize;
    if get_u16(data, stub + 16)? != EXEPACK_SIGNATURE {
        return Err(Error::Format("missing EXEPACK signature"));
    }

    let final_size = dest_len * 16;
    let packed = data.get(exe_data_start..stub).ok_or(Error::EndOfData)?;
    log::debug!(
        "unpacking {} packed bytes into {} bytes",
        packed.len(),
        final_size
    );
    let body = unpack_body(packed, final_size)?;

    let pbuffer = data
        .get(stub + UNPACKER_VARS_LEN..stub + unpacker_len)
        .ok_or(Error::EndOfData)?;
    let reloc_table = expand_relocations(pbuffer)?;
    let reloc_size = reloc_table.len();

    // Rebuild a minimal MZ header. The header is padded so its paragraph
    // count stays a multiple of 32, matching what the original packer
    // stripped away.
    let header_size = MZ_HEADER_SIZE + reloc_size;
    let new_header_paragraphs = ((header_size >> 4 >> 5) + 1) << 5;
    let need_header_size = new_header_paragraphs << 4;
    let reloc_garbage = need_header_size - header_size;
    let full_size = MZ_HEADER_SIZE + reloc_size + reloc_garbage + final_size;

    let mut unpacked = vec![0u8; full_size];
    put_u16(&mut unpacked, 0, MZ_SIGNATURE);
    put_u16(&mut unpacked, 1, (full_size % 512) as u16);
    put_u16(&mut unpacked, 2, ((full_size >> 9) + 1) as u16);
    put_u16(&mut unpacked, 3, (reloc_size >> 2) as u16);
    put_u16(&mut unpacked, 4, new_header_paragraphs as u16);
    put_u16(&mut unpacked, 5, (full_size / 60) as u16);
    put_u16(&mut unpacked, 6, 0xffff);
    put_u16(&mut unpacked, 7, real_stack_segment);
    put_u16(&mut unpacked, 8, real_stack_offset);
    put_u16(&mut unpacked, 10, real_start_offset);
    put_u16(&mut unpacked, 11, real_start_segment);
    put_u16(&mut unpacked, 12, MZ_HEADER_SIZE as u16);
    put_u16(&mut unpacked, 13, 0);
    unpacked[MZ_HEADER_SIZE..MZ_HEADER_SIZE + reloc_size].copy_from_slice(&reloc_table);
    unpacked[MZ_HEADER_SIZE + reloc_size + reloc_garbage..].copy_from_slice(&body);
    Ok(unpacked)
}
