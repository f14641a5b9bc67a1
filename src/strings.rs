use crate::error::Result;
use crate::reader::BinaryReader;

/// Code marking the next index as high-shifted (+0x1e).
const CODE_HIGH: u32 = 0x1f;

/// Code marking the next character as uppercase.
const CODE_UPPER: u32 = 0x1e;

/// Decodes one compressed string: 5-bit LSB-first dictionary codes with the
/// high-shift and uppercase modifier codes. A NUL dictionary entry ends the
/// string; `None` is returned when the stream runs dry mid-string.
fn read_compressed_string(dictionary: &[u8], reader: &mut BinaryReader) -> Result<Option<String>> {
    let mut upper = false;
    let mut high = false;
    let mut string = String::new();
    while reader.has_data(0, 5) {
        let index = reader.read_bits_reversed(5)?;
        match index {
            CODE_HIGH => high = true,
            CODE_UPPER => upper = true,
            _ => {
                let c = dictionary[index as usize + if high { 0x1e } else { 0 }];
                if c == 0 {
                    return Ok(Some(string));
                }
                let c = c as char;
                string.push(if upper { c.to_ascii_uppercase() } else { c });
                upper = false;
                high = false;
            }
        }
    }
    Ok(None)
}

/// Reads the string group pointer table. The number of pointers is derived
/// from the first pointer; a pointer implying a smaller table shrinks the
/// effective count, since the string data cannot overlap the table.
fn read_group_pointers(reader: &mut BinaryReader) -> Result<Vec<u16>> {
    let first = reader.read_u16()?;
    let mut count = (first >> 1) as usize;
    let mut pointers = vec![first];
    let mut i = 1;
    while i < count {
        let pointer = reader.read_u16()?;
        let implied = (pointer >> 1) as usize;
        if implied < count {
            count = implied.max(i + 1);
        }
        pointers.push(pointer);
        i += 1;
    }
    pointers.truncate(count);
    Ok(pointers)
}

/// Reads compressed string groups from the reader's current position to the
/// end of its window: a 60-byte dictionary, the pointer table, then up to
/// four NUL-terminated strings per pointer. Pointers past the window are
/// dropped.
pub fn read_string_groups(reader: &mut BinaryReader) -> Result<Vec<Vec<String>>> {
    let dictionary = reader.read_u8s(60)?;
    let base = reader.byte_index();
    let pointers = read_group_pointers(reader)?;
    let mut groups = Vec::new();
    for pointer in pointers {
        let start = base + pointer as usize;
        if start >= reader.byte_len() {
            log::debug!("dropping string group pointer {:#06x} past the block", pointer);
            continue;
        }
        reader.seek(start, 0)?;
        let mut group = Vec::new();
        for _ in 0..4 {
            match read_compressed_string(&dictionary, reader)? {
                Some(string) => {
                    if !string.is_empty() {
                        group.push(string);
                    }
                }
                None => break,
            }
        }
        groups.push(group);
    }
    Ok(groups)
}

/// Decodes the string groups of a block at `offset` spanning `size` bytes.
pub fn decode_string_groups(data: &[u8], offset: usize, size: usize) -> Result<Vec<Vec<String>>> {
    let mut reader = BinaryReader::with_range(data, offset, size)?;
    read_string_groups(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::LsbWriter;

    /// Dictionary with NUL at index 0, lowercase letters from index 1 and a
    /// marker character in the high half.
    fn dictionary() -> Vec<u8> {
        let mut dict = vec![0u8; 60];
        for (i, c) in ('a'..='z').enumerate() {
            dict[i + 1] = c as u8;
        }
        dict[0x1e + 2] = b'!';
        dict
    }

    fn code(c: char) -> u16 {
        (c as u8 - b'a' + 1) as u16
    }

    fn block(groups: &[&[&str]]) -> Vec<u8> {
        let mut pointers = Vec::new();
        let mut strings = Vec::new();
        let table_len = 2 * groups.len();
        for group in groups {
            pointers.push((table_len + strings.len()) as u16);
            let mut w = LsbWriter::new();
            for s in *group {
                for c in s.chars() {
                    match c {
                        'A'..='Z' => {
                            w.push(0x1e, 5);
                            w.push(code(c.to_ascii_lowercase()), 5);
                        }
                        '!' => {
                            w.push(0x1f, 5);
                            w.push(2, 5);
                        }
                        _ => w.push(code(c), 5),
                    }
                }
                w.push(0, 5); // NUL dictionary entry terminates
            }
            strings.extend_from_slice(&w.finish());
        }
        let mut data = dictionary();
        for p in pointers {
            data.extend_from_slice(&p.to_le_bytes());
        }
        data.extend_from_slice(&strings);
        data
    }

    #[test]
    fn decodes_plain_strings() {
        let data = block(&[&["hello", "world"]]);
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        assert_eq!(groups, vec![vec!["hello".to_string(), "world".to_string()]]);
    }

    #[test]
    fn uppercase_and_high_shift_modifiers() {
        let data = block(&[&["Ab!"]]);
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        assert_eq!(groups, vec![vec!["Ab!".to_string()]]);

        let data = block(&[&["cD"]]);
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        assert_eq!(groups, vec![vec!["cD".to_string()]]);
    }

    #[test]
    fn at_most_four_strings_per_group() {
        let data = block(&[&["a", "b", "c", "d", "e"]]);
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        assert_eq!(groups[0], vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn truncated_stream_drops_partial_string() {
        let mut data = block(&[&["abcdef"]]);
        // Cut into the middle of the 5-bit code stream.
        data.truncate(data.len() - 2);
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        assert_eq!(groups, vec![Vec::<String>::new()]);
    }

    #[test]
    fn out_of_range_pointer_is_dropped() {
        // Two pointers, but the second one lands far past the block.
        let mut data = dictionary();
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&0xff00u16.to_le_bytes());
        let mut w = LsbWriter::new();
        for &c in &[code('o'), code('k'), 0] {
            w.push(c, 5);
        }
        data.extend_from_slice(&w.finish());
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        assert_eq!(groups, vec![vec!["ok".to_string()]]);
    }

    #[test]
    fn pointer_table_shrinks_to_smallest_valid_count() {
        // The first pointer announces three groups, but the second pointer
        // implies a two-entry table, so the third pointer is never read.
        let mut data = dictionary();
        data.extend_from_slice(&6u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        let mut w = LsbWriter::new();
        w.push(code('x'), 5); // target of the second pointer, at base + 4
        w.push(0, 5);
        data.extend_from_slice(&w.finish());
        let mut w = LsbWriter::new();
        w.push(code('y'), 5); // target of the first pointer, at base + 6
        w.push(0, 5);
        data.extend_from_slice(&w.finish());
        let groups = decode_string_groups(&data, 0, data.len()).unwrap();
        // The second group's trailing bits decode as filler, so only check
        // the shape of the table and the leading string of each group.
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][0], "y");
        assert_eq!(groups[1][0], "x");
    }
}
