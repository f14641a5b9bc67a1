use crate::error::Result;
use crate::reader::BinaryReader;

/// Node of the decode tree that is serialized in front of every huffman
/// block: bit 1 is a leaf followed by the literal byte, bit 0 is an inner
/// node followed by the left subtree, a separator bit and the right subtree.
enum Node {
    Leaf(u8),
    Branch(Box<Node>, Box<Node>),
}

fn read_node(reader: &mut BinaryReader) -> Result<Node> {
    if reader.read_bit()? != 0 {
        Ok(Node::Leaf(reader.read_u8()?))
    } else {
        let left = read_node(reader)?;
        reader.read_bit()?;
        let right = read_node(reader)?;
        Ok(Node::Branch(Box::new(left), Box::new(right)))
    }
}

/// Decodes a huffman block of `size` bytes. The reader must point at the
/// serialized decode tree; afterwards it is synced to the next byte boundary
/// because the data following a block is always byte-aligned.
pub fn decode_huffman(reader: &mut BinaryReader, size: usize) -> Result<Vec<u8>> {
    let root = read_node(reader)?;
    let mut data = Vec::with_capacity(size);
    for _ in 0..size {
        let mut node = &root;
        loop {
            match node {
                Node::Leaf(value) => {
                    data.push(*value);
                    break;
                }
                Node::Branch(left, right) => {
                    node = if reader.read_bit()? != 0 { right } else { left };
                }
            }
        }
    }
    reader.sync();
    Ok(data)
}
