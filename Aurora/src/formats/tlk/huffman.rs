//! Huffman string decoding for `V0.5` GFF talk tables
//!
//! The tree is a flat array of `i32` node pairs; node `n`'s children sit at
//! `2n` and `2n + 1`, and the root is the last pair. A non-negative value is
//! the index of the next node, a negative value `v` is a leaf for the UTF-16
//! code unit `0xFFFF - v` (truncated to 16 bits). The bit stream is read as
//! little-endian 32-bit words, least significant bit first. A string ends at
//! the first zero code unit.

/// Decode one string starting at bit `offset` of `bits`.
///
/// Running off the end of the bit stream or the tree stops decoding and
/// returns what was decoded so far.
#[must_use]
pub fn decode_huffman(tree: &[i32], bits: &[u32], offset: u32) -> String {
    let root = (tree.len() / 2) as i64 - 1;

    let mut units = Vec::new();
    let mut index = (offset >> 5) as usize;
    let mut shift = offset & 0x1F;

    loop {
        let mut node = root;
        while node >= 0 {
            let Some(&word) = bits.get(index) else {
                tracing::warn!("Huffman string at bit {} runs past the bit stream", offset);
                return String::from_utf16_lossy(&units);
            };
            let bit = (word >> shift) & 1;

            let Some(&next) = tree.get(node as usize * 2 + bit as usize) else {
                tracing::warn!("Huffman string at bit {} leaves the tree at node {}", offset, node);
                return String::from_utf16_lossy(&units);
            };
            node = i64::from(next);

            shift += 1;
            index += (shift >> 5) as usize;
            shift %= 32;
        }

        let unit = (0xFFFF - node) as u16;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }

    String::from_utf16_lossy(&units)
}

/// Leaf value for a code unit.
#[cfg(test)]
pub(crate) fn leaf(unit: u16) -> i32 {
    -1 - i32::from(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Two-level tree: 00 'a', 01 'b', 10 'c', 11 terminator.
    fn tree() -> Vec<i32> {
        vec![
            leaf(u16::from(b'a')),
            leaf(u16::from(b'b')),
            leaf(u16::from(b'c')),
            leaf(0),
            0, // root, bit 0
            1, // root, bit 1
        ]
    }

    #[test]
    fn test_leaf_encoding() {
        assert_eq!(leaf(0), -1);
        assert_eq!(leaf(0x61), -98);
    }

    #[test]
    fn test_decode_from_word_start() {
        // "ba": b = 0,1  a = 0,0  end = 1,1 (LSB first) -> 0b110010
        assert_eq!(decode_huffman(&tree(), &[0b11_0010, 0], 0), "ba");
    }

    #[test]
    fn test_decode_across_word_boundary() {
        // "abc" starting at bit 30: 'a' fills bits 30-31 of word 0,
        // then b = 0,1  c = 1,0  end = 1,1 in word 1 -> 0b110110
        let bits = [0b11_0010, 0b11_0110];
        assert_eq!(decode_huffman(&tree(), &bits, 30), "abc");
        assert_eq!(decode_huffman(&tree(), &bits, 0), "ba");
    }

    #[test]
    fn test_non_ascii_code_unit() {
        let tree = vec![leaf(0xE9), leaf(0), 0, 1];
        // Root is node 1 (pair 2..4): bit 0 -> node 0, bit 1 -> node 1 again.
        // 0,0 -> 'é'  0,1 -> end
        assert_eq!(decode_huffman(&tree, &[0b1000], 0), "\u{e9}");
    }

    #[test]
    fn test_overrun_returns_partial() {
        let bits = [0b11_0010, 0];
        // Bits 62-63 decode 'a', then the stream ends
        assert_eq!(decode_huffman(&tree(), &bits, 62), "a");
        assert_eq!(decode_huffman(&tree(), &bits, 64), "");
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(decode_huffman(&[], &[0xFFFF_FFFF], 0), "");
    }

    #[test]
    fn test_bad_child_index() {
        let tree = vec![leaf(u16::from(b'x')), 7, 0, 0];
        // 0,0 -> 'x', then 0,1 jumps to node 7, outside the tree
        assert_eq!(decode_huffman(&tree, &[0b1000], 0), "x");
    }
}
