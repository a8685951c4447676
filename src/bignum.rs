//! Big-number codec.
//!
//! Host-visible large numbers are big-endian byte arrays. The IP wants
//! them least-significant limb first, and within each limb least-significant
//! byte first. Packing therefore consumes the byte array from its tail
//! toward its head, filling each wire word from bit 0 upward and
//! zero-padding once the input runs out. This module is pure: the MMIO
//! streaming lives in [`xfer`](crate::xfer).

/// Bytes needed to hold an `nn`-bit value.
pub fn nn_bytes(nn: u32) -> usize {
    nn.div_ceil(8) as usize
}

/// Number of wire words moved per transfer at the given operand and wire
/// sizes.
pub fn word_count(nn_bytes: usize, wire_bytes: usize) -> usize {
    nn_bytes.div_ceil(wire_bytes)
}

/// Packs a big-endian byte array into wire words, LSB first.
///
/// `bytes.len()` may be anything up to `nn_bytes`; shorter inputs come out
/// zero-padded at the most-significant end, exactly as the IP stores them.
pub fn pack(bytes: &[u8], nn_bytes: usize, wire_bytes: usize) -> Vec<u64> {
    debug_assert!(bytes.len() <= nn_bytes);
    let mut words = vec![0u64; word_count(nn_bytes, wire_bytes)];
    let mut tail = bytes.iter().rev();
    for word in words.iter_mut() {
        for lane in 0..wire_bytes {
            match tail.next() {
                Some(&b) => *word |= (b as u64) << (8 * lane),
                None => break,
            }
        }
    }
    words
}

/// Unpacks wire words into an `nn_bytes`-long big-endian byte array, the
/// exact dual of [`pack`].
pub fn unpack(words: &[u64], nn_bytes: usize, wire_bytes: usize) -> Vec<u8> {
    debug_assert_eq!(words.len(), word_count(nn_bytes, wire_bytes));
    let mut bytes = vec![0u8; nn_bytes];
    let mut pos = nn_bytes;
    'words: for &word in words {
        for lane in 0..wire_bytes {
            if pos == 0 {
                break 'words;
            }
            pos -= 1;
            bytes[pos] = (word >> (8 * lane)) as u8;
        }
    }
    bytes
}

/// Effective bit length of a big-endian byte array. Used to derive `nn`
/// from the curve prime.
pub fn bit_len(bytes: &[u8]) -> u32 {
    for (i, &b) in bytes.iter().enumerate() {
        if b != 0 {
            return (bytes.len() - i) as u32 * 8 - b.leading_zeros();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(nn_bytes(256), 32);
        assert_eq!(nn_bytes(521), 66);
        assert_eq!(word_count(32, 4), 8);
        assert_eq!(word_count(32, 8), 4);
        assert_eq!(word_count(66, 8), 9);
    }

    #[test]
    fn pack_consumes_the_tail_first() {
        // 0x010203 into an 8-byte operand over a 32-bit wire.
        let words = pack(&[0x01, 0x02, 0x03], 8, 4);
        assert_eq!(words, vec![0x0001_0203, 0]);
    }

    #[test]
    fn pack_wide_wire() {
        let bytes: Vec<u8> = (1..=12).collect();
        let words = pack(&bytes, 16, 8);
        assert_eq!(words, vec![0x0506_0708_090a_0b0c, 0x0102_0304]);
    }

    #[test]
    fn unpack_is_the_dual() {
        let bytes = unpack(&[0x0001_0203, 0], 8, 4);
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn roundtrip_left_pads_with_zeros() {
        for len in 0..=32 {
            let input: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(37).wrapping_add(1)).collect();
            for wire_bytes in [4usize, 8] {
                let out = unpack(&pack(&input, 32, wire_bytes), 32, wire_bytes);
                assert_eq!(&out[32 - len..], &input[..], "len {len} wire {wire_bytes}");
                assert!(out[..32 - len].iter().all(|&b| b == 0));
            }
        }
    }

    #[test]
    fn odd_operand_sizes() {
        // 521-bit curve: 66 bytes, 17 words on a 32-bit wire.
        let input = vec![0xff; 66];
        let words = pack(&input, 66, 4);
        assert_eq!(words.len(), 17);
        // The last word carries the two most-significant bytes.
        assert_eq!(words[16], 0xffff);
        assert_eq!(unpack(&words, 66, 4), input);
    }

    #[test]
    fn bit_lengths() {
        assert_eq!(bit_len(&[]), 0);
        assert_eq!(bit_len(&[0, 0]), 0);
        assert_eq!(bit_len(&[0x01]), 1);
        assert_eq!(bit_len(&[0x80, 0, 0]), 24);
        assert_eq!(bit_len(&[0x00, 0xc0, 0x05]), 16);
    }
}
