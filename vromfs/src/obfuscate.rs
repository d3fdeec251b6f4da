//! Fixed-key XOR deobfuscation applied to ZSTD-packed payloads.

/// Four little-endian 32-bit words, applied to the head window of a payload.
const KEY: [u32; 4] = [0xAA55_AA55, 0xF00F_F00F, 0xAA55_AA55, 0x1248_1248];

fn key_rev() -> [u32; 4] {
    let mut k = KEY;
    k.reverse();
    k
}

/// XOR a 16-byte window against `key`, word by word, little-endian.
fn xor_window(data: &[u8], key: [u32; 4]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for i in 0..4 {
        let word = u32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap());
        let xored = word ^ key[i];
        out[i * 4..i * 4 + 4].copy_from_slice(&xored.to_le_bytes());
    }
    out
}

/// Deobfuscates `data` per the VROMFS obfuscation scheme: short buffers pass
/// through unchanged, buffers up to 32 bytes get a single head XOR, and
/// longer buffers additionally get a reversed-key XOR at a window near the
/// tail. The transform is its own inverse in each branch.
pub fn deobfuscate(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    if len < 16 {
        return data.to_vec();
    }
    if len <= 32 {
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&xor_window(data, KEY));
        out.extend_from_slice(&data[16..]);
        return out;
    }

    let head = xor_window(data, KEY);
    let mid = (len & 0x03FF_FFFC) - 16;
    let mid_xored = xor_window(&data[mid..mid + 16], key_rev());

    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&head);
    out.extend_from_slice(&data[16..mid]);
    out.extend_from_slice(&mid_xored);
    out.extend_from_slice(&data[mid + 16..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_buffers_are_passed_through() {
        let data = vec![1, 2, 3];
        assert_eq!(deobfuscate(&data), data);
    }

    #[test]
    fn sixteen_zero_bytes_xor_to_the_key_bytes() {
        let data = [0u8; 16];
        let out = deobfuscate(&data);
        let expected: Vec<u8> = vec![
            0x55, 0xAA, 0x55, 0xAA, 0x0F, 0xF0, 0x0F, 0xF0, 0x55, 0xAA, 0x55, 0xAA, 0x48, 0x12,
            0x48, 0x12,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn short_window_involution_round_trips() {
        let data: Vec<u8> = (0..24u8).collect();
        let once = deobfuscate(&data);
        let twice = deobfuscate(&once);
        assert_eq!(twice, data);
    }

    #[test]
    fn long_buffer_involution_round_trips() {
        let data: Vec<u8> = (0..200u8).cycle().take(300).collect();
        let once = deobfuscate(&data);
        let twice = deobfuscate(&once);
        assert_eq!(twice, data);
    }
}
