//! Packet-class-dependent AES-CBC-MAC tag builder (component G).
//!
//! The uplink MAC authenticates flags, sequence number, device ID and
//! payload together. Its length varies with payload length so that the
//! total packet lands on the same byte boundary regardless of how many of
//! those bytes are real payload versus MAC padding.

use crate::aes::{cbc_encrypt_in_place, Aes128Block, BlockEncrypt128};

pub const MIN_MAC_LEN: usize = 2;
pub const MAX_MAC_LEN: usize = 5;
const MAX_PAYLOAD_LEN: usize = 12;

/// MAC length, in bytes, for a packet with the given payload length and
/// single-bit flag. Single-bit messages and 1-byte payloads always use the
/// minimum length; everything else pads out to `2 + ((12 - payload_len) % 4)`.
pub fn mac_len(payload_len: usize, single_bit: bool) -> usize {
    if single_bit || payload_len == 1 {
        MIN_MAC_LEN
    } else {
        MIN_MAC_LEN + (MAX_PAYLOAD_LEN - payload_len) % 4
    }
}

/// Compute the CBC-MAC over `prefix` (the packet's flags, sequence number,
/// device ID and payload — 6 bytes for single-bit messages, `6 + payload_len`
/// otherwise) and write `mac_out.len()` bytes of tag into `mac_out`.
///
/// `prefix` is replicated to fill one or two 32-byte/16-byte AES blocks
/// (two when longer than 16 bytes) before CBC-encrypting; the tag is taken
/// from the last block.
pub fn uplink_mac(prefix: &[u8], key: &[u8; 16], mac_out: &mut [u8]) {
    uplink_mac_with(&Aes128Block, prefix, key, mac_out)
}

pub fn uplink_mac_with(
    cipher: &impl BlockEncrypt128,
    prefix: &[u8],
    key: &[u8; 16],
    mac_out: &mut [u8],
) {
    let mut block = [0u8; 32];
    for (i, slot) in block.iter_mut().enumerate() {
        *slot = prefix[i % prefix.len()];
    }

    let block_count = if prefix.len() > 16 { 2 } else { 1 };
    cbc_encrypt_in_place(cipher, key, &mut block[..block_count * 16]);

    let tag = &block[(block_count - 1) * 16..block_count * 16];
    mac_out.copy_from_slice(&tag[..mac_out.len()]);
}
