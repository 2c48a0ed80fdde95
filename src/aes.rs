//! AES-128 block primitive (component A) and the CBC-mode driver built on
//! top of it.

use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};

/// A single-block AES-128 encryptor. The codec depends only on this trait,
/// not on a concrete cipher implementation.
pub trait BlockEncrypt128 {
    fn encrypt_block(&self, key: &[u8; 16], block: [u8; 16]) -> [u8; 16];
}

/// AES-128 implementation backed by the `aes` crate. The default used by
/// every `*_with`-less function in this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aes128Block;

impl BlockEncrypt128 for Aes128Block {
    fn encrypt_block(&self, key: &[u8; 16], block: [u8; 16]) -> [u8; 16] {
        let cipher = Aes128::new(GenericArray::from_slice(key));
        let mut buf = GenericArray::clone_from_slice(&block);
        cipher.encrypt_block(&mut buf);
        buf.into()
    }
}

/// Encrypt `data` in place using CBC chaining with an all-zero IV: each
/// block is XORed with the previous block's ciphertext (the first block
/// with the zero IV) before encryption. `data.len()` must be a multiple of
/// 16.
pub fn cbc_encrypt_in_place(cipher: &impl BlockEncrypt128, key: &[u8; 16], data: &mut [u8]) {
    debug_assert!(data.len() % 16 == 0);
    let mut chain = [0u8; 16];
    for block in data.chunks_mut(16) {
        for i in 0..16 {
            chain[i] ^= block[i];
        }
        chain = cipher.encrypt_block(key, chain);
        block.copy_from_slice(&chain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // FIPS-197 test vector.
    #[test]
    fn single_block_matches_fips_vector() {
        let key = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ];
        let plaintext = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        let expected = [
            0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4,
            0xc5, 0x5a,
        ];
        assert_eq!(Aes128Block.encrypt_block(&key, plaintext), expected);
    }

    #[test]
    fn cbc_chaining_differs_from_ecb_after_first_block() {
        let key = [0u8; 16];
        let mut data = [0x11u8; 32];
        cbc_encrypt_in_place(&Aes128Block, &key, &mut data);
        assert_ne!(&data[..16], &data[16..]);
    }
}
