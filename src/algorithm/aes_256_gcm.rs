//! sealstream AES-256-GCM 加解密算法
//!
//! GCM 使用 96 bit nonce，只取派生出的 24 字节 nonce 的前 12 字节。
//! 各字节均来自 SHA-256 输出，不同 chunk 的前缀相同的概率可忽略。

use aes_gcm::{
    Aes256Gcm,
    aead::{self, AeadInPlace, KeyInit},
};

use crate::crypto::kdf::{Key, Nonce};
use crate::error::{Result, SealStreamError};

pub const NONCE_SIZE: usize = 12;

pub fn new_cipher(key: &Key) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| SealStreamError::CipherInit)
}

pub fn seal_in_place(cipher: &Aes256Gcm, nonce: &Nonce, buffer: &mut Vec<u8>) -> aead::Result<()> {
    cipher.encrypt_in_place(gcm_nonce(nonce), b"", buffer)
}

pub fn open_in_place(cipher: &Aes256Gcm, nonce: &Nonce, buffer: &mut Vec<u8>) -> aead::Result<()> {
    cipher.decrypt_in_place(gcm_nonce(nonce), b"", buffer)
}

fn gcm_nonce(nonce: &Nonce) -> &aes_gcm::Nonce<aes_gcm::aead::consts::U12> {
    aes_gcm::Nonce::from_slice(&nonce.as_bytes()[..NONCE_SIZE])
}
