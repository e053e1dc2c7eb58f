//! sealstream XChaCha20-Poly1305 加解密算法

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{self, AeadInPlace, KeyInit},
};

use crate::crypto::kdf::{Key, Nonce};
use crate::error::{Result, SealStreamError};

pub const NONCE_SIZE: usize = 24;

pub fn new_cipher(key: &Key) -> Result<XChaCha20Poly1305> {
    XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| SealStreamError::CipherInit)
}

pub fn seal_in_place(
    cipher: &XChaCha20Poly1305,
    nonce: &Nonce,
    buffer: &mut Vec<u8>,
) -> aead::Result<()> {
    cipher.encrypt_in_place(xnonce(nonce), b"", buffer)
}

pub fn open_in_place(
    cipher: &XChaCha20Poly1305,
    nonce: &Nonce,
    buffer: &mut Vec<u8>,
) -> aead::Result<()> {
    cipher.decrypt_in_place(xnonce(nonce), b"", buffer)
}

fn xnonce(nonce: &Nonce) -> &XNonce {
    XNonce::from_slice(&nonce.as_bytes()[..NONCE_SIZE])
}
