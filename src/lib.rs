//! sealstream：文件 / 字节流的分块认证加密
//!
//! 输入按固定大小切分为 chunk，每个 chunk 使用 XChaCha20-Poly1305
//! （或 AES-256-GCM）独立加密，密钥与逐 chunk 的 nonce 均由调用方提供的
//! 字符串派生。格式见 [`format::stream`]，派生规则见 [`crypto::kdf`]。

mod decrypt;
mod encrypt;

pub mod algorithm;
pub mod crypto;
pub mod error;
pub mod format;
pub mod fs;

pub use algorithm::{AeadAlgorithm, TAG_SIZE};
pub use crypto::aead::{open_chunk, seal_chunk};
pub use crypto::kdf::{Key, Nonce, NonceSequence, derive_key, derive_nonce};
pub use decrypt::decrypt_file;
pub use encrypt::encrypt_file;
pub use error::{Result, SealStreamError};
pub use format::stream::{
    DEFAULT_CHUNK_SIZE, StreamConfig, StreamStats, ciphertext_len, decrypt_stream, encrypt_stream,
};

use std::path::Path;

/// 使用默认配置加密文件
pub fn encrypt(input: &Path, output: &Path, passphrase: &str, nonce_seed: &str) -> Result<()> {
    encrypt_file(input, output, passphrase, nonce_seed, &StreamConfig::default()).map(|_| ())
}

/// 使用默认配置解密文件
pub fn decrypt(input: &Path, output: &Path, passphrase: &str, nonce_seed: &str) -> Result<()> {
    decrypt_file(input, output, passphrase, nonce_seed, &StreamConfig::default()).map(|_| ())
}
