//! sealstream 单 chunk AEAD 加解密
//!
//! 使用 XChaCha20-Poly1305、空 associated data 处理单个缓冲区，
//! 与 stream 对每个 chunk 做的变换相同。
//!
//! 安全约束：
//! - nonce 唯一性由调用方负责
//! - 同一 key + nonce 严禁加密两段不同的明文

use crate::algorithm::{AeadAlgorithm, ChunkCipher};
use crate::crypto::kdf::{Key, Nonce};
use crate::error::Result;

/// 加密单个 chunk，结果比明文长 [`TAG_SIZE`](crate::algorithm::TAG_SIZE) 字节
pub fn seal_chunk(key: &Key, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChunkCipher::new(AeadAlgorithm::XChaCha20Poly1305, key)?;

    let mut buffer = plaintext.to_vec();
    cipher.seal_in_place(nonce, &mut buffer)?;
    Ok(buffer)
}

/// 解密单个 chunk
///
/// #### 错误
/// - 输入短于 tag：`MalformedCiphertext`
/// - tag 校验失败：`Authentication`
pub fn open_chunk(key: &Key, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChunkCipher::new(AeadAlgorithm::XChaCha20Poly1305, key)?;

    let mut buffer = ciphertext.to_vec();
    cipher.open_in_place(nonce, 0, &mut buffer)?;
    Ok(buffer)
}
