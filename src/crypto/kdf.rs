//! sealstream 密钥 / nonce 派生模块
//!
//! 密钥与 nonce 都由调用方提供的 UTF-8 字符串经 SHA-256 得到。
//! 派生过程是确定性的：解密端用相同的 passphrase 和 seed
//! 即可独立重建完全相同的材料，输出中不保存任何派生结果。
//!
//! 单个 stream 的 nonce 序列：
//! ```text
//! root     = SHA-256(seed)[0..24]
//! nonce_i  = SHA-256(root || u64_be(i))[0..24]     i = 0, 1, 2, ...
//! ```
//! 同一 stream 中每个 chunk 都使用独立的 nonce，严禁复用。

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// 派生密钥长度（256-bit）
pub const KEY_LEN: usize = 32;

/// XChaCha20-Poly1305 扩展 nonce 长度
pub const NONCE_LEN: usize = 24;

/// 32 字节 AEAD 密钥，离开作用域后自动清零。
///
/// 不实现 `Clone`：密钥只属于一次加 / 解密操作。
///
/// ```compile_fail
/// let key = sealstream::derive_key("pw");
/// let copy = key.clone();
/// ```
pub struct Key(Zeroizing<[u8; KEY_LEN]>);

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Key").field(&"[REDACTED]").finish()
    }
}

/// 24 字节 nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// 由 passphrase 派生 AEAD 密钥：SHA-256(passphrase)
pub fn derive_key(passphrase: &str) -> Key {
    let mut key = Key::from_bytes([0u8; KEY_LEN]);
    key.0.copy_from_slice(&Sha256::digest(passphrase.as_bytes()));
    key
}

/// 由 seed 派生根 nonce：SHA-256(seed) 的前 24 字节
pub fn derive_nonce(seed: &str) -> Nonce {
    truncate(&Sha256::digest(seed.as_bytes()))
}

/// 单个 stream 的逐 chunk nonce 序列
#[derive(Debug, Clone)]
pub struct NonceSequence {
    root: Nonce,
}

impl NonceSequence {
    pub fn new(seed: &str) -> Self {
        Self::from_root(derive_nonce(seed))
    }

    pub fn from_root(root: Nonce) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Nonce {
        &self.root
    }

    /// 第 `index` 个 chunk 加密 / 解密时使用的 nonce
    pub fn nonce_for(&self, index: u64) -> Nonce {
        let mut hasher = Sha256::new();
        hasher.update(self.root.as_bytes());
        hasher.update(index.to_be_bytes());
        truncate(&hasher.finalize())
    }
}

fn truncate(digest: &[u8]) -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    Nonce(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_is_sha256_of_passphrase() {
        // SHA-256("abc")
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(derive_key("abc").as_bytes(), &expected);
    }

    #[test]
    fn nonce_is_truncated_sha256_of_seed() {
        let key = derive_key("abc");
        let nonce = derive_nonce("abc");
        assert_eq!(nonce.as_bytes()[..], key.as_bytes()[..NONCE_LEN]);
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(derive_key("pw").as_bytes(), derive_key("pw").as_bytes());
        assert_eq!(derive_nonce("seed"), derive_nonce("seed"));
        assert_ne!(derive_key("pw").as_bytes(), derive_key("pw2").as_bytes());
        assert_ne!(derive_nonce("seed"), derive_nonce("seed2"));
    }

    #[test]
    fn sequence_nonces_are_distinct() {
        let seq = NonceSequence::new("seed");
        let seen: HashSet<Nonce> = (0..1000).map(|i| seq.nonce_for(i)).collect();
        assert_eq!(seen.len(), 1000);
        assert!(!seen.contains(seq.root()));
    }

    #[test]
    fn sequence_is_reproducible_from_seed() {
        let a = NonceSequence::new("seed");
        let b = NonceSequence::new("seed");
        for i in [0, 1, 2, u64::MAX] {
            assert_eq!(a.nonce_for(i), b.nonce_for(i));
        }
        assert_ne!(a.nonce_for(0), NonceSequence::new("other").nonce_for(0));
    }

    #[test]
    fn key_debug_is_redacted() {
        let rendered = format!("{:?}", derive_key("secret"));
        assert_eq!(rendered, "Key(\"[REDACTED]\")");
    }
}
