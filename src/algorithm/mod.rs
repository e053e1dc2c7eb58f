//! sealstream AEAD 算法模块。
//!
//! 统一管理可选算法，并提供逐 chunk 的 seal / open 适配层：
//! - 每个 stream 只构建一次 [`ChunkCipher`]
//! - chunk 在复用的缓冲区中原地加密 / 解密
//! - associated data 固定为空

pub mod aes_256_gcm;
pub mod xchacha20_poly1305;

use std::fmt;
use std::str::FromStr;

use crate::crypto::kdf::{Key, Nonce};
use crate::error::{Result, SealStreamError};

/// 每个加密 chunk 末尾追加的认证标签长度
pub const TAG_SIZE: usize = 16;

/// 支持的 AEAD 算法，默认 XChaCha20-Poly1305。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AeadAlgorithm {
    #[default]
    XChaCha20Poly1305,
    Aes256Gcm,
}

impl AeadAlgorithm {
    pub const XCHACHA20_POLY1305_NAME: &'static str = "xchacha20-poly1305";
    pub const AES_256_GCM_NAME: &'static str = "aes-256-gcm";

    pub fn name(self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => Self::XCHACHA20_POLY1305_NAME,
            Self::Aes256Gcm => Self::AES_256_GCM_NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            Self::XCHACHA20_POLY1305_NAME => Some(Self::XChaCha20Poly1305),
            Self::AES_256_GCM_NAME => Some(Self::Aes256Gcm),
            _ => None,
        }
    }
}

impl fmt::Display for AeadAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AeadAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            format!(
                "unknown algorithm '{s}' (expected {} or {})",
                Self::XCHACHA20_POLY1305_NAME,
                Self::AES_256_GCM_NAME
            )
        })
    }
}

/// 已绑定密钥的 AEAD 实例
pub enum ChunkCipher {
    XChaCha20Poly1305(chacha20poly1305::XChaCha20Poly1305),
    Aes256Gcm(aes_gcm::Aes256Gcm),
}

impl ChunkCipher {
    pub fn new(algorithm: AeadAlgorithm, key: &Key) -> Result<Self> {
        let cipher = match algorithm {
            AeadAlgorithm::XChaCha20Poly1305 => {
                Self::XChaCha20Poly1305(xchacha20_poly1305::new_cipher(key)?)
            }
            AeadAlgorithm::Aes256Gcm => Self::Aes256Gcm(aes_256_gcm::new_cipher(key)?),
        };
        Ok(cipher)
    }

    pub fn algorithm(&self) -> AeadAlgorithm {
        match self {
            Self::XChaCha20Poly1305(_) => AeadAlgorithm::XChaCha20Poly1305,
            Self::Aes256Gcm(_) => AeadAlgorithm::Aes256Gcm,
        }
    }

    /// 原地加密：明文被替换为密文，缓冲区长度增加 [`TAG_SIZE`]。
    pub fn seal_in_place(&self, nonce: &Nonce, buffer: &mut Vec<u8>) -> Result<()> {
        let sealed = match self {
            Self::XChaCha20Poly1305(c) => {
                xchacha20_poly1305::seal_in_place(c, nonce, buffer).is_ok()
            }
            Self::Aes256Gcm(c) => aes_256_gcm::seal_in_place(c, nonce, buffer).is_ok(),
        };

        if !sealed {
            return Err(std::io::Error::other("AEAD seal failed").into());
        }
        Ok(())
    }

    /// 原地解密：密文 + tag 被替换为明文，长度减少 [`TAG_SIZE`]。
    ///
    /// - 长度不足一个 tag 时直接返回 `MalformedCiphertext`，不调用底层算法
    /// - `chunk_index` 仅用于错误信息
    pub fn open_in_place(
        &self,
        nonce: &Nonce,
        chunk_index: u64,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        if buffer.len() < TAG_SIZE {
            return Err(SealStreamError::MalformedCiphertext {
                chunk_index,
                len: buffer.len(),
            });
        }

        let opened = match self {
            Self::XChaCha20Poly1305(c) => {
                xchacha20_poly1305::open_in_place(c, nonce, buffer).is_ok()
            }
            Self::Aes256Gcm(c) => aes_256_gcm::open_in_place(c, nonce, buffer).is_ok(),
        };

        if !opened {
            // 认证失败的数据不允许流出
            buffer.clear();
            return Err(SealStreamError::Authentication { chunk_index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::{NonceSequence, derive_key};

    const ALL: [AeadAlgorithm; 2] = [AeadAlgorithm::XChaCha20Poly1305, AeadAlgorithm::Aes256Gcm];

    #[test]
    fn algorithm_names_roundtrip() {
        for algorithm in ALL {
            assert_eq!(algorithm.name().parse::<AeadAlgorithm>(), Ok(algorithm));
        }
        assert_eq!(
            AeadAlgorithm::from_name("XChaCha20-Poly1305"),
            Some(AeadAlgorithm::XChaCha20Poly1305)
        );
        assert!("rot13".parse::<AeadAlgorithm>().is_err());
        assert_eq!(AeadAlgorithm::default(), AeadAlgorithm::XChaCha20Poly1305);
    }

    #[test]
    fn seal_grows_by_tag_and_open_restores() {
        let key = derive_key("pw");
        let nonce = NonceSequence::new("seed").nonce_for(0);

        for algorithm in ALL {
            let cipher = ChunkCipher::new(algorithm, &key).unwrap();
            assert_eq!(cipher.algorithm(), algorithm);

            let mut buffer = b"chunk payload".to_vec();
            cipher.seal_in_place(&nonce, &mut buffer).unwrap();
            assert_eq!(buffer.len(), 13 + TAG_SIZE);
            assert_ne!(&buffer[..13], b"chunk payload");

            cipher.open_in_place(&nonce, 0, &mut buffer).unwrap();
            assert_eq!(buffer, b"chunk payload");
        }
    }

    #[test]
    fn empty_chunk_seals_to_bare_tag() {
        let cipher = ChunkCipher::new(AeadAlgorithm::default(), &derive_key("pw")).unwrap();
        let nonce = NonceSequence::new("seed").nonce_for(0);

        let mut buffer = Vec::new();
        cipher.seal_in_place(&nonce, &mut buffer).unwrap();
        assert_eq!(buffer.len(), TAG_SIZE);

        cipher.open_in_place(&nonce, 0, &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn open_rejects_short_input_before_cipher() {
        let cipher = ChunkCipher::new(AeadAlgorithm::default(), &derive_key("pw")).unwrap();
        let nonce = NonceSequence::new("seed").nonce_for(0);

        let mut buffer = vec![0u8; TAG_SIZE - 1];
        let err = cipher.open_in_place(&nonce, 7, &mut buffer).unwrap_err();
        assert!(matches!(
            err,
            SealStreamError::MalformedCiphertext { chunk_index: 7, len } if len == TAG_SIZE - 1
        ));
    }

    #[test]
    fn open_with_wrong_nonce_fails_authentication() {
        let key = derive_key("pw");
        let seq = NonceSequence::new("seed");

        for algorithm in ALL {
            let cipher = ChunkCipher::new(algorithm, &key).unwrap();
            let mut buffer = b"secret data".to_vec();
            cipher.seal_in_place(&seq.nonce_for(0), &mut buffer).unwrap();

            let err = cipher.open_in_place(&seq.nonce_for(1), 1, &mut buffer).unwrap_err();
            assert!(err.is_authentication());
            assert!(buffer.is_empty());
        }
    }
}
