use thiserror::Error;

pub type Result<T> = std::result::Result<T, SealStreamError>;

#[derive(Debug, Error)]
pub enum SealStreamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ciphertext: chunk {chunk_index} is {len} bytes, shorter than the tag")]
    MalformedCiphertext { chunk_index: u64, len: usize },

    #[error("authentication failed at chunk {chunk_index}: wrong passphrase or seed, or corrupted data")]
    Authentication { chunk_index: u64 },

    #[error("cipher rejected the derived key")]
    CipherInit,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SealStreamError {
    /// 是否为 AEAD 认证失败（密码 / seed 错误或数据被篡改）
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
