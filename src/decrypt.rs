//! sealstream 文件解密流程实现
//!
//! 解密流程（严格顺序）：
//! 1. 打开输入文件（带缓冲）
//! 2. 由 passphrase / seed 派生密钥与 nonce 序列
//! 3. 流式解密到临时文件，成功后 rename 覆盖目标文件
//!
//! 注意：
//! - 输入没有 header，`config` 中的 chunk 大小和算法必须与加密时一致
//! - 任一 chunk 校验失败必须立即报错，目标路径保持不变

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::info;

use crate::crypto::kdf::{NonceSequence, derive_key};
use crate::error::Result;
use crate::format::stream::{StreamConfig, StreamDecryptor, StreamStats};
use crate::fs::atomic::write_atomic;

/// 使用 passphrase + seed 解密文件
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase: &str,
    nonce_seed: &str,
    config: &StreamConfig,
) -> Result<StreamStats> {
    config.validate()?;

    // ---------- 打开输入文件 ----------
    let reader = BufReader::new(File::open(input_path)?);

    // ---------- 派生密钥与 nonce 序列 ----------
    let key = derive_key(passphrase);
    let decryptor = StreamDecryptor::new(&key, NonceSequence::new(nonce_seed), config)?;

    // ---------- Stream 解密（原子写出） ----------
    let stats = write_atomic(output_path, |file| {
        decryptor.decrypt(reader, BufWriter::new(file))
    })?;

    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        chunks = stats.chunks,
        bytes = stats.bytes_written,
        "decrypted"
    );

    Ok(stats)
}
