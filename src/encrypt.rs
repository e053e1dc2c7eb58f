//! sealstream 文件加密流程实现
//!
//! 加密流程（严格顺序）：
//! 1. 打开输入文件（带缓冲）
//! 2. 由 passphrase / seed 派生密钥与 nonce 序列
//! 3. 将加密 chunk 流式写入临时文件
//! 4. 成功后 rename 覆盖目标文件
//!
//! 注意：
//! - 本模块不决定输出文件名
//! - 不做密码输入

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::info;

use crate::crypto::kdf::{NonceSequence, derive_key};
use crate::error::Result;
use crate::format::stream::{StreamConfig, StreamEncryptor, StreamStats};
use crate::fs::atomic::write_atomic;

/// 使用 passphrase + seed 加密文件
pub fn encrypt_file(
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
    let encryptor = StreamEncryptor::new(&key, NonceSequence::new(nonce_seed), config)?;

    // ---------- Stream 加密（原子写出） ----------
    let stats = write_atomic(output_path, |file| {
        encryptor.encrypt(reader, BufWriter::new(file))
    })?;

    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        chunks = stats.chunks,
        bytes = stats.bytes_read,
        "encrypted"
    );

    Ok(stats)
}
