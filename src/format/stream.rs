//! sealstream Stream 实现
//!
//! 本模块负责数据流（Stream）的分块加密与解密。
//!
//! Stream 格式：各 chunk 独立加密后直接拼接。
//! ```text
//! [ct_0 | tag_0][ct_1 | tag_1] ... [ct_n | tag_n]
//! ```
//! - 除最后一个 chunk 外，每个 chunk 含 `chunk_size` 字节明文，
//!   落盘为 `chunk_size + TAG_SIZE` 字节
//! - 没有 header、长度字段或结束标记，解密端必须使用相同的 `chunk_size`
//!   才能还原 chunk 边界
//! - 第 `i` 个 chunk 使用 `NonceSequence::nonce_for(i)`，AAD 为空，
//!   同一 stream 内 nonce 互不相同
//!
//! 加密 / 解密共用同一个状态机：
//! ```text
//! ReadChunk -> TransformChunk -> WriteChunk -> Advance -> ReadChunk
//!     |
//!     +-- end of stream --> Done
//! ```
//! 任一步骤出错即进入 Failed，错误直接返回调用方。
//! 出错前已写出的 chunk 留在 writer 中，由调用方负责丢弃。

use std::io::{self, ErrorKind, Read, Write};

use tracing::{debug, trace, warn};
use zeroize::Zeroize;

use crate::algorithm::{AeadAlgorithm, ChunkCipher, TAG_SIZE};
use crate::crypto::kdf::{Key, NonceSequence, derive_key};
use crate::error::{Result, SealStreamError};

/// 默认明文 chunk 大小：2 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Stream 配置，显式传入每一次加 / 解密调用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// 每个 chunk 的明文字节数，不写入输出
    pub chunk_size: usize,
    pub algorithm: AeadAlgorithm,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: AeadAlgorithm::default(),
        }
    }
}

impl StreamConfig {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: AeadAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// 完整 chunk 加密后的大小
    pub fn sealed_chunk_size(&self) -> usize {
        self.chunk_size + TAG_SIZE
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SealStreamError::InvalidConfig(
                "chunk size must be greater than zero".into(),
            ));
        }
        if self.chunk_size.checked_add(TAG_SIZE).is_none() {
            return Err(SealStreamError::InvalidConfig(format!(
                "chunk size {} is too large",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

/// 加密 `plaintext_len` 字节明文后输出流的总长度。
///
/// 与流式接口使用同一份配置校验：`chunk_size == 0` 返回 `InvalidConfig`。
pub fn ciphertext_len(plaintext_len: u64, config: &StreamConfig) -> Result<u64> {
    config.validate()?;

    let chunks = plaintext_len.div_ceil(config.chunk_size as u64);
    chunks
        .checked_mul(TAG_SIZE as u64)
        .and_then(|overhead| plaintext_len.checked_add(overhead))
        .ok_or_else(|| {
            SealStreamError::InvalidConfig(format!(
                "ciphertext length of {plaintext_len} plaintext bytes overflows u64"
            ))
        })
}

/// Stream 结束（Done）时的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// 单次读取的结果，EOF 不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// 缓冲区前 `n > 0` 字节有效
    Chunk(usize),
    EndOfStream,
}

/// 从 `reader` 填满 `buf`，只有遇到 EOF 才提前结束。
///
/// 短读会继续读取，保证 chunk 边界与 reader 的分段方式无关。
pub fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<ReadOutcome> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    if filled == 0 {
        Ok(ReadOutcome::EndOfStream)
    } else {
        Ok(ReadOutcome::Chunk(filled))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Seal,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadChunk,
    TransformChunk,
    WriteChunk,
    Advance,
    Done,
}

struct ChunkPipeline {
    direction: Direction,
    cipher: ChunkCipher,
    nonces: NonceSequence,
    read_size: usize,
    buffer: Vec<u8>,
    chunk_index: u64,
    stats: StreamStats,
}

impl ChunkPipeline {
    fn new(
        direction: Direction,
        key: &Key,
        nonces: NonceSequence,
        config: &StreamConfig,
    ) -> Result<Self> {
        config.validate()?;

        let cipher = ChunkCipher::new(config.algorithm, key)?;
        let read_size = match direction {
            Direction::Seal => config.chunk_size,
            Direction::Open => config.sealed_chunk_size(),
        };

        Ok(Self {
            direction,
            cipher,
            nonces,
            read_size,
            // 容量可容纳一个完整的加密 chunk，循环中不再重新分配
            buffer: Vec::with_capacity(config.sealed_chunk_size()),
            chunk_index: 0,
            stats: StreamStats::default(),
        })
    }

    fn run<R: Read, W: Write>(mut self, reader: &mut R, writer: &mut W) -> Result<StreamStats> {
        let span = tracing::debug_span!(
            "stream",
            direction = ?self.direction,
            algorithm = %self.cipher.algorithm(),
            read_size = self.read_size,
        );
        let _enter = span.enter();

        let result = self.drive(reader, writer);
        match &result {
            Ok(stats) => debug!(
                chunks = stats.chunks,
                bytes_read = stats.bytes_read,
                bytes_written = stats.bytes_written,
                "stream done"
            ),
            Err(e) => warn!(chunk_index = self.chunk_index, error = %e, "stream failed"),
        }
        result
    }

    fn drive<R: Read, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> Result<StreamStats> {
        let mut state = State::ReadChunk;

        loop {
            state = match state {
                State::ReadChunk => {
                    self.buffer.resize(self.read_size, 0);
                    match read_chunk(reader, &mut self.buffer)? {
                        ReadOutcome::EndOfStream => State::Done,
                        ReadOutcome::Chunk(n) => {
                            self.buffer.truncate(n);
                            self.stats.bytes_read += n as u64;
                            State::TransformChunk
                        }
                    }
                }

                State::TransformChunk => {
                    let nonce = self.nonces.nonce_for(self.chunk_index);
                    match self.direction {
                        Direction::Seal => self.cipher.seal_in_place(&nonce, &mut self.buffer)?,
                        Direction::Open => {
                            self.cipher
                                .open_in_place(&nonce, self.chunk_index, &mut self.buffer)?
                        }
                    }
                    State::WriteChunk
                }

                State::WriteChunk => {
                    writer.write_all(&self.buffer)?;
                    self.stats.bytes_written += self.buffer.len() as u64;
                    trace!(
                        chunk_index = self.chunk_index,
                        len = self.buffer.len(),
                        "chunk written"
                    );
                    State::Advance
                }

                State::Advance => {
                    self.chunk_index += 1;
                    self.stats.chunks += 1;
                    State::ReadChunk
                }

                State::Done => {
                    writer.flush()?;
                    return Ok(self.stats);
                }
            };
        }
    }
}

impl Drop for ChunkPipeline {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}

/// 流式加密器
///
/// [`encrypt`](Self::encrypt) 会消耗自身，同一实例不能在第二个 stream 上
/// 重新从 chunk 0 开始使用 nonce。
pub struct StreamEncryptor {
    pipeline: ChunkPipeline,
}

impl StreamEncryptor {
    pub fn new(key: &Key, nonces: NonceSequence, config: &StreamConfig) -> Result<Self> {
        Ok(Self {
            pipeline: ChunkPipeline::new(Direction::Seal, key, nonces, config)?,
        })
    }

    /// 从 reader 读取明文，加密后写入 writer
    pub fn encrypt<R: Read, W: Write>(self, mut reader: R, mut writer: W) -> Result<StreamStats> {
        self.pipeline.run(&mut reader, &mut writer)
    }
}

/// 流式解密器
pub struct StreamDecryptor {
    pipeline: ChunkPipeline,
}

impl StreamDecryptor {
    pub fn new(key: &Key, nonces: NonceSequence, config: &StreamConfig) -> Result<Self> {
        Ok(Self {
            pipeline: ChunkPipeline::new(Direction::Open, key, nonces, config)?,
        })
    }

    /// 从 reader 读取加密数据流，解密后写入 writer
    ///
    /// 任一 chunk 校验失败立即停止。
    pub fn decrypt<R: Read, W: Write>(self, mut reader: R, mut writer: W) -> Result<StreamStats> {
        self.pipeline.run(&mut reader, &mut writer)
    }
}

/// 由 passphrase / seed 派生密钥与 nonce，加密整个 stream
pub fn encrypt_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    passphrase: &str,
    nonce_seed: &str,
    config: &StreamConfig,
) -> Result<StreamStats> {
    let key = derive_key(passphrase);
    StreamEncryptor::new(&key, NonceSequence::new(nonce_seed), config)?.encrypt(reader, writer)
}

/// 解密 [`encrypt_stream`] 的输出，passphrase、seed、chunk 大小必须一致
pub fn decrypt_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    passphrase: &str,
    nonce_seed: &str,
    config: &StreamConfig,
) -> Result<StreamStats> {
    let key = derive_key(passphrase);
    StreamDecryptor::new(&key, NonceSequence::new(nonce_seed), config)?.decrypt(reader, writer)
}
