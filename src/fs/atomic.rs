//! sealstream 原子写入工具。
//!
//! 输出先写入目标旁边的临时文件，整个 stream 成功后再 rename 覆盖目标：
//! 加密失败或任一 chunk 认证失败时，目标路径上不会出现截断或
//! 部分解密的文件。

use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::Result;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

const TMP_ATTEMPTS: usize = 16;

/// 原子写文件。
///
/// 流程：
/// 1. 在目标目录独占创建临时文件；
/// 2. 调用 `write_fn` 写入完整内容并 fsync；
/// 3. 成功后 rename 替换目标文件，失败则删除临时文件。
pub fn write_atomic<T, F>(target: &Path, write_fn: F) -> Result<T>
where
    F: FnOnce(&mut File) -> Result<T>,
{
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "target path has no parent directory",
            )
            .into());
        }
    };

    fs::create_dir_all(parent)?;

    let (tmp_path, mut tmp_file) = create_tmp_file(parent, target)?;

    let value = match write_fn(&mut tmp_file).and_then(|v| {
        tmp_file.sync_all()?;
        Ok(v)
    }) {
        Ok(v) => v,
        Err(err) => {
            drop(tmp_file);
            let _ = fs::remove_file(&tmp_path);
            debug!(tmp = %tmp_path.display(), "discarded partial output");
            return Err(err);
        }
    };
    drop(tmp_file);

    if target.exists() {
        fs::remove_file(target)?;
    }

    fs::rename(&tmp_path, target)?;

    Ok(value)
}

/// 同目录下独占创建临时文件，名称冲突时换下一个序号重试。
fn create_tmp_file(parent: &Path, target: &Path) -> io::Result<(PathBuf, File)> {
    let stem = target
        .file_name()
        .filter(|n| !n.is_empty())
        .unwrap_or(OsStr::new("sealstream-output"));

    for _ in 0..TMP_ATTEMPTS {
        let path = parent.join(tmp_name(stem, TMP_COUNTER.fetch_add(1, Ordering::Relaxed)));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free temporary name next to {}", target.display()),
    ))
}

/// `.<name>.sealstream-<pid>-<seq>.part`，保留非 UTF-8 文件名原样
fn tmp_name(stem: &OsStr, seq: u64) -> OsString {
    let mut name = OsString::from(".");
    name.push(stem);
    name.push(format!(".sealstream-{}-{seq}.part", std::process::id()));
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SealStreamError;
    use std::io::Write;

    #[test]
    fn success_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");
        fs::write(&target, b"old contents").unwrap();

        let n = write_atomic(&target, |f| {
            f.write_all(b"new")?;
            Ok(3)
        })
        .unwrap();

        assert_eq!(n, 3);
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failure_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");

        let result: Result<()> = write_atomic(&target, |f| {
            f.write_all(b"partial")?;
            Err(SealStreamError::Authentication { chunk_index: 1 })
        });

        assert!(result.unwrap_err().is_authentication());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn tmp_files_are_distinct_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");

        let (a, _fa) = create_tmp_file(dir.path(), &target).unwrap();
        let (b, _fb) = create_tmp_file(dir.path(), &target).unwrap();

        assert_ne!(a, b);
        for path in [&a, &b] {
            assert_eq!(path.parent(), Some(dir.path()));
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with(".out.bin.sealstream-"), "{name}");
            assert!(name.ends_with(".part"), "{name}");
        }
    }

    #[test]
    fn tmp_name_layout() {
        assert_eq!(
            tmp_name(OsStr::new("out.bin"), 7),
            OsString::from(format!(".out.bin.sealstream-{}-7.part", std::process::id()))
        );
    }

    #[test]
    fn failure_keeps_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");
        fs::write(&target, b"keep me").unwrap();

        let result: Result<()> =
            write_atomic(&target, |_| Err(io::Error::other("boom").into()));

        assert!(result.is_err());
        assert_eq!(fs::read(&target).unwrap(), b"keep me");
    }
}
