//! `flock(2)` 기반 프로세스 간 배타 잠금
//!
//! 허용 목록 파일 자체는 rename으로 교체되어 inode가 바뀌므로,
//! 잠금은 교체되지 않는 별도 파일(`<file>.lock`)에 겁니다.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::AllowlistError;

/// 잠금 재시도 간격
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// 잠금 보유 가드 -- drop 시 잠금을 해제합니다.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// 잠금 파일을 열고 배타 잠금을 획득합니다.
    ///
    /// 다른 프로세스가 잠금을 쥐고 있으면 `timeout`까지 기다린 뒤
    /// [`AllowlistError::LockTimeout`]을 반환합니다.
    pub(crate) fn acquire(path: &Path, timeout: Duration) -> Result<Self, AllowlistError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o644)
            .open(path)
            .map_err(|e| AllowlistError::io(path, e))?;

        let started = Instant::now();
        loop {
            // SAFETY: fd는 `file`이 살아 있는 동안 유효하며, flock은 메모리를 건드리지 않습니다.
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
            if rc == 0 {
                tracing::trace!(path = %path.display(), "allowlist lock acquired");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            let err = std::io::Error::last_os_error();
            match err.kind() {
                ErrorKind::WouldBlock => {
                    if started.elapsed() >= timeout {
                        return Err(AllowlistError::LockTimeout {
                            path: path.display().to_string(),
                            waited_ms: started.elapsed().as_millis() as u64,
                        });
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                ErrorKind::Interrupted => continue,
                _ => return Err(AllowlistError::io(path, err)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // SAFETY: fd는 아직 `self.file`이 소유하고 있습니다.
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if rc != 0 {
            // fd가 닫히면 잠금도 함께 풀리므로 경고만 남깁니다.
            tracing::warn!(
                path = %self.path.display(),
                error = %std::io::Error::last_os_error(),
                "failed to release allowlist lock"
            );
        }
    }
}
