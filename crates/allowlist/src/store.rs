//! CIDR 파일 저장소 -- [`AllowlistSink`] 구현
//!
//! # 쓰기 절차
//! 1. `<file>.lock` 배타 잠금 (다른 sshwarden 인스턴스와 직렬화)
//! 2. 현재 목록 읽기 (파일이 없으면 빈 목록)
//! 3. 주소 병합 (중복 제거)
//! 4. 같은 디렉토리의 임시 파일에 작성 + fsync
//! 5. `rename(2)`으로 원자적 교체, 디렉토리 fsync
//!
//! 잠금 없이 읽는 프로세스도 rename 덕분에 항상 완전한 파일을 봅니다.

use std::fs::{self, File, Permissions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sshwarden_core::config::AllowlistConfig;
use sshwarden_core::error::SinkError;
use sshwarden_core::metrics as m;
use sshwarden_core::pipeline::AllowlistSink;

use crate::entry::{Allowlist, AllowlistEntry, Cidr, Upsert};
use crate::error::{AllowlistError, LineError};
use crate::lock::FileLock;

/// 새로 만드는 목록 파일의 권한 (방화벽 관리자가 읽을 수 있어야 함)
const NEW_FILE_MODE: u32 = 0o644;

/// CIDR 목록 파일 저장소
#[derive(Debug, Clone)]
pub struct CidrFileStore {
    /// 목록 파일 경로
    path: PathBuf,
    /// 잠금 파일 경로
    lock_path: PathBuf,
    /// 잠금 대기 최대 시간
    lock_timeout: Duration,
}

impl CidrFileStore {
    /// 기본 잠금 대기 시간(5초)으로 저장소를 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            lock_path: PathBuf::from(lock_name),
            path,
            lock_timeout: Duration::from_secs(5),
        }
    }

    /// 설정에서 저장소를 생성합니다.
    pub fn from_config(config: &AllowlistConfig) -> Self {
        Self::new(&config.path).with_lock_timeout(Duration::from_millis(config.lock_timeout_ms))
    }

    /// 잠금 대기 시간을 설정합니다.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// 목록 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 잠금 파일 경로
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// 현재 목록을 읽습니다. 파일이 없으면 빈 목록입니다.
    pub fn load(&self) -> Result<Allowlist, AllowlistError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Allowlist::new()),
            Err(e) => return Err(AllowlistError::io(&self.path, e)),
        };
        let malformed = |source: LineError| AllowlistError::Malformed {
            path: self.path.display().to_string(),
            source,
        };

        let content = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            malformed(LineError {
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
                reason: "invalid UTF-8".to_owned(),
            })
        })?;
        Allowlist::parse(&content).map_err(malformed)
    }

    /// 주소를 기록합니다. 이미 있으면 주석만 갱신합니다.
    pub fn record_ip(&self, address: &str, comment: &str) -> Result<Upsert, AllowlistError> {
        let cidr = Cidr::parse(address)?;
        let _lock = FileLock::acquire(&self.lock_path, self.lock_timeout)?;

        let mut list = self.load()?;
        let outcome = list.upsert(AllowlistEntry::new(cidr.clone(), comment));
        self.replace(&list.render())?;

        tracing::debug!(
            path = %self.path.display(),
            cidr = %cidr,
            outcome = ?outcome,
            entries = list.len(),
            "allowlist updated"
        );
        Ok(outcome)
    }

    /// 임시 파일에 쓴 뒤 rename으로 목록 파일을 교체합니다.
    fn replace(&self, content: &str) -> Result<(), AllowlistError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let permissions = match fs::metadata(&self.path) {
            Ok(meta) => meta.permissions(),
            Err(_) => Permissions::from_mode(NEW_FILE_MODE),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".sshwarden-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| AllowlistError::io(dir, e))?;

        let tmp_path = tmp.path().to_path_buf();
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .and_then(|()| tmp.as_file().set_permissions(permissions))
            .map_err(|e| AllowlistError::io(&tmp_path, e))?;

        tmp.persist(&self.path)
            .map_err(|e| AllowlistError::io(&self.path, e.error))?;

        // rename을 디스크에 반영; 실패해도 교체 자체는 이미 끝났음
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to fsync allowlist directory");
        }

        Ok(())
    }
}

impl AllowlistSink for CidrFileStore {
    fn name(&self) -> &str {
        "cidr-file"
    }

    fn record(&self, address: &str, comment: &str) -> Result<(), SinkError> {
        let started = Instant::now();
        let result = self.record_ip(address, comment);

        metrics::histogram!(m::ALLOWLIST_RECORD_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        let label = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!(m::ALLOWLIST_RECORDS_TOTAL, m::LABEL_RESULT => label).increment(1);

        result.map(|_| ()).map_err(SinkError::from)
    }
}
