//! 파일 기반 로그 추적기
//!
//! 로그 파일을 감시하며 새로운 라인이 추가되면 수집합니다.
//! `tail -F`와 유사한 동작을 비동기 방식으로 구현합니다.
//!
//! # 로테이션 감지
//! 현재 핸들을 EOF까지 읽은 뒤에만 경로를 다시 확인합니다.
//! - inode/device 변경 (logrotate의 rename + create)
//! - 파일 크기 축소 (copytruncate)
//! - 파일이 사라졌다가 다시 생성됨
//!
//! 어느 경우든 새 파일의 **끝**에서 다시 읽기 시작합니다. 확인 시점 사이에
//! 새 파일에 기록된 라인은 놓칠 수 있습니다 (best-effort).

use std::io::SeekFrom;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use sshwarden_core::metrics as m;

use super::{LineSource, RawLine};
use crate::config::{PipelineConfig, StartPosition};
use crate::error::LogPipelineError;

/// 파일 식별자 (device, inode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    fn of(meta: &std::fs::Metadata) -> Self {
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }
}

/// 열린 로그 파일 핸들
struct OpenedFile {
    reader: BufReader<File>,
    identity: FileIdentity,
    offset: u64,
}

async fn open_file(path: &Path, start_at: StartPosition) -> std::io::Result<OpenedFile> {
    let mut file = File::open(path).await?;
    let meta = file.metadata().await?;
    if meta.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path is a directory",
        ));
    }

    let offset = match start_at {
        StartPosition::End => file.seek(SeekFrom::End(0)).await?,
        StartPosition::Beginning => 0,
    };

    Ok(OpenedFile {
        reader: BufReader::new(file),
        identity: FileIdentity::of(&meta),
        offset,
    })
}

/// 로그 파일 추적기
///
/// 한 파일을 따라가며 완성된 라인을 순서대로 반환합니다. 새 데이터가 없으면
/// `poll_interval`만큼 잠들었다가 다시 확인합니다.
///
/// # 사용 예시
/// ```ignore
/// let mut follower = LogFollower::open(&config).await?;
/// loop {
///     let line = follower.read_next().await;
///     println!("{}", line.text());
/// }
/// ```
pub struct LogFollower {
    /// 로그 파일 경로
    path: PathBuf,
    /// 새 데이터가 없을 때 대기 간격
    poll_interval: Duration,
    /// 최대 라인 길이 (바이트)
    max_line_length: usize,
    /// 현재 핸들. 읽기 실패나 재열기 실패 후에는 `None`
    reader: Option<BufReader<File>>,
    /// 현재 핸들의 파일 식별자
    identity: Option<FileIdentity>,
    /// 현재 핸들에서 소비한 바이트 위치
    offset: u64,
    /// 아직 개행을 만나지 못한 부분 라인
    pending: Vec<u8>,
    /// 부분 라인이 최대 길이를 넘었는지 여부
    pending_truncated: bool,
    /// 다음 라인 순번
    next_seq: u64,
    /// 파일 부재 경고를 이미 남겼는지 여부
    missing_reported: bool,
}

impl LogFollower {
    /// 로그 파일을 열고 추적기를 생성합니다.
    ///
    /// 파일을 열 수 없으면 [`LogPipelineError::SourceUnavailable`]을 반환합니다.
    /// 시작 이후의 파일 부재는 에러가 아니며 폴링마다 재시도합니다.
    pub async fn open(config: &PipelineConfig) -> Result<Self, LogPipelineError> {
        config.validate()?;
        let path = config.log_file.clone();

        let opened = open_file(&path, config.start_at)
            .await
            .map_err(|source| LogPipelineError::SourceUnavailable {
                path: path.display().to_string(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            start_at = ?config.start_at,
            offset = opened.offset,
            "following log file"
        );

        Ok(Self {
            path,
            poll_interval: config.poll_interval(),
            max_line_length: config.max_line_length,
            reader: Some(opened.reader),
            identity: Some(opened.identity),
            offset: opened.offset,
            pending: Vec::new(),
            pending_truncated: false,
            next_seq: 0,
            missing_reported: false,
        })
    }

    /// 로그 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 핸들에서 소비한 바이트 위치
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 다음 완성된 라인을 반환합니다. 라인이 생길 때까지 대기합니다.
    pub async fn read_next(&mut self) -> RawLine {
        loop {
            if let Some(line) = self.read_buffered_line().await {
                return line;
            }
            self.check_rotation().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 현재 핸들에서 라인 하나를 읽습니다. EOF에 닿으면 `None`입니다.
    ///
    /// 개행 없는 데이터는 `pending`에 쌓아 두고 다음 호출에서 이어 붙입니다.
    async fn read_buffered_line(&mut self) -> Option<RawLine> {
        loop {
            let step = {
                let reader = self.reader.as_mut()?;
                match reader.fill_buf().await {
                    Err(e) => Err(e),
                    Ok([]) => Ok(None),
                    Ok(chunk) => {
                        let (take, complete) = match chunk.iter().position(|&b| b == b'\n') {
                            Some(pos) => (pos + 1, true),
                            None => (chunk.len(), false),
                        };
                        let content = if complete { take - 1 } else { take };
                        let room = self.max_line_length.saturating_sub(self.pending.len());
                        if content > room {
                            self.pending_truncated = true;
                        }
                        self.pending.extend_from_slice(&chunk[..content.min(room)]);
                        reader.consume(take);
                        Ok(Some((take, complete)))
                    }
                }
            };

            match step {
                Ok(None) => return None,
                Ok(Some((take, complete))) => {
                    self.offset += take as u64;
                    if complete {
                        return Some(self.finish_line());
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "failed to read log file, will reopen"
                    );
                    self.reader = None;
                    self.identity = None;
                    return None;
                }
            }
        }
    }

    /// 보류 중인 라인을 완성된 `RawLine`으로 만듭니다.
    fn finish_line(&mut self) -> RawLine {
        let mut data = std::mem::take(&mut self.pending);
        if data.last() == Some(&b'\r') {
            data.pop();
        }
        let truncated = std::mem::take(&mut self.pending_truncated);
        let seq = self.next_seq;
        self.next_seq += 1;

        if truncated {
            tracing::warn!(
                path = %self.path.display(),
                seq,
                max_line_length = self.max_line_length,
                "line exceeded max length and was truncated"
            );
            metrics::counter!(m::FOLLOWER_LINES_TRUNCATED_TOTAL).increment(1);
        }
        metrics::counter!(m::FOLLOWER_LINES_READ_TOTAL).increment(1);

        RawLine::new(Bytes::from(data), seq).with_truncated(truncated)
    }

    /// 경로가 가리키는 파일이 바뀌었는지 확인하고, 바뀌었으면 다시 엽니다.
    async fn check_rotation(&mut self) {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => {
                self.missing_reported = false;
                meta
            }
            Err(e) => {
                if !self.missing_reported {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "log file unavailable, waiting for it to reappear"
                    );
                    self.missing_reported = true;
                }
                return;
            }
        };

        let current = FileIdentity::of(&meta);
        let reason = match self.identity {
            None => "reappeared",
            Some(identity) if identity != current => "replaced",
            Some(_) if meta.len() < self.offset => "truncated",
            Some(_) => return,
        };

        self.reopen(reason).await;
    }

    /// 파일을 다시 열어 끝에서부터 읽도록 합니다.
    async fn reopen(&mut self, reason: &'static str) {
        if !self.pending.is_empty() {
            tracing::debug!(
                path = %self.path.display(),
                bytes = self.pending.len(),
                "discarding incomplete line from previous file"
            );
            self.pending.clear();
            self.pending_truncated = false;
        }

        match open_file(&self.path, StartPosition::End).await {
            Ok(opened) => {
                tracing::info!(
                    path = %self.path.display(),
                    reason,
                    offset = opened.offset,
                    "log file rotated, resuming from end"
                );
                metrics::counter!(m::FOLLOWER_ROTATIONS_TOTAL).increment(1);
                self.reader = Some(opened.reader);
                self.identity = Some(opened.identity);
                self.offset = opened.offset;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    reason,
                    error = %e,
                    "failed to reopen log file, will retry"
                );
                self.reader = None;
                self.identity = None;
            }
        }
    }
}

impl LineSource for LogFollower {
    async fn next_line(&mut self) -> Option<RawLine> {
        Some(self.read_next().await)
    }
}
