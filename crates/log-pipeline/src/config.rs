//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`SshwardenConfig`](sshwarden_core::config::SshwardenConfig)
//! 에서 로그 추적과 추출에 필요한 값만 골라 만듭니다.
//!
//! # 사용 예시
//! ```ignore
//! use sshwarden_core::config::SshwardenConfig;
//! use sshwarden_log_pipeline::config::PipelineConfig;
//!
//! let core_config = SshwardenConfig::load("sshwarden.toml").await?;
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use sshwarden_core::config::SshwardenConfig;

use crate::error::LogPipelineError;

/// 로그 파일을 처음 열 때 읽기 시작할 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartPosition {
    /// 파일 끝 -- 시작 이후 추가된 라인만 전달 (기본값)
    #[default]
    End,
    /// 파일 처음 -- 기존 내용을 모두 재생한 뒤 추적
    Beginning,
}

/// 로그 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 추적할 로그 파일
    pub log_file: PathBuf,
    /// 읽기 시작 위치
    pub start_at: StartPosition,
    /// 새 데이터가 없을 때 대기 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 최대 라인 길이 (바이트). 초과분은 버립니다.
    pub max_line_length: usize,
    /// 매칭 실패/기록 성공 진단 출력 여부
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/var/log/auth.log"),
            start_at: StartPosition::End,
            poll_interval_ms: 250,
            max_line_length: 64 * 1024, // 64KB
            verbose: false,
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &SshwardenConfig) -> Self {
        Self {
            log_file: PathBuf::from(&core.watch.log_file),
            start_at: if core.watch.from_beginning {
                StartPosition::Beginning
            } else {
                StartPosition::End
            },
            poll_interval_ms: core.watch.poll_interval_ms,
            max_line_length: core.watch.max_line_length,
            verbose: core.general.verbose,
        }
    }

    /// 폴링 간격
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.log_file.as_os_str().is_empty() {
            return Err(LogPipelineError::Config {
                field: "log_file".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(LogPipelineError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_line_length == 0 {
            return Err(LogPipelineError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 추적할 로그 파일을 설정합니다.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = path.into();
        self
    }

    /// 읽기 시작 위치를 설정합니다.
    pub fn start_at(mut self, start_at: StartPosition) -> Self {
        self.config.start_at = start_at;
        self
    }

    /// 폴링 간격(밀리초)을 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.config.max_line_length = len;
        self
    }

    /// verbose 진단 출력 여부를 설정합니다.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
