//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for SshwardenError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use sshwarden_core::error::{ConfigError, PipelineError, SinkError, SshwardenError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 시작 시점에 로그 파일을 열 수 없음
    #[error("cannot open log file {path}: {source}")]
    SourceUnavailable {
        /// 로그 파일 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 허용 목록 기록 실패 (치명적)
    #[error("failed to record {address} for user '{user}': {source}")]
    Sink {
        /// 기록하려던 주소
        address: String,
        /// 로그인한 사용자
        user: String,
        /// 싱크가 반환한 에러
        #[source]
        source: SinkError,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 블로킹 작업 태스크가 완료되지 못함
    #[error("blocking task failed: {0}")]
    Task(String),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogPipelineError> for SshwardenError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Sink { source, .. } => SshwardenError::Sink(source),
            LogPipelineError::SourceUnavailable { .. } => {
                SshwardenError::Pipeline(PipelineError::SourceUnavailable(err.to_string()))
            }
            LogPipelineError::Config { field, reason } => {
                SshwardenError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Regex(_) => {
                SshwardenError::Pipeline(PipelineError::InitFailed(err.to_string()))
            }
            LogPipelineError::Task(_) => {
                SshwardenError::Pipeline(PipelineError::Halted(err.to_string()))
            }
        }
    }
}
