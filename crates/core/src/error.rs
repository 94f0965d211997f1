//! 에러 타입 — 도메인별 에러 정의

/// sshwarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SshwardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 허용 목록 기록 에러
    #[error("allowlist error: {0}")]
    Sink(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 필수 값 누락
    #[error("missing required value '{field}'")]
    MissingValue { field: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 시작 시점에 로그 파일을 열 수 없음
    #[error("log source unavailable: {0}")]
    SourceUnavailable(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 치명적 오류로 파이프라인 중단
    #[error("pipeline halted: {0}")]
    Halted(String),
}

/// 허용 목록 기록 에러
///
/// [`AllowlistSink`](crate::pipeline::AllowlistSink) 구현체가 반환합니다.
/// 싱크 내부에서는 재시도하지 않으며, 파이프라인은 이 에러를 치명적으로 취급합니다.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 주소를 허용 목록 형식으로 표현할 수 없음
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// 기존 허용 목록 내용이 손상됨
    #[error("malformed allowlist {path} line {line}: {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },

    /// 다른 프로세스와의 경합(잠금 실패)
    #[error("allowlist {path} is locked: {reason}")]
    Contention { path: String, reason: String },

    /// 파일 읽기/쓰기 실패
    #[error("allowlist i/o failed on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
