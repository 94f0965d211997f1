//! 허용 목록 에러 타입
//!
//! [`AllowlistError`]는 CIDR 파일 저장소에서 발생하는 모든 에러를 표현합니다.
//! `From<AllowlistError> for SinkError` 변환이 구현되어 있어
//! [`AllowlistSink`](sshwarden_core::pipeline::AllowlistSink) 구현에서 `?`로 전파할 수 있습니다.

use sshwarden_core::error::SinkError;

/// 허용 목록 한 줄의 형식 오류
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct LineError {
    /// 1부터 시작하는 라인 번호
    pub line: usize,
    /// 실패 사유
    pub reason: String,
}

/// 허용 목록 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    /// IP 또는 CIDR로 해석할 수 없는 주소
    #[error("invalid address '{0}': not an IP address or CIDR")]
    InvalidAddress(String),

    /// 기존 파일 내용이 손상됨
    #[error("malformed allowlist {path}: {source}")]
    Malformed {
        /// 허용 목록 파일 경로
        path: String,
        /// 문제가 된 라인
        #[source]
        source: LineError,
    },

    /// 제한 시간 안에 잠금을 얻지 못함
    #[error("could not lock {path} within {waited_ms}ms")]
    LockTimeout {
        /// 잠금 파일 경로
        path: String,
        /// 기다린 시간 (밀리초)
        waited_ms: u64,
    },

    /// 파일 I/O 실패
    #[error("io error on {path}: {source}")]
    Io {
        /// 대상 파일 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },
}

impl AllowlistError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<AllowlistError> for SinkError {
    fn from(err: AllowlistError) -> Self {
        match err {
            AllowlistError::InvalidAddress(addr) => SinkError::InvalidAddress(addr),
            AllowlistError::Malformed { path, source } => SinkError::Malformed {
                path,
                line: source.line,
                reason: source.reason,
            },
            AllowlistError::LockTimeout { path, waited_ms } => SinkError::Contention {
                path,
                reason: format!("lock not acquired within {waited_ms}ms"),
            },
            AllowlistError::Io { path, source } => SinkError::Io { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_includes_line() {
        let err = AllowlistError::Malformed {
            path: "/tmp/ssh.cidrs".to_owned(),
            source: LineError {
                line: 3,
                reason: "invalid CIDR 'nope'".to_owned(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/ssh.cidrs"));
        assert!(msg.contains("line 3"));
    }

    #[test]
    fn lock_timeout_maps_to_contention() {
        let err = AllowlistError::LockTimeout {
            path: "/tmp/ssh.cidrs.lock".to_owned(),
            waited_ms: 50,
        };
        let sink: SinkError = err.into();
        assert!(matches!(sink, SinkError::Contention { .. }));
    }

    #[test]
    fn io_maps_with_original_error_kind() {
        let err = AllowlistError::Io {
            path: "/tmp/ssh.cidrs".to_owned(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        match SinkError::from(err) {
            SinkError::Io { path, source } => {
                assert_eq!(path, "/tmp/ssh.cidrs");
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn malformed_maps_line_number() {
        let err = AllowlistError::Malformed {
            path: "x".to_owned(),
            source: LineError {
                line: 9,
                reason: "bad".to_owned(),
            },
        };
        match SinkError::from(err) {
            SinkError::Malformed { line, .. } => assert_eq!(line, 9),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
