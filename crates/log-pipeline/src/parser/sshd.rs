//! OpenSSH 로그인 성공 라인 추출기
//!
//! # 매칭 형식
//! ```text
//! <TIMESTAMP> <HOST> <...sshd...>[<PID>]: Accepted <publickey|password> for <USER> from <ADDR> ...
//! ```
//!
//! - TIMESTAMP: BSD syslog(`Sep 21 14:52:13`) 또는 RFC 3339 토큰(`2024-09-21T14:52:13.123456+00:00`)
//! - 프로세스 태그는 `sshd`를 포함해야 합니다 (`sshd[1]:`, `sshd-session[1]:`).
//! - `from <ADDR>` 뒤의 내용(`port 43970 ssh2: RSA ...`)은 무시합니다.
//!
//! 주소 토큰은 sshd가 기록한 그대로 전달하며, 형식 검증은 싱크가 합니다.

use regex::Regex;

use sshwarden_core::pipeline::EventExtractor;
use sshwarden_core::types::{AuthMethod, LoginEvent};

use crate::error::LogPipelineError;

/// 로그인 성공 라인 패턴
const LOGIN_PATTERN: &str = concat!(
    r"^(?:\S+\s+\d{1,2}\s+\d{1,2}:\d{2}:\d{2}|\d{4}-\d{2}-\d{2}T\S+)",
    r"\s+\S+",
    r"\s+\S*sshd\S*\[\d+\]:",
    r"\s+Accepted\s+(?P<method>publickey|password)",
    r"\s+for\s+(?P<user>\S+)",
    r"\s+from\s+(?P<address>\S+)",
);

/// sshd 로그인 성공 라인 추출기
///
/// I/O가 없고 내부 상태를 바꾸지 않으므로 여러 태스크에서 공유할 수 있습니다.
#[derive(Debug, Clone)]
pub struct SshdLoginExtractor {
    /// 컴파일된 로그인 패턴
    pattern: Regex,
    /// 매칭 직전에 실패한 라인 진단 출력 여부
    verbose: bool,
}

impl SshdLoginExtractor {
    /// 기본 패턴으로 새 추출기를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        Ok(Self {
            pattern: Regex::new(LOGIN_PATTERN)?,
            verbose: false,
        })
    }

    /// verbose 진단 출력 여부를 설정합니다.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl EventExtractor for SshdLoginExtractor {
    fn name(&self) -> &str {
        "sshd-login"
    }

    fn extract(&self, line: &str) -> Option<LoginEvent> {
        let Some(caps) = self.pattern.captures(line) else {
            if self.verbose && line.contains("Accepted") && line.contains("sshd") {
                tracing::debug!(line, "sshd line mentions 'Accepted' but did not match");
            }
            return None;
        };

        let method: AuthMethod = caps["method"].parse().ok()?;
        Some(LoginEvent::new(&caps["user"], &caps["address"], method))
    }
}
