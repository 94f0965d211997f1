//! 도메인 타입 — 크레이트 간에 공유되는 공통 타입
//!
//! 추출기가 생성하고 파이프라인이 싱크로 전달하는 로그인 이벤트를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SSH 인증 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// 공개키 인증
    PublicKey,
    /// 비밀번호 인증
    Password,
}

impl AuthMethod {
    /// sshd 로그에 기록되는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublicKey => "publickey",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publickey" => Ok(Self::PublicKey),
            "password" => Ok(Self::Password),
            other => Err(format!("unknown auth method: {other}")),
        }
    }
}

/// 성공한 SSH 로그인 이벤트
///
/// 로그 라인이 로그인 패턴에 매칭될 때만 생성되며, 생성 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    /// 로그인한 사용자명
    pub user: String,
    /// 접속 출발지 주소 (sshd가 기록한 그대로)
    pub address: String,
    /// 인증 방식
    pub method: AuthMethod,
    /// 이벤트를 관측한 시각
    pub observed_at: DateTime<Utc>,
}

impl LoginEvent {
    /// 새 이벤트를 생성합니다. 관측 시각은 현재 시각입니다.
    pub fn new(user: impl Into<String>, address: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            user: user.into(),
            address: address.into(),
            method,
            observed_at: Utc::now(),
        }
    }

    /// 허용 목록 엔트리에 남길 주석을 생성합니다.
    ///
    /// 형식: `SSH: <user> @ <RFC 2822 시각>`
    pub fn allowlist_comment(&self) -> String {
        format!("SSH: {} @ {}", self.user, self.observed_at.to_rfc2822())
    }
}

impl fmt::Display for LoginEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.user, self.address, self.method)
    }
}
