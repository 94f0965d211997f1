//! 설정 관리 — sshwarden.toml 파싱 및 런타임 설정
//!
//! [`SshwardenConfig`]는 모든 구성요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬이 적용)
//! 2. 환경변수 (`SSHWARDEN_WATCH_LOG_FILE=/var/log/auth.log` 형식)
//! 3. 설정 파일 (`sshwarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! 로그 파일과 허용 목록 경로는 기본값이 없는 필수 값이므로, 모든 오버라이드를
//! 적용한 뒤 [`SshwardenConfig::validate`]를 호출해야 합니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sshwarden_core::error::SshwardenError> {
//! use sshwarden_core::config::SshwardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let mut config = SshwardenConfig::load("sshwarden.toml").await?;
//! config.general.verbose = true;
//! config.validate()?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SshwardenConfig::parse("[watch]\nlog_file = \"/var/log/auth.log\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SshwardenError};

/// sshwarden 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshwardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 감시 설정
    #[serde(default)]
    pub watch: WatchConfig,
    /// 허용 목록 설정
    #[serde(default)]
    pub allowlist: AllowlistConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SshwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 검증은 하지 않습니다. CLI 오버라이드까지 적용한 뒤 `validate()`를 호출하세요.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SshwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SshwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SshwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SshwardenError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SshwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            SshwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SSHWARDEN_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SSHWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SSHWARDEN_GENERAL_LOG_FORMAT");
        override_bool(&mut self.general.verbose, "SSHWARDEN_GENERAL_VERBOSE");

        // Watch
        override_string(&mut self.watch.log_file, "SSHWARDEN_WATCH_LOG_FILE");
        override_bool(
            &mut self.watch.from_beginning,
            "SSHWARDEN_WATCH_FROM_BEGINNING",
        );
        override_u64(
            &mut self.watch.poll_interval_ms,
            "SSHWARDEN_WATCH_POLL_INTERVAL_MS",
        );
        override_usize(
            &mut self.watch.max_line_length,
            "SSHWARDEN_WATCH_MAX_LINE_LENGTH",
        );

        // Allowlist
        override_string(&mut self.allowlist.path, "SSHWARDEN_ALLOWLIST_PATH");
        override_u64(
            &mut self.allowlist.lock_timeout_ms,
            "SSHWARDEN_ALLOWLIST_LOCK_TIMEOUT_MS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "SSHWARDEN_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "SSHWARDEN_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "SSHWARDEN_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SshwardenError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000;
        const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

        // 필수 경로
        if self.watch.log_file.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                field: "watch.log_file".to_owned(),
            }
            .into());
        }
        if self.allowlist.path.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                field: "allowlist.path".to_owned(),
            }
            .into());
        }
        if self.watch.log_file == self.allowlist.path {
            return Err(ConfigError::InvalidValue {
                field: "allowlist.path".to_owned(),
                reason: "must differ from watch.log_file".to_owned(),
            }
            .into());
        }

        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.watch.poll_interval_ms == 0 || self.watch.poll_interval_ms > MAX_POLL_INTERVAL_MS
        {
            return Err(ConfigError::InvalidValue {
                field: "watch.poll_interval_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_POLL_INTERVAL_MS),
            }
            .into());
        }

        if self.watch.max_line_length == 0 || self.watch.max_line_length > MAX_LINE_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "watch.max_line_length".to_owned(),
                reason: format!("must be 1-{}", MAX_LINE_LENGTH),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "must be greater than 0 when metrics are enabled".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 매칭되지 않은 라인과 기록된 이벤트를 진단 로그로 남길지 여부
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            verbose: false,
        }
    }
}

/// 로그 감시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// 감시할 인증 로그 파일 (필수)
    pub log_file: String,
    /// 기존 내용을 처음부터 읽을지 여부 (기본: 끝에서부터)
    pub from_beginning: bool,
    /// 새 데이터가 없을 때 파일 상태를 다시 확인하는 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 최대 라인 길이 (바이트), 초과분은 버림
    pub max_line_length: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            log_file: String::new(),
            from_beginning: false,
            poll_interval_ms: 250,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 허용 목록 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowlistConfig {
    /// 허용 목록(CIDR 목록) 파일 경로 (필수)
    pub path: String,
    /// 다른 프로세스가 잠금을 쥐고 있을 때 기다리는 최대 시간 (밀리초)
    pub lock_timeout_ms: u64,
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            lock_timeout_ms: 5_000,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9105,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
