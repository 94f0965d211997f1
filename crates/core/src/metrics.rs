//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()` 등을 호출합니다.
//! 레코더가 설치되지 않은 경우 매크로 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sshwarden_`
//! - 구성요소: `follower_`, `extractor_`, `allowlist_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), `_info` (gauge, 항상 1)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sshwarden_core::metrics::FOLLOWER_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 인증 방식 레이블 키 (publickey, password)
pub const LABEL_METHOD: &str = "method";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Line Source 메트릭 ────────────────────────────────────────────

/// Follower: 읽은 전체 라인 수 (counter)
pub const FOLLOWER_LINES_READ_TOTAL: &str = "sshwarden_follower_lines_read_total";

/// Follower: 감지된 로테이션/truncation 수 (counter)
pub const FOLLOWER_ROTATIONS_TOTAL: &str = "sshwarden_follower_rotations_total";

/// Follower: 최대 길이를 넘어 잘린 라인 수 (counter)
pub const FOLLOWER_LINES_TRUNCATED_TOTAL: &str = "sshwarden_follower_lines_truncated_total";

// ─── Extractor 메트릭 ──────────────────────────────────────────────

/// Extractor: 추출된 로그인 이벤트 수 (counter, label: method)
pub const EXTRACTOR_EVENTS_TOTAL: &str = "sshwarden_extractor_events_total";

/// Extractor: 패턴에 매칭되지 않은 라인 수 (counter)
pub const EXTRACTOR_UNMATCHED_TOTAL: &str = "sshwarden_extractor_unmatched_total";

// ─── Allowlist 메트릭 ──────────────────────────────────────────────

/// Allowlist: 기록 시도 수 (counter, label: result)
pub const ALLOWLIST_RECORDS_TOTAL: &str = "sshwarden_allowlist_records_total";

/// Allowlist: 기록 소요 시간 (histogram, 초)
pub const ALLOWLIST_RECORD_DURATION_SECONDS: &str = "sshwarden_allowlist_record_duration_seconds";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "sshwarden_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        FOLLOWER_LINES_READ_TOTAL,
        "Total number of complete lines read from the followed log file"
    );
    describe_counter!(
        FOLLOWER_ROTATIONS_TOTAL,
        "Total number of rotations or truncations detected on the followed log file"
    );
    describe_counter!(
        FOLLOWER_LINES_TRUNCATED_TOTAL,
        "Total number of lines cut at the maximum line length"
    );
    describe_counter!(
        EXTRACTOR_EVENTS_TOTAL,
        "Total number of accepted SSH logins extracted, by method"
    );
    describe_counter!(
        EXTRACTOR_UNMATCHED_TOTAL,
        "Total number of lines that did not match the login pattern"
    );
    describe_counter!(
        ALLOWLIST_RECORDS_TOTAL,
        "Total number of allowlist record attempts, by result"
    );
    describe_histogram!(
        ALLOWLIST_RECORD_DURATION_SECONDS,
        "Time to lock, merge and rewrite the allowlist in seconds"
    );
    describe_gauge!(DAEMON_BUILD_INFO, "Build information, value is always 1");
}
