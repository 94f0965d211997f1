//! 로그인 이벤트 추출 모듈
//!
//! 각 추출기는 core의 [`EventExtractor`](sshwarden_core::pipeline::EventExtractor)
//! trait을 구현하며, 라인 하나를 받아 로그인 이벤트 또는 `None`을 반환합니다.
//!
//! # 지원 형식
//! - OpenSSH `sshd` 로그인 성공 라인 ([`SshdLoginExtractor`])
//!
//! # 사용 예시
//! ```ignore
//! use sshwarden_core::pipeline::EventExtractor;
//! use sshwarden_log_pipeline::parser::SshdLoginExtractor;
//!
//! let extractor = SshdLoginExtractor::new()?;
//! let event = extractor.extract(
//!     "Sep 21 14:52:13 beast sshd[31281]: Accepted publickey for alice from 203.0.113.7 port 43970 ssh2",
//! );
//! assert_eq!(event.unwrap().address, "203.0.113.7");
//! ```

pub mod sshd;

pub use sshd::SshdLoginExtractor;
