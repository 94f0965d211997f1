#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`entry`]: CIDR 정규화와 목록 파일 문서 모델
//! - [`store`]: 잠금 + 원자적 교체로 기록하는 [`CidrFileStore`]
//! - [`error`]: 도메인 에러 타입
//!
//! Unix 전용입니다 (`flock(2)`, 파일 권한 비트).

pub mod entry;
pub mod error;
mod lock;
pub mod store;

pub use entry::{Allowlist, AllowlistEntry, Cidr, Upsert};
pub use error::{AllowlistError, LineError};
pub use store::CidrFileStore;
