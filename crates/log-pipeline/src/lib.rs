#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 로그 파일 추적 (로테이션/truncation 처리, 부분 라인 보류)
//! - [`parser`]: sshd 로그인 성공 라인 추출기
//! - [`pipeline`]: 추적 -> 추출 -> 기록 순차 실행과 실패 정책
//! - [`config`]: 파이프라인 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입

pub mod config;
pub mod error;
pub mod pipeline;

pub mod collector;
pub mod parser;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LoginPipeline, LoginPipelineBuilder, PipelineStats};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder, StartPosition};

// 에러
pub use error::LogPipelineError;

// 추출기
pub use parser::SshdLoginExtractor;

// 수집기
pub use collector::{LineSource, LogFollower, RawLine};
