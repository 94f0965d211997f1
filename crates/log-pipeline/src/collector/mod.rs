//! 로그 수집 모듈 -- 원시 로그 라인을 순서대로 공급합니다.
//!
//! # 수집 소스
//! - [`LogFollower`]: 로그 파일 추적 (`tail -F` 방식, 로테이션 감지)
//! - `mpsc::Receiver<RawLine>`: 채널로 라인을 밀어 넣는 소스 (테스트, 임베딩용)
//!
//! # 아키텍처
//! 파이프라인은 [`LineSource::next_line`]을 한 번에 하나씩 호출하는 pull 방식으로
//! 라인을 받습니다. 라인 하나가 끝까지 처리된 뒤에야 다음 라인을 읽습니다.

pub mod file;

pub use file::LogFollower;

use std::borrow::Cow;
use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

/// 수집된 원시 로그 라인
///
/// 줄바꿈(`\n`, `\r\n`)은 제거된 상태입니다.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// 원시 라인 바이트
    pub data: Bytes,
    /// 소스가 부여한 단조 증가 순번 (0부터)
    pub seq: u64,
    /// 수집 시각
    pub received_at: std::time::SystemTime,
    /// 최대 길이를 넘어 잘렸는지 여부
    pub truncated: bool,
}

impl RawLine {
    /// 새 RawLine을 생성합니다.
    pub fn new(data: impl Into<Bytes>, seq: u64) -> Self {
        Self {
            data: data.into(),
            seq,
            received_at: std::time::SystemTime::now(),
            truncated: false,
        }
    }

    /// 잘림 여부를 설정합니다.
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    /// 라인을 문자열로 봅니다. 잘못된 UTF-8은 U+FFFD로 대체됩니다.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// 라인 소스 trait
///
/// 구현체는 라인을 도착 순서대로 반환해야 하며, 새 데이터가 없으면
/// busy-wait 없이 대기해야 합니다.
pub trait LineSource: Send {
    /// 다음 라인을 반환합니다. 소스가 더 이상 라인을 만들 수 없으면 `None`입니다.
    ///
    /// 파일 추적기는 `None`을 반환하지 않습니다.
    fn next_line(&mut self) -> impl Future<Output = Option<RawLine>> + Send;
}

impl LineSource for mpsc::Receiver<RawLine> {
    async fn next_line(&mut self) -> Option<RawLine> {
        self.recv().await
    }
}
