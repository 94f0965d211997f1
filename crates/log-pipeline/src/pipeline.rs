//! 파이프라인 오케스트레이션 -- 추적/추출/기록의 전체 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! LineSource --next_line--> EventExtractor --LoginEvent--> spawn_blocking(AllowlistSink::record)
//! ```
//!
//! 라인 하나를 끝까지 처리한 뒤에 다음 라인을 읽습니다. 따라서 이벤트는 로그 순서대로
//! 기록되며, 싱크 호출 동안에는 새 라인을 읽지 않습니다.
//!
//! # 실패 정책
//! - 매칭되지 않는 라인: 에러가 아님 (verbose일 때만 진단 출력)
//! - 최대 길이로 잘린 라인: 추출하지 않고 경고 후 건너뜀
//! - 싱크 기록 실패: 치명적, [`LogPipelineError::Sink`]로 즉시 중단

use std::sync::Arc;

use sshwarden_core::metrics as m;
use sshwarden_core::pipeline::{AllowlistSink, EventExtractor};
use sshwarden_core::types::LoginEvent;

use crate::collector::{LineSource, RawLine};
use crate::error::LogPipelineError;
use crate::parser::SshdLoginExtractor;

/// 파이프라인 처리 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// 읽은 라인 수
    pub lines: u64,
    /// 추출된 로그인 이벤트 수
    pub events: u64,
    /// 허용 목록에 기록된 주소 수
    pub recorded: u64,
    /// 매칭되지 않은 라인 수
    pub unmatched: u64,
}

/// 로그인 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use sshwarden_log_pipeline::{LoginPipelineBuilder, LogFollower};
///
/// let follower = LogFollower::open(&config).await?;
/// let mut pipeline = LoginPipelineBuilder::new()
///     .source(follower)
///     .sink(Arc::new(store))
///     .verbose(true)
///     .build()?;
///
/// // 파일 추적기는 끝나지 않으므로 싱크 실패 시에만 반환됩니다.
/// pipeline.run().await?;
/// ```
pub struct LoginPipeline<S: LineSource> {
    /// 라인 소스
    source: S,
    /// 이벤트 추출기
    extractor: Box<dyn EventExtractor>,
    /// 허용 목록 싱크
    sink: Arc<dyn AllowlistSink>,
    /// 진단 출력 여부
    verbose: bool,
    /// 처리 통계
    stats: PipelineStats,
}

impl<S: LineSource> LoginPipeline<S> {
    /// 소스가 끝나거나 치명적 에러가 날 때까지 라인을 처리합니다.
    ///
    /// 소스가 끝나면 누적 통계를 반환합니다.
    pub async fn run(&mut self) -> Result<PipelineStats, LogPipelineError> {
        tracing::info!(
            extractor = self.extractor.name(),
            sink = self.sink.name(),
            verbose = self.verbose,
            "login pipeline started"
        );

        while let Some(line) = self.source.next_line().await {
            self.process_line(&line).await?;
        }

        tracing::info!(stats = ?self.stats, "line source exhausted, pipeline finished");
        Ok(self.stats.clone())
    }

    /// 라인 하나를 처리합니다. 기록된 이벤트가 있으면 반환합니다.
    pub async fn process_line(
        &mut self,
        line: &RawLine,
    ) -> Result<Option<LoginEvent>, LogPipelineError> {
        self.stats.lines += 1;
        let text = line.text();

        // 잘린 라인의 주소 토큰은 원래 주소의 접두어일 수 있음
        if line.truncated {
            self.stats.unmatched += 1;
            metrics::counter!(m::EXTRACTOR_UNMATCHED_TOTAL).increment(1);
            tracing::warn!(
                seq = line.seq,
                length = line.data.len(),
                "skipping truncated line"
            );
            return Ok(None);
        }

        let Some(mut event) = self.extractor.extract(&text) else {
            self.stats.unmatched += 1;
            metrics::counter!(m::EXTRACTOR_UNMATCHED_TOTAL).increment(1);
            if self.verbose {
                tracing::debug!(seq = line.seq, line = %text, "line did not match");
            }
            return Ok(None);
        };

        event.observed_at = line.received_at.into();
        self.stats.events += 1;
        metrics::counter!(m::EXTRACTOR_EVENTS_TOTAL, m::LABEL_METHOD => event.method.as_str())
            .increment(1);

        self.record(&event).await?;
        self.stats.recorded += 1;

        if self.verbose {
            tracing::info!(
                seq = line.seq,
                user = %event.user,
                address = %event.address,
                method = %event.method,
                "recorded login address"
            );
        } else {
            tracing::debug!(user = %event.user, address = %event.address, "recorded login address");
        }

        Ok(Some(event))
    }

    /// 싱크 호출은 파일 잠금과 fsync로 블로킹되므로 블로킹 풀에서 실행합니다.
    async fn record(&self, event: &LoginEvent) -> Result<(), LogPipelineError> {
        let sink = Arc::clone(&self.sink);
        let address = event.address.clone();
        let comment = event.allowlist_comment();

        let result = tokio::task::spawn_blocking(move || sink.record(&address, &comment))
            .await
            .map_err(|e| LogPipelineError::Task(e.to_string()))?;

        result.map_err(|source| {
            tracing::error!(
                user = %event.user,
                address = %event.address,
                sink = self.sink.name(),
                error = %source,
                "failed to record login address"
            );
            LogPipelineError::Sink {
                address: event.address.clone(),
                user: event.user.clone(),
                source,
            }
        })
    }

    /// 현재까지의 처리 통계
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// 라인 소스에 접근합니다.
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// 파이프라인 빌더
pub struct LoginPipelineBuilder<S: LineSource> {
    source: Option<S>,
    extractor: Option<Box<dyn EventExtractor>>,
    sink: Option<Arc<dyn AllowlistSink>>,
    verbose: bool,
}

impl<S: LineSource> LoginPipelineBuilder<S> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            source: None,
            extractor: None,
            sink: None,
            verbose: false,
        }
    }

    /// 라인 소스를 설정합니다.
    pub fn source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// 이벤트 추출기를 설정합니다. 생략하면 [`SshdLoginExtractor`]를 사용합니다.
    pub fn extractor(mut self, extractor: Box<dyn EventExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// 허용 목록 싱크를 설정합니다.
    pub fn sink(mut self, sink: Arc<dyn AllowlistSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 진단 출력 여부를 설정합니다.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 파이프라인을 생성합니다.
    ///
    /// # Errors
    ///
    /// 소스나 싱크가 설정되지 않았으면 `LogPipelineError::Config`를 반환합니다.
    pub fn build(self) -> Result<LoginPipeline<S>, LogPipelineError> {
        let source = self.source.ok_or_else(|| LogPipelineError::Config {
            field: "source".to_owned(),
            reason: "a line source is required".to_owned(),
        })?;
        let sink = self.sink.ok_or_else(|| LogPipelineError::Config {
            field: "sink".to_owned(),
            reason: "an allowlist sink is required".to_owned(),
        })?;
        let extractor = match self.extractor {
            Some(extractor) => extractor,
            None => Box::new(SshdLoginExtractor::new()?.with_verbose(self.verbose)),
        };

        Ok(LoginPipeline {
            source,
            extractor,
            sink,
            verbose: self.verbose,
            stats: PipelineStats::default(),
        })
    }
}

impl<S: LineSource> Default for LoginPipelineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use sshwarden_core::error::SinkError;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl AllowlistSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn record(&self, address: &str, comment: &str) -> Result<(), SinkError> {
            self.calls
                .lock()
                .unwrap()
                .push((address.to_owned(), comment.to_owned()));
            Ok(())
        }
    }

    struct FailingSink;

    impl AllowlistSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn record(&self, address: &str, _comment: &str) -> Result<(), SinkError> {
            Err(SinkError::InvalidAddress(address.to_owned()))
        }
    }

    fn source_of(lines: &[&str]) -> mpsc::Receiver<RawLine> {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for (seq, line) in lines.iter().enumerate() {
            tx.try_send(RawLine::new(line.as_bytes().to_vec(), seq as u64))
                .unwrap();
        }
        rx
    }

    const ACCEPTED: &str = "Sep 21 14:52:13 beast sshd[31281]: Accepted publickey for alice from 203.0.113.7 port 43970 ssh2: RSA ab:cd";
    const FAILED: &str =
        "Sep 21 14:52:13 beast sshd[31281]: Failed password for root from 198.51.100.9 port 22 ssh2";

    #[tokio::test]
    async fn accepted_line_is_recorded_with_comment() {
        let sink = Arc::new(RecordingSink::default());
        let mut pipeline = LoginPipelineBuilder::new()
            .source(source_of(&[ACCEPTED]))
            .sink(sink.clone())
            .build()
            .unwrap();

        let stats = pipeline.run().await.unwrap();
        assert_eq!(stats.recorded, 1);

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "203.0.113.7");
        assert!(calls[0].1.starts_with("SSH: alice @ "));
    }

    #[tokio::test]
    async fn failed_line_never_reaches_sink() {
        let sink = Arc::new(RecordingSink::default());
        let mut pipeline = LoginPipelineBuilder::new()
            .source(source_of(&[FAILED, "", "random noise"]))
            .sink(sink.clone())
            .verbose(true)
            .build()
            .unwrap();

        let stats = pipeline.run().await.unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.unmatched, 3);
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_halts_pipeline() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(RawLine::new(ACCEPTED, 0)).await.unwrap();
        tx.send(RawLine::new(ACCEPTED, 1)).await.unwrap();

        let mut pipeline = LoginPipelineBuilder::new()
            .source(rx)
            .sink(Arc::new(FailingSink))
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(
            err,
            LogPipelineError::Sink {
                source: SinkError::InvalidAddress(_),
                ..
            }
        ));
        // 두 번째 라인은 읽지 않음
        assert_eq!(pipeline.stats().lines, 1);
        assert_eq!(pipeline.stats().recorded, 0);
    }

    #[tokio::test]
    async fn process_line_returns_event() {
        let mut pipeline = LoginPipelineBuilder::new()
            .source(source_of(&[]))
            .sink(Arc::new(RecordingSink::default()))
            .build()
            .unwrap();

        let event = pipeline
            .process_line(&RawLine::new(ACCEPTED, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.user, "alice");
        assert!(
            pipeline
                .process_line(&RawLine::new(FAILED, 1))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn truncated_login_line_is_skipped() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, rx) = mpsc::channel(2);
        tx.send(RawLine::new(&ACCEPTED.as_bytes()[..78], 0).with_truncated(true))
            .await
            .unwrap();
        tx.send(RawLine::new(ACCEPTED, 1)).await.unwrap();
        drop(tx);

        let mut pipeline = LoginPipelineBuilder::new()
            .source(rx)
            .sink(sink.clone())
            .build()
            .unwrap();

        let stats = pipeline.run().await.unwrap();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(stats.recorded, 1);

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "203.0.113.7");
    }

    #[tokio::test]
    async fn comment_uses_time_line_was_read() {
        let sink = Arc::new(RecordingSink::default());
        let mut pipeline = LoginPipelineBuilder::new()
            .source(source_of(&[]))
            .sink(sink.clone())
            .build()
            .unwrap();

        let mut line = RawLine::new(ACCEPTED, 0);
        line.received_at =
            std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_726_930_333);
        pipeline.process_line(&line).await.unwrap();

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls[0].1, "SSH: alice @ Sat, 21 Sep 2024 14:52:13 +0000");
    }

    #[test]
    fn builder_requires_sink() {
        let result = LoginPipelineBuilder::new().source(source_of(&[])).build();
        assert!(matches!(result, Err(LogPipelineError::Config { .. })));
    }

    #[test]
    fn builder_requires_source() {
        let result = LoginPipelineBuilder::<mpsc::Receiver<RawLine>>::new()
            .sink(Arc::new(RecordingSink::default()))
            .build();
        assert!(matches!(result, Err(LogPipelineError::Config { .. })));
    }
}
