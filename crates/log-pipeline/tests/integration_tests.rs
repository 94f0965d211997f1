//! 통합 테스트 -- 파이프라인 전체 흐름 검증
//!
//! 실제 로그 파일을 추적하며 CIDR 파일 저장소에 기록되는 과정을 검증합니다.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sshwarden_allowlist::{Allowlist, CidrFileStore};
use sshwarden_core::error::SinkError;
use sshwarden_log_pipeline::{
    LogFollower, LogPipelineError, LoginPipelineBuilder, PipelineConfigBuilder, StartPosition,
};

fn append(path: &Path, data: &str) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("should open log for append");
    file.write_all(data.as_bytes())
        .expect("should append to log");
}

fn accepted(user: &str, address: &str) -> String {
    format!(
        "Sep 21 14:52:13 beast sshd[31281]: Accepted publickey for {user} from {address} port 43970 ssh2: RSA SHA256:abc\n"
    )
}

async fn follow(path: &Path) -> LogFollower {
    let config = PipelineConfigBuilder::new()
        .log_file(path)
        .poll_interval_ms(10)
        .start_at(StartPosition::End)
        .build()
        .expect("config should be valid");
    LogFollower::open(&config)
        .await
        .expect("log file should open")
}

async fn wait_for_entries(store: &CidrFileStore, count: usize) -> Allowlist {
    for _ in 0..500 {
        if let Ok(list) = store.load() {
            if list.len() >= count {
                return list;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("allowlist never reached {count} entries");
}

#[tokio::test]
async fn test_logins_are_recorded_in_log_order() {
    // Given: 빈 로그 파일을 끝에서부터 추적하는 파이프라인
    let dir = tempfile::tempdir().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    append(&log, "");
    let store = CidrFileStore::new(dir.path().join("ssh.cidrs"));

    let mut pipeline = LoginPipelineBuilder::new()
        .source(follow(&log).await)
        .sink(Arc::new(store.clone()))
        .build()
        .expect("pipeline should build");
    let task = tokio::spawn(async move { pipeline.run().await });

    // When: 로그인 라인 사이에 잡음이 섞여 추가됨
    let addresses = ["192.0.2.5", "198.51.100.2", "203.0.113.9", "192.0.2.1"];
    let mut content = String::new();
    for (i, address) in addresses.iter().enumerate() {
        content.push_str(&accepted(&format!("user{i}"), address));
        content.push_str("Sep 21 14:52:14 beast sshd[31282]: Received disconnect from 10.0.0.1\n");
    }
    append(&log, &content);

    // Then: 로그 순서대로 기록됨
    let list = wait_for_entries(&store, addresses.len()).await;
    let recorded: Vec<String> = list.entries().map(|e| e.cidr.addr().to_string()).collect();
    assert_eq!(recorded, addresses);
    assert!(list.entries().all(|e| e.comment.starts_with("SSH: user")));

    task.abort();
}

#[tokio::test]
async fn test_failed_logins_never_touch_the_allowlist() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    append(&log, "");
    let store = CidrFileStore::new(dir.path().join("ssh.cidrs"));

    let mut pipeline = LoginPipelineBuilder::new()
        .source(follow(&log).await)
        .sink(Arc::new(store.clone()))
        .build()
        .expect("pipeline should build");
    let task = tokio::spawn(async move { pipeline.run().await });

    append(
        &log,
        "Sep 21 14:52:13 beast sshd[31281]: Failed password for root from 198.51.100.9 port 22 ssh2\n",
    );
    append(&log, &accepted("alice", "203.0.113.7"));

    let list = wait_for_entries(&store, 1).await;
    assert_eq!(list.len(), 1);
    assert_eq!(
        list.entries().next().expect("one entry").cidr.to_string(),
        "203.0.113.7/32"
    );

    task.abort();
}

#[tokio::test]
async fn test_rotation_mid_run_keeps_recording() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    append(&log, "");
    let store = CidrFileStore::new(dir.path().join("ssh.cidrs"));

    let mut pipeline = LoginPipelineBuilder::new()
        .source(follow(&log).await)
        .sink(Arc::new(store.clone()))
        .build()
        .expect("pipeline should build");
    let task = tokio::spawn(async move { pipeline.run().await });

    append(&log, &accepted("alice", "203.0.113.7"));
    wait_for_entries(&store, 1).await;

    // logrotate: rename + 새 빈 파일
    std::fs::rename(&log, dir.path().join("auth.log.1")).expect("should rotate");
    append(&log, "");
    tokio::time::sleep(Duration::from_millis(200)).await;

    append(&log, &accepted("bob", "198.51.100.20"));
    let list = wait_for_entries(&store, 2).await;
    assert_eq!(list.len(), 2);

    task.abort();
}

#[tokio::test]
async fn test_repeated_login_updates_single_entry() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    append(&log, "");
    let store = CidrFileStore::new(dir.path().join("ssh.cidrs"));

    let mut pipeline = LoginPipelineBuilder::new()
        .source(follow(&log).await)
        .sink(Arc::new(store.clone()))
        .build()
        .expect("pipeline should build");
    let task = tokio::spawn(async move { pipeline.run().await });

    append(&log, &accepted("alice", "203.0.113.7"));
    append(&log, &accepted("bob", "203.0.113.7"));
    append(&log, &accepted("carol", "192.0.2.8"));

    // carol의 기록은 bob 이후에만 일어남
    let list = wait_for_entries(&store, 2).await;
    let shared = list
        .entries()
        .find(|e| e.cidr.to_string() == "203.0.113.7/32")
        .expect("shared address should be present");
    assert!(shared.comment.starts_with("SSH: bob @ "));

    task.abort();
}

#[tokio::test]
async fn test_sink_failure_stops_pipeline() {
    // Given: 손상된 허용 목록 파일
    let dir = tempfile::tempdir().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    append(&log, "");
    let list_path = dir.path().join("ssh.cidrs");
    std::fs::write(&list_path, "this is not a cidr\n").expect("should write list");

    let mut pipeline = LoginPipelineBuilder::new()
        .source(follow(&log).await)
        .sink(Arc::new(CidrFileStore::new(&list_path)))
        .build()
        .expect("pipeline should build");
    let task = tokio::spawn(async move { pipeline.run().await });

    // When
    append(&log, &accepted("alice", "203.0.113.7"));

    // Then: 파이프라인이 Sink 에러로 끝나고 파일은 그대로
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("pipeline should stop")
        .expect("task should not panic");
    let err = result.expect_err("sink failure should be fatal");
    assert!(matches!(
        err,
        LogPipelineError::Sink {
            source: SinkError::Malformed { line: 1, .. },
            ..
        }
    ));
    assert_eq!(
        std::fs::read_to_string(&list_path).expect("list should exist"),
        "this is not a cidr\n"
    );
}

#[tokio::test]
async fn test_hostname_address_is_fatal() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let log = dir.path().join("auth.log");
    append(&log, "");

    let mut pipeline = LoginPipelineBuilder::new()
        .source(follow(&log).await)
        .sink(Arc::new(CidrFileStore::new(dir.path().join("ssh.cidrs"))))
        .build()
        .expect("pipeline should build");
    let task = tokio::spawn(async move { pipeline.run().await });

    append(&log, &accepted("alice", "gateway.example.net"));

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("pipeline should stop")
        .expect("task should not panic");
    assert!(matches!(
        result,
        Err(LogPipelineError::Sink {
            source: SinkError::InvalidAddress(_),
            ..
        })
    ));
}
