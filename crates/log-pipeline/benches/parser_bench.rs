//! 로그인 추출기 벤치마크
//!
//! 매칭되는 라인과 매칭되지 않는 라인(실제 auth.log의 대부분)의 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sshwarden_core::pipeline::EventExtractor;
use sshwarden_log_pipeline::parser::SshdLoginExtractor;

/// 공개키 로그인 성공
const ACCEPTED_PUBLICKEY: &str = "Sep 21 14:52:13 beast sshd[31281]: Accepted publickey for alice from 203.0.113.7 port 43970 ssh2: RSA SHA256:Qm8bJ0Zb9v7rX3p5Y2kq1wZ4nT6uH8sL0cV2dF4gA1E";

/// RFC 3339 타임스탬프 + IPv6
const ACCEPTED_RFC3339: &str = "2024-09-21T14:52:13.123456+00:00 beast sshd-session[31281]: Accepted password for bob from 2001:db8::7 port 50022 ssh2";

/// 비밀번호 실패 (매칭 안 됨)
const FAILED_PASSWORD: &str =
    "Sep 21 14:52:13 beast sshd[31281]: Failed password for root from 198.51.100.9 port 22 ssh2";

/// sshd와 무관한 라인 (매칭 안 됨)
const CRON_SESSION: &str = "Sep 21 14:52:01 beast CRON[4100]: pam_unix(cron:session): session opened for user root(uid=0) by (uid=0)";

fn bench_extractor(c: &mut Criterion) {
    let extractor = SshdLoginExtractor::new().unwrap();

    let mut group = c.benchmark_group("sshd_login_extractor");
    group.throughput(Throughput::Elements(1));

    for (name, line) in [
        ("accepted_publickey", ACCEPTED_PUBLICKEY),
        ("accepted_rfc3339", ACCEPTED_RFC3339),
        ("failed_password", FAILED_PASSWORD),
        ("cron_session", CRON_SESSION),
    ] {
        group.bench_with_input(BenchmarkId::new("line", name), line, |b, line| {
            b.iter(|| extractor.extract(black_box(line)))
        });
    }

    group.finish();
}

fn bench_mixed_log(c: &mut Criterion) {
    let extractor = SshdLoginExtractor::new().unwrap();

    // 성공 1 : 실패 9 비율의 혼합 로그
    let mut lines = Vec::with_capacity(1000);
    for i in 0..1000 {
        lines.push(match i % 10 {
            0 => ACCEPTED_PUBLICKEY,
            1..=4 => FAILED_PASSWORD,
            _ => CRON_SESSION,
        });
    }

    let mut group = c.benchmark_group("mixed_log");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            lines
                .iter()
                .filter_map(|line| extractor.extract(black_box(line)))
                .count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_extractor, bench_mixed_log);
criterion_main!(benches);
