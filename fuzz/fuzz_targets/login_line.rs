#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use sshwarden_core::pipeline::EventExtractor;
use sshwarden_log_pipeline::parser::SshdLoginExtractor;

/// 퍼저용 구조적 로그인 라인
#[derive(Arbitrary, Debug)]
struct FuzzLogin {
    user: String,
    address: String,
    host: String,
    pid: u32,
    password: bool,
    suffix: String,
}

/// 공백이 없고 비어 있지 않은 토큰만 sshd가 기록할 수 있음
fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

fuzz_target!(|input: FuzzLogin| {
    if !is_token(&input.user) || !is_token(&input.address) || !is_token(&input.host) {
        return;
    }
    if input.suffix.contains('\n') {
        return;
    }
    let Ok(extractor) = SshdLoginExtractor::new() else {
        return;
    };

    let method = if input.password { "password" } else { "publickey" };
    let line = format!(
        "Sep 21 14:52:13 {} sshd[{}]: Accepted {} for {} from {} {}",
        input.host, input.pid, method, input.user, input.address, input.suffix
    );

    let event = extractor
        .extract(&line)
        .expect("well-formed login line must match");
    assert_eq!(event.user, input.user);
    assert_eq!(event.address, input.address);
    assert_eq!(event.method.as_str(), method);
});
