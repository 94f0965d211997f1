#![no_main]

use libfuzzer_sys::fuzz_target;
use sshwarden_core::pipeline::EventExtractor;
use sshwarden_log_pipeline::parser::SshdLoginExtractor;

fuzz_target!(|data: &[u8]| {
    let Ok(extractor) = SshdLoginExtractor::new() else {
        return;
    };
    let line = String::from_utf8_lossy(data);
    if let Some(event) = extractor.extract(&line) {
        // 캡처된 토큰은 공백을 포함하지 않음
        assert!(!event.user.is_empty());
        assert!(!event.address.chars().any(char::is_whitespace));
    }
});
