#![no_main]

use libfuzzer_sys::fuzz_target;
use sshwarden_allowlist::Allowlist;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(list) = Allowlist::parse(content) else {
        return;
    };

    // 렌더링 결과는 다시 파싱되어야 하며, 두 번째 렌더링은 첫 번째와 같아야 함
    let rendered = list.render();
    let reparsed = Allowlist::parse(&rendered).expect("rendered allowlist must parse");
    assert_eq!(reparsed.render(), rendered);
    assert_eq!(reparsed.len(), list.len());
});
