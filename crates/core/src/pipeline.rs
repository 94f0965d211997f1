//! 파이프라인 trait — 구성요소 확장 포인트 정의

use crate::error::SinkError;
use crate::types::LoginEvent;

/// 로그 라인에서 로그인 이벤트를 추출하는 trait
///
/// 새로운 로그인 패턴을 지원하려면 이 trait을 구현합니다.
/// 구현체는 I/O나 부수 효과가 없어야 합니다.
pub trait EventExtractor: Send + Sync {
    /// 추출기 이름
    fn name(&self) -> &str;

    /// 한 줄을 분류합니다. 매칭되지 않으면 `None`을 반환합니다.
    fn extract(&self, line: &str) -> Option<LoginEvent>;
}

/// 허용 목록 저장소 trait
///
/// 같은 주소로 반복 호출해도 엔트리가 중복되지 않아야 하며(주석만 갱신),
/// 다른 프로세스가 같은 저장소를 동시에 읽고 쓰는 상황에서도 안전해야 합니다.
/// 실패 시 내부에서 재시도하지 않고 에러를 그대로 반환합니다.
pub trait AllowlistSink: Send + Sync {
    /// 싱크 이름 (진단 메시지용)
    fn name(&self) -> &str;

    /// 주소를 허용 목록에 기록합니다.
    fn record(&self, address: &str, comment: &str) -> Result<(), SinkError>;
}
