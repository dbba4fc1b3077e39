//! Fixed user-facing texts for turns that end without a model answer.

pub const NOT_CONFIGURED_MESSAGE: &str = "엔진이 설정되지 않았습니다.";
pub const BLOCKED_FALLBACK_MESSAGE: &str = "안전정책으로 답변을 생성할 수 없습니다.";
pub const TRANSIENT_FAILURE_MESSAGE: &str =
    "모델이 일시적으로 응답하지 않습니다. 잠시 뒤 다시 시도해 주세요.";
