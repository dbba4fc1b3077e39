use lawdesk_core::Value;
use reqwest::StatusCode;
use serde_json::json;

/// A request rejected by the provider's content-safety filter.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentFilterHit {
    pub message: Option<String>,
    pub categories: Value,
}

const CODE_PATHS: &[&[&str]] = &[
    &["code"],
    &["error", "code"],
    &["innererror", "code"],
    &["error", "innererror", "code"],
];

const CATEGORY_PATHS: &[&[&str]] = &[
    &["innererror", "content_filter_result"],
    &["error", "innererror", "content_filter_result"],
];

fn lookup<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(body, |value, key| value.get(key))
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(code) => Some(code.to_ascii_lowercase()),
        other => Some(other.to_string().to_ascii_lowercase()),
    }
}

/// Recognises a content-filter rejection from an error status and its JSON
/// body. Only HTTP 400 responses qualify.
pub fn detect_content_filter(status: StatusCode, body: &Value) -> Option<ContentFilterHit> {
    if status != StatusCode::BAD_REQUEST || !body.is_object() {
        return None;
    }

    let filtered = CODE_PATHS
        .iter()
        .filter_map(|path| lookup(body, path))
        .filter_map(code_text)
        .any(|code| code.contains("content_filter"));
    if !filtered {
        return None;
    }

    let categories = CATEGORY_PATHS
        .iter()
        .filter_map(|path| lookup(body, path))
        .find(|value| value.is_object())
        .cloned()
        .unwrap_or_else(|| json!({}));
    let message = lookup(body, &["error", "message"])
        .or_else(|| lookup(body, &["message"]))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ContentFilterHit {
        message,
        categories,
    })
}
