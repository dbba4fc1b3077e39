use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Statute pages live under `/법령/<name>/<article>`.
pub const ARTICLE_BASE_URL: &str = "https://law.go.kr/법령";

// Unreserved characters plus '/', left as-is.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Deep link for one article. Built by convention only; the target page is
/// not checked.
pub fn build_article_url(law_name: &str, article_label: &str) -> String {
    format!(
        "{ARTICLE_BASE_URL}/{}/{}",
        utf8_percent_encode(law_name, PATH_SEGMENT),
        utf8_percent_encode(article_label, PATH_SEGMENT)
    )
}
