use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::{build_article_url, extract_citations, Citation};

pub const LINKS_HEADER: &str = "### 참고 링크(조문)";

fn existing_block_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"(?s)\n{}.*\z", regex::escape(LINKS_HEADER)))
            .expect("links block pattern is valid")
    })
}

/// Renders the reference-links block, or an empty string when there is
/// nothing to link. The block starts with a newline and has no trailing one.
pub fn render_links_block(citations: &BTreeSet<Citation>) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let mut block = format!("\n{LINKS_HEADER}");
    for Citation { law, article } in citations {
        block.push_str(&format!(
            "\n- [{law} {article}]({})",
            build_article_url(law, article)
        ));
    }
    block
}

/// Replaces a trailing links block in `text`, or appends one.
///
/// Applying it twice with the same citations gives the same text as applying
/// it once. When `text` has no block yet, the result starts with `text`.
pub fn merge_links_block(text: &str, citations: &BTreeSet<Citation>) -> String {
    let block = render_links_block(citations);
    if block.is_empty() {
        return text.to_string();
    }

    if let Some(existing) = existing_block_regex().find(text) {
        let mut merged = String::with_capacity(existing.start() + block.len() + 1);
        merged.push_str(&text[..existing.start()]);
        merged.push_str(&block);
        merged.push('\n');
        return merged;
    }

    let mut merged = String::with_capacity(text.len() + block.len() + 2);
    merged.push_str(text);
    if !text.ends_with('\n') {
        merged.push('\n');
    }
    merged.push_str(&block);
    merged.push('\n');
    merged
}

/// Links every citation found in `text` itself.
pub fn link_citations(text: &str) -> String {
    merge_links_block(text, &extract_citations(text))
}
