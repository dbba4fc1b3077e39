//! Statute citation detection and `law.go.kr` deep links.
//!
//! Answers mention articles as `법령명 제N조(의M)`. This crate finds those
//! citations, normalizes common abbreviations, and keeps a single trailing
//! reference-links block in sync with them.

mod block;
mod citation;
mod url;

pub use block::{link_citations, merge_links_block, render_links_block, LINKS_HEADER};
pub use citation::{
    extract_citations, normalize_law_name, Citation, LAW_ALIASES, MULTI_WORD_LAWS,
};
pub use url::{build_article_url, ARTICLE_BASE_URL};
