use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Abbreviated statute names and their canonical titles.
pub const LAW_ALIASES: &[(&str, &str)] = &[
    ("형소법", "형사소송법"),
    ("민소법", "민사소송법"),
    ("민집법", "민사집행법"),
];

/// Statute titles containing spaces. The pattern below only captures the
/// last word of such a title, so a match is widened back to the full title
/// when the text before it spells out the rest.
pub const MULTI_WORD_LAWS: &[&str] = &[
    "개인정보 보호법",
    "상가건물 임대차보호법",
    "교통사고처리 특례법",
    "근로자퇴직급여 보장법",
    "성폭력범죄의 처벌 등에 관한 특례법",
    "가정폭력범죄의 처벌 등에 관한 특례법",
    "아동·청소년의 성보호에 관한 법률",
    "특정범죄 가중처벌 등에 관한 법률",
    "특정경제범죄 가중처벌 등에 관한 법률",
    "정보통신망 이용촉진 및 정보보호 등에 관한 법률",
    "부정경쟁방지 및 영업비밀보호에 관한 법률",
    "채무자 회생 및 파산에 관한 법률",
];

// A name is one run of name characters, optionally followed by an
// enforcement-decree suffix. Bare spaces are excluded so that a name never
// swallows the clause before it ("... 및 형소법 제163조").
const ARTICLE_PATTERN: &str = concat!(
    r"(?P<law>[가-힣A-Za-z0-9·()]{2,40}(?:\s+시행(?:령|규칙))?)",
    r"\s*제(?P<num>\d{1,4})조(?P<sub>(?:의\d{1,3}){0,2})"
);

fn article_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(ARTICLE_PATTERN).expect("article pattern is valid"))
}

/// A `(statute, article)` pair such as `("민법", "제839조의2")`.
///
/// Ordering is lexicographic by statute name, then article label.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Citation {
    pub law: String,
    pub article: String,
}

impl Citation {
    pub fn new(law: impl Into<String>, article: impl Into<String>) -> Self {
        Self {
            law: law.into(),
            article: article.into(),
        }
    }
}

pub fn normalize_law_name(name: &str) -> String {
    let name = name.trim();
    LAW_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| name.to_string())
}

fn is_name_char(c: char) -> bool {
    matches!(c, '가'..='힣' | 'A'..='Z' | 'a'..='z' | '0'..='9' | '·' | '(' | ')')
}

/// The listed multi-word title ending in `last_word`, if `before` (the text
/// preceding that word) ends with the rest of it as a whole phrase.
fn widen_to_known_title(before: &str, last_word: &str) -> Option<&'static str> {
    let trimmed = before.trim_end();
    if trimmed.len() == before.len() {
        return None;
    }
    MULTI_WORD_LAWS.iter().copied().find(|title| {
        let Some((head, tail)) = title.rsplit_once(' ') else {
            return false;
        };
        tail == last_word
            && trimmed
                .strip_suffix(head)
                .is_some_and(|rest| !rest.chars().next_back().is_some_and(is_name_char))
    })
}

/// Every distinct citation in `text`. Repeated mentions of an article
/// collapse to one entry.
///
/// Names containing spaces are only recognized when listed in
/// [`MULTI_WORD_LAWS`]; any other one is cut down to its last word.
pub fn extract_citations(text: &str) -> BTreeSet<Citation> {
    article_regex()
        .captures_iter(text)
        .map(|caps| {
            let law_match = &caps["law"];
            let start = caps.name("law").map_or(0, |m| m.start());
            let law = match widen_to_known_title(&text[..start], law_match) {
                Some(title) => title.to_string(),
                None => normalize_law_name(law_match),
            };
            let article = format!("제{}조{}", &caps["num"], &caps["sub"]);
            Citation { law, article }
        })
        .collect()
}
