use std::fmt;
use std::str::FromStr;

use lawdesk_core::LawdeskError;
use serde::{Deserialize, Serialize};

/// Response mode selected for a question.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Quick,
    Lawfinder,
    Memo,
    Draft,
}

/// Classifications at or above this confidence are used as-is by [`pick_mode`].
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

const QUICK_KEYWORDS: &[&str] = &["간단", "짧게", "요약"];
const LAWFINDER_KEYWORDS: &[&str] = &["법령", "조문", "근거", "관련 법률"];
const MEMO_KEYWORDS: &[&str] = &["자문", "판단", "책임", "위험", "가능성"];
const DRAFT_KEYWORDS: &[&str] = &["조항", "계약", "통지", "서식", "양식"];

/// Checked in order; the first category with a matching keyword wins.
const RULES: &[(&[&str], Intent, f32)] = &[
    (QUICK_KEYWORDS, Intent::Quick, 0.9),
    (LAWFINDER_KEYWORDS, Intent::Lawfinder, 0.8),
    (MEMO_KEYWORDS, Intent::Memo, 0.75),
    (DRAFT_KEYWORDS, Intent::Draft, 0.85),
];

const DEFAULT_CLASSIFICATION: (Intent, f32) = (Intent::Lawfinder, 0.6);

/// Maps a question to an intent and a confidence in `[0, 1]` by keyword
/// membership. An empty question falls through to the default.
pub fn classify_intent(question: &str) -> (Intent, f32) {
    RULES
        .iter()
        .find(|(keywords, _, _)| keywords.iter().any(|keyword| question.contains(keyword)))
        .map(|(_, intent, confidence)| (*intent, *confidence))
        .unwrap_or(DEFAULT_CLASSIFICATION)
}

/// Resolves a classification to the mode actually used. Low-confidence
/// results escalate toward the more thorough mode.
pub fn pick_mode(intent: Intent, confidence: f32) -> Intent {
    if confidence >= CONFIDENCE_THRESHOLD {
        return intent;
    }
    match intent {
        Intent::Quick => Intent::Lawfinder,
        Intent::Lawfinder => Intent::Memo,
        other => other,
    }
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Quick => "quick",
            Intent::Lawfinder => "lawfinder",
            Intent::Memo => "memo",
            Intent::Draft => "draft",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = LawdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Intent::Quick),
            "lawfinder" => Ok(Intent::Lawfinder),
            "memo" => Ok(Intent::Memo),
            "draft" => Ok(Intent::Draft),
            other => Err(LawdeskError::InvalidConfig(format!(
                "unknown mode '{other}'"
            ))),
        }
    }
}
