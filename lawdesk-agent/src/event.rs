use lawdesk_core::Value;
use serde::Serialize;

/// One item of a `generate` turn.
///
/// `links` carries the structured search-result items collected from tool
/// calls so far. Regex-detected statute citations only ever appear inside
/// `text`, as the trailing links block.
///
/// A streamed `Final` always equals the concatenated deltas. If the model
/// streamed a links block of its own, that block cannot be taken back, so
/// the `Final` keeps it unlinked. The same reply without streaming has its
/// block replaced by the canonical deep links.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerateEvent {
    Delta { text: String, links: Vec<Value> },
    Final { text: String, links: Vec<Value> },
}

impl GenerateEvent {
    pub fn delta(text: impl Into<String>, links: Vec<Value>) -> Self {
        GenerateEvent::Delta {
            text: text.into(),
            links,
        }
    }

    pub fn final_text(text: impl Into<String>, links: Vec<Value>) -> Self {
        GenerateEvent::Final {
            text: text.into(),
            links,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            GenerateEvent::Delta { text, .. } | GenerateEvent::Final { text, .. } => text,
        }
    }

    pub fn links(&self) -> &[Value] {
        match self {
            GenerateEvent::Delta { links, .. } | GenerateEvent::Final { links, .. } => links,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, GenerateEvent::Final { .. })
    }
}

/// A turn ends with exactly one `Final`, and nothing follows it.
pub fn validate_single_final(events: &[GenerateEvent]) -> Result<(), String> {
    let mut final_index: Option<usize> = None;

    for (index, event) in events.iter().enumerate() {
        if let Some(first_index) = final_index {
            return Err(format!(
                "event at index {index} emitted after Final at index {first_index}"
            ));
        }
        if event.is_final() {
            final_index = Some(index);
        }
    }

    match final_index {
        Some(_) => Ok(()),
        None => Err("turn ended without a Final event".to_string()),
    }
}

/// When a turn streamed any deltas, their concatenation must equal the
/// `Final` text.
pub fn validate_deltas_match_final(events: &[GenerateEvent]) -> Result<(), String> {
    let mut streamed = String::new();
    let mut saw_delta = false;

    for event in events {
        match event {
            GenerateEvent::Delta { text, .. } => {
                saw_delta = true;
                streamed.push_str(text);
            }
            GenerateEvent::Final { text, .. } => {
                if saw_delta && streamed != *text {
                    return Err(format!(
                        "deltas concatenate to {} bytes but Final carries {} bytes",
                        streamed.len(),
                        text.len()
                    ));
                }
                return Ok(());
            }
        }
    }

    Err("turn ended without a Final event".to_string())
}
