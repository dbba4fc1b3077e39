pub type Value = serde_json::Value;

/// JSON object used for tool keyword arguments.
pub type ArgMap = serde_json::Map<String, Value>;
