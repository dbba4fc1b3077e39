use lawdesk_core::{ArgMap, ToolCall, ToolError, ToolSpec, Value};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

/// Statute search backend behind the two declared tools.
#[async_trait::async_trait]
pub trait LawSearch: Send + Sync {
    async fn search_one(&self, args: ArgMap) -> Result<Value, ToolError>;

    async fn search_multi(&self, args: ArgMap) -> Result<Value, ToolError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LawTool {
    SearchOne,
    SearchMulti,
}

impl LawTool {
    pub const ALL: [LawTool; 2] = [LawTool::SearchOne, LawTool::SearchMulti];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            LawTool::SearchOne => "search_one",
            LawTool::SearchMulti => "search_multi",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LawTool::SearchOne => {
                "Search Korean statutes and administrative rules for a single query."
            }
            LawTool::SearchMulti => {
                "Search Korean statutes and administrative rules for several queries at once."
            }
        }
    }

    fn parameters(self) -> Value {
        let schema = match self {
            LawTool::SearchOne => schemars::schema_for!(SearchOneArgs),
            LawTool::SearchMulti => schemars::schema_for!(SearchMultiArgs),
        };
        let mut parameters =
            serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }));
        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        parameters
    }

    pub fn spec(self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct SearchOneArgs {
    /// Statute name or keywords to look up.
    pub query: String,
    /// Rows to return per matching statute.
    #[serde(default)]
    pub num_rows: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct SearchMultiArgs {
    pub queries: Vec<String>,
    #[serde(default)]
    pub num_rows: Option<u32>,
}

pub fn default_tool_specs() -> Vec<ToolSpec> {
    LawTool::ALL.into_iter().map(LawTool::spec).collect()
}

/// Runs one requested call and returns the JSON fed back to the model.
/// Failures become `{"error": ..}` results instead of aborting the turn.
pub async fn dispatch_tool_call(search: Option<&dyn LawSearch>, call: &ToolCall) -> Value {
    let Some(tool) = LawTool::from_name(&call.name) else {
        return json!({ "error": format!("unknown tool: {}", call.name) });
    };
    let Some(search) = search else {
        return json!({ "error": "search backend not configured" });
    };

    let args = call.parse_args_or_empty();
    let result = match tool {
        LawTool::SearchOne => search.search_one(args).await,
        LawTool::SearchMulti => search.search_multi(args).await,
    };
    result.unwrap_or_else(|err| json!({ "error": err.to_string() }))
}

fn non_empty_items(value: &Value) -> Option<&Vec<Value>> {
    value
        .get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

/// Appends the `items` of a tool result to `links`: either the result's own
/// `items`, or those of each object in a result list.
pub fn collect_link_items(result: &Value, links: &mut Vec<Value>) {
    match result {
        Value::Object(_) => {
            if let Some(items) = non_empty_items(result) {
                links.extend(items.iter().cloned());
            }
        }
        Value::Array(results) => {
            for items in results.iter().filter_map(non_empty_items) {
                links.extend(items.iter().cloned());
            }
        }
        _ => {}
    }
}

pub fn serialize_or_empty(result: &Value) -> String {
    serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string())
}
