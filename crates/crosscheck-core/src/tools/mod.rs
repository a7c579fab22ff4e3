//! The callable tool surface: declarations, the provider-backed adapter and
//! the registry that dispatches calls to it.

pub mod adapter;
pub mod registry;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CrossCheckError;

pub use adapter::{
    CodeReview, CritiqueInput, ParsePolicy, PlanCritique, ProviderTool, ReviewInput, ReviewTask,
};
pub use registry::{ToolOutcome, ToolRegistry};

/// One declared input field. Every field the tools accept is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: "string",
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: "string",
            required: false,
            description,
        }
    }
}

/// Name, description and input shape of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
}

impl ToolDefinition {
    /// JSON Schema for the input object, as advertised to MCP clients.
    pub fn input_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                (
                    f.name.to_string(),
                    serde_json::json!({"type": f.kind, "description": f.description}),
                )
            })
            .collect();
        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| Value::String(f.name.to_string()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("object".into()));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), Value::Array(required));
        schema
    }

    /// Checks raw call arguments against the declared fields and returns
    /// only the declared ones.
    ///
    /// `null` arguments count as an empty object and `null` optional fields
    /// as absent. Undeclared fields are dropped. Every offending field is
    /// reported, not just the first.
    pub fn validate_arguments(&self, args: Value) -> Result<Value, CrossCheckError> {
        let map = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(CrossCheckError::InvalidInput(vec![format!(
                    "arguments: expected an object, got {}",
                    json_type(&other)
                )]))
            }
        };

        let mut problems = Vec::new();
        let mut accepted = Map::new();
        for field in &self.fields {
            match map.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        problems.push(format!("{}: required field is missing", field.name));
                    }
                }
                Some(Value::String(s)) => {
                    accepted.insert(field.name.to_string(), Value::String(s.clone()));
                }
                Some(other) => problems.push(format!(
                    "{}: expected string, got {}",
                    field.name,
                    json_type(other)
                )),
            }
        }

        if problems.is_empty() {
            Ok(Value::Object(accepted))
        } else {
            Err(CrossCheckError::InvalidInput(problems))
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    /// Runs the tool on arguments already checked against the definition.
    async fn execute(&self, input: Value) -> Result<Value, CrossCheckError>;
}
