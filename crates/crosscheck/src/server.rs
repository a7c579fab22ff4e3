//! MCP front end: advertises the tool catalogue and forwards calls to the
//! registry over stdio.

use std::sync::Arc;

use crosscheck_core::tools::{ToolOutcome, ToolRegistry};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
};
use serde_json::Value;
use tokio::io::{stdin, stdout};

#[derive(Clone)]
pub struct CrossCheckServer {
    registry: Arc<ToolRegistry>,
}

impl CrossCheckServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The catalogue in MCP form.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry
            .definitions()
            .into_iter()
            .map(|def| {
                Tool::new(def.name.clone(), def.description.clone(), def.input_schema())
            })
            .collect()
    }

    /// Runs one call; registry failures come back as error-flagged results,
    /// never as protocol errors.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, Value>>,
    ) -> CallToolResult {
        let args = arguments.map(Value::Object).unwrap_or(Value::Null);
        to_call_result(self.registry.dispatch(name, args).await)
    }

    /// Serves MCP on stdin/stdout until the client disconnects.
    pub async fn run(self) -> Result<(), String> {
        tracing::info!("starting MCP server on stdio");
        let server = self
            .serve((stdin(), stdout()))
            .await
            .map_err(|e| format!("MCP initialization failed: {e}"))?;
        tracing::info!("MCP server initialized, waiting for requests");
        let reason = server
            .waiting()
            .await
            .map_err(|e| format!("MCP server task failed: {e}"))?;
        tracing::info!(?reason, "MCP server stopped");
        Ok(())
    }
}

fn to_call_result(outcome: ToolOutcome) -> CallToolResult {
    let content = vec![Content::text(outcome.text)];
    if outcome.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for CrossCheckServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "crosscheck".to_string(),
                title: Some("CrossCheck MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Independent second opinions from other models. \
                Use gemini_review/gpt_review on code and gemini_critique/gpt_critique on plans; \
                each returns a structured JSON verdict."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            meta: None,
            tools: self.tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(request.name.as_ref(), request.arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::config::Config;
    use crosscheck_core::credentials::{ApiKeyStore, HttpTokenRefresher, OAuthTokenStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn offline_server(tmp: &TempDir) -> CrossCheckServer {
        let api_keys = Arc::new(ApiKeyStore::with_env(
            tmp.path().join("gemini-api.json"),
            Arc::new(|_: &str| None),
        ));
        let oauth = Arc::new(OAuthTokenStore::new(
            tmp.path().join("openai-oauth.json"),
            Arc::new(HttpTokenRefresher::new("http://127.0.0.1:9/token", None)),
        ));
        let registry = ToolRegistry::with_stores(&Config::default(), api_keys, oauth);
        CrossCheckServer::new(Arc::new(registry))
    }

    #[test]
    fn lists_four_tools_with_schemas() {
        let tmp = TempDir::new().unwrap();
        let tools = offline_server(&tmp).tools();
        assert_eq!(tools.len(), 4);
        let review = tools.iter().find(|t| t.name == "gpt_review").unwrap();
        assert_eq!(review.input_schema["type"], json!("object"));
        assert_eq!(review.input_schema["required"], json!(["code"]));
    }

    #[test]
    fn advertises_tool_capability() {
        let tmp = TempDir::new().unwrap();
        let info = offline_server(&tmp).get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "crosscheck");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let tmp = TempDir::new().unwrap();
        let result = offline_server(&tmp).call("nope", None).await;
        assert_eq!(result.is_error, Some(true));
        let text = result.content[0].as_text().unwrap().text.clone();
        assert_eq!(text, "Error: Unknown tool: nope");
    }

    #[tokio::test]
    async fn missing_key_is_an_error_result() {
        let tmp = TempDir::new().unwrap();
        let mut args = serde_json::Map::new();
        args.insert("code".into(), json!("fn main() {}"));
        let result = offline_server(&tmp).call("gemini_review", Some(args)).await;
        assert_eq!(result.is_error, Some(true));
        let text = result.content[0].as_text().unwrap().text.clone();
        assert!(text.contains("gemini-api.json"));
    }
}
