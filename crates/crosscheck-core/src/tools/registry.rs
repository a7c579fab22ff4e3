//! Tool catalogue and dispatch.
//!
//! [`ToolRegistry::dispatch`] is the error boundary of the whole pipeline:
//! whatever fails below it (credentials, provider, parsing, input checks) is
//! turned into an error-flagged [`ToolOutcome`] instead of escaping.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::credentials::{ApiKeyStore, HttpTokenRefresher, OAuthTokenStore};
use crate::error::CrossCheckError;
use crate::provider::{GeminiBackend, OpenAiBackend};
use crate::tools::adapter::{CodeReview, ParsePolicy, PlanCritique, ProviderTool};
use crate::tools::{Tool, ToolDefinition};

/// Result of one dispatched call, ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub is_error: bool,
    pub text: String,
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            text: text.into(),
        }
    }

    pub fn failure(err: &CrossCheckError) -> Self {
        Self {
            is_error: true,
            text: format!("Error: {err}"),
        }
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name.clone();
        self.tools.retain(|t| t.definition().name != name);
        self.tools.push(tool);
    }

    /// The four provider tools, wired from configuration.
    pub fn standard(config: &Config) -> Result<Self, CrossCheckError> {
        let api_keys = Arc::new(ApiKeyStore::new(config.api_key_path()?));
        let refresher = Arc::new(HttpTokenRefresher::new(
            config.openai.token_endpoint.clone(),
            config.openai.client_id.clone(),
        ));
        let oauth = Arc::new(OAuthTokenStore::new(config.oauth_token_path()?, refresher));
        Ok(Self::with_stores(config, api_keys, oauth))
    }

    /// The four provider tools using the given credential stores.
    pub fn with_stores(
        config: &Config,
        api_keys: Arc<ApiKeyStore>,
        oauth: Arc<OAuthTokenStore>,
    ) -> Self {
        let gemini = Arc::new(GeminiBackend::new(config.gemini.base_url.clone()));
        let openai = Arc::new(OpenAiBackend::new(config.openai.base_url.clone()));

        let mut registry = Self::new();
        registry.register(Arc::new(ProviderTool::<PlanCritique>::new(
            "gemini_critique",
            "Critique a work plan or design with Gemini. Independent cross-check of Claude's judgement.",
            config.gemini.critique_model.clone(),
            api_keys.clone(),
            gemini.clone(),
            ParsePolicy::Degrade,
        )));
        registry.register(Arc::new(ProviderTool::<CodeReview>::new(
            "gemini_review",
            "Review code quality with Gemini. Independent cross-check of Claude's judgement.",
            config.gemini.review_model.clone(),
            api_keys,
            gemini,
            ParsePolicy::Degrade,
        )));
        registry.register(Arc::new(ProviderTool::<PlanCritique>::new(
            "gpt_critique",
            "Critique a work plan or design with GPT. Independent cross-check of Claude's judgement.",
            config.openai.model.clone(),
            oauth.clone(),
            openai.clone(),
            ParsePolicy::Strict,
        )));
        registry.register(Arc::new(ProviderTool::<CodeReview>::new(
            "gpt_review",
            "Review code quality with GPT. Independent cross-check of Claude's judgement.",
            config.openai.model.clone(),
            oauth,
            openai,
            ParsePolicy::Strict,
        )));
        registry
    }

    /// Declarations of every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.definition().name == name)
    }

    /// Looks up `name`, checks `args` against its declaration and runs it.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, CrossCheckError> {
        let tool = self
            .get(name)
            .ok_or_else(|| CrossCheckError::UnknownTool(name.to_string()))?;
        let input = tool.definition().validate_arguments(args)?;
        tool.execute(input).await
    }

    /// Like [`call`](Self::call), but every failure becomes an error-flagged
    /// outcome and success is rendered as pretty JSON.
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolOutcome {
        tracing::debug!(tool = name, "dispatching tool call");
        let result = match self.call(name, args).await {
            Ok(value) => serde_json::to_string_pretty(&value).map_err(CrossCheckError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(text) => ToolOutcome::success(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                ToolOutcome::failure(&e)
            }
        }
    }
}
