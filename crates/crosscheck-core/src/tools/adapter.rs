//! Provider-backed review and critique tools.
//!
//! [`ProviderTool`] is the single adapter behind all four tools. It is
//! parameterised by the task kind ([`CodeReview`] or [`PlanCritique`]), the
//! credential source, the completion backend and a [`ParsePolicy`]:
//!
//! 1. fetch a credential (errors propagate unchanged),
//! 2. render the task's prompt,
//! 3. call the backend once with JSON output requested,
//! 4. parse and validate the text, degrading or failing per policy.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::CredentialSource;
use crate::error::CrossCheckError;
use crate::prompts::{self, Prompt};
use crate::provider::{CompletionBackend, CompletionRequest, REVIEW_TEMPERATURE};
use crate::tools::{FieldSpec, Tool, ToolDefinition};
use crate::types::{parse_output, CritiqueOutput, ReviewOutput, Validate};

/// What to do when the provider's text is not a valid output object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Surface `MalformedProviderResponse` to the caller.
    Strict,
    /// Return the task's degraded output instead of failing.
    Degrade,
}

/// A kind of review: its input, output, prompt and fallback.
pub trait ReviewTask: Send + Sync + 'static {
    type Input: DeserializeOwned + Send + Sync;
    type Output: Serialize + DeserializeOwned + Validate + Send;

    const MAX_OUTPUT_TOKENS: u32;

    fn fields() -> Vec<FieldSpec>;

    fn prompt(input: &Self::Input) -> Prompt;

    fn degraded(raw: &str) -> Self::Output;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewInput {
    pub code: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CritiqueInput {
    pub plan: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Code review of a snippet or file.
pub struct CodeReview;

impl ReviewTask for CodeReview {
    type Input = ReviewInput;
    type Output = ReviewOutput;

    const MAX_OUTPUT_TOKENS: u32 = 4000;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("code", "Code to review"),
            FieldSpec::optional("file_path", "Path of the file under review"),
            FieldSpec::optional("language", "Programming language of the code"),
            FieldSpec::optional("context", "Additional context"),
        ]
    }

    fn prompt(input: &ReviewInput) -> Prompt {
        prompts::review::build_prompt(
            &input.code,
            input.file_path.as_deref(),
            input.language.as_deref(),
            input.context.as_deref(),
        )
    }

    fn degraded(raw: &str) -> ReviewOutput {
        ReviewOutput::degraded(raw)
    }
}

/// Critique of a work plan or design.
pub struct PlanCritique;

impl ReviewTask for PlanCritique {
    type Input = CritiqueInput;
    type Output = CritiqueOutput;

    const MAX_OUTPUT_TOKENS: u32 = 2000;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("plan", "Plan or design to critique"),
            FieldSpec::optional("context", "Additional context (project details, constraints)"),
        ]
    }

    fn prompt(input: &CritiqueInput) -> Prompt {
        prompts::critique::build_prompt(&input.plan, input.context.as_deref())
    }

    fn degraded(raw: &str) -> CritiqueOutput {
        CritiqueOutput::degraded(raw)
    }
}

pub struct ProviderTool<T: ReviewTask> {
    definition: ToolDefinition,
    model: String,
    credentials: Arc<dyn CredentialSource>,
    backend: Arc<dyn CompletionBackend>,
    policy: ParsePolicy,
    _task: PhantomData<fn() -> T>,
}

impl<T: ReviewTask> ProviderTool<T> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        model: impl Into<String>,
        credentials: Arc<dyn CredentialSource>,
        backend: Arc<dyn CompletionBackend>,
        policy: ParsePolicy,
    ) -> Self {
        Self {
            definition: ToolDefinition {
                name: name.into(),
                description: description.into(),
                fields: T::fields(),
            },
            model: model.into(),
            credentials,
            backend,
            policy,
            _task: PhantomData,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Runs one review against the provider.
    pub async fn run(&self, input: T::Input) -> Result<T::Output, CrossCheckError> {
        let credential = self.credentials.credential().await?;

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: T::prompt(&input),
            temperature: REVIEW_TEMPERATURE,
            max_output_tokens: T::MAX_OUTPUT_TOKENS,
        };

        tracing::info!(
            tool = %self.definition.name,
            provider = self.backend.name(),
            model = %self.model,
            "requesting review"
        );
        let text = self.backend.complete(&credential, &request).await?;

        match parse_output::<T::Output>(&text) {
            Ok(output) => Ok(output),
            Err(reason) => match self.policy {
                ParsePolicy::Degrade => {
                    tracing::warn!(
                        tool = %self.definition.name,
                        %reason,
                        "provider output did not parse; returning degraded result"
                    );
                    Ok(T::degraded(&text))
                }
                ParsePolicy::Strict => Err(CrossCheckError::MalformedProviderResponse(reason)),
            },
        }
    }
}

#[async_trait]
impl<T: ReviewTask> Tool for ProviderTool<T> {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: Value) -> Result<Value, CrossCheckError> {
        let input: T::Input = serde_json::from_value(input)
            .map_err(|e| CrossCheckError::InvalidInput(vec![e.to_string()]))?;
        let output = self.run(input).await?;
        Ok(serde_json::to_value(output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockBackend;
    use crate::types::{CritiqueVerdict, ReviewVerdict, PARSE_FAILURE_MARKER};
    use serde_json::json;

    struct StaticSource(&'static str);

    #[async_trait]
    impl CredentialSource for StaticSource {
        async fn credential(&self) -> Result<String, CrossCheckError> {
            Ok(self.0.to_string())
        }
    }

    struct NoCredential;

    #[async_trait]
    impl CredentialSource for NoCredential {
        async fn credential(&self) -> Result<String, CrossCheckError> {
            Err(CrossCheckError::MissingCredential("set it up".into()))
        }
    }

    const GOOD_REVIEW: &str = r#"{"verdict":"APPROVE","overall_score":9,"summary":"Clean","issues":[],"highlights":["Small functions"]}"#;
    const GOOD_CRITIQUE: &str = r#"{"verdict":"OKAY","confidence":0.9,"summary":"Clear","strengths":[],"concerns":[],"suggestions":[],"risk_assessment":{"level":"LOW","factors":[]}}"#;

    fn review_tool(backend: Arc<MockBackend>, policy: ParsePolicy) -> ProviderTool<CodeReview> {
        ProviderTool::new(
            "test_review",
            "Review",
            "model-x",
            Arc::new(StaticSource("cred-1")),
            backend,
            policy,
        )
    }

    fn critique_tool(backend: Arc<MockBackend>, policy: ParsePolicy) -> ProviderTool<PlanCritique> {
        ProviderTool::new(
            "test_critique",
            "Critique",
            "model-y",
            Arc::new(StaticSource("cred-2")),
            backend,
            policy,
        )
    }

    fn review_input() -> ReviewInput {
        ReviewInput {
            code: "fn add(a: i32, b: i32) -> i32 { a + b }".into(),
            file_path: Some("src/math.rs".into()),
            language: Some("rust".into()),
            context: None,
        }
    }

    #[tokio::test]
    async fn review_sends_prompt_with_fixed_sampling() {
        let backend = Arc::new(MockBackend::new(GOOD_REVIEW));
        let tool = review_tool(backend.clone(), ParsePolicy::Strict);

        let output = tool.run(review_input()).await.unwrap();
        assert_eq!(output.verdict, ReviewVerdict::Approve);
        assert_eq!(output.overall_score, 9);

        let (credential, request) = backend.last_call().unwrap();
        assert_eq!(credential, "cred-1");
        assert_eq!(request.model, "model-x");
        assert_eq!(request.temperature, REVIEW_TEMPERATURE);
        assert_eq!(request.max_output_tokens, 4000);
        assert_eq!(request.prompt.system, prompts::review::SYSTEM_PROMPT);
        assert!(request.prompt.user.contains("**File:** src/math.rs"));
    }

    #[tokio::test]
    async fn critique_uses_smaller_output_budget() {
        let backend = Arc::new(MockBackend::new(GOOD_CRITIQUE));
        let tool = critique_tool(backend.clone(), ParsePolicy::Strict);

        let output = tool
            .run(CritiqueInput {
                plan: "1. Do it".into(),
                context: Some("greenfield".into()),
            })
            .await
            .unwrap();
        assert_eq!(output.verdict, CritiqueVerdict::Okay);

        let (_, request) = backend.last_call().unwrap();
        assert_eq!(request.max_output_tokens, 2000);
        assert!(request.prompt.user.contains("greenfield"));
    }

    // The two provider families deliberately disagree on unparseable output:
    // the degrading family repairs, the strict family fails.

    #[tokio::test]
    async fn degrade_policy_repairs_invalid_review_json() {
        let backend = Arc::new(MockBackend::new("Sure! Here is my review: looks fine."));
        let tool = review_tool(backend, ParsePolicy::Degrade);

        let output = tool.run(review_input()).await.unwrap();
        assert_eq!(output.verdict, ReviewVerdict::RequestChanges);
        assert_eq!(output.summary, "Sure! Here is my review: looks fine.");
        assert_eq!(output.issues[0].message, PARSE_FAILURE_MARKER);
    }

    #[tokio::test]
    async fn strict_policy_rejects_invalid_review_json() {
        let backend = Arc::new(MockBackend::new("Sure! Here is my review: looks fine."));
        let tool = review_tool(backend, ParsePolicy::Strict);

        let err = tool.run(review_input()).await.unwrap_err();
        assert!(matches!(err, CrossCheckError::MalformedProviderResponse(_)));
    }

    #[tokio::test]
    async fn degrade_policy_repairs_schema_violation_in_critique() {
        let backend = Arc::new(MockBackend::new(r#"{"verdict":"MAYBE"}"#));
        let tool = critique_tool(backend, ParsePolicy::Degrade);

        let output = tool
            .run(CritiqueInput {
                plan: "plan".into(),
                context: None,
            })
            .await
            .unwrap();
        assert_eq!(output.verdict, CritiqueVerdict::Reject);
        assert_eq!(output.concerns, vec![PARSE_FAILURE_MARKER.to_string()]);
    }

    #[tokio::test]
    async fn strict_policy_rejects_out_of_range_confidence() {
        let backend = Arc::new(MockBackend::new(GOOD_CRITIQUE.replace("0.9", "4.2")));
        let tool = critique_tool(backend, ParsePolicy::Strict);

        let err = tool
            .run(CritiqueInput {
                plan: "plan".into(),
                context: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("confidence"));
    }

    #[tokio::test]
    async fn credential_error_propagates_without_provider_call() {
        let backend = Arc::new(MockBackend::new(GOOD_REVIEW));
        let tool: ProviderTool<CodeReview> = ProviderTool::new(
            "t",
            "d",
            "m",
            Arc::new(NoCredential),
            backend.clone(),
            ParsePolicy::Degrade,
        );

        let err = tool.run(review_input()).await.unwrap_err();
        assert!(matches!(err, CrossCheckError::MissingCredential(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_not_degraded() {
        let backend = Arc::new(MockBackend::failing(Some(500), "boom"));
        let tool = review_tool(backend.clone(), ParsePolicy::Degrade);

        let err = tool.run(review_input()).await.unwrap_err();
        assert!(matches!(
            err,
            CrossCheckError::ProviderRequestFailed {
                status: Some(500),
                ..
            }
        ));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn execute_round_trips_json_values() {
        let backend = Arc::new(MockBackend::new(GOOD_REVIEW));
        let tool = review_tool(backend, ParsePolicy::Strict);

        let value = tool.execute(json!({"code": "x"})).await.unwrap();
        assert_eq!(value["verdict"], "APPROVE");
        assert_eq!(value["highlights"], json!(["Small functions"]));
    }

    #[tokio::test]
    async fn execute_rejects_wrongly_typed_input() {
        let backend = Arc::new(MockBackend::new(GOOD_REVIEW));
        let tool = review_tool(backend.clone(), ParsePolicy::Strict);

        let err = tool.execute(json!({"code": 12})).await.unwrap_err();
        assert!(matches!(err, CrossCheckError::InvalidInput(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn definitions_carry_task_fields() {
        let tool = review_tool(Arc::new(MockBackend::new("")), ParsePolicy::Strict);
        let names: Vec<&str> = tool.definition().fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["code", "file_path", "language", "context"]);
        assert_eq!(tool.policy(), ParsePolicy::Strict);
        assert_eq!(tool.model(), "model-x");
    }
}
