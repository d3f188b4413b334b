//! Screening evaluator backed by the Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sift_config::AgentConfig;

use crate::error::AgentError;
use crate::evaluator::{EvaluationRequest, ScreeningEvaluator, ScreeningResult};
use crate::http::check_response;
use crate::prompt::system_prompt;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Evaluator that asks a Claude model for a JSON screening result.
pub struct AnthropicEvaluator {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicEvaluator {
    /// Build an evaluator from the `agent` config section.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Config` when no API key is set, or
    /// `AgentError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        config.require()?;
        // Calls are bounded by the screener's timeout.
        let http = reqwest::Client::builder().user_agent("sift/0.1").build()?;
        Ok(Self {
            http,
            url: config.messages_url(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ScreeningEvaluator for AnthropicEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ScreeningResult, AgentError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system: system_prompt(&request.review_question, &request.criteria),
            messages: [Message {
                role: "user",
                content: &request.article_text,
            }],
        };
        tracing::debug!(model = %self.model, criteria = request.criteria.len(), "requesting evaluation");

        let resp = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let data: MessagesResponse = check_response(resp).await?.json().await?;

        let text = data
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| AgentError::MalformedOutput("no text block in response".into()))?;
        let result = parse_screening_result(&text)?;
        result.validate(&request.criteria)?;
        Ok(result)
    }
}

/// Extract the JSON object from a model reply, tolerating code fences and
/// surrounding prose. Checking it against the criteria is left to
/// [`ScreeningResult::validate`].
///
/// # Errors
///
/// Returns `AgentError::MalformedOutput` when no valid result can be read.
pub fn parse_screening_result(text: &str) -> Result<ScreeningResult, AgentError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(AgentError::MalformedOutput(
                "reply contains no JSON object".into(),
            ));
        }
    };
    serde_json::from_str(json)
        .map_err(|e| AgentError::MalformedOutput(format!("invalid screening result: {e}")))
}
