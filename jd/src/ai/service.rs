//! TextService - best-effort AI enrichment with fixed fallbacks
//!
//! The presentation layer depends on the `TextService` trait only. Which
//! implementation it gets is decided once, at construction: a generative
//! service backed by an `LlmClient`, or the offline service when no
//! credential is configured. Neither ever returns an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{AiError, CompletionRequest, GeminiClient, LlmClient};
use crate::config::AiConfig;

/// Steps returned whenever a real breakdown is unavailable
pub const FALLBACK_SUBTASKS: [&str; 4] = [
    "Define scope",
    "Research requirements",
    "Execute first draft",
    "Review and refine",
];

/// Quote shown when no AI credential is configured
pub const DEFAULT_QUOTE: &str = "Discipline is doing what needs to be done, even if you don't want to do it.";

/// Quote shown when a configured call fails
pub const FAILURE_QUOTE: &str = "Action is the foundational key to all success.";

/// Longest quote we display, in words
pub const MAX_QUOTE_WORDS: usize = 20;

const SUBTASK_MAX_TOKENS: u32 = 512;
const QUOTE_MAX_TOKENS: u32 = 100;

/// Text generation used by the dashboard
#[async_trait]
pub trait TextService: Send + Sync {
    /// Break a task title into short actionable steps
    async fn generate_subtasks(&self, title: &str) -> Vec<String>;

    /// A short productivity aphorism
    async fn motivational_quote(&self) -> String;

    /// Whether results come from a live model
    fn is_live(&self) -> bool;
}

pub fn fallback_subtasks() -> Vec<String> {
    FALLBACK_SUBTASKS.iter().map(|s| s.to_string()).collect()
}

/// Null-object service used when the AI endpoint is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTextService;

#[async_trait]
impl TextService for OfflineTextService {
    async fn generate_subtasks(&self, title: &str) -> Vec<String> {
        debug!(%title, "OfflineTextService::generate_subtasks: returning fallback");
        fallback_subtasks()
    }

    async fn motivational_quote(&self) -> String {
        debug!("OfflineTextService::motivational_quote: returning default");
        DEFAULT_QUOTE.to_string()
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Service backed by a live LLM client
pub struct GenerativeTextService {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl GenerativeTextService {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Ask the model for a breakdown, surfacing every failure
    pub async fn try_generate_subtasks(&self, title: &str) -> Result<Vec<String>, AiError> {
        let prompt = format!(
            "Break down the following task into 3-5 short, actionable sub-steps: \"{}\"",
            title
        );
        let schema = serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "subtasks": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["subtasks"]
        });

        let request = CompletionRequest::structured(prompt, schema, SUBTASK_MAX_TOKENS);
        let text = self.complete_text(request).await?;
        parse_subtasks(&text)
    }

    /// Ask the model for a quote, surfacing every failure
    pub async fn try_motivational_quote(&self) -> Result<String, AiError> {
        let request = CompletionRequest::text(
            "Generate a short, sophisticated, slightly stoic or modern productivity quote. Maximum 20 words.",
            QUOTE_MAX_TOKENS,
        );
        let text = self.complete_text(request).await?;
        clean_quote(&text)
    }

    async fn complete_text(&self, request: CompletionRequest) -> Result<String, AiError> {
        let response = tokio::time::timeout(self.timeout, self.client.complete(request))
            .await
            .map_err(|_| AiError::Timeout(self.timeout))??;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            finish_reason = ?response.finish_reason,
            "complete_text: response received"
        );

        response
            .content
            .ok_or_else(|| AiError::InvalidResponse(format!("empty response ({:?})", response.finish_reason)))
    }
}

#[async_trait]
impl TextService for GenerativeTextService {
    async fn generate_subtasks(&self, title: &str) -> Vec<String> {
        debug!(%title, "generate_subtasks: called");
        match self.try_generate_subtasks(title).await {
            Ok(steps) => {
                debug!(count = steps.len(), "generate_subtasks: model returned steps");
                steps
            }
            Err(e) => {
                warn!(error = %e, %title, "generate_subtasks: AI call failed, using fallback steps");
                fallback_subtasks()
            }
        }
    }

    async fn motivational_quote(&self) -> String {
        debug!("motivational_quote: called");
        match self.try_motivational_quote().await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(error = %e, "motivational_quote: AI call failed, using fallback quote");
                FAILURE_QUOTE.to_string()
            }
        }
    }

    fn is_live(&self) -> bool {
        true
    }
}

/// Choose the text service for this configuration
///
/// A missing credential is a supported setup, not an error.
pub fn create_text_service(config: &AiConfig) -> Arc<dyn TextService> {
    debug!(provider = %config.provider, "create_text_service: called");
    if !config.is_configured() {
        info!(
            api_key_env = %config.api_key_env,
            "No AI credential configured, using offline text service"
        );
        return Arc::new(OfflineTextService);
    }

    if config.provider != "gemini" {
        warn!(provider = %config.provider, "Unknown AI provider, using offline text service. Supported: gemini");
        return Arc::new(OfflineTextService);
    }

    match GeminiClient::from_config(config) {
        Ok(client) => {
            info!(model = %config.model, "Using Gemini text service");
            Arc::new(GenerativeTextService::new(
                Arc::new(client),
                Duration::from_millis(config.timeout_ms),
            ))
        }
        Err(e) => {
            warn!(error = %e, "Failed to create AI client, using offline text service");
            Arc::new(OfflineTextService)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubtaskBreakdown {
    #[serde(default)]
    subtasks: Vec<String>,
}

/// Extract the `subtasks` array from a model response
fn parse_subtasks(text: &str) -> Result<Vec<String>, AiError> {
    let breakdown: SubtaskBreakdown = serde_json::from_str(strip_code_fence(text))?;

    let steps: Vec<String> = breakdown
        .subtasks
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if steps.is_empty() {
        return Err(AiError::InvalidResponse("no subtasks in response".to_string()));
    }
    Ok(steps)
}

/// Models sometimes wrap JSON in a markdown fence despite the mime type
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

/// Trim wrapping quotes and cap the length
fn clean_quote(text: &str) -> Result<String, AiError> {
    let quote = text
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\u{201C}' | '\u{201D}'))
        .trim();

    if quote.is_empty() {
        return Err(AiError::InvalidResponse("empty quote".to_string()));
    }

    Ok(quote.split_whitespace().take(MAX_QUOTE_WORDS).collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CompletionResponse;
    use crate::ai::client::mock::MockLlmClient;
    use serial_test::serial;

    fn service(client: MockLlmClient) -> (Arc<MockLlmClient>, GenerativeTextService) {
        let client = Arc::new(client);
        let svc = GenerativeTextService::new(client.clone(), Duration::from_secs(5));
        (client, svc)
    }

    #[tokio::test]
    async fn test_offline_subtasks_are_fixed() {
        let svc = OfflineTextService;
        let steps = svc.generate_subtasks("Write report").await;
        assert_eq!(
            steps,
            ["Define scope", "Research requirements", "Execute first draft", "Review and refine"]
        );
        assert_eq!(svc.generate_subtasks("Anything else").await, steps);
        assert!(!svc.is_live());
    }

    #[tokio::test]
    async fn test_offline_quote_is_default() {
        assert_eq!(OfflineTextService.motivational_quote().await, DEFAULT_QUOTE);
    }

    #[tokio::test]
    async fn test_generate_subtasks_from_model() {
        let (client, svc) = service(MockLlmClient::new(vec![CompletionResponse::from_text(
            r#"{"subtasks": ["Outline sections", "  Gather data ", "", "Write summary"]}"#,
        )]));

        let steps = svc.generate_subtasks("Write report").await;
        assert_eq!(steps, ["Outline sections", "Gather data", "Write summary"]);

        let request = &client.requests()[0];
        assert!(request.prompt.contains("\"Write report\""));
        assert!(request.prompt.contains("3-5"));
        assert_eq!(request.response_schema.as_ref().unwrap()["properties"]["subtasks"]["type"], "ARRAY");
    }

    #[tokio::test]
    async fn test_generate_subtasks_fenced_json() {
        let (_, svc) = service(MockLlmClient::new(vec![CompletionResponse::from_text(
            "```json\n{\"subtasks\": [\"One\", \"Two\", \"Three\"]}\n```",
        )]));
        assert_eq!(svc.generate_subtasks("x").await, ["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn test_generate_subtasks_failure_uses_fallback() {
        let (_, svc) = service(MockLlmClient::failing());
        assert_eq!(svc.generate_subtasks("Write report").await, fallback_subtasks());
    }

    #[tokio::test]
    async fn test_generate_subtasks_malformed_uses_fallback() {
        let (_, svc) = service(MockLlmClient::new(vec![
            CompletionResponse::from_text("Sure! Here are some steps: 1. Plan"),
            CompletionResponse::from_text(r#"{"subtasks": []}"#),
            CompletionResponse::default(),
        ]));
        assert_eq!(svc.generate_subtasks("a").await, fallback_subtasks());
        assert_eq!(svc.generate_subtasks("b").await, fallback_subtasks());
        assert_eq!(svc.generate_subtasks("c").await, fallback_subtasks());
    }

    #[tokio::test]
    async fn test_timeout_uses_fallback() {
        let client = Arc::new(
            MockLlmClient::new(vec![CompletionResponse::from_text(r#"{"subtasks": ["late"]}"#)])
                .with_delay(Duration::from_millis(500)),
        );
        let svc = GenerativeTextService::new(client, Duration::from_millis(20));

        assert!(matches!(svc.try_generate_subtasks("slow").await, Err(AiError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_quote_from_model() {
        let (_, svc) = service(MockLlmClient::new(vec![CompletionResponse::from_text(
            "  \"Small steps, taken daily, outrun grand plans.\"\n",
        )]));
        assert_eq!(svc.motivational_quote().await, "Small steps, taken daily, outrun grand plans.");
        assert!(svc.is_live());
    }

    #[tokio::test]
    async fn test_quote_capped_at_twenty_words() {
        let long = (1..=30).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let (_, svc) = service(MockLlmClient::new(vec![CompletionResponse::from_text(long)]));
        let quote = svc.motivational_quote().await;
        assert_eq!(quote.split_whitespace().count(), MAX_QUOTE_WORDS);
        assert!(quote.ends_with("w20"));
    }

    #[tokio::test]
    async fn test_quote_failure_is_fixed() {
        let (_, svc) = service(MockLlmClient::failing());
        assert_eq!(svc.motivational_quote().await, FAILURE_QUOTE);

        let (_, svc) = service(MockLlmClient::new(vec![CompletionResponse::from_text("  \"\"  ")]));
        assert_eq!(svc.motivational_quote().await, FAILURE_QUOTE);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[tokio::test]
    #[serial]
    async fn test_create_without_credential_is_offline() {
        let config = AiConfig {
            api_key_env: "JUSTDOIT_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        unsafe { std::env::remove_var("JUSTDOIT_TEST_UNSET_KEY") };

        let svc = create_text_service(&config);
        assert!(!svc.is_live());
        assert_eq!(svc.generate_subtasks("Write report").await, fallback_subtasks());
        assert_eq!(svc.motivational_quote().await, DEFAULT_QUOTE);
    }

    #[test]
    #[serial]
    fn test_create_with_credential_is_live() {
        let config = AiConfig {
            api_key_env: "JUSTDOIT_TEST_SET_KEY".to_string(),
            ..Default::default()
        };
        unsafe { std::env::set_var("JUSTDOIT_TEST_SET_KEY", "test-key") };
        let svc = create_text_service(&config);
        unsafe { std::env::remove_var("JUSTDOIT_TEST_SET_KEY") };

        assert!(svc.is_live());
    }
}
