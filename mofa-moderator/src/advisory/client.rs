//! OpenAI-compatible advice provider
//!
//! Posts a small chat completion request to `{api_url}/chat/completions`
//! using a blocking client. It only ever runs on the advisor worker thread.

use super::{AdviceProvider, AdviceRequest};
use crate::config::{resolve_secret, AdvisoryConfig};
use crate::error::{AdvisoryError, AdvisoryResult};
use crate::phase::Phase;
use reqwest::blocking::Client as HttpClient;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a facilitator for a small group conversation. \
Reply with a single friendly sentence of at most 25 words. No lists, no quotes.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug)]
pub struct OpenAiAdviceProvider {
    api_url: String,
    api_key: String,
    model: String,
    client: HttpClient,
}

impl OpenAiAdviceProvider {
    pub fn from_config(config: &AdvisoryConfig) -> AdvisoryResult<Self> {
        if !config.enabled {
            return Err(AdvisoryError::Disabled);
        }

        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: resolve_secret(&config.api_key),
            model: config.model.clone(),
            client,
        })
    }

    fn build_request(&self, request: &AdviceRequest) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(request),
                },
            ],
            max_tokens: 60,
            temperature: 0.7,
        }
    }
}

fn user_prompt(request: &AdviceRequest) -> String {
    let situation = match request.phase {
        Phase::Nudge => "one person has been dominating and should be gently encouraged to make room for others",
        Phase::ImbalanceDetected => "the talk time has become uneven",
        Phase::StructuredTurnTaking => "the group is taking strict turns",
        Phase::ReflectionPause => "the group is pausing to reflect",
        Phase::CheckIn => "the group is deciding whether to resume open conversation",
        Phase::Monitoring => "the conversation is flowing freely",
    };
    format!(
        "A group of {} people is talking and {}. Give them one practical tip.",
        request.speaker_count, situation
    )
}

/// Pull the first non-empty message out of a completion
fn extract_advice(response: ChatCompletionResponse) -> AdvisoryResult<String> {
    response
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
        .ok_or(AdvisoryError::EmptyResponse)
}

impl AdviceProvider for OpenAiAdviceProvider {
    fn advise(&self, request: &AdviceRequest) -> AdvisoryResult<String> {
        let url = format!("{}/chat/completions", self.api_url);
        log::debug!("Requesting advice for {:?} from {}", request, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(request))
            .send()?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdvisoryError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdvisoryError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        extract_advice(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiAdviceProvider {
        let config = AdvisoryConfig {
            enabled: true,
            api_url: "http://localhost:9/v1/".to_string(),
            api_key: "sk-local".to_string(),
            ..AdvisoryConfig::default()
        };
        OpenAiAdviceProvider::from_config(&config).unwrap()
    }

    #[test]
    fn test_disabled_config_rejected() {
        let result = OpenAiAdviceProvider::from_config(&AdvisoryConfig::default());
        assert!(matches!(result, Err(AdvisoryError::Disabled)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(provider().api_url, "http://localhost:9/v1");
    }

    #[test]
    fn test_request_body_shape() {
        let provider = provider();
        let request = AdviceRequest { phase: Phase::Nudge, speaker_count: 4 };
        let body = serde_json::to_value(provider.build_request(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        let prompt = body["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.contains("4 people"));
        assert!(prompt.contains("dominating"));
    }

    #[test]
    fn test_extract_first_non_empty_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [
                {"message": {"role": "assistant", "content": "   "}},
                {"message": {"role": "assistant", "content": " Ask Ben what he thinks. "}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_advice(response).unwrap(), "Ask Ben what he thinks.");
    }

    #[test]
    fn test_extract_empty_response() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(extract_advice(response), Err(AdvisoryError::EmptyResponse)));

        let null_content: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(extract_advice(null_content), Err(AdvisoryError::EmptyResponse)));
    }
}
