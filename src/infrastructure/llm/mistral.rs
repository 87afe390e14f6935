use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::llm::{
    FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmResponseFormat, Message, Usage,
};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

pub const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai";

const PROVIDER: &str = "mistral";

/// Mistral chat completions provider
#[derive(Debug)]
pub struct MistralProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> MistralProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_MISTRAL_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<MistralMessage<'_>> =
            request.messages.iter().map(MistralMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(top_p) = request.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        if let Some(format) = request.response_format {
            let kind = match format {
                LlmResponseFormat::Text => "text",
                LlmResponseFormat::JsonObject => "json_object",
            };
            body["response_format"] = serde_json::json!({"type": kind});
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: MistralResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::empty_response(PROVIDER))?;

        let content = choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::empty_response(PROVIDER))?;

        let mut llm_response =
            LlmResponse::new(response.id, response.model, Message::assistant(content));

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response = llm_response.with_usage(usage);
        }

        Ok(llm_response)
    }
}

/// Map backend rejections of the model name to [`DomainError::ModelUnavailable`]
fn classify_error(error: DomainError, model: &str) -> DomainError {
    match error {
        DomainError::HttpStatus { status, ref body, .. }
            if status == 404 || (status == 400 && mentions_invalid_model(body)) =>
        {
            DomainError::model_unavailable(PROVIDER, model)
        }
        other => other,
    }
}

fn mentions_invalid_model(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("invalid_model") || body.contains("invalid model")
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for MistralProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, &request);

        debug!(
            model = %model,
            messages = request.messages.len(),
            "Calling Mistral chat completions"
        );

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| classify_error(e, model))?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" | "model_length" => FinishReason::Length,
        "tool_calls" => FinishReason::ToolCalls,
        "error" => FinishReason::Error,
        _ => FinishReason::Stop,
    }
}

// Mistral API types

#[derive(Debug, Serialize)]
struct MistralMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> MistralMessage<'a> {
    fn from_domain(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content_text().unwrap_or(""),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MistralResponse {
    id: String,
    model: String,
    choices: Vec<MistralChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct MistralChoice {
    message: MistralResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MistralResponseMessage {
    content: Option<String>,
}
