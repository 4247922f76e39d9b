//! Gemini `generateContent` chat client

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ChatClient, ConversationSession, Role};
use crate::config::{ChatConfig, GenerationConfig};
use crate::{Error, Result};

/// Safety categories the threshold is applied to
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
    safety_settings: Vec<SafetySetting<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Chat client for the Gemini API
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    generation: GenerationConfig,
    safety_threshold: String,
    system_instruction: Option<String>,
    session: ConversationSession,
}

impl GeminiClient {
    /// Create a client with an empty session
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generation: config.generation.clone(),
            safety_threshold: config.safety_threshold.clone(),
            system_instruction: config.system_instruction.clone(),
            session: ConversationSession::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Full history followed by the new user message
    fn build_request<'a>(&'a self, text: &'a str) -> GenerateContentRequest<'a> {
        let mut contents: Vec<Content<'a>> = self
            .session
            .turns()
            .iter()
            .map(|turn| Content {
                role: turn.role.as_str(),
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        contents.push(Content {
            role: Role::User.as_str(),
            parts: vec![Part { text }],
        });

        GenerateContentRequest {
            contents,
            generation_config: &self.generation,
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: &self.safety_threshold,
                })
                .collect(),
            system_instruction: self.system_instruction.as_deref().map(|s| SystemInstruction {
                parts: vec![Part { text: s }],
            }),
        }
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn send(&mut self, text: &str) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            history = self.session.len(),
            "sending chat message"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&self.build_request(text))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request failed");
                e
            })?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(classify_error(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let reply = extract_reply(parsed)?;

        self.session.record_exchange(text, &reply);
        tracing::debug!(reply_len = reply.len(), "chat reply received");
        Ok(reply)
    }

    fn session(&self) -> &ConversationSession {
        &self.session
    }
}

/// Map a non-success response to an error, singling out rate limiting
fn classify_error(status: StatusCode, body: &str) -> Error {
    let api_error = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
    let exhausted = status == StatusCode::TOO_MANY_REQUESTS
        || api_error
            .as_ref()
            .and_then(|e| e.status.as_deref())
            .is_some_and(|s| s == "RESOURCE_EXHAUSTED");

    let message = api_error.map_or_else(|| body.to_string(), |e| e.message);

    if exhausted {
        Error::QuotaExhausted(message)
    } else {
        Error::Chat(format!("Gemini API error {status}: {message}"))
    }
}

/// Concatenate the text parts of the first candidate
fn extract_reply(response: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(Error::Chat(format!("empty response: {reason}")));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "no text".to_string());
        return Err(Error::Chat(format!("empty response: {reason}")));
    }

    Ok(text)
}
