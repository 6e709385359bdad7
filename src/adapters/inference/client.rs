//! Inference service client
//!
//! Sends batches of staged member documents to a chat-completions
//! endpoint and parses suspect condition candidates out of the reply.
//! A reply that does not conform to the expected JSON shape yields an
//! empty result for the batch rather than aborting the run.

use crate::config::InferenceConfig;
use crate::domain::errors::InferenceError;
use crate::domain::suspect::{parse_suspects, Suspect};
use crate::domain::Result;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// System prompt sent with every inference request.
///
/// The contract with the model is a bare JSON array: no prose, no code
/// fences, one element per suspected condition.
const SYSTEM_PROMPT: &str = "You are a clinical assistant.";

/// Instructions prepended to every batch of member documents.
///
/// The contract with the model is a bare JSON array: no prose, no code
/// fences, one element per suspected condition.
const SUSPECT_PROMPT: &str = r#"Identify possible 'suspects' (undiagnosed or missing chronic conditions)
for the following members using their medical claims, pharmacy claims, and eligibility data.

Return results in JSON exactly like this, with no markdown and no commentary:
[
  {
    "memberId": "...",
    "suspectType": "...",
    "suspectDiagnosis": {
      "code": "...",
      "description": "...",
      "hccCategory": "..."
    },
    "confidenceScore": 0.85,
    "priority": "...",
    "evidence": {
      "summary": "...",
      "details": ["...", "..."]
    },
    "suggestedAction": "..."
  }
]

If no suspects are found, return [].

Members: "#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Client for the suspect-inference service
pub struct InferenceClient {
    client: Client,
    config: InferenceConfig,
}

impl InferenceClient {
    /// Create a new inference client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| InferenceError::RequestFailed(format!("Failed to build client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Infer suspect conditions for a batch of staged member documents
    ///
    /// # Arguments
    ///
    /// * `documents` - Staged member documents to analyze
    ///
    /// # Returns
    ///
    /// Returns the suspects the service identified. A syntactically
    /// invalid reply is logged and treated as no suspects for the batch.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures, authentication failures,
    /// and server errors.
    pub async fn infer_suspects(&self, documents: &[Value]) -> Result<Vec<Suspect>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::to_string(documents)
            .map_err(|e| InferenceError::InvalidResponse(format!("Unserializable input: {e}")))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{SUSPECT_PROMPT}{payload}"),
                },
            ],
            temperature: 0.0,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret().as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(e.to_string())
                } else {
                    InferenceError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(InferenceError::AuthenticationFailed(format!(
                "Service rejected credentials with status {status}"
            ))
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::ServerError {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| InferenceError::InvalidResponse("Response had no choices".to_string()))?;

        match parse_suspects(content) {
            Ok(suspects) => {
                tracing::debug!(
                    documents = documents.len(),
                    suspects = suspects.len(),
                    "Inference batch complete"
                );
                Ok(suspects)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Inference reply was not a valid suspect array, treating batch as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Model identifier this client is configured for
    pub fn model(&self) -> &str {
        &self.config.model
    }
}
