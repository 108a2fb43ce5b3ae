//! HTTP-based text generators.
//!
//! Two interchangeable backends: OpenRouter's chat-completions API (primary)
//! and the Hugging Face inference API (secondary). Which one is used is
//! decided once, at startup, by [`ProviderSelection`].

use crate::provider::{GenerationError, SamplingParams, TextGenerator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct:free";
pub const HF_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// Max characters of an error body kept in diagnostics.
const ERROR_BODY_LIMIT: usize = 300;

pub fn hf_model_url(model: &str) -> String {
    format!("https://api-inference.huggingface.co/models/{model}")
}

/// Endpoint, credential and model of one provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

// Keep the credential out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Provider resolved once at startup. Never re-inspected per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderSelection {
    /// OpenRouter chat-completions.
    Primary(ProviderConfig),
    /// Hugging Face text-generation inference.
    Secondary(ProviderConfig),
}

impl ProviderSelection {
    pub fn config(&self) -> &ProviderConfig {
        match self {
            Self::Primary(cfg) | Self::Secondary(cfg) => cfg,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Primary(_) => "openrouter",
            Self::Secondary(_) => "huggingface",
        }
    }
}

// ── Request types ──

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
}

// ── Response types ──

/// Every successful body shape we accept, plus the error shape.
/// Order matters: serde tries the variants top to bottom.
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerationBody {
    Chat { choices: Vec<ChatChoice> },
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error { error: ApiError },
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiError {
    Message { message: String },
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { message } => f.write_str(message),
            Self::Text(text) => f.write_str(text),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Deserialize)]
struct LoadingBody {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    estimated_time: Option<f64>,
}

fn truncate(text: &str) -> String {
    text.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Extract the generated text from a successful response body.
///
/// Text-generation endpoints echo their input, so `prompt` is stripped
/// from the result when present.
pub fn extract_text(body: &str, prompt: &str) -> Result<String, GenerationError> {
    let parsed: GenerationBody = serde_json::from_str(body)
        .map_err(|_| GenerationError::Protocol(format!("unexpected payload: {}", truncate(body))))?;

    let text = match parsed {
        GenerationBody::Chat { choices } => choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| GenerationError::Protocol("empty choices".into()))?,
        GenerationBody::Batch(items) => items
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| GenerationError::Protocol("empty generation list".into()))?,
        GenerationBody::Single(g) => g.generated_text,
        GenerationBody::Error { error } => {
            return Err(GenerationError::Protocol(format!("provider error: {}", truncate(&error.to_string()))));
        }
    };

    let text = if !prompt.is_empty() && text.contains(prompt) {
        text.replace(prompt, "")
    } else {
        text
    };
    Ok(text.trim().to_owned())
}

/// Map a non-success status and its body to an error class.
pub fn classify_status(status: u16, body: &str) -> GenerationError {
    match status {
        503 => {
            let loading: Option<LoadingBody> = serde_json::from_str(body).ok();
            let message = loading
                .as_ref()
                .and_then(|l| l.error.as_ref())
                .map(|e| truncate(&e.to_string()))
                .unwrap_or_else(|| "model is loading".to_owned());
            let retry_after = loading
                .and_then(|l| l.estimated_time)
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
            GenerationError::Unavailable { message, retry_after }
        }
        401 | 403 => GenerationError::AuthFailed(format!("{status}: {}", truncate(body))),
        _ => GenerationError::Protocol(format!("{status}: {}", truncate(body))),
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout(timeout)
    } else {
        GenerationError::Network(e.to_string())
    }
}

// ── Generator ──

/// HTTP generator bound to exactly one provider.
pub struct HttpGenerator {
    selection: ProviderSelection,
    params: SamplingParams,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(selection: ProviderSelection) -> Result<Self, GenerationError> {
        Self::with_params(selection, SamplingParams::default())
    }

    pub fn with_params(selection: ProviderSelection, params: SamplingParams) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(selection.config().timeout)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        Ok(Self { selection, params, client })
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    /// JSON body for the selected provider.
    fn payload(&self, prompt: &str) -> Result<serde_json::Value, GenerationError> {
        let encoded = match &self.selection {
            ProviderSelection::Primary(cfg) => serde_json::to_value(ChatRequest {
                model: &cfg.model,
                messages: [ChatMessage { role: "user", content: prompt }],
                temperature: self.params.temperature,
                top_p: self.params.top_p,
                max_tokens: self.params.max_tokens,
            }),
            ProviderSelection::Secondary(_) => serde_json::to_value(InferenceRequest {
                inputs: prompt,
                parameters: InferenceParameters {
                    max_new_tokens: self.params.max_tokens,
                    temperature: self.params.temperature,
                    top_p: self.params.top_p,
                },
            }),
        };
        encoded.map_err(|e| GenerationError::Protocol(format!("failed to encode request: {e}")))
    }

    fn request(&self, prompt: &str) -> Result<reqwest::RequestBuilder, GenerationError> {
        let cfg = self.selection.config();
        let payload = self.payload(prompt)?;
        Ok(self.client.post(&cfg.endpoint).bearer_auth(&cfg.api_key).json(&payload))
    }

    async fn call(&self, prompt: &str) -> Result<String, GenerationError> {
        let timeout = self.selection.config().timeout;
        tracing::debug!(provider = self.selection.name(), model = %self.selection.config().model, "calling provider");

        let resp = self.request(prompt)?.send().await.map_err(|e| transport_error(e, timeout))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| transport_error(e, timeout))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }
        extract_text(&body, prompt)
    }
}

impl TextGenerator for HttpGenerator {
    fn name(&self) -> &str {
        self.selection.name()
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(self.call(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            endpoint: endpoint.into(),
            api_key: "sk-secret".into(),
            model: "m".into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[test]
    fn parses_chat_completion_shape() {
        let body = r#"{"id":"x","choices":[{"message":{"role":"assistant","content":"  Une phrase. "}}]}"#;
        assert_eq!(extract_text(body, "prompt").unwrap(), "Une phrase.");
    }

    #[test]
    fn parses_generation_list_shape() {
        let body = r#"[{"generated_text":"Ce moment apaise."}]"#;
        assert_eq!(extract_text(body, "prompt").unwrap(), "Ce moment apaise.");
    }

    #[test]
    fn parses_single_generation_shape() {
        let body = r#"{"generated_text":"Texte seul."}"#;
        assert_eq!(extract_text(body, "prompt").unwrap(), "Texte seul.");
    }

    #[test]
    fn strips_echoed_prompt() {
        let body = r#"[{"generated_text":"Explication:\nLa paix revient."}]"#;
        assert_eq!(extract_text(body, "Explication:").unwrap(), "La paix revient.");
    }

    #[test]
    fn error_body_is_protocol_error() {
        let body = r#"{"error":{"message":"model not found","code":404}}"#;
        let err = extract_text(body, "p").unwrap_err();
        assert!(matches!(err, GenerationError::Protocol(ref m) if m.contains("model not found")));

        let body = r#"{"error":"quota exceeded"}"#;
        assert!(matches!(extract_text(body, "p"), Err(GenerationError::Protocol(_))));
    }

    #[test]
    fn unknown_shapes_are_protocol_errors() {
        for body in [r#"{"foo":1}"#, "[]", r#"{"choices":[]}"#, "not json", "42"] {
            assert!(
                matches!(extract_text(body, "p"), Err(GenerationError::Protocol(_))),
                "body {body} should be rejected"
            );
        }
    }

    #[test]
    fn status_503_carries_estimated_time() {
        let err = classify_status(503, r#"{"error":"Model is loading","estimated_time":12.5}"#);
        assert_eq!(
            err,
            GenerationError::Unavailable {
                message: "Model is loading".into(),
                retry_after: Some(Duration::from_secs_f64(12.5)),
            }
        );
    }

    #[test]
    fn status_503_with_huge_estimate_does_not_panic() {
        let err = classify_status(503, r#"{"error":"Model is loading","estimated_time":1e20}"#);
        assert_eq!(
            err,
            GenerationError::Unavailable { message: "Model is loading".into(), retry_after: None }
        );
        for body in [r#"{"estimated_time":-3}"#, r#"{"estimated_time":0}"#] {
            assert!(matches!(classify_status(503, body), GenerationError::Unavailable { retry_after: None, .. }));
        }
    }

    #[test]
    fn status_503_with_structured_error() {
        let body = r#"{"error":{"message":"Model is loading","code":503},"estimated_time":7}"#;
        assert_eq!(
            classify_status(503, body),
            GenerationError::Unavailable {
                message: "Model is loading".into(),
                retry_after: Some(Duration::from_secs(7)),
            }
        );
    }

    #[test]
    fn chat_request_body() {
        let generator = HttpGenerator::new(ProviderSelection::Primary(cfg(OPENROUTER_URL))).unwrap();
        let body = generator.payload("Explique.").unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "m",
                "messages": [{ "role": "user", "content": "Explique." }],
                "temperature": 0.7f32,
                "top_p": 0.9f32,
                "max_tokens": 150
            })
        );
        assert!(body.get("max_new_tokens").is_none());
    }

    #[test]
    fn inference_request_body() {
        let generator = HttpGenerator::new(ProviderSelection::Secondary(cfg(&hf_model_url(HF_MODEL)))).unwrap();
        let body = generator.payload("Explique.").unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "inputs": "Explique.",
                "parameters": {
                    "max_new_tokens": 150,
                    "temperature": 0.7f32,
                    "top_p": 0.9f32
                }
            })
        );
        assert!(body.get("model").is_none());
    }

    #[test]
    fn status_503_without_body() {
        let err = classify_status(503, "");
        assert!(matches!(err, GenerationError::Unavailable { retry_after: None, .. }));
    }

    #[test]
    fn auth_and_other_statuses() {
        assert!(matches!(classify_status(401, "bad token"), GenerationError::AuthFailed(_)));
        assert!(matches!(classify_status(403, ""), GenerationError::AuthFailed(_)));
        assert!(matches!(classify_status(410, "deprecated"), GenerationError::Protocol(_)));
        assert!(matches!(classify_status(500, "boom"), GenerationError::Protocol(_)));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let GenerationError::Protocol(msg) = classify_status(500, &body) else {
            panic!("expected protocol error");
        };
        assert!(msg.len() < 320);
    }

    #[test]
    fn debug_redacts_credential() {
        let printed = format!("{:?}", ProviderSelection::Primary(cfg(OPENROUTER_URL)));
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn selection_names() {
        let primary = HttpGenerator::new(ProviderSelection::Primary(cfg(OPENROUTER_URL))).unwrap();
        assert_eq!(primary.name(), "openrouter");
        let secondary = HttpGenerator::new(ProviderSelection::Secondary(cfg(&hf_model_url(HF_MODEL)))).unwrap();
        assert_eq!(secondary.name(), "huggingface");
        assert_eq!(
            secondary.selection().config().endpoint,
            "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.1"
        );
    }
}
