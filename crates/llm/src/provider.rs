use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sampling parameters shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// Error type for text generation.
///
/// Variants are distinguishable so callers can log and retry per class:
/// only `Unavailable` is ever retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Model or service is warming up (HTTP 503).
    #[error("provider unavailable: {message}")]
    Unavailable {
        message: String,
        /// Provider-estimated time until the model is ready.
        retry_after: Option<Duration>,
    },
    #[error("credential rejected: {0}")]
    AuthFailed(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Malformed, unexpected, or error-shaped response.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Coarse error classes used for logging and operator alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Auth,
    Protocol,
}

impl GenerationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Unavailable { .. } | Self::Timeout(_) | Self::Network(_) => ErrorClass::Transient,
            Self::AuthFailed(_) => ErrorClass::Auth,
            Self::Protocol(_) => ErrorClass::Protocol,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into(), retry_after: None }
    }
}

/// A remote free-text generator (OpenRouter, Hugging Face inference, ...).
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for Arc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        (**self).generate(prompt)
    }
}

/// Scripted generator for testing. Replays queued outcomes in order.
/// Once the script runs out, every call returns a protocol error.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same text.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_outcome(&self) -> Result<String, GenerationError> {
        let Ok(mut script) = self.script.lock() else {
            return Err(GenerationError::Protocol("script poisoned".into()));
        };
        // A single remaining Ok entry is sticky so `replying` answers forever.
        match script.len() {
            0 => Err(GenerationError::Protocol("script exhausted".into())),
            1 if script.front().is_some_and(|r| r.is_ok()) => script[0].clone(),
            _ => script.pop_front().unwrap_or_else(|| Err(GenerationError::Protocol("script exhausted".into()))),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_owned());
        }
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}
