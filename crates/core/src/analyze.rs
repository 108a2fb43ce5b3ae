//! Image analysis: classify → map to content key → fetch grounding content →
//! explain. Classification and content storage are injected collaborators.

use crate::ayah;
use crate::emotion::EmotionLabel;
use crate::explain::{Explainer, GenerationResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, thiserror::Error)]
#[error("classification failed: {0}")]
pub struct ClassifyError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("content store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("classifier task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Blocking image → emotion model. Runs on the blocking thread pool.
pub trait Classifier: Send + Sync + 'static {
    fn classify(&self, image: &[u8]) -> Result<Classification, ClassifyError>;
}

/// Content fetched for one emotion key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionContent {
    pub douaa: Option<String>,
    pub ayah: Option<String>,
}

#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn lookup(&self, key: EmotionLabel) -> Result<EmotionContent, StoreError>;

    /// Every emotion key that has content.
    async fn available_keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Result of a full analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub request_id: Uuid,
    pub emotion: String,
    pub confidence: Option<f32>,
    pub content_key: EmotionLabel,
    pub douaa: Option<String>,
    pub ayah_text: Option<String>,
    pub ayah_reference: Option<String>,
    pub explanation: GenerationResult,
}

/// Process-scoped analysis service. Constructed once and shared by handle.
pub struct Analyzer {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn ContentStore>,
    explainer: Arc<Explainer>,
    /// Keys known to the store, fetched on first use and kept until restart.
    /// Two concurrent first requests may both fetch; the second `set` is
    /// simply ignored.
    available_keys: OnceLock<Vec<String>>,
}

impl Analyzer {
    pub fn new(classifier: Arc<dyn Classifier>, store: Arc<dyn ContentStore>, explainer: Arc<Explainer>) -> Self {
        Self {
            classifier,
            store,
            explainer,
            available_keys: OnceLock::new(),
        }
    }

    pub fn explainer(&self) -> &Explainer {
        &self.explainer
    }

    pub async fn analyze(&self, image: Vec<u8>) -> Result<Analysis, AnalyzeError> {
        let request_id = Uuid::new_v4();

        let classifier = self.classifier.clone();
        let classification = tokio::task::spawn_blocking(move || classifier.classify(&image)).await??;
        let content_key = EmotionLabel::content_key(&classification.label);
        tracing::debug!(
            %request_id,
            label = %classification.label,
            confidence = ?classification.confidence,
            %content_key,
            "image classified"
        );

        let content = self.fetch_content(request_id, content_key).await;
        let ayah = content.ayah.as_deref().map(ayah::parse).unwrap_or_default();
        // Explain against the canonical key so classifier aliases get their own wording.
        let explanation = self
            .explainer
            .explain(content_key.as_str(), classification.confidence, content.douaa.as_deref())
            .await;

        Ok(Analysis {
            request_id,
            emotion: classification.label,
            confidence: classification.confidence,
            content_key,
            douaa: content.douaa,
            ayah_text: ayah.text,
            ayah_reference: ayah.reference,
            explanation,
        })
    }

    /// Store failures degrade to empty content; the explanation then falls back.
    async fn fetch_content(&self, request_id: Uuid, key: EmotionLabel) -> EmotionContent {
        if let Some(keys) = self.known_keys().await {
            if !keys.is_empty() && !keys.iter().any(|k| k == key.as_str()) {
                tracing::warn!(%request_id, %key, "no content stored for emotion key");
                return EmotionContent::default();
            }
        }
        match self.store.lookup(key).await {
            Ok(content) => {
                if content.douaa.is_none() {
                    tracing::warn!(%request_id, %key, "no douaa found");
                }
                if content.ayah.is_none() {
                    tracing::warn!(%request_id, %key, "no ayah found");
                }
                content
            }
            Err(e) => {
                tracing::warn!(%request_id, %key, error = %e, "content lookup failed");
                EmotionContent::default()
            }
        }
    }

    async fn known_keys(&self) -> Option<&[String]> {
        if let Some(keys) = self.available_keys.get() {
            return Some(keys.as_slice());
        }
        match self.store.available_keys().await {
            Ok(keys) => {
                if keys.is_empty() {
                    tracing::warn!("content store reports no emotion keys");
                } else {
                    tracing::debug!(?keys, "cached available emotion keys");
                }
                let _ = self.available_keys.set(keys);
                self.available_keys.get().map(Vec::as_slice)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list emotion keys");
                None
            }
        }
    }
}
