//! Explanation pipeline: prompt → generate → sanitize → validate, with the
//! deterministic fallback as the answer to every failure.

use crate::config::{ConfigError, ExplainCfg};
use crate::safety::SafetyPolicy;
use crate::{confidence, fallback, prompt, sanitize};
use sakina_llm::http::HttpGenerator;
use sakina_llm::provider::{ErrorClass, GenerationError, TextGenerator};
use sakina_llm::retry::RetryingGenerator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where an explanation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Generated,
    Fallback,
}

/// Final explanation handed to the caller. Text is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub provenance: Provenance,
}

impl GenerationResult {
    fn fallback(emotion: &str, confidence_pct: Option<f32>) -> Self {
        Self {
            text: fallback::explain(emotion, confidence_pct),
            provenance: Provenance::Fallback,
        }
    }
}

/// Running counters for operators. Not consulted by the pipeline itself.
#[derive(Debug, Default)]
pub struct GenerationStats {
    generated: AtomicU64,
    fallback: AtomicU64,
    auth_failures: AtomicU64,
    protocol_errors: AtomicU64,
    transient_errors: AtomicU64,
    rejections: AtomicU64,
}

/// Point-in-time copy of [`GenerationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub generated: u64,
    pub fallback: u64,
    pub auth_failures: u64,
    pub protocol_errors: u64,
    pub transient_errors: u64,
    pub rejections: u64,
}

impl GenerationStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

/// Long-lived explanation service, built once at startup.
pub struct Explainer {
    /// `None` when generation is disabled.
    generator: Option<Arc<dyn TextGenerator>>,
    policy: SafetyPolicy,
    stats: GenerationStats,
}

impl Explainer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
            policy: SafetyPolicy::default(),
            stats: GenerationStats::default(),
        }
    }

    /// Fallback-only explainer; never touches the network.
    pub fn disabled() -> Self {
        Self {
            generator: None,
            policy: SafetyPolicy::default(),
            stats: GenerationStats::default(),
        }
    }

    /// Build from configuration: resolves the provider once and wraps it
    /// with the retry policy.
    pub fn from_cfg(cfg: &ExplainCfg) -> Result<Self, ConfigError> {
        let Some(selection) = cfg.provider()? else {
            tracing::info!("generation disabled, explanations use fallback text");
            return Ok(Self::disabled());
        };
        tracing::info!(
            provider = selection.name(),
            model = %selection.config().model,
            timeout_secs = cfg.timeout_secs,
            max_retries = cfg.max_retries,
            "explanation generation enabled"
        );
        let http = HttpGenerator::new(selection).map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self::new(Arc::new(RetryingGenerator::new(http, cfg.retry_policy()))))
    }

    pub fn with_policy(mut self, policy: SafetyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Explain how the supporting text helps with `emotion`.
    ///
    /// Never fails: disabled generation, missing supporting text, provider
    /// errors and policy rejections all resolve to the fallback text.
    pub async fn explain(
        &self,
        emotion: &str,
        confidence: Option<f32>,
        supporting_text: Option<&str>,
    ) -> GenerationResult {
        let pct = confidence::to_percent(confidence);
        let result = match self.try_generate(emotion, pct, supporting_text).await {
            Some(text) => {
                bump(&self.stats.generated);
                GenerationResult { text, provenance: Provenance::Generated }
            }
            None => {
                bump(&self.stats.fallback);
                GenerationResult::fallback(emotion, pct)
            }
        };
        tracing::debug!(emotion, provenance = ?result.provenance, "explanation ready");
        result
    }

    async fn try_generate(&self, emotion: &str, pct: Option<f32>, supporting_text: Option<&str>) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let Some(support) = supporting_text.filter(|s| !s.trim().is_empty()) else {
            tracing::info!(emotion, "no supporting text, skipping generation");
            return None;
        };

        let prompt = prompt::build_prompt(emotion, pct);
        let raw = match generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                self.record_failure(generator.name(), &e);
                return None;
            }
        };

        let text = sanitize::sanitize(&raw);
        let verdict = self.policy.check(&text, Some(support));
        if !verdict.is_valid() {
            let rejections = bump(&self.stats.rejections);
            tracing::info!(
                provider = generator.name(),
                reasons = ?verdict.reasons,
                rejections,
                candidate = %text,
                "generated explanation rejected"
            );
            return None;
        }
        Some(text)
    }

    fn record_failure(&self, provider: &str, error: &GenerationError) {
        match error.class() {
            ErrorClass::Auth => {
                let auth_failures = bump(&self.stats.auth_failures);
                tracing::error!(provider, auth_failures, error = %error, "provider rejected credential");
            }
            ErrorClass::Protocol => {
                let protocol_errors = bump(&self.stats.protocol_errors);
                tracing::warn!(
                    provider,
                    protocol_errors,
                    error = %error,
                    provider_drift = true,
                    "unexpected provider response"
                );
            }
            ErrorClass::Transient => {
                let transient_errors = bump(&self.stats.transient_errors);
                tracing::warn!(provider, transient_errors, error = %error, "generation unavailable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sakina_llm::provider::ScriptedGenerator;

    const GOOD: &str = "Cette invocation apaise le cœur. Elle rappelle que la patience transforme la peine.";
    const DOUAA: &str = "Seigneur, accorde-moi la patience";

    fn explainer(script: Vec<Result<String, GenerationError>>) -> (Arc<ScriptedGenerator>, Explainer) {
        let generator = Arc::new(ScriptedGenerator::new(script));
        (generator.clone(), Explainer::new(generator))
    }

    #[tokio::test]
    async fn disabled_uses_fallback() {
        let explainer = Explainer::disabled();
        let result = explainer.explain("sad", Some(0.82), Some(DOUAA)).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(result.text.contains("tristesse"));
        assert!(!explainer.is_enabled());
    }

    #[tokio::test]
    async fn valid_generation_is_returned() {
        let (generator, explainer) = explainer(vec![Ok(format!("  {GOOD}  Troisième. Quatrième."))]);
        let result = explainer.explain("sad", Some(82.0), Some(DOUAA)).await;
        assert_eq!(result.provenance, Provenance::Generated);
        assert_eq!(
            result.text,
            "Cette invocation apaise le cœur. Elle rappelle que la patience transforme la peine. Troisième."
        );
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts()[0].contains("tristesse (confiance: 82.0%)"));
        assert!(!generator.prompts()[0].contains(DOUAA));
        assert_eq!(explainer.stats().generated, 1);
    }

    #[tokio::test]
    async fn missing_supporting_text_skips_generation() {
        let (generator, explainer) = explainer(vec![Ok(GOOD.into())]);
        for support in [None, Some(""), Some("   ")] {
            let result = explainer.explain("happy", None, support).await;
            assert_eq!(result.provenance, Provenance::Fallback);
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn every_error_class_falls_back() {
        for err in [
            GenerationError::unavailable("loading"),
            GenerationError::AuthFailed("401".into()),
            GenerationError::Timeout(std::time::Duration::from_secs(25)),
            GenerationError::Protocol("shape".into()),
            GenerationError::Network("reset".into()),
        ] {
            let (_, explainer) = explainer(vec![Err(err)]);
            let result = explainer.explain("angry", Some(0.6), Some(DOUAA)).await;
            assert_eq!(result.provenance, Provenance::Fallback);
            assert!(result.text.contains("colère"));
        }
    }

    #[tokio::test]
    async fn failures_are_counted_by_class() {
        let (_, explainer) = explainer(vec![
            Err(GenerationError::AuthFailed("401".into())),
            Err(GenerationError::AuthFailed("401".into())),
            Err(GenerationError::Protocol("shape".into())),
            Err(GenerationError::Network("reset".into())),
        ]);
        for _ in 0..4 {
            explainer.explain("sad", None, Some(DOUAA)).await;
        }
        let stats = explainer.stats();
        assert_eq!(stats.auth_failures, 2);
        assert_eq!(stats.protocol_errors, 1);
        assert_eq!(stats.transient_errors, 1);
        assert_eq!(stats.fallback, 4);
    }

    #[tokio::test]
    async fn rejected_output_falls_back() {
        let (_, explainer) = explainer(vec![Ok("Comme dit la sourate, la patience est une lumière.".into())]);
        let result = explainer.explain("sad", None, Some(DOUAA)).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert_eq!(explainer.stats().rejections, 1);
    }

    #[tokio::test]
    async fn echoed_supporting_text_falls_back() {
        let (_, explainer) = explainer(vec![Ok(format!("Répétez: {DOUAA}. Cela apaise profondément le cœur."))]);
        let result = explainer.explain("sad", None, Some(DOUAA)).await;
        assert_eq!(result.provenance, Provenance::Fallback);
    }

    #[tokio::test]
    async fn empty_generation_falls_back() {
        let (_, explainer) = explainer(vec![Ok("   ".into())]);
        let result = explainer.explain("lonely", None, Some(DOUAA)).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(!result.text.is_empty());
    }

    #[test]
    fn provenance_serializes_lowercase() {
        let json = serde_json::to_string(&GenerationResult {
            text: "x".into(),
            provenance: Provenance::Generated,
        })
        .unwrap();
        assert_eq!(json, r#"{"text":"x","provenance":"generated"}"#);
    }

    #[test]
    fn from_cfg_disabled() {
        let cfg = ExplainCfg { enabled: false, ..ExplainCfg::default() };
        assert!(!Explainer::from_cfg(&cfg).unwrap().is_enabled());
    }

    #[test]
    fn from_cfg_without_credential_fails() {
        assert!(matches!(
            Explainer::from_cfg(&ExplainCfg::default()),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[test]
    fn from_cfg_with_key_enables_generation() {
        let cfg = ExplainCfg { openrouter_api_key: "k".into(), ..ExplainCfg::default() };
        assert!(Explainer::from_cfg(&cfg).unwrap().is_enabled());
    }
}
