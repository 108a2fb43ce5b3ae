use clap::{Parser, Subcommand};
use sakina_core::config::ExplainCfg;
use sakina_core::explain::Explainer;
use sakina_core::safety::SafetyPolicy;
use sakina_core::{confidence, fallback, sanitize};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sakina", version, about = "Emotion-aware spiritual explanations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain how the supporting text helps with an emotion (generated or fallback)
    Explain {
        /// Emotion label (e.g. "sad", "happy")
        #[arg(long)]
        emotion: String,
        /// Confidence, either in [0,1] or in [0,100]
        #[arg(long)]
        confidence: Option<f32>,
        /// Douaa used as grounding context
        #[arg(long)]
        supporting_text: Option<String>,
    },
    /// Run sanitizer and safety policy on a candidate explanation
    Check {
        #[arg(long)]
        text: String,
        /// Douaa the text must not echo
        #[arg(long)]
        supporting_text: Option<String>,
    },
    /// Print the deterministic fallback explanation
    Fallback {
        #[arg(long)]
        emotion: String,
        #[arg(long)]
        confidence: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explain { emotion, confidence, supporting_text } => {
            // Misconfiguration fails here, before any request is made.
            let cfg = ExplainCfg::from_env();
            let explainer = Explainer::from_cfg(&cfg)?;

            let request = explainer.explain(&emotion, confidence, supporting_text.as_deref());
            tokio::select! {
                result = request => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("interrupted, abandoning explanation");
                }
            }
        }
        Commands::Check { text, supporting_text } => {
            let sanitized = sanitize::sanitize(&text);
            let verdict = SafetyPolicy::default().check(&sanitized, supporting_text.as_deref());
            let out = json!({
                "sanitized": sanitized,
                "valid": verdict.is_valid(),
                "reasons": verdict.reasons,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Fallback { emotion, confidence } => {
            println!("{}", fallback::explain(&emotion, confidence::to_percent(confidence)));
        }
    }

    Ok(())
}
