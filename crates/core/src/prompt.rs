use crate::confidence::{self, ToneBucket};
use crate::emotion::EmotionLabel;

/// Build the generation prompt for an emotion and a normalized confidence.
///
/// The supporting text is never part of the prompt; the model only writes
/// an explanation around it.
pub fn build_prompt(emotion: &str, confidence_pct: Option<f32>) -> String {
    let emotion_fr = EmotionLabel::parse(emotion)
        .map(EmotionLabel::french)
        .unwrap_or("cette émotion");
    let conf_text = confidence_pct
        .map(confidence::format_percent)
        .unwrap_or_else(|| "non précisée".to_owned());
    let tone = ToneBucket::from_percent(confidence_pct).prompt_phrase();

    format!(
        "Génère une explication émotionnelle courte (2-3 phrases) en français uniquement.\n\
         \n\
         Émotion détectée: {emotion_fr} (confiance: {conf_text})\n\
         Ton: {tone}\n\
         \n\
         Instructions:\n\
         - Explique comment cette invocation spirituelle peut aider avec cette émotion\n\
         - Ne cite PAS le douaa, ne génère AUCUN texte sacré\n\
         - Utilise un langage naturel et chaleureux\n\
         - Réponds UNIQUEMENT avec l'explication, sans préambule ni instruction\n\
         \n\
         Explication:"
    )
}
