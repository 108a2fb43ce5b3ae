//! Deterministic explanations used whenever generation is off, fails, or is
//! rejected. No I/O, no failure modes.

use crate::confidence::{self, ToneBucket};
use crate::emotion::EmotionLabel;

/// Hand-written explanation paragraph per emotion.
pub fn base_explanation(label: EmotionLabel) -> &'static str {
    match label {
        EmotionLabel::Happy => {
            "Ce douaa vous aide à exprimer votre gratitude envers Allah et à maintenir cette sensation de paix intérieure. \
             Il renforce votre connexion spirituelle, vous rappelle que le bonheur véritable vient de la foi, \
             et vous permet de savourer pleinement ce moment de joie tout en restant humble."
        }
        EmotionLabel::Sad => {
            "Ce douaa vous apporte réconfort et apaisement dans les moments difficiles. \
             Il vous rappelle que vous n'êtes jamais seul, qu'Allah est toujours avec vous, \
             et que la patience (sabr) et la foi peuvent transformer la tristesse en force intérieure et en rapprochement spirituel."
        }
        EmotionLabel::Angry => {
            "Ce douaa vous aide à calmer votre colère et à retrouver votre sérénité. \
             Il vous guide vers la patience, le pardon et la compréhension, transformant les émotions négatives en énergie positive. \
             La maîtrise de soi dans la colère est une forme de force spirituelle."
        }
        EmotionLabel::Fear => {
            "Ce douaa vous apporte protection divine et courage face à vos peurs. \
             Il renforce votre confiance en Allah, vous rappelle que vous avez la force intérieure nécessaire pour surmonter vos craintes, \
             et que la foi est le meilleur remède contre l'anxiété."
        }
        EmotionLabel::Neutral => {
            "Ce douaa vous aide à maintenir votre équilibre émotionnel et votre paix intérieure. \
             Il renforce votre connexion spirituelle avec Allah, vous permet de rester centré dans le moment présent, \
             et cultive un état de sérénité et de gratitude constante."
        }
        EmotionLabel::Surprised => {
            "Ce douaa vous aide à accueillir l'inattendu avec sérénité et gratitude. \
             Il vous rappelle que tout ce qui arrive est par la volonté d'Allah, \
             et vous guide pour transformer la surprise en opportunité de croissance spirituelle et de renforcement de votre foi."
        }
        EmotionLabel::Anxious => {
            "Ce douaa vous apporte calme et tranquillité dans les moments d'anxiété. \
             Il vous aide à lâcher prise, à faire confiance en Allah, et à vous rappeler que Lui seul contrôle l'avenir. \
             La récitation régulière réduit le stress et apporte la paix du cœur."
        }
        EmotionLabel::Excited => {
            "Ce douaa vous aide à canaliser votre enthousiasme de manière positive et spirituelle. \
             Il vous rappelle de rester humble dans la joie, de partager votre bonheur avec gratitude, \
             et de diriger votre énergie vers des actions qui plaisent à Allah."
        }
        EmotionLabel::Lonely => {
            "Ce douaa vous rappelle que vous êtes toujours accompagné spirituellement par Allah. \
             Il vous apporte réconfort, vous aide à ressentir la présence divine dans votre vie, \
             et transforme la solitude en moment privilégié de connexion spirituelle et de méditation."
        }
        EmotionLabel::Grateful => {
            "Ce douaa renforce votre sentiment de gratitude envers Allah et vous aide à exprimer votre reconnaissance pour Ses innombrables bienfaits. \
             Il vous permet de savourer pleinement les bénédictions de votre vie \
             et vous rappelle que la gratitude attire davantage de bénédictions."
        }
        EmotionLabel::Hopeful => {
            "Ce douaa renforce votre espoir et votre foi en l'avenir. \
             Il vous rappelle qu'Allah a un plan pour chacun, que chaque jour apporte de nouvelles possibilités, \
             et que la patience et la confiance en Lui portent toujours leurs fruits."
        }
    }
}

/// Lead sentence plus the emotion's paragraph.
///
/// Unknown labels get the neutral paragraph but keep their own name in the
/// lead sentence.
pub fn explain(emotion: &str, confidence_pct: Option<f32>) -> String {
    let parsed = EmotionLabel::parse(emotion);
    let base = base_explanation(parsed.unwrap_or(EmotionLabel::Neutral));

    let raw_name = emotion.trim().to_lowercase();
    let emotion_fr = match parsed {
        Some(label) => label.french().to_owned(),
        None if raw_name.is_empty() => EmotionLabel::Neutral.french().to_owned(),
        None => raw_name,
    };
    let conf_text = confidence_pct
        .map(confidence::format_percent)
        .unwrap_or_else(|| "confiance non précisée".to_owned());
    let tone = ToneBucket::from_percent(confidence_pct).label();
    let signal = confidence::signal_strength(confidence_pct);

    format!(
        "Je perçois surtout de la {emotion_fr} ({conf_text}). \
         Le ton reste {tone} car le signal est {signal}. \
         {base}"
    )
}
