use serde::{Deserialize, Serialize};

/// Canonical emotion categories known to the content store and fallback texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Fear,
    Neutral,
    Surprised,
    Anxious,
    Excited,
    Lonely,
    Grateful,
    Hopeful,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 11] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Fear,
        Self::Neutral,
        Self::Surprised,
        Self::Anxious,
        Self::Excited,
        Self::Lonely,
        Self::Grateful,
        Self::Hopeful,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fear => "fear",
            Self::Neutral => "neutral",
            Self::Surprised => "surprised",
            Self::Anxious => "anxious",
            Self::Excited => "excited",
            Self::Lonely => "lonely",
            Self::Grateful => "grateful",
            Self::Hopeful => "hopeful",
        }
    }

    /// French noun used in prompts and fallback texts.
    pub fn french(self) -> &'static str {
        match self {
            Self::Happy => "joie",
            Self::Sad => "tristesse",
            Self::Angry => "colère",
            Self::Fear => "peur",
            Self::Neutral => "calme",
            Self::Surprised => "surprise",
            Self::Anxious => "anxiété",
            Self::Excited => "excitation",
            Self::Lonely => "solitude",
            Self::Grateful => "gratitude",
            Self::Hopeful => "espoir",
        }
    }

    /// Exact (case-insensitive) match against the canonical names.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|label| label.as_str() == lowered)
    }

    /// Canonical label, with unknown input mapped to `Neutral`.
    pub fn from_label(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Neutral)
    }

    /// Content-store key for a raw classifier label.
    ///
    /// Accepts the canonical names plus the classifier's own vocabulary
    /// (`surprise`, `disgust`, `contempt`). Anything else is `Neutral`.
    pub fn content_key(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "surprise" => Self::Surprised,
            "disgust" | "contempt" => Self::Sad,
            other => Self::parse(other).unwrap_or(Self::Neutral),
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(EmotionLabel::parse("SAD"), Some(EmotionLabel::Sad));
        assert_eq!(EmotionLabel::parse("  Hopeful "), Some(EmotionLabel::Hopeful));
        assert_eq!(EmotionLabel::parse("bored"), None);
    }

    #[test]
    fn unknown_labels_map_to_neutral() {
        for raw in ["bored", "", "   ", "joy", "sadness", "colère"] {
            assert_eq!(EmotionLabel::from_label(raw), EmotionLabel::Neutral, "{raw}");
            assert_eq!(EmotionLabel::content_key(raw), EmotionLabel::Neutral, "{raw}");
        }
    }

    #[test]
    fn classifier_aliases() {
        assert_eq!(EmotionLabel::content_key("Surprise"), EmotionLabel::Surprised);
        assert_eq!(EmotionLabel::content_key("disgust"), EmotionLabel::Sad);
        assert_eq!(EmotionLabel::content_key("CONTEMPT"), EmotionLabel::Sad);
        assert_eq!(EmotionLabel::content_key("fear"), EmotionLabel::Fear);
    }

    #[test]
    fn every_label_round_trips_through_its_name() {
        for label in EmotionLabel::ALL {
            assert_eq!(EmotionLabel::from_label(label.as_str()), label);
            assert_eq!(EmotionLabel::content_key(label.as_str()), label);
        }
    }
}
