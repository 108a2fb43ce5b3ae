//! Confidence normalization and tone buckets.
//!
//! Classifiers report confidence either as a fraction in [0,1] or as a
//! percentage in [0,100]. Values `<= 1` are read as fractions. This cannot
//! tell a 1% percentage from a 100% fraction; callers that know their scale
//! should build a [`Confidence`] explicitly instead.

use serde::{Deserialize, Serialize};

const PRUDENT_BELOW: f32 = 55.0;
const CONFIDENT_FROM: f32 = 80.0;

/// Normalize a raw score to a percentage.
pub fn to_percent(raw: Option<f32>) -> Option<f32> {
    raw.map(|v| Confidence::from_raw(v).percent())
}

/// Confidence with an explicit scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    Fraction(f32),
    Percent(f32),
}

impl Confidence {
    /// Guess the scale of an unlabeled score.
    pub fn from_raw(v: f32) -> Self {
        if v <= 1.0 { Self::Fraction(v) } else { Self::Percent(v) }
    }

    pub fn percent(self) -> f32 {
        match self {
            Self::Fraction(v) => v * 100.0,
            Self::Percent(v) => v,
        }
    }
}

/// Qualitative confidence tier controlling phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneBucket {
    Prudent,
    AffirmedButNuanced,
    Confident,
}

impl ToneBucket {
    /// Bucket for a percentage; absent confidence is `Prudent`.
    pub fn from_percent(pct: Option<f32>) -> Self {
        match pct {
            Some(p) if p >= CONFIDENT_FROM => Self::Confident,
            Some(p) if p >= PRUDENT_BELOW => Self::AffirmedButNuanced,
            _ => Self::Prudent,
        }
    }

    /// Tone instruction given to the model.
    pub fn prompt_phrase(self) -> &'static str {
        match self {
            Self::Prudent => "prudent et nuancé",
            Self::AffirmedButNuanced => "affirmé mais nuancé",
            Self::Confident => "confiant",
        }
    }

    /// Tone named in the fallback lead sentence.
    pub fn label(self) -> &'static str {
        match self {
            Self::Prudent => "prudent",
            Self::AffirmedButNuanced => "affirmé mais nuancé",
            Self::Confident => "confiant",
        }
    }
}

/// Signal strength wording for the fallback lead sentence.
pub fn signal_strength(pct: Option<f32>) -> &'static str {
    match pct {
        None => "non précisé",
        Some(_) => match ToneBucket::from_percent(pct) {
            ToneBucket::Prudent => "modéré",
            ToneBucket::AffirmedButNuanced => "assez clair",
            ToneBucket::Confident => "net",
        },
    }
}

/// `82.0%`-style rendering.
pub fn format_percent(pct: f32) -> String {
    format!("{pct:.1}%")
}
