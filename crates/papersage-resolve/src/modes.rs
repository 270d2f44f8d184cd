//! Retrieval modes and their index parameters.

use std::str::FromStr;

use papersage_core::Error;
use papersage_store::SearchParams;
use serde::{Deserialize, Serialize};

/// Speed/accuracy trade-off of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// int8 candidate scoring only.
    Fast,
    /// int8 candidates, 2x oversampled, re-scored in full precision.
    #[default]
    Balanced,
    /// Full-precision scoring of every point.
    Quality,
}

impl SearchMode {
    /// Comparison and escalation order.
    pub const ALL: [SearchMode; 3] = [Self::Fast, Self::Balanced, Self::Quality];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Quality => "quality",
        }
    }

    pub fn search_params(&self) -> SearchParams {
        match self {
            Self::Fast => SearchParams::quantized(1.0, false),
            Self::Balanced => SearchParams::quantized(2.0, true),
            Self::Quality => SearchParams::exact(),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown search mode '{}' (expected fast, balanced or quality)",
                    s
                ))
            })
    }
}
