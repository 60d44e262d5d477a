//! Audience tiers and the result fields they may see.

use serde::{Deserialize, Serialize};

/// Audience tier requesting an audit.
///
/// A persona only selects which fields of a result are exposed; it never
/// changes how numbers are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Scientist,
    Student,
    Public,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Scientist, Persona::Student, Persona::Public];

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "scientist" => Some(Self::Scientist),
            "student" => Some(Self::Student),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scientist => "scientist",
            Self::Student => "student",
            Self::Public => "public",
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::Public
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field of an audit result that can be exposed to a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditField {
    /// Green scores for both years.
    Scores,
    /// Signed score difference.
    Delta,
    /// Mean vegetation index per year.
    MeanIndex,
    /// Index change relative to the baseline mean.
    RelativeChange,
    /// Human-readable gain/loss label.
    ChangeLabel,
    /// Gain/loss/stable fractions and mean per-pixel delta.
    ChangeStatistics,
    /// Full per-pixel change map.
    ChangeMap,
    /// Year-by-year mean index series.
    Trend,
    /// Per-pixel composite and index rasters for a single year.
    Composite,
}

impl AuditField {
    pub const ALL: [AuditField; 9] = [
        AuditField::Scores,
        AuditField::Delta,
        AuditField::MeanIndex,
        AuditField::RelativeChange,
        AuditField::ChangeLabel,
        AuditField::ChangeStatistics,
        AuditField::ChangeMap,
        AuditField::Trend,
        AuditField::Composite,
    ];
}
