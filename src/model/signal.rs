//! Per-matcher scores and their explanatory payloads

use crate::model::resume::DegreeLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    HardMatch,
    Semantic,
    Education,
    Experience,
}

/// A scored signal, or the sentinel reported when its backend could not run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SignalStatus {
    Scored { score: f32 },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSignal {
    pub kind: SignalKind,
    pub status: SignalStatus,
    pub detail: SignalDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalDetail {
    Hard(HardMatchDetail),
    Semantic(SemanticDetail),
    Education(EducationDetail),
    Experience(ExperienceDetail),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub required: String,
    pub matched: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardMatchDetail {
    pub tfidf_score: f32,
    pub skill_score: f32,
    pub matched_required: Vec<SkillMatch>,
    /// In job order, canonical form
    pub missing_required: Vec<String>,
    /// Informational only, not scored
    pub matched_preferred: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticDetail {
    pub backend: Option<String>,
    pub resume_chunks: usize,
    pub job_chunks: usize,
    pub cache_hits: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationDetail {
    pub level_component: f32,
    pub field_component: f32,
    pub detected_degree: DegreeLevel,
    pub required_degree: Option<DegreeLevel>,
    pub unmet_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceDetail {
    pub years_component: f32,
    pub title_component: f32,
    pub total_years: f32,
    pub required_years: Option<f32>,
    pub shortfall_years: f32,
    pub best_title_match: Option<String>,
}

/// Clamp into [0, 1], mapping NaN and infinities to 0
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl MatchSignal {
    pub fn scored(kind: SignalKind, score: f32, detail: SignalDetail) -> Self {
        Self {
            kind,
            status: SignalStatus::Scored {
                score: clamp_unit(score),
            },
            detail,
        }
    }

    pub fn unavailable(kind: SignalKind, reason: impl Into<String>, detail: SignalDetail) -> Self {
        Self {
            kind,
            status: SignalStatus::Unavailable {
                reason: reason.into(),
            },
            detail,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self.status {
            SignalStatus::Scored { score } => Some(score),
            SignalStatus::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.score().is_some()
    }

    pub fn hard_detail(&self) -> Option<&HardMatchDetail> {
        match &self.detail {
            SignalDetail::Hard(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn education_detail(&self) -> Option<&EducationDetail> {
        match &self.detail {
            SignalDetail::Education(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn experience_detail(&self) -> Option<&ExperienceDetail> {
        match &self.detail {
            SignalDetail::Experience(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::HardMatch => write!(f, "Hard match"),
            SignalKind::Semantic => write!(f, "Semantic match"),
            SignalKind::Education => write!(f, "Education"),
            SignalKind::Experience => write!(f, "Experience"),
        }
    }
}
