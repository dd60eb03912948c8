//! The engine's only output

use crate::config::ScoringWeights;
use crate::model::signal::{MatchSignal, SignalKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EvaluationStatus {
    Complete,
    /// Computed with some signals unavailable and their weight redistributed
    Degraded { unavailable: Vec<SignalKind> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 0..=100
    pub overall_score: u8,
    pub verdict: Verdict,
    pub status: EvaluationStatus,
    /// Weights actually applied, after any redistribution
    pub applied_weights: ScoringWeights,
    pub hard_match: MatchSignal,
    pub semantic: MatchSignal,
    pub education: MatchSignal,
    pub experience: MatchSignal,
    pub missing_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub processing_time_ms: u64,
}

impl Verdict {
    /// Boundaries are inclusive on the lower edge of each tier
    pub fn from_score(overall: u8, high_threshold: u8, medium_threshold: u8) -> Self {
        if overall >= high_threshold {
            Verdict::High
        } else if overall >= medium_threshold {
            Verdict::Medium
        } else {
            Verdict::Low
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::High => write!(f, "High"),
            Verdict::Medium => write!(f, "Medium"),
            Verdict::Low => write!(f, "Low"),
        }
    }
}

impl EvaluationResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, EvaluationStatus::Degraded { .. })
    }

    pub fn signals(&self) -> [&MatchSignal; 4] {
        [&self.hard_match, &self.semantic, &self.education, &self.experience]
    }
}
