//! Relevance scoring: matchers, their building blocks and the aggregator

pub mod aggregator;
pub mod chunker;
pub mod education_matcher;
pub mod embedding_manager;
pub mod embeddings;
pub mod experience_matcher;
pub mod hard_matcher;
pub mod semantic_matcher;
pub mod skill_extractor;
pub mod skill_normalizer;
pub mod text_processor;
pub mod tfidf;

use crate::error::Result;
use crate::model::{MatchSignal, ParsedJobDescription, ParsedResume, SignalKind};

/// A scoring policy that turns a resume/job pair into one signal.
///
/// Matchers are pure given their inputs and safe to share across threads.
pub trait SignalMatcher: Send + Sync {
    fn kind(&self) -> SignalKind;

    fn evaluate(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> Result<MatchSignal>;
}
