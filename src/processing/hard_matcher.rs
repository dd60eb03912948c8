//! Lexical matching: TF-IDF document similarity plus fuzzy skill overlap

use crate::error::Result;
use crate::model::signal::{HardMatchDetail, SignalDetail, SkillMatch};
use crate::model::{MatchSignal, ParsedJobDescription, ParsedResume, SignalKind};
use crate::processing::skill_extractor::SkillExtractor;
use crate::processing::skill_normalizer::{skill_similarity, SkillNormalizer};
use crate::processing::text_processor::TextProcessor;
use crate::processing::tfidf::TfIdfVectorizer;
use crate::processing::SignalMatcher;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

pub struct HardMatcher {
    normalizer: Arc<SkillNormalizer>,
    extractor: Option<Arc<SkillExtractor>>,
    text_processor: Arc<TextProcessor>,
    vectorizer: TfIdfVectorizer,
    fuzzy_threshold: f32,
}

impl HardMatcher {
    pub fn new(
        normalizer: Arc<SkillNormalizer>,
        text_processor: Arc<TextProcessor>,
        ngram_max: usize,
        fuzzy_threshold: f32,
    ) -> Self {
        Self {
            normalizer,
            extractor: None,
            text_processor,
            vectorizer: TfIdfVectorizer::new(ngram_max),
            fuzzy_threshold,
        }
    }

    /// Also credit known skills found in the resume raw text
    pub fn with_extractor(mut self, extractor: Arc<SkillExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Canonical resume skills: parsed list first, then text mentions
    pub fn resume_skills(&self, resume: &ParsedResume) -> Vec<String> {
        let mut skills = self.normalizer.normalize_all(&resume.skills);
        if let Some(extractor) = &self.extractor {
            let mut seen: HashSet<String> = skills.iter().cloned().collect();
            for skill in extractor.extract(&resume.raw_text) {
                if seen.insert(skill.clone()) {
                    skills.push(skill);
                }
            }
        }
        skills
    }

    /// Best resume skill for `required`: exact canonical match, else the
    /// highest fuzzy similarity at or above the threshold
    pub fn find_match(&self, required: &str, resume_skills: &[String]) -> Option<SkillMatch> {
        if resume_skills.iter().any(|s| s == required) {
            return Some(SkillMatch {
                required: required.to_string(),
                matched: required.to_string(),
                similarity: 1.0,
            });
        }

        resume_skills
            .iter()
            .map(|candidate| (candidate, skill_similarity(required, candidate)))
            .filter(|(_, similarity)| *similarity >= self.fuzzy_threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, similarity)| SkillMatch {
                required: required.to_string(),
                matched: candidate.clone(),
                similarity,
            })
    }

    pub fn score(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> (f32, HardMatchDetail) {
        let tfidf_score = self
            .vectorizer
            .similarity(&self.text_processor, &resume.raw_text, job.raw_text());

        let resume_skills = self.resume_skills(resume);
        let required = self.normalizer.normalize_all(job.required_skills());

        let mut matched_required = Vec::new();
        let mut missing_required = Vec::new();
        for skill in &required {
            match self.find_match(skill, &resume_skills) {
                Some(found) => matched_required.push(found),
                None => missing_required.push(skill.clone()),
            }
        }

        let skill_score = if required.is_empty() {
            1.0
        } else {
            matched_required.len() as f32 / required.len() as f32
        };

        let matched_preferred = self
            .normalizer
            .normalize_all(job.preferred_skills())
            .into_iter()
            .filter(|skill| self.find_match(skill, &resume_skills).is_some())
            .collect();

        debug!(
            "Hard match: tfidf={:.3} skills={}/{} missing={:?}",
            tfidf_score,
            matched_required.len(),
            required.len(),
            missing_required
        );

        let detail = HardMatchDetail {
            tfidf_score,
            skill_score,
            matched_required,
            missing_required,
            matched_preferred,
        };

        ((tfidf_score + skill_score) / 2.0, detail)
    }
}

impl SignalMatcher for HardMatcher {
    fn kind(&self) -> SignalKind {
        SignalKind::HardMatch
    }

    fn evaluate(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> Result<MatchSignal> {
        let (score, detail) = self.score(resume, job);
        Ok(MatchSignal::scored(SignalKind::HardMatch, score, SignalDetail::Hard(detail)))
    }
}
