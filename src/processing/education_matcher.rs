//! Degree level and field-of-study comparison

use crate::error::Result;
use crate::model::signal::{EducationDetail, SignalDetail};
use crate::model::{DegreeLevel, EducationEntry, MatchSignal, ParsedJobDescription, ParsedResume, SignalKind};
use crate::processing::skill_normalizer::{basic_form, phrase_similarity};
use crate::processing::SignalMatcher;
use log::debug;

pub struct EducationMatcher {
    fuzzy_threshold: f32,
}

impl EducationMatcher {
    pub fn new(fuzzy_threshold: f32) -> Self {
        Self { fuzzy_threshold }
    }

    /// 1.0 when the requirement is met or absent, otherwise reduced by the
    /// ordinal gap over the full scale
    pub fn level_component(detected: DegreeLevel, required: Option<DegreeLevel>) -> f32 {
        match required {
            Some(required) if detected < required => {
                let gap = (required.rank() - detected.rank()) as f32;
                (1.0 - gap / DegreeLevel::span() as f32).max(0.0)
            }
            _ => 1.0,
        }
    }

    /// Whether `keyword` is covered by a resume field of study: every keyword
    /// word present, or a fuzzy phrase match
    pub fn field_matches(&self, keyword: &str, field_of_study: &str) -> bool {
        let keyword_form = basic_form(keyword);
        let field_form = basic_form(field_of_study);
        if keyword_form.is_empty() || field_form.is_empty() {
            return false;
        }

        let field_words: Vec<&str> = field_form.split_whitespace().collect();
        keyword_form.split_whitespace().all(|w| field_words.contains(&w))
            || phrase_similarity(&keyword_form, &field_form) >= self.fuzzy_threshold
    }

    pub fn unmet_fields(&self, required_fields: &[String], education: &[EducationEntry]) -> Vec<String> {
        required_fields
            .iter()
            .filter(|keyword| {
                !education
                    .iter()
                    .any(|entry| self.field_matches(keyword, &entry.field_of_study))
            })
            .cloned()
            .collect()
    }

    pub fn score(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> (f32, EducationDetail) {
        let detected_degree = resume.highest_degree();
        let required_degree = job.min_degree();
        let level_component = Self::level_component(detected_degree, required_degree);

        let required_fields = job.required_fields();
        let unmet_fields = self.unmet_fields(required_fields, &resume.education);
        let field_component = if required_fields.is_empty() {
            1.0
        } else {
            (required_fields.len() - unmet_fields.len()) as f32 / required_fields.len() as f32
        };

        debug!(
            "Education: detected={} required={:?} level={:.2} field={:.2}",
            detected_degree.as_str(),
            required_degree.map(DegreeLevel::as_str),
            level_component,
            field_component
        );

        let detail = EducationDetail {
            level_component,
            field_component,
            detected_degree,
            required_degree,
            unmet_fields,
        };

        ((level_component + field_component) / 2.0, detail)
    }
}

impl SignalMatcher for EducationMatcher {
    fn kind(&self) -> SignalKind {
        SignalKind::Education
    }

    fn evaluate(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> Result<MatchSignal> {
        let (score, detail) = self.score(resume, job);
        Ok(MatchSignal::scored(SignalKind::Education, score, SignalDetail::Education(detail)))
    }
}
