//! Years of experience and role-title relevance

use crate::error::Result;
use crate::model::signal::{ExperienceDetail, SignalDetail};
use crate::model::{ExperienceEntry, MatchSignal, ParsedJobDescription, ParsedResume, SignalKind};
use crate::processing::skill_normalizer::phrase_similarity;
use crate::processing::SignalMatcher;
use chrono::{Datelike, Local, Months, NaiveDate};
use log::debug;
use regex::Regex;

/// Average year length, only used for the days left over after whole months
const DAYS_PER_YEAR: f32 = 365.25;

/// Mentions above this are calendar years, not durations
const MAX_MENTIONED_YEARS: f32 = 60.0;

pub struct ExperienceMatcher {
    /// Closes open-ended ranges; today when unset
    reference_date: Option<NaiveDate>,
    years_regex: Regex,
}

impl ExperienceMatcher {
    pub fn new(reference_date: Option<NaiveDate>) -> Self {
        // "5 years", "5+ yrs", "3-5 years", "2 to 4 years", "1.5 years"
        let years_regex = Regex::new(
            r"(?i)\b(\d+(?:\.\d+)?)\s*(?:(?:to|-|\x{2013})\s*(\d+(?:\.\d+)?)\s*)?\+?\s*(?:years?|yrs?)\b",
        )
        .expect("Invalid years regex");

        Self {
            reference_date,
            years_regex,
        }
    }

    fn reference(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Largest "N years" mention in `text`; ranges count their upper bound
    pub fn mentioned_years(&self, text: &str) -> Option<f32> {
        self.years_regex
            .captures_iter(text)
            .filter_map(|cap| {
                let value = cap.get(2).or_else(|| cap.get(1))?;
                value.as_str().parse::<f32>().ok()
            })
            .filter(|years| years.is_finite() && *years <= MAX_MENTIONED_YEARS)
            .reduce(f32::max)
    }

    /// Union of dated ranges plus undated contributions, in years.
    ///
    /// Overlapping or adjacent ranges are merged before summing so concurrent
    /// roles are counted once. Open ranges close at the reference date.
    pub fn total_years(&self, entries: &[ExperienceEntry]) -> f32 {
        let reference = self.reference();
        let mut intervals: Vec<(NaiveDate, NaiveDate)> = Vec::new();
        let mut undated_years = 0.0f32;

        for entry in entries {
            match entry.start {
                Some(start) => {
                    let end = entry.end.unwrap_or(reference);
                    if end > start {
                        intervals.push((start, end));
                    } else {
                        debug!("Skipping empty or inverted range for {:?}", entry.role_title);
                    }
                }
                None => {
                    let explicit = entry
                        .duration_years
                        .filter(|years| years.is_finite() && *years >= 0.0);
                    undated_years += explicit
                        .or_else(|| self.mentioned_years(&entry.description))
                        .unwrap_or(0.0);
                }
            }
        }

        intervals.sort();
        let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(intervals.len());
        for (start, end) in intervals {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let dated_years: f32 = merged.iter().map(|(start, end)| calendar_years(*start, *end)).sum();
        dated_years + undated_years
    }

    pub fn years_component(total_years: f32, required_years: Option<f32>) -> f32 {
        match required_years {
            Some(required) if required > 0.0 => (total_years / required).min(1.0),
            _ => 1.0,
        }
    }

    /// Best title similarity and the title that produced it
    pub fn best_title_match(&self, target: &str, entries: &[ExperienceEntry]) -> Option<(String, f32)> {
        entries
            .iter()
            .filter(|e| !e.role_title.trim().is_empty())
            .map(|e| (e.role_title.clone(), phrase_similarity(target, &e.role_title)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn score(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> (f32, ExperienceDetail) {
        let total_years = self.total_years(&resume.experience);
        let required_years = job.min_years_experience();
        let years_component = Self::years_component(total_years, required_years);

        let (title_component, best_title_match) = match job.title() {
            None => (1.0, None),
            Some(target) => match self.best_title_match(target, &resume.experience) {
                Some((title, similarity)) => (similarity, Some(title)),
                None => (0.0, None),
            },
        };

        let shortfall_years = required_years
            .map(|required| (required - total_years).max(0.0))
            .unwrap_or(0.0);

        debug!(
            "Experience: total={:.2}y required={:?} years={:.2} title={:.2}",
            total_years, required_years, years_component, title_component
        );

        let detail = ExperienceDetail {
            years_component,
            title_component,
            total_years,
            required_years,
            shortfall_years,
            best_title_match,
        };

        ((years_component + title_component) / 2.0, detail)
    }
}

/// Whole calendar months between the dates, in years, plus the leftover days.
/// Same-day anniversaries give exact years whether or not a Feb 29 falls inside.
fn calendar_years(start: NaiveDate, end: NaiveDate) -> f32 {
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    let months = months.max(0) as u32;

    let anchor = start.checked_add_months(Months::new(months)).unwrap_or(start);
    let leftover_days = (end - anchor).num_days().max(0) as f32;

    months as f32 / 12.0 + leftover_days / DAYS_PER_YEAR
}

impl SignalMatcher for ExperienceMatcher {
    fn kind(&self) -> SignalKind {
        SignalKind::Experience
    }

    fn evaluate(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> Result<MatchSignal> {
        let (score, detail) = self.score(resume, job);
        Ok(MatchSignal::scored(SignalKind::Experience, score, SignalDetail::Experience(detail)))
    }
}
