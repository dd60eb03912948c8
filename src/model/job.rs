//! Job description requirements as produced by the job parsing collaborator

use crate::error::{Result, RelevanceError};
use crate::model::resume::DegreeLevel;
use serde::{Deserialize, Serialize};

/// Validated, read-only job requirements.
///
/// Construction goes through [`JobDescriptionBuilder`] or serde; both reject
/// invalid requirements so the engine never sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JobDescriptionFields")]
pub struct ParsedJobDescription {
    raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    required_skills: Vec<String>,
    preferred_skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_degree: Option<DegreeLevel>,
    required_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_years_experience: Option<f32>,
}

/// Unvalidated job description fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDescriptionFields {
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_degree: Option<DegreeLevel>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub min_years_experience: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct JobDescriptionBuilder {
    fields: JobDescriptionFields,
}

impl TryFrom<JobDescriptionFields> for ParsedJobDescription {
    type Error = RelevanceError;

    fn try_from(fields: JobDescriptionFields) -> Result<Self> {
        if let Some(years) = fields.min_years_experience {
            if !years.is_finite() || years < 0.0 {
                return Err(RelevanceError::InvalidInput(format!(
                    "Minimum years of experience must be a non-negative number, got {}",
                    years
                )));
            }
        }

        let clean = |values: Vec<String>| -> Vec<String> {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        };

        Ok(Self {
            raw_text: fields.raw_text,
            title: fields
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            required_skills: clean(fields.required_skills),
            preferred_skills: clean(fields.preferred_skills),
            // "none" is the same as no requirement
            min_degree: fields.min_degree.filter(|d| *d != DegreeLevel::None),
            required_fields: clean(fields.required_fields),
            min_years_experience: fields.min_years_experience,
        })
    }
}

impl ParsedJobDescription {
    pub fn builder(raw_text: impl Into<String>) -> JobDescriptionBuilder {
        JobDescriptionBuilder::new(raw_text)
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn required_skills(&self) -> &[String] {
        &self.required_skills
    }

    pub fn preferred_skills(&self) -> &[String] {
        &self.preferred_skills
    }

    pub fn min_degree(&self) -> Option<DegreeLevel> {
        self.min_degree
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    pub fn min_years_experience(&self) -> Option<f32> {
        self.min_years_experience
    }
}

impl JobDescriptionBuilder {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            fields: JobDescriptionFields {
                raw_text: raw_text.into(),
                ..JobDescriptionFields::default()
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.fields.title = Some(title.into());
        self
    }

    pub fn required_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn preferred_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.preferred_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_degree(mut self, degree: DegreeLevel) -> Self {
        self.fields.min_degree = Some(degree);
        self
    }

    pub fn required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_years_experience(mut self, years: f32) -> Self {
        self.fields.min_years_experience = Some(years);
        self
    }

    pub fn build(self) -> Result<ParsedJobDescription> {
        ParsedJobDescription::try_from(self.fields)
    }
}
