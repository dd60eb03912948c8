//! Resume structures as produced by the document parsing collaborator

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub raw_text: String,
    /// Extracted skill tokens; set semantics once normalized
    #[serde(default)]
    pub skills: Vec<String>,
    /// Best-effort section labels found by the extractor
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: DegreeLevel,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// `None` with a start date means the role is ongoing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_years: Option<f32>,
}

/// Ordinal degree scale: none < high school < associate < bachelor < master < doctorate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DegreeLevel {
    #[default]
    None,
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl ParsedResume {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_education(mut self, entry: EducationEntry) -> Self {
        self.education.push(entry);
        self
    }

    pub fn with_experience(mut self, entry: ExperienceEntry) -> Self {
        self.experience.push(entry);
        self
    }

    /// Highest degree across all education entries
    pub fn highest_degree(&self) -> DegreeLevel {
        self.education
            .iter()
            .map(|e| e.degree)
            .max()
            .unwrap_or_default()
    }
}

impl EducationEntry {
    pub fn new(degree: DegreeLevel, field_of_study: impl Into<String>) -> Self {
        Self {
            degree,
            field_of_study: field_of_study.into(),
            institution: None,
        }
    }
}

impl ExperienceEntry {
    pub fn dated(role_title: impl Into<String>, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            role_title: role_title.into(),
            start: Some(start),
            end,
            ..Self::default()
        }
    }

    pub fn with_duration(role_title: impl Into<String>, years: f32) -> Self {
        Self {
            role_title: role_title.into(),
            duration_years: Some(years),
            ..Self::default()
        }
    }
}

impl DegreeLevel {
    pub const ALL: [DegreeLevel; 6] = [
        DegreeLevel::None,
        DegreeLevel::HighSchool,
        DegreeLevel::Associate,
        DegreeLevel::Bachelor,
        DegreeLevel::Master,
        DegreeLevel::Doctorate,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Number of steps between the lowest and highest level
    pub fn span() -> u8 {
        DegreeLevel::Doctorate.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DegreeLevel::None => "none",
            DegreeLevel::HighSchool => "high_school",
            DegreeLevel::Associate => "associate",
            DegreeLevel::Bachelor => "bachelor",
            DegreeLevel::Master => "master",
            DegreeLevel::Doctorate => "doctorate",
        }
    }

    /// Map a free-form degree string ("B.S.", "MBA", "Ph.D. in Physics") onto the scale
    pub fn from_degree_text(text: &str) -> DegreeLevel {
        let lowered = text.trim().to_lowercase();
        if let Some(level) = Self::ALL.iter().find(|l| l.as_str() == lowered) {
            return *level;
        }

        let compact = lowered.replace(['.', '\''], "");
        let tokens: Vec<&str> = compact
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let has = |candidates: &[&str]| tokens.iter().any(|t| candidates.contains(t));

        if has(&["phd", "doctorate", "doctoral", "dphil", "edd"]) || compact.contains("doctor of") {
            DegreeLevel::Doctorate
        } else if has(&["master", "masters", "msc", "ms", "ma", "mba", "mca", "meng", "mtech", "mphil"]) {
            DegreeLevel::Master
        } else if has(&["bachelor", "bachelors", "bsc", "bs", "ba", "bca", "beng", "btech", "bba", "undergraduate"]) {
            DegreeLevel::Bachelor
        } else if has(&["associate", "associates", "aas"]) {
            DegreeLevel::Associate
        } else if compact.contains("high school") || has(&["ged", "diploma", "secondary", "hsc", "ssc"]) {
            DegreeLevel::HighSchool
        } else {
            DegreeLevel::None
        }
    }

    /// Human-readable label used in suggestions
    pub fn label(self) -> &'static str {
        match self {
            DegreeLevel::None => "no formal degree",
            DegreeLevel::HighSchool => "high-school diploma",
            DegreeLevel::Associate => "associate degree",
            DegreeLevel::Bachelor => "bachelor's degree",
            DegreeLevel::Master => "master's degree",
            DegreeLevel::Doctorate => "doctorate",
        }
    }
}

impl fmt::Display for DegreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for DegreeLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DegreeLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(DegreeLevel::from_degree_text(&text))
    }
}
