//! Known-skill scanning over raw resume text

use crate::config::SkillConfig;
use crate::error::{Result, RelevanceError};
use crate::processing::skill_normalizer::SkillNormalizer;
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::HashSet;

/// Short alphabetic aliases ("js", "ml", "node") collide with ordinary words
/// and are only resolved when they come from a parsed skill list.
const MIN_ALPHA_ALIAS_LEN: usize = 5;

/// Finds known skills and their aliases in free text, returning canonical forms
pub struct SkillExtractor {
    matcher: AhoCorasick,
    /// canonical form per pattern id
    canonical: Vec<String>,
}

impl SkillExtractor {
    pub fn new(config: &SkillConfig, normalizer: &SkillNormalizer) -> Result<Self> {
        let mut patterns: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        let aliases = config.synonyms.keys().filter(|alias| {
            alias.chars().count() >= MIN_ALPHA_ALIAS_LEN
                || alias.chars().any(|c| !c.is_ascii_alphabetic())
        });

        for pattern in config.known_skills.iter().chain(aliases) {
            let pattern = pattern.trim().to_lowercase();
            if !pattern.is_empty() && seen.insert(pattern.clone()) {
                patterns.push(pattern);
            }
        }

        // Longest first so "machine learning" wins over "learning"-like prefixes
        patterns.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| RelevanceError::Processing(format!("Failed to build skill extractor: {}", e)))?;

        let canonical = patterns.iter().map(|p| normalizer.normalize(p)).collect();

        Ok(Self { matcher, canonical })
    }

    /// Canonical skills mentioned in `text`, in order of first mention
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for mat in self.matcher.find_iter(text) {
            if !is_word_bounded(text, mat.start(), mat.end()) {
                continue;
            }
            let skill = &self.canonical[mat.pattern().as_usize()];
            if seen.insert(skill.as_str()) {
                found.push(skill.clone());
            }
        }

        found
    }
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';

    !before.map_or(false, is_word_char) && !after.map_or(false, |c| is_word_char(c) || c == '+' || c == '#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn extractor() -> SkillExtractor {
        let config = Config::default();
        let normalizer = SkillNormalizer::from_config(&config.skills);
        SkillExtractor::new(&config.skills, &normalizer).unwrap()
    }

    #[test]
    fn test_extracts_canonical_skills() {
        let skills = extractor().extract("Built services in Python and Node.js, deployed on K8s with Docker.");
        assert_eq!(skills, vec!["python", "nodejs", "kubernetes", "docker"]);
    }

    #[test]
    fn test_respects_word_boundaries() {
        let skills = extractor().extract("I trust my team and enjoy javascripting");
        assert!(!skills.contains(&"rust".to_string()));
        assert!(!skills.contains(&"javascript".to_string()));
    }

    #[test]
    fn test_prefers_longest_match() {
        let skills = extractor().extract("Strong JavaScript and Machine Learning background");
        assert!(skills.contains(&"javascript".to_string()));
        assert!(!skills.contains(&"java".to_string()));
        assert!(skills.contains(&"machine learning".to_string()));
    }

    #[test]
    fn test_short_aliases_are_not_scanned() {
        let skills = extractor().extract("Go to the ML meetup");
        assert!(skills.is_empty());
    }
}
