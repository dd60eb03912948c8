//! Canonical skill forms and fuzzy string ratios

use crate::config::SkillConfig;
use std::collections::{BTreeMap, HashMap, HashSet};
use strsim::normalized_levenshtein;

/// Shared tokens needed before one phrase counts as contained in another
const MIN_SHARED_TOKENS: usize = 2;

/// Resolves free-form skill tokens to their canonical form.
///
/// Two tokens with the same canonical form are the same skill everywhere
/// downstream (hard matching, missing-skill reporting, text augmentation).
#[derive(Debug, Clone, Default)]
pub struct SkillNormalizer {
    /// basic form of alias -> canonical skill
    synonyms: HashMap<String, String>,
}

impl SkillNormalizer {
    pub fn new(synonyms: &BTreeMap<String, String>) -> Self {
        let synonyms = synonyms
            .iter()
            .map(|(alias, canonical)| (basic_form(alias), canonical.trim().to_lowercase()))
            .filter(|(alias, canonical)| !alias.is_empty() && !canonical.is_empty())
            .collect();

        Self { synonyms }
    }

    pub fn from_config(config: &SkillConfig) -> Self {
        Self::new(&config.synonyms)
    }

    /// Canonical lowercase form with punctuation collapsed and aliases resolved
    pub fn normalize(&self, raw: &str) -> String {
        let basic = basic_form(raw);
        match self.synonyms.get(&basic) {
            Some(canonical) => canonical.clone(),
            None => basic,
        }
    }

    /// Normalize a list, dropping empties and duplicates while keeping first-seen order
    pub fn normalize_all<I, S>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        raw.into_iter()
            .map(|s| self.normalize(s.as_ref()))
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect()
    }
}

/// Lowercase, drop dots, turn other punctuation into spaces and collapse
/// whitespace. `+` and `#` survive so "c++" and "c#" stay distinct.
pub fn basic_form(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .filter(|c| *c != '.')
        .map(|c| {
            if c.is_alphanumeric() || c == '+' || c == '#' {
                c
            } else {
                ' '
            }
        })
        .collect();

    mapped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized edit similarity in [0, 1]; 0 when either side is empty
pub fn ratio(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b) as f32
}

/// Ratio after sorting whitespace tokens, so word order does not matter
pub fn token_sort_ratio(a: &str, b: &str) -> f32 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Ratio over shared and leftover token sets. A phrase contained in another
/// scores 1.0 once at least two tokens are shared; a lone shared word only
/// counts through the full sorted comparison.
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    let left: HashSet<&str> = a.split_whitespace().collect();
    let right: HashSet<&str> = b.split_whitespace().collect();
    let shared_count = left.intersection(&right).count();

    let join_sorted = |tokens: Vec<&str>| {
        let mut tokens = tokens;
        tokens.sort_unstable();
        tokens.join(" ")
    };

    let shared = join_sorted(left.intersection(&right).copied().collect());
    let only_left = join_sorted(left.difference(&right).copied().collect());
    let only_right = join_sorted(right.difference(&left).copied().collect());

    let combine = |rest: &str| match (shared.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => shared.clone(),
        (false, false) => format!("{} {}", shared, rest),
    };
    let with_left = combine(&only_left);
    let with_right = combine(&only_right);

    let full = ratio(&with_left, &with_right);
    if shared_count < MIN_SHARED_TOKENS {
        return full;
    }
    ratio(&shared, &with_left)
        .max(ratio(&shared, &with_right))
        .max(full)
}

/// Similarity used for skill tokens
pub fn skill_similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    ratio(a, b).max(token_sort_ratio(a, b))
}

/// Similarity used for role titles and fields of study
pub fn phrase_similarity(a: &str, b: &str) -> f32 {
    let a = basic_form(a);
    let b = basic_form(b);
    if !a.is_empty() && a == b {
        return 1.0;
    }
    ratio(&a, &b).max(token_set_ratio(&a, &b))
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn normalizer() -> SkillNormalizer {
        SkillNormalizer::from_config(&Config::default().skills)
    }

    #[test]
    fn test_basic_form() {
        assert_eq!(basic_form("  Machine   Learning "), "machine learning");
        assert_eq!(basic_form("Node.js"), "nodejs");
        assert_eq!(basic_form("C++"), "c++");
        assert_eq!(basic_form("CI/CD"), "ci cd");
        assert_eq!(basic_form("scikit-learn"), "scikit learn");
    }

    #[test]
    fn test_aliases_resolve() {
        let n = normalizer();
        assert_eq!(n.normalize("JS"), "javascript");
        assert_eq!(n.normalize("Node.js"), "nodejs");
        assert_eq!(n.normalize("k8s"), "kubernetes");
        assert_eq!(n.normalize("CI/CD"), "cicd");
        assert_eq!(n.normalize("Python"), "python");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let n = normalizer();
        for raw in ["scikit-learn", "c#", "Power BI", "ReactJS", "rest"] {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once, "not stable for {}", raw);
        }
    }

    #[test]
    fn test_normalize_all_dedups_in_order() {
        let n = normalizer();
        let skills = n.normalize_all(["React", "js", "reactjs", "", "JavaScript", "SQL"]);
        assert_eq!(skills, vec!["react", "javascript", "sql"]);
    }

    #[test]
    fn test_ratios() {
        assert_eq!(ratio("python", "python"), 1.0);
        assert_eq!(ratio("", "python"), 0.0);
        assert!(ratio("pythn", "python") >= 0.8);
        assert!(ratio("java", "javascript") < 0.8);
        assert_eq!(token_sort_ratio("learning machine", "machine learning"), 1.0);
        assert_eq!(token_set_ratio("senior software engineer", "software engineer"), 1.0);
    }

    #[test]
    fn test_single_shared_word_is_not_a_subset_match() {
        assert!(token_set_ratio("engineer", "senior machine learning engineer") < 0.5);
        assert!(phrase_similarity("Engineer", "Senior Machine Learning Engineer") < 0.8);
        assert!(phrase_similarity("Manager", "Senior Manager") < 0.8);
        assert_eq!(token_set_ratio("engineer", "engineer"), 1.0);
    }

    #[test]
    fn test_phrase_similarity() {
        assert_eq!(phrase_similarity("Data Scientist", "data scientist"), 1.0);
        assert!(phrase_similarity("Backend Developer", "Senior Backend Developer") > 0.99);
        assert!(phrase_similarity("Chef", "Software Engineer") < 0.5);
    }
}
