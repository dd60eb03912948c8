//! Pairwise TF-IDF document similarity

use crate::processing::text_processor::TextProcessor;
use std::collections::BTreeMap;

/// TF-IDF over a two-document corpus with word n-grams.
///
/// Uses raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1` and
/// L2-normalized vectors. Ordered maps keep floating point summation
/// deterministic between runs.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    ngram_max: usize,
}

impl TfIdfVectorizer {
    pub fn new(ngram_max: usize) -> Self {
        Self {
            ngram_max: ngram_max.max(1),
        }
    }

    /// All n-grams of `tokens` for n in 1..=ngram_max, joined by single spaces
    pub fn terms(&self, tokens: &[String]) -> Vec<String> {
        let mut terms = Vec::new();
        for n in 1..=self.ngram_max {
            if tokens.len() < n {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Cosine similarity of the TF-IDF vectors of `a` and `b`, in [0, 1].
    /// An empty vocabulary on either side yields 0.
    pub fn similarity(&self, processor: &TextProcessor, a: &str, b: &str) -> f32 {
        let counts_a = term_counts(self.terms(&processor.tokenize(a)));
        let counts_b = term_counts(self.terms(&processor.tokenize(b)));

        if counts_a.is_empty() || counts_b.is_empty() {
            return 0.0;
        }

        let vector_a = weigh(&counts_a, &counts_b);
        let vector_b = weigh(&counts_b, &counts_a);

        let dot: f64 = vector_a
            .iter()
            .filter_map(|(term, wa)| vector_b.get(term).map(|wb| wa * wb))
            .sum();
        let norm_a = l2_norm(&vector_a);
        let norm_b = l2_norm(&vector_b);

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let cosine = (dot / (norm_a * norm_b)) as f32;
        if cosine.is_finite() {
            cosine.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn term_counts(terms: Vec<String>) -> BTreeMap<String, f64> {
    let mut counts = BTreeMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0.0) += 1.0;
    }
    counts
}

/// Weigh `own` term counts by idf computed over the pair {own, other}
fn weigh(own: &BTreeMap<String, f64>, other: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    const DOCS: f64 = 2.0;
    own.iter()
        .map(|(term, tf)| {
            let df = if other.contains_key(term) { 2.0 } else { 1.0 };
            let idf = ((1.0 + DOCS) / (1.0 + df)).ln() + 1.0;
            (term.clone(), tf * idf)
        })
        .collect()
}

fn l2_norm(vector: &BTreeMap<String, f64>) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_terms_include_bigrams() {
        let vectorizer = TfIdfVectorizer::new(2);
        let terms = vectorizer.terms(&tokens(&["machine", "learning", "engineer"]));
        assert_eq!(
            terms,
            vec!["machine", "learning", "engineer", "machine learning", "learning engineer"]
        );
    }

    #[test]
    fn test_identical_documents() {
        let processor = TextProcessor::new();
        let vectorizer = TfIdfVectorizer::new(2);
        let text = "Senior Python developer with Django and PostgreSQL experience";
        let score = vectorizer.similarity(&processor, text, text);
        assert!((score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_disjoint_documents() {
        let processor = TextProcessor::new();
        let vectorizer = TfIdfVectorizer::new(2);
        let score = vectorizer.similarity(&processor, "python django", "carpentry woodwork");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_partial_overlap_is_between_bounds() {
        let processor = TextProcessor::new();
        let vectorizer = TfIdfVectorizer::new(2);
        let score = vectorizer.similarity(
            &processor,
            "Python developer building data pipelines with Spark",
            "Looking for a Python developer familiar with Kafka",
        );
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_degenerate_inputs_do_not_panic() {
        let processor = TextProcessor::new();
        let vectorizer = TfIdfVectorizer::new(2);
        assert_eq!(vectorizer.similarity(&processor, "", "python"), 0.0);
        assert_eq!(vectorizer.similarity(&processor, "the and of", "python"), 0.0);
        assert!(vectorizer.similarity(&processor, "python", "python") > 0.99);
    }
}
