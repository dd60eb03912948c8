//! Dense-embedding similarity between resume and job description text

use crate::error::Result;
use crate::model::signal::{SemanticDetail, SignalDetail};
use crate::model::{MatchSignal, ParsedJobDescription, ParsedResume, SignalKind};
use crate::processing::chunker::Chunker;
use crate::processing::embeddings::{
    cosine_similarity, mean_pool, ContentHash, EmbeddingBackend, EmbeddingCache,
};
use crate::processing::SignalMatcher;
use log::{debug, warn};
use std::sync::Arc;

pub struct SemanticMatcher {
    backend: Option<Arc<dyn EmbeddingBackend>>,
    chunker: Chunker,
    cache: Option<Arc<EmbeddingCache>>,
}

/// Pooled vector for one document
struct DocumentVector {
    vector: Option<Arc<Vec<f32>>>,
    chunks: usize,
    cache_hit: bool,
}

impl SemanticMatcher {
    pub fn new(backend: Option<Arc<dyn EmbeddingBackend>>, chunker: Chunker) -> Self {
        Self {
            backend,
            chunker,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.name())
    }

    /// Chunk, embed and mean-pool `text`. Blank text has no vector.
    fn document_vector(&self, backend: &dyn EmbeddingBackend, text: &str) -> Result<DocumentVector> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Ok(DocumentVector {
                vector: None,
                chunks: 0,
                cache_hit: false,
            });
        }

        let key = ContentHash::new(backend.name(), text);
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            return Ok(DocumentVector {
                vector: Some(cached),
                chunks: chunks.len(),
                cache_hit: true,
            });
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = backend.embed_batch(&contents)?;
        let pooled = Arc::new(mean_pool(&embeddings)?);

        if let Some(cache) = &self.cache {
            cache.insert(key, pooled.clone());
        }

        Ok(DocumentVector {
            vector: Some(pooled),
            chunks: chunks.len(),
            cache_hit: false,
        })
    }

    /// Similarity of two texts, or the backend failure that prevented it
    pub fn score(&self, backend: &dyn EmbeddingBackend, resume_text: &str, job_text: &str) -> Result<(f32, SemanticDetail)> {
        let resume = self.document_vector(backend, resume_text)?;
        let job = self.document_vector(backend, job_text)?;

        let score = match (&resume.vector, &job.vector) {
            (Some(a), Some(b)) => cosine_similarity(a, b).max(0.0),
            _ => 0.0,
        };

        let detail = SemanticDetail {
            backend: Some(backend.name().to_string()),
            resume_chunks: resume.chunks,
            job_chunks: job.chunks,
            cache_hits: usize::from(resume.cache_hit) + usize::from(job.cache_hit),
        };

        debug!(
            "Semantic match: {:.3} ({} + {} chunks, {} cached)",
            score, detail.resume_chunks, detail.job_chunks, detail.cache_hits
        );

        Ok((score, detail))
    }
}

impl SignalMatcher for SemanticMatcher {
    fn kind(&self) -> SignalKind {
        SignalKind::Semantic
    }

    /// Backend absence or failure yields the Unavailable sentinel, never a
    /// fabricated zero
    fn evaluate(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> Result<MatchSignal> {
        let Some(backend) = self.backend.as_deref() else {
            return Ok(MatchSignal::unavailable(
                SignalKind::Semantic,
                "no embedding backend configured",
                SignalDetail::Semantic(SemanticDetail::default()),
            ));
        };

        match self.score(backend, &resume.raw_text, job.raw_text()) {
            Ok((score, detail)) => Ok(MatchSignal::scored(
                SignalKind::Semantic,
                score,
                SignalDetail::Semantic(detail),
            )),
            Err(e) => {
                warn!("Embedding backend {} failed: {}", backend.name(), e);
                Ok(MatchSignal::unavailable(
                    SignalKind::Semantic,
                    e.to_string(),
                    SignalDetail::Semantic(SemanticDetail {
                        backend: Some(backend.name().to_string()),
                        ..SemanticDetail::default()
                    }),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelevanceError;
    use crate::processing::embeddings::HashingBackend;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RelevanceError::Embedding("model offline".to_string()))
        }
    }

    /// Counts embedding calls and returns fixed vectors
    struct CountingBackend {
        calls: AtomicUsize,
    }

    impl EmbeddingBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    /// Resume and job land on opposite vectors
    struct OpposingBackend;

    impl EmbeddingBackend for OpposingBackend {
        fn name(&self) -> &str {
            "opposing"
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| if t.contains("resume") { vec![1.0, 0.0] } else { vec![-1.0, 0.0] })
                .collect())
        }
    }

    fn job(text: &str) -> ParsedJobDescription {
        ParsedJobDescription::builder(text).build().unwrap()
    }

    fn matcher(backend: Option<Arc<dyn EmbeddingBackend>>) -> SemanticMatcher {
        SemanticMatcher::new(backend, Chunker::new(512, 50).unwrap())
    }

    #[test]
    fn test_missing_backend_is_unavailable() {
        let signal = matcher(None)
            .evaluate(&ParsedResume::new("Rust engineer"), &job("Rust engineer"))
            .unwrap();
        assert!(!signal.is_available());
    }

    #[test]
    fn test_failing_backend_is_unavailable() {
        let signal = matcher(Some(Arc::new(FailingBackend)))
            .evaluate(&ParsedResume::new("Rust engineer"), &job("Rust engineer"))
            .unwrap();
        assert!(!signal.is_available());
    }

    #[test]
    fn test_identical_text_scores_high() {
        let signal = matcher(Some(Arc::new(HashingBackend::default())))
            .evaluate(&ParsedResume::new("Rust systems engineer"), &job("Rust systems engineer"))
            .unwrap();
        assert!(signal.score().unwrap() > 0.99);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let signal = matcher(Some(Arc::new(HashingBackend::default())))
            .evaluate(&ParsedResume::new("   "), &job("Rust systems engineer"))
            .unwrap();
        assert_eq!(signal.score(), Some(0.0));
    }

    #[test]
    fn test_negative_cosine_is_clamped() {
        let signal = matcher(Some(Arc::new(OpposingBackend)))
            .evaluate(&ParsedResume::new("resume text"), &job("job text"))
            .unwrap();
        assert_eq!(signal.score(), Some(0.0));
    }

    #[test]
    fn test_long_text_is_chunked() {
        let chunker = Chunker::new(40, 10).unwrap();
        let matcher = SemanticMatcher::new(Some(Arc::new(HashingBackend::default())), chunker);
        let long_text = "Built data pipelines in Python. ".repeat(10);
        let (score, detail) = matcher
            .score(&HashingBackend::default(), &long_text, "Python data pipelines")
            .unwrap();

        assert!(detail.resume_chunks > 1);
        assert_eq!(detail.job_chunks, 1);
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn test_cache_avoids_recomputation() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(EmbeddingCache::new(NonZeroUsize::new(8).unwrap()));
        let shared: Arc<dyn EmbeddingBackend> = backend.clone();
        let matcher = matcher(Some(shared)).with_cache(cache.clone());

        let resume = ParsedResume::new("Python developer");
        matcher.evaluate(&resume, &job("Data engineer")).unwrap();
        let signal = matcher.evaluate(&resume, &job("Data  engineer")).unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().hits, 2);
        match signal.detail {
            SignalDetail::Semantic(detail) => assert_eq!(detail.cache_hits, 2),
            other => panic!("unexpected detail {:?}", other),
        }
    }
}
