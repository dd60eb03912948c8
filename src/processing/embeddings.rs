//! Embedding backends, vector helpers and the document vector cache

use crate::error::{Result, RelevanceError};
use anyhow::Context;
use log::{info, warn};
use lru::LruCache;
use model2vec_rs::model::StaticModel;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Something that turns text into dense vectors.
///
/// Implementations must be safe for concurrent use; the engine shares one
/// backend across all evaluations. Calls may block for the duration of
/// model inference.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per input, all of the same dimension
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Model2Vec static embeddings loaded from a local model directory
pub struct StaticModelBackend {
    model: StaticModel,
    model_name: String,
}

impl StaticModelBackend {
    pub fn load(model_path: &Path, model_name: impl Into<String>) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, None, None)
            .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

        info!("Model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.into(),
        })
    }
}

impl EmbeddingBackend for StaticModelBackend {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.model.encode(texts);
        if embeddings.len() != texts.len() {
            return Err(RelevanceError::Embedding(format!(
                "Model returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Deterministic feature-hashing embedder: word and character trigram
/// buckets, L2-normalized. Needs no model files.
#[derive(Debug, Clone)]
pub struct HashingBackend {
    dimensions: usize,
}

impl HashingBackend {
    pub const DEFAULT_DIMENSIONS: usize = 256;

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let normalized = text.to_lowercase();

        for word in normalized.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() >= 3 {
                for trigram in chars.windows(3) {
                    let trigram: String = trigram.iter().collect();
                    vector[self.bucket(&trigram)] += 1.0;
                }
            }
            // Words contribute more than their trigrams
            vector[self.bucket(word)] += 2.0;
        }

        normalize_in_place(&mut vector);
        vector
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dimensions as u64) as usize
    }
}

impl Default for HashingBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

impl EmbeddingBackend for HashingBackend {
    fn name(&self) -> &str {
        "feature-hashing"
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

/// Cosine similarity; 0 for empty, zero-norm or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot_product / (norm_a * norm_b);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Element-wise mean of equally sized vectors
pub fn mean_pool(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let Some(first) = vectors.first() else {
        return Ok(Vec::new());
    };

    let dim = first.len();
    let mut pooled = vec![0.0f32; dim];
    for vector in vectors {
        if vector.len() != dim {
            return Err(RelevanceError::Embedding(format!(
                "Embedding dimensions don't match: {} vs {}",
                dim,
                vector.len()
            )));
        }
        for (acc, value) in pooled.iter_mut().zip(vector) {
            *acc += value;
        }
    }

    let count = vectors.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    Ok(pooled)
}

fn normalize_in_place(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        vector.iter_mut().for_each(|v| *v /= magnitude);
    }
}

/// SHA-256 of backend name and whitespace-normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn new(backend: &str, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(backend.as_bytes());
        hasher.update([0u8]);
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                hasher.update(b" ");
            }
            hasher.update(word.as_bytes());
        }
        Self(hasher.finalize().into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded LRU of pooled document vectors
pub struct EmbeddingCache {
    cache: Mutex<LruCache<ContentHash, Arc<Vec<f32>>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Recovers a poisoned guard; the LRU stays consistent across a panic
    fn lock(&self) -> MutexGuard<'_, LruCache<ContentHash, Arc<Vec<f32>>>> {
        self.cache.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Embedding cache lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, key: &ContentHash) -> Option<Arc<Vec<f32>>> {
        let found = self.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, key: ContentHash, vector: Arc<Vec<f32>>) {
        self.lock().put(key, vector);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.lock().len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) < 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_mean_pool() {
        let pooled = mean_pool(&[vec![1.0, 3.0], vec![3.0, 5.0]]).unwrap();
        assert_eq!(pooled, vec![2.0, 4.0]);
        assert!(mean_pool(&[]).unwrap().is_empty());
        assert!(mean_pool(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_hashing_backend_is_deterministic() {
        let backend = HashingBackend::default();
        let a = backend.embed("Rust systems engineer");
        let b = backend.embed("rust  systems engineer");
        assert_eq!(a.len(), HashingBackend::DEFAULT_DIMENSIONS);
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(backend.embed("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hashing_backend_ranks_related_text_higher() {
        let backend = HashingBackend::default();
        let resume = backend.embed("python developer building data pipelines");
        let related = backend.embed("python data pipeline developer");
        let unrelated = backend.embed("pastry chef baking croissants");
        assert!(cosine_similarity(&resume, &related) > cosine_similarity(&resume, &unrelated));
    }

    #[test]
    fn test_content_hash_ignores_whitespace_layout() {
        assert_eq!(
            ContentHash::new("m", "Senior  Rust\nengineer "),
            ContentHash::new("m", "Senior Rust engineer")
        );
        assert_ne!(ContentHash::new("a", "text"), ContentHash::new("b", "text"));
    }

    #[test]
    fn test_cache_evicts_and_counts() {
        let cache = EmbeddingCache::new(NonZeroUsize::new(1).unwrap());
        let first = ContentHash::new("m", "first");
        let second = ContentHash::new("m", "second");

        cache.insert(first, Arc::new(vec![1.0]));
        assert!(cache.get(&first).is_some());
        cache.insert(second, Arc::new(vec![2.0]));
        assert!(cache.get(&first).is_none());

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_cache_survives_poisoned_lock() {
        let cache = Arc::new(EmbeddingCache::new(NonZeroUsize::new(4).unwrap()));
        let key = ContentHash::new("m", "kept");
        cache.insert(key, Arc::new(vec![1.0]));

        let poisoner = Arc::clone(&cache);
        let outcome = std::thread::spawn(move || {
            let _guard = poisoner.cache.lock().unwrap();
            panic!("worker failed while holding the cache");
        })
        .join();
        assert!(outcome.is_err());
        assert!(cache.cache.is_poisoned());

        assert_eq!(cache.get(&key).as_deref(), Some(&vec![1.0]));
        let fresh = ContentHash::new("m", "fresh");
        assert!(cache.get(&fresh).is_none());
        cache.insert(fresh, Arc::new(vec![2.0]));
        assert!(cache.get(&fresh).is_some());

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_incomplete_model_directory_is_a_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = StaticModelBackend::load(dir.path(), "empty");
        assert!(matches!(result, Err(RelevanceError::ModelError(_))));
    }
}
