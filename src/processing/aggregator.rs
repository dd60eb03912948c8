//! Entry point of the engine: runs the matchers and combines their signals

use crate::config::{Config, ScoringWeights};
use crate::error::{Result, RelevanceError};
use crate::model::{
    EvaluationResult, EvaluationStatus, MatchSignal, ParsedJobDescription, ParsedResume, SignalKind,
    Verdict,
};
use crate::processing::chunker::Chunker;
use crate::processing::education_matcher::EducationMatcher;
use crate::processing::embeddings::{CacheStats, EmbeddingBackend, EmbeddingCache, StaticModelBackend};
use crate::processing::experience_matcher::ExperienceMatcher;
use crate::processing::hard_matcher::HardMatcher;
use crate::processing::semantic_matcher::SemanticMatcher;
use crate::processing::skill_extractor::SkillExtractor;
use crate::processing::skill_normalizer::SkillNormalizer;
use crate::processing::text_processor::TextProcessor;
use crate::processing::SignalMatcher;
use log::{info, warn};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

/// Scores resume/job pairs. Holds only read-only state plus the embedding
/// cache, so one engine can serve concurrent evaluations.
pub struct RelevanceEngine {
    config: Config,
    hard: HardMatcher,
    semantic: SemanticMatcher,
    education: EducationMatcher,
    experience: ExperienceMatcher,
    cache: Option<Arc<EmbeddingCache>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub embedding_backend: Option<String>,
    pub cache: Option<CacheStats>,
    pub fuzzy_threshold: f32,
    pub synonym_count: usize,
    pub known_skill_patterns: usize,
}

/// Weighted combination of the available signals
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    /// In [0, 1]
    pub weighted: f32,
    pub applied_weights: ScoringWeights,
    pub unavailable: Vec<SignalKind>,
}

impl RelevanceEngine {
    pub fn new(config: Config, backend: Option<Arc<dyn EmbeddingBackend>>) -> Result<Self> {
        config.validate()?;

        let normalizer = Arc::new(SkillNormalizer::from_config(&config.skills));
        let text_processor = Arc::new(TextProcessor::new());

        let mut hard = HardMatcher::new(
            normalizer.clone(),
            text_processor,
            config.processing.ngram_max,
            config.scoring.fuzzy_threshold,
        );
        if config.skills.augment_from_text {
            let extractor = SkillExtractor::new(&config.skills, &normalizer)?;
            hard = hard.with_extractor(Arc::new(extractor));
        }

        let cache = if config.processing.enable_caching {
            NonZeroUsize::new(config.processing.cache_capacity)
                .map(|capacity| Arc::new(EmbeddingCache::new(capacity)))
        } else {
            None
        };

        let chunker = Chunker::new(config.processing.chunk_size, config.processing.chunk_overlap)?;
        let mut semantic = SemanticMatcher::new(backend, chunker);
        if let Some(cache) = &cache {
            semantic = semantic.with_cache(cache.clone());
        }

        Ok(Self {
            education: EducationMatcher::new(config.scoring.fuzzy_threshold),
            experience: ExperienceMatcher::new(config.processing.reference_date),
            hard,
            semantic,
            cache,
            config,
        })
    }

    /// Build an engine around the configured Model2Vec model. A model that
    /// cannot be loaded leaves the engine without a semantic backend, so
    /// evaluations come back degraded rather than failing.
    pub async fn from_config(config: Config) -> Result<Self> {
        let backend = load_default_backend(&config).await;
        Self::new(config, backend)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Evaluate one resume against one job description
    pub fn evaluate(&self, resume: &ParsedResume, job: &ParsedJobDescription) -> Result<EvaluationResult> {
        let start_time = Instant::now();

        let hard_match = self.hard.evaluate(resume, job)?;
        let semantic = self.semantic.evaluate(resume, job)?;
        let education = self.education.evaluate(resume, job)?;
        let experience = self.experience.evaluate(resume, job)?;

        let combination = combine(
            &self.config.scoring.weights,
            [&hard_match, &semantic, &education, &experience],
        )?;

        let overall_score = (combination.weighted * 100.0).round().clamp(0.0, 100.0) as u8;
        let verdict = Verdict::from_score(
            overall_score,
            self.config.scoring.high_threshold,
            self.config.scoring.medium_threshold,
        );

        let status = if combination.unavailable.is_empty() {
            EvaluationStatus::Complete
        } else {
            warn!(
                "Degraded evaluation: {:?} unavailable, weights redistributed",
                combination.unavailable
            );
            EvaluationStatus::Degraded {
                unavailable: combination.unavailable.clone(),
            }
        };

        let missing_skills = hard_match
            .hard_detail()
            .map(|d| d.missing_required.clone())
            .unwrap_or_default();
        let suggestions = build_suggestions(&missing_skills, &education, &experience);

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Evaluation complete: {} ({}) in {}ms",
            overall_score, verdict, processing_time_ms
        );

        Ok(EvaluationResult {
            overall_score,
            verdict,
            status,
            applied_weights: combination.applied_weights,
            hard_match,
            semantic,
            education,
            experience,
            missing_skills,
            suggestions,
            processing_time_ms,
        })
    }

    /// Evaluate one resume against many jobs, one blocking task per job.
    /// Results keep job order; a failure affects only its own job.
    pub async fn evaluate_batch(
        self: Arc<Self>,
        resume: Arc<ParsedResume>,
        jobs: Vec<ParsedJobDescription>,
    ) -> Vec<Result<EvaluationResult>> {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let engine = Arc::clone(&self);
                let resume = Arc::clone(&resume);
                tokio::task::spawn_blocking(move || engine.evaluate(&resume, &job))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle.await {
                Ok(Ok(evaluation)) => Ok(evaluation),
                Ok(Err(e)) => Err(RelevanceError::EvaluationFailed(e.to_string())),
                Err(e) => Err(RelevanceError::EvaluationFailed(format!("Evaluation task aborted: {}", e))),
            };
            results.push(result);
        }
        results
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            embedding_backend: self.semantic.backend_name().map(str::to_string),
            cache: self.cache.as_ref().map(|c| c.stats()),
            fuzzy_threshold: self.config.scoring.fuzzy_threshold,
            synonym_count: self.config.skills.synonyms.len(),
            known_skill_patterns: self.config.skills.known_skills.len(),
        }
    }
}

/// Load the configured Model2Vec model off the async runtime's worker threads
pub async fn load_default_backend(config: &Config) -> Option<Arc<dyn EmbeddingBackend>> {
    let model_name = config.models.default_embedding_model.clone();
    let model_path = config.models_dir().join(&model_name);

    if !model_path.exists() {
        warn!(
            "Embedding model {} not found at {}; semantic matching disabled",
            model_name,
            model_path.display()
        );
        return None;
    }

    let loaded = tokio::task::spawn_blocking(move || StaticModelBackend::load(&model_path, model_name)).await;
    match loaded {
        Ok(Ok(backend)) => Some(Arc::new(backend) as Arc<dyn EmbeddingBackend>),
        Ok(Err(e)) => {
            warn!("Failed to load embedding model: {}", e);
            None
        }
        Err(e) => {
            warn!("Embedding model loader aborted: {}", e);
            None
        }
    }
}

/// Combine signals under `weights`. Unavailable signals lose their weight,
/// which is spread over the available ones in proportion to their own.
pub fn combine(weights: &ScoringWeights, signals: [&MatchSignal; 4]) -> Result<Combination> {
    let unavailable: Vec<SignalKind> = signals
        .iter()
        .filter(|s| !s.is_available())
        .map(|s| s.kind)
        .collect();

    let available_weight: f32 = signals
        .iter()
        .filter(|s| s.is_available())
        .map(|s| weights.weight_of(s.kind))
        .sum();

    if available_weight.is_nan() || available_weight <= 0.0 {
        return Err(RelevanceError::Scoring(
            "No weighted signal is available for this evaluation".to_string(),
        ));
    }

    let mut applied = ScoringWeights {
        hard_match: 0.0,
        semantic: 0.0,
        education: 0.0,
        experience: 0.0,
    };
    let mut weighted = 0.0f32;

    for signal in signals {
        let Some(score) = signal.score() else {
            continue;
        };
        let weight = weights.weight_of(signal.kind) / available_weight;
        weighted += weight * score;
        match signal.kind {
            SignalKind::HardMatch => applied.hard_match = weight,
            SignalKind::Semantic => applied.semantic = weight,
            SignalKind::Education => applied.education = weight,
            SignalKind::Experience => applied.experience = weight,
        }
    }

    Ok(Combination {
        weighted: weighted.clamp(0.0, 1.0),
        applied_weights: applied,
        unavailable,
    })
}

/// One line per missing skill, then education and experience shortfalls
pub fn build_suggestions(
    missing_skills: &[String],
    education: &MatchSignal,
    experience: &MatchSignal,
) -> Vec<String> {
    let mut suggestions: Vec<String> = missing_skills
        .iter()
        .map(|skill| {
            format!(
                "Add {} to your resume if you have used it, or build experience with it through a project or course.",
                skill
            )
        })
        .collect();

    if let Some(detail) = education.education_detail() {
        if let Some(required) = detail.required_degree {
            if detail.detected_degree < required {
                suggestions.push(format!(
                    "The role asks for a {}; your resume lists {}. Mention any equivalent qualification or certification.",
                    required.label(),
                    detail.detected_degree.label()
                ));
            }
        }
    }

    if let Some(detail) = experience.experience_detail() {
        if let Some(required) = detail.required_years {
            if detail.shortfall_years > 0.0 {
                suggestions.push(format!(
                    "The role asks for {:.1} years of experience; your resume shows about {:.1}. Highlight internships, freelance or project work that counts toward it.",
                    required, detail.total_years
                ));
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::signal::{
        EducationDetail, ExperienceDetail, HardMatchDetail, SemanticDetail, SignalDetail,
    };
    use crate::model::{DegreeLevel, EducationEntry, ExperienceEntry};
    use crate::processing::embeddings::HashingBackend;
    use chrono::NaiveDate;

    fn signal(kind: SignalKind, score: Option<f32>) -> MatchSignal {
        let detail = match kind {
            SignalKind::HardMatch => SignalDetail::Hard(HardMatchDetail::default()),
            SignalKind::Semantic => SignalDetail::Semantic(SemanticDetail::default()),
            SignalKind::Education => SignalDetail::Education(EducationDetail::default()),
            SignalKind::Experience => SignalDetail::Experience(ExperienceDetail::default()),
        };
        match score {
            Some(score) => MatchSignal::scored(kind, score, detail),
            None => MatchSignal::unavailable(kind, "offline", detail),
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.processing.reference_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        config
    }

    fn hashing_engine() -> RelevanceEngine {
        RelevanceEngine::new(test_config(), Some(Arc::new(HashingBackend::default()))).unwrap()
    }

    #[test]
    fn test_combine_with_all_signals() {
        let hard = signal(SignalKind::HardMatch, Some(1.0));
        let semantic = signal(SignalKind::Semantic, Some(0.5));
        let education = signal(SignalKind::Education, Some(1.0));
        let experience = signal(SignalKind::Experience, Some(0.0));

        let combination =
            combine(&ScoringWeights::default(), [&hard, &semantic, &education, &experience]).unwrap();
        assert!((combination.weighted - 0.7).abs() < 1e-6);
        assert!(combination.unavailable.is_empty());
        assert_eq!(combination.applied_weights, ScoringWeights::default());
    }

    #[test]
    fn test_combine_redistributes_semantic_weight() {
        let hard = signal(SignalKind::HardMatch, Some(0.5));
        let semantic = signal(SignalKind::Semantic, None);
        let education = signal(SignalKind::Education, Some(1.0));
        let experience = signal(SignalKind::Experience, Some(1.0));

        let combination =
            combine(&ScoringWeights::default(), [&hard, &semantic, &education, &experience]).unwrap();
        let applied = combination.applied_weights;

        assert_eq!(combination.unavailable, vec![SignalKind::Semantic]);
        assert_eq!(applied.semantic, 0.0);
        assert!((applied.total() - 1.0).abs() < 1e-6);
        assert!((applied.hard_match - 2.0 / 3.0).abs() < 1e-6);
        assert!((applied.education - 1.0 / 6.0).abs() < 1e-6);
        assert!((combination.weighted - (0.5 * 2.0 / 3.0 + 1.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_combine_without_weighted_signals_fails() {
        let weights = ScoringWeights {
            hard_match: 0.0,
            semantic: 1.0,
            education: 0.0,
            experience: 0.0,
        };
        let hard = signal(SignalKind::HardMatch, Some(1.0));
        let semantic = signal(SignalKind::Semantic, None);
        let education = signal(SignalKind::Education, Some(1.0));
        let experience = signal(SignalKind::Experience, Some(1.0));

        let result = combine(&weights, [&hard, &semantic, &education, &experience]);
        assert!(matches!(result, Err(RelevanceError::Scoring(_))));
    }

    #[test]
    fn test_evaluation_without_backend_is_degraded() {
        let engine = RelevanceEngine::new(test_config(), None).unwrap();
        let resume = ParsedResume::new("Python developer").with_skills(["python"]);
        let job = ParsedJobDescription::builder("Python developer")
            .required_skills(["python"])
            .build()
            .unwrap();

        let result = engine.evaluate(&resume, &job).unwrap();
        assert!(result.is_degraded());
        assert!(!result.semantic.is_available());
        assert_eq!(result.applied_weights.semantic, 0.0);
        assert!((result.applied_weights.total() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_requirements_give_full_components() {
        let engine = hashing_engine();
        let job = ParsedJobDescription::builder("General role").build().unwrap();
        let result = engine.evaluate(&ParsedResume::new("Anything at all"), &job).unwrap();

        let hard = result.hard_match.hard_detail().unwrap();
        assert_eq!(hard.skill_score, 1.0);
        assert_eq!(result.education.score(), Some(1.0));
        assert_eq!(result.experience.experience_detail().unwrap().years_component, 1.0);
        assert!(result.missing_skills.is_empty());
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_evaluation_is_deterministic_and_bounded() {
        let engine = hashing_engine();
        let resume = ParsedResume::new("Data analyst with SQL, Python and Tableau. 3 years of experience.")
            .with_skills(["SQL", "Python", "Tableau"])
            .with_education(EducationEntry::new(DegreeLevel::Bachelor, "Statistics"))
            .with_experience(ExperienceEntry::with_duration("Data Analyst", 3.0));
        let job = ParsedJobDescription::builder("Data analyst. SQL, Python and Power BI required.")
            .title("Data Analyst")
            .required_skills(["sql", "python", "power bi"])
            .min_degree(DegreeLevel::Bachelor)
            .required_fields(["Statistics", "Mathematics"])
            .min_years_experience(2.0)
            .build()
            .unwrap();

        let first = engine.evaluate(&resume, &job).unwrap();
        let second = engine.evaluate(&resume, &job).unwrap();

        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.verdict, second.verdict);
        assert!(first.overall_score <= 100);
        for signal in first.signals() {
            let score = signal.score().unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
        assert_eq!(first.missing_skills, vec!["power bi"]);
        assert_eq!(first.suggestions.len(), 1);
        assert!(first.suggestions[0].contains("power bi"));
    }

    #[test]
    fn test_suggestions_cover_shortfalls() {
        let engine = hashing_engine();
        let resume = ParsedResume::new("Junior developer")
            .with_education(EducationEntry::new(DegreeLevel::Associate, "Computing"))
            .with_experience(ExperienceEntry::with_duration("Developer", 1.0));
        let job = ParsedJobDescription::builder("Senior developer")
            .required_skills(["rust", "go"])
            .min_degree(DegreeLevel::Bachelor)
            .min_years_experience(5.0)
            .build()
            .unwrap();

        let result = engine.evaluate(&resume, &job).unwrap();
        assert_eq!(result.missing_skills, vec!["rust", "golang"]);
        assert_eq!(result.suggestions.len(), 4);
        assert!(result.suggestions[2].contains("bachelor's degree"));
        assert!(result.suggestions[3].contains("5.0 years"));
    }

    #[test]
    fn test_met_experience_requirement_has_no_suggestion() {
        let resume = ParsedResume::new("Analyst").with_experience(ExperienceEntry::dated(
            "Analyst",
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1),
        ));
        let job = ParsedJobDescription::builder("Analyst")
            .min_years_experience(3.0)
            .build()
            .unwrap();

        let result = hashing_engine().evaluate(&resume, &job).unwrap();
        let detail = result.experience.experience_detail().unwrap();
        assert_eq!(detail.shortfall_years, 0.0);
        assert!(result.suggestions.iter().all(|s| !s.contains("years of experience")));
    }

    #[tokio::test]
    async fn test_batch_keeps_job_order() {
        let engine = Arc::new(hashing_engine());
        let resume = Arc::new(ParsedResume::new("Rust engineer").with_skills(["rust"]));
        let jobs = vec![
            ParsedJobDescription::builder("Rust engineer").required_skills(["rust"]).build().unwrap(),
            ParsedJobDescription::builder("Chef").required_skills(["cooking"]).build().unwrap(),
        ];

        let results = engine.clone().evaluate_batch(resume, jobs).await;
        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        let second = results[1].as_ref().unwrap();
        assert!(first.missing_skills.is_empty());
        assert_eq!(second.missing_skills, vec!["cooking"]);
        assert!(first.overall_score > second.overall_score);
    }

    #[test]
    fn test_stats() {
        let engine = hashing_engine();
        let stats = engine.stats();
        assert_eq!(stats.embedding_backend.as_deref(), Some("feature-hashing"));
        assert_eq!(stats.cache.map(|c| c.capacity), Some(256));
        assert_eq!(stats.fuzzy_threshold, 0.8);
    }
}
