//! Configuration management for the relevance engine

use crate::error::{Result, RelevanceError};
use crate::model::SignalKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub processing: ProcessingConfig,
    pub scoring: ScoringConfig,
    pub skills: SkillConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub dimensions: u32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Embedding context window, in characters
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub enable_caching: bool,
    /// Number of pooled document vectors kept in the embedding cache
    pub cache_capacity: usize,
    /// Closes open-ended experience ranges; today when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
    pub ngram_max: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub hard_match: f32,
    pub semantic: f32,
    pub education: f32,
    pub experience: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub fuzzy_threshold: f32,
    pub high_threshold: u8,
    pub medium_threshold: u8,
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    pub augment_from_text: bool,
    pub known_skills: Vec<String>,
    /// alias -> canonical skill
    pub synonyms: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl ScoringWeights {
    pub fn total(&self) -> f32 {
        self.hard_match + self.semantic + self.education + self.experience
    }

    pub fn weight_of(&self, kind: SignalKind) -> f32 {
        match kind {
            SignalKind::HardMatch => self.hard_match,
            SignalKind::Semantic => self.semantic,
            SignalKind::Education => self.education,
            SignalKind::Experience => self.experience,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            hard_match: 0.4,
            semantic: 0.4,
            education: 0.1,
            experience: 0.1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-relevance")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                default_embedding_model: "potion-base-8M".to_string(),
                available_models: vec![
                    AvailableModel {
                        name: "potion-base-8M".to_string(),
                        repo_id: "minishlab/potion-base-8M".to_string(),
                        size_mb: 33,
                        dimensions: 256,
                        description: "High-quality Model2Vec embeddings with 8M parameters".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-base".to_string(),
                        repo_id: "minishlab/M2V_base_output".to_string(),
                        size_mb: 90,
                        dimensions: 256,
                        description: "Fast Model2Vec base embeddings model".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-large".to_string(),
                        repo_id: "minishlab/M2V_large_output".to_string(),
                        size_mb: 250,
                        dimensions: 512,
                        description: "High-capacity Model2Vec large embeddings model".to_string(),
                    },
                ],
            },
            processing: ProcessingConfig {
                chunk_size: 512,
                chunk_overlap: 50,
                enable_caching: true,
                cache_capacity: 256,
                reference_date: None,
                ngram_max: 2,
            },
            scoring: ScoringConfig {
                fuzzy_threshold: 0.8,
                high_threshold: 80,
                medium_threshold: 60,
                weights: ScoringWeights::default(),
            },
            skills: SkillConfig {
                augment_from_text: true,
                known_skills: default_known_skills(),
                synonyms: default_synonyms(),
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| RelevanceError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RelevanceError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-relevance")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let w = &self.scoring.weights;
        let weights = [w.hard_match, w.semantic, w.education, w.experience];
        if weights.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(RelevanceError::Configuration(
                "Scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if (w.total() - 1.0).abs() > 1e-3 {
            return Err(RelevanceError::Configuration(format!(
                "Scoring weights must sum to 1.0 (got {:.3})",
                w.total()
            )));
        }
        if !(0.0..=1.0).contains(&self.scoring.fuzzy_threshold) {
            return Err(RelevanceError::Configuration(
                "fuzzy_threshold must lie in [0, 1]".to_string(),
            ));
        }
        if self.scoring.medium_threshold > self.scoring.high_threshold || self.scoring.high_threshold > 100 {
            return Err(RelevanceError::Configuration(
                "Verdict thresholds must satisfy medium <= high <= 100".to_string(),
            ));
        }
        if self.processing.chunk_size == 0 || self.processing.chunk_overlap >= self.processing.chunk_size {
            return Err(RelevanceError::Configuration(
                "Chunk size must be greater than overlap".to_string(),
            ));
        }
        if self.processing.enable_caching && self.processing.cache_capacity == 0 {
            return Err(RelevanceError::Configuration(
                "cache_capacity must be positive when caching is enabled".to_string(),
            ));
        }
        if self.processing.ngram_max == 0 {
            return Err(RelevanceError::Configuration("ngram_max must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models
            .available_models
            .iter()
            .find(|m| m.name == name || m.repo_id == name)
    }
}

fn default_synonyms() -> BTreeMap<String, String> {
    let aliases: &[(&str, &[&str])] = &[
        ("javascript", &["js", "java script", "ecmascript", "es6"]),
        ("typescript", &["ts", "type script"]),
        ("nodejs", &["node", "node js", "node.js"]),
        ("react", &["reactjs", "react.js", "react js"]),
        ("vue", &["vuejs", "vue.js"]),
        ("angular", &["angularjs", "angular.js"]),
        ("nextjs", &["next.js", "next js"]),
        ("express", &["expressjs", "express.js"]),
        ("python", &["py", "python3", "python 3"]),
        ("golang", &["go", "go lang"]),
        ("c++", &["cpp", "cplusplus"]),
        ("c#", &["csharp", "c sharp"]),
        ("postgresql", &["postgres", "psql"]),
        ("mongodb", &["mongo", "mongo db"]),
        ("mysql", &["my sql", "mariadb"]),
        ("sql", &["structured query language"]),
        ("elasticsearch", &["elastic search"]),
        ("aws", &["amazon web services"]),
        ("gcp", &["google cloud", "google cloud platform"]),
        ("azure", &["microsoft azure"]),
        ("kubernetes", &["k8s", "kube"]),
        ("docker", &["docker engine"]),
        ("cicd", &["ci cd", "ci/cd", "continuous integration"]),
        ("machine learning", &["ml"]),
        ("deep learning", &["dl"]),
        ("artificial intelligence", &["ai"]),
        ("natural language processing", &["nlp"]),
        ("computer vision", &["cv"]),
        ("scikit-learn", &["sklearn", "scikit learn"]),
        ("tensorflow", &["tf"]),
        ("rest api", &["rest", "restful", "restful api"]),
        ("power bi", &["powerbi"]),
    ];

    let mut table = BTreeMap::new();
    for (canonical, alias_list) in aliases {
        for alias in alias_list.iter() {
            table.insert(alias.to_string(), canonical.to_string());
        }
    }
    table
}

fn default_known_skills() -> Vec<String> {
    [
        // Programming languages
        "python", "java", "javascript", "typescript", "c++", "c#", "php", "ruby", "golang",
        "rust", "swift", "kotlin", "scala", "matlab", "perl", "bash",
        // Web
        "react", "angular", "vue", "nodejs", "express", "django", "flask", "fastapi", "spring",
        "laravel", "rails", "html", "css", "sass", "tailwind", "jquery", "webpack",
        // Databases
        "sql", "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "oracle", "sqlite",
        "dynamodb", "cassandra", "neo4j",
        // Cloud and DevOps
        "aws", "azure", "gcp", "docker", "kubernetes", "terraform", "ansible", "jenkins",
        "gitlab", "github", "cicd", "devops", "linux",
        // Data and ML
        "machine learning", "deep learning", "natural language processing", "computer vision",
        "pandas", "numpy", "scikit-learn", "tensorflow", "pytorch", "keras", "spark", "kafka",
        "tableau", "power bi",
        // Practices
        "git", "agile", "scrum", "kanban", "tdd", "microservices", "rest api", "graphql",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!((config.scoring.weights.total() - 1.0).abs() < 1e-6);
        assert_eq!(config.scoring.fuzzy_threshold, 0.8);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut config = Config::default();
        config.scoring.weights.semantic = 0.9;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.weights.education = -0.1;
        config.scoring.weights.experience = 0.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_overlap_larger_than_chunk() {
        let mut config = Config::default();
        config.processing.chunk_overlap = config.processing.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.processing.reference_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.processing.reference_date, config.processing.reference_date);
        assert_eq!(loaded.skills.synonyms.get("js").map(String::as_str), Some("javascript"));
        assert_eq!(loaded.scoring.weights, config.scoring.weights);
    }
}
