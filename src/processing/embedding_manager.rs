//! Download and discovery of Model2Vec embedding models

use crate::config::{AvailableModel, ModelConfig};
use crate::error::{Result, RelevanceError};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

const REQUIRED_FILES: [&str; 2] = ["model.safetensors", "tokenizer.json"];
const OPTIONAL_FILES: [&str; 2] = ["config.json", "README.md"];

/// Resolves catalogue entries to local model directories, fetching from the
/// Hugging Face hub on demand
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    catalogue: Vec<AvailableModel>,
    downloaded: BTreeSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(config: &ModelConfig) -> Result<Self> {
        fs::create_dir_all(&config.models_dir).await.map_err(|e| {
            RelevanceError::ModelError(format!("Failed to create models directory: {}", e))
        })?;

        let mut manager = Self {
            models_dir: config.models_dir.clone(),
            catalogue: config.available_models.clone(),
            downloaded: BTreeSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            RelevanceError::ModelError(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && is_model_directory(&entry.path()).await {
                self.downloaded
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(())
    }

    /// Catalogue name for a name, repo id or case-insensitive name
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        let lowered = input.to_lowercase();
        self.catalogue
            .iter()
            .find(|m| m.name == input || m.repo_id == input)
            .or_else(|| self.catalogue.iter().find(|m| m.name.to_lowercase() == lowered))
            .map(|m| m.name.clone())
    }

    pub fn model_info(&self, model_id: &str) -> Option<&AvailableModel> {
        let name = self.resolve_model_id(model_id)?;
        self.catalogue.iter().find(|m| m.name == name)
    }

    pub fn list_available_models(&self) -> &[AvailableModel] {
        &self.catalogue
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        self.downloaded.iter().cloned().collect()
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded.contains(model_id)
    }

    pub fn model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.is_model_downloaded(model_id)
            .then(|| self.models_dir.join(model_id))
    }

    pub async fn download_model(&mut self, model_id: &str) -> Result<PathBuf> {
        let info = self
            .model_info(model_id)
            .cloned()
            .ok_or_else(|| RelevanceError::ModelNotFound(model_id.to_string()))?;

        let model_dir = self.models_dir.join(&info.name);
        if self.downloaded.contains(&info.name) {
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            info.name, info.size_mb, info.repo_id
        );
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| RelevanceError::Network(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(info.repo_id.clone());

        for file in REQUIRED_FILES.iter().chain(OPTIONAL_FILES.iter()) {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await.map_err(|e| {
                        RelevanceError::ModelError(format!("Failed to copy {}: {}", file, e))
                    })?;
                    info!("Downloaded {}", file);
                }
                Err(e) if OPTIONAL_FILES.contains(file) => {
                    warn!("Optional file {} not available: {}", file, e);
                }
                Err(e) => {
                    return Err(RelevanceError::Network(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        self.downloaded.insert(info.name.clone());
        Ok(model_dir)
    }

    pub async fn ensure_model_available(&mut self, model_id: &str) -> Result<PathBuf> {
        let name = self
            .resolve_model_id(model_id)
            .ok_or_else(|| RelevanceError::ModelNotFound(model_id.to_string()))?;
        match self.model_path(&name) {
            Some(path) => Ok(path),
            None => self.download_model(&name).await,
        }
    }
}

async fn is_model_directory(path: &Path) -> bool {
    for file in REQUIRED_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}
