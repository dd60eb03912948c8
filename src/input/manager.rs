//! Input manager for parsed resume and job description documents

use crate::error::{Result, RelevanceError};
use crate::input::file_detector::FileType;
use crate::model::{ParsedJobDescription, ParsedResume};
use log::info;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Reads documents produced by the parsing collaborators. File contents are
/// cached by path so one resume evaluated against many jobs is read once.
pub struct InputManager {
    cache: HashMap<String, String>,
    enable_cache: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Load a resume from JSON, TOML or plain text (raw text only)
    pub async fn load_resume(&mut self, path: &Path) -> Result<ParsedResume> {
        let (file_type, content) = self.read(path).await?;
        match file_type {
            FileType::Text => Ok(ParsedResume::new(content)),
            _ => parse_structured(file_type, &content, path),
        }
    }

    /// Load a job description; validation runs as part of deserialization
    pub async fn load_job(&mut self, path: &Path) -> Result<ParsedJobDescription> {
        let (file_type, content) = self.read(path).await?;
        match file_type {
            FileType::Text => ParsedJobDescription::builder(content).build(),
            _ => parse_structured(file_type, &content, path),
        }
    }

    async fn read(&mut self, path: &Path) -> Result<(FileType, String)> {
        let file_type = detect_file_type(path)?;
        if file_type == FileType::Unknown {
            return Err(RelevanceError::UnsupportedFormat(format!(
                "Expected a .json, .toml or .txt document: {}",
                path.display()
            )));
        }

        let path_str = path.to_string_lossy().to_string();
        if self.enable_cache {
            if let Some(cached) = self.cache.get(&path_str) {
                info!("Using cached content for: {}", path.display());
                return Ok((file_type, cached.clone()));
            }
        }

        if !path.exists() {
            return Err(RelevanceError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        info!("Reading {:?} document: {}", file_type, path.display());
        let content = fs::read_to_string(path).await?;

        if self.enable_cache {
            self.cache.insert(path_str, content.clone());
        }

        Ok((file_type, content))
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

fn detect_file_type(path: &Path) -> Result<FileType> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| RelevanceError::InvalidInput(format!("File has no extension: {}", path.display())))?;

    Ok(FileType::from_extension(extension))
}

fn parse_structured<T: DeserializeOwned>(file_type: FileType, content: &str, path: &Path) -> Result<T> {
    match file_type {
        FileType::Json => serde_json::from_str(content).map_err(|e| {
            RelevanceError::InvalidInput(format!("Invalid JSON in {}: {}", path.display(), e))
        }),
        FileType::Toml => toml::from_str(content).map_err(|e| {
            RelevanceError::InvalidInput(format!("Invalid TOML in {}: {}", path.display(), e))
        }),
        other => Err(RelevanceError::UnsupportedFormat(format!(
            "{:?} is not a structured format",
            other
        ))),
    }
}
