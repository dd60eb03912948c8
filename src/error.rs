//! Error handling for the relevance engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelevanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),
}

pub type Result<T> = std::result::Result<T, RelevanceError>;

/// Model2Vec reports load failures as anyhow errors
impl From<anyhow::Error> for RelevanceError {
    fn from(err: anyhow::Error) -> Self {
        RelevanceError::ModelError(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_chain_is_kept() {
        let err: RelevanceError = anyhow::anyhow!("config.json missing")
            .context("Failed to load model")
            .into();
        assert_eq!(err.to_string(), "Model error: Failed to load model: config.json missing");
    }
}
