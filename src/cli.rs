//! CLI interface for the relevance engine

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-relevance")]
#[command(about = "Explainable resume to job description relevance scoring")]
#[command(long_about = "Score parsed resumes against parsed job descriptions using skill matching, TF-IDF, embeddings, education and experience signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Which embedding backend feeds the semantic signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    /// Configured Model2Vec model
    Model,
    /// Offline feature hashing, no model files needed
    Hashing,
    /// No semantic signal; its weight is redistributed
    None,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate one resume against one job description
    Evaluate {
        /// Parsed resume (JSON, TOML or plain text)
        #[arg(short, long)]
        resume: PathBuf,

        /// Parsed job description (JSON, TOML or plain text)
        #[arg(short, long)]
        job: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show the per-signal breakdown
        #[arg(short, long)]
        detailed: bool,

        /// Embedding backend for the semantic signal
        #[arg(short, long, value_enum, default_value = "model")]
        backend: BackendChoice,

        /// Skip the semantic signal (same as --backend none)
        #[arg(long)]
        no_embeddings: bool,
    },

    /// Evaluate one resume against several job descriptions
    Batch {
        /// Parsed resume (JSON, TOML or plain text)
        #[arg(short, long)]
        resume: PathBuf,

        /// Parsed job descriptions
        #[arg(short, long, num_args = 1.., required = true)]
        jobs: Vec<PathBuf>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show missing skills per job
        #[arg(short, long)]
        detailed: bool,

        /// Embedding backend for the semantic signal
        #[arg(short, long, value_enum, default_value = "model")]
        backend: BackendChoice,

        /// Skip the semantic signal (same as --backend none)
        #[arg(long)]
        no_embeddings: bool,
    },

    /// Embedding model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List catalogued embedding models
    List {
        /// Show only downloaded models
        #[arg(long)]
        downloaded: bool,
    },

    /// Download a model
    Download {
        /// Model name or HuggingFace repo ID
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// `--no-embeddings` wins over `--backend`
pub fn effective_backend(backend: BackendChoice, no_embeddings: bool) -> BackendChoice {
    if no_embeddings {
        BackendChoice::None
    } else {
        backend
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
