//! Explainable resume to job description relevance scoring

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{Result, RelevanceError};
pub use model::{EvaluationResult, ParsedJobDescription, ParsedResume, Verdict};
pub use processing::aggregator::RelevanceEngine;
