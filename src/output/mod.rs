//! Rendering of evaluation results

pub mod formatter;

pub use formatter::{BatchReport, ReportGenerator};
