//! Renders evaluation results for the terminal, for tooling and for documents

use crate::config::{OutputFormat, ScoringWeights};
use crate::error::{Result, RelevanceError};
use crate::model::{EvaluationResult, EvaluationStatus, MatchSignal, SignalDetail, SignalStatus, Verdict};
use colored::{Color, Colorize};
use serde::Serialize;
use std::path::Path;

/// Trait for rendering evaluation results
pub trait OutputFormatter {
    fn format_evaluation(&self, result: &EvaluationResult) -> Result<String>;
    fn format_batch(&self, batch: &BatchReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// One resume scored against several jobs, in job order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub resume: String,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub job: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchReport {
    pub fn new(resume: impl Into<String>) -> Self {
        Self {
            resume: resume.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, job: impl Into<String>, outcome: Result<EvaluationResult>) {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(e) => (None, Some(e.to_string())),
        };
        self.entries.push(BatchEntry {
            job: job.into(),
            result,
            error,
        });
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }
}

/// Console formatter with colors and an optional per-signal breakdown
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for tooling and persistence collaborators
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for documents
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

fn percent(score: f32) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

fn signal_score_text(signal: &MatchSignal) -> String {
    match &signal.status {
        SignalStatus::Scored { score } => format!("{}%", percent(*score)),
        SignalStatus::Unavailable { reason } => format!("unavailable ({})", reason),
    }
}

fn weight_text(weights: &ScoringWeights, signal: &MatchSignal) -> String {
    format!("{:.1}%", weights.weight_of(signal.kind) * 100.0)
}

fn status_text(status: &EvaluationStatus) -> String {
    match status {
        EvaluationStatus::Complete => "complete".to_string(),
        EvaluationStatus::Degraded { unavailable } => {
            let names: Vec<String> = unavailable.iter().map(|k| k.to_string()).collect();
            format!("degraded ({} unavailable, weight redistributed)", names.join(", "))
        }
    }
}

/// Plain-text lines explaining one signal's detail payload
fn detail_lines(signal: &MatchSignal) -> Vec<String> {
    match &signal.detail {
        SignalDetail::Hard(d) => {
            let mut lines = vec![
                format!("TF-IDF similarity: {}%", percent(d.tfidf_score)),
                format!("Required skill coverage: {}%", percent(d.skill_score)),
            ];
            for m in &d.matched_required {
                if m.matched == m.required {
                    lines.push(format!("matched {}", m.required));
                } else {
                    lines.push(format!(
                        "matched {} via {} ({:.0}%)",
                        m.required,
                        m.matched,
                        m.similarity * 100.0
                    ));
                }
            }
            if !d.missing_required.is_empty() {
                lines.push(format!("missing: {}", d.missing_required.join(", ")));
            }
            if !d.matched_preferred.is_empty() {
                lines.push(format!("preferred skills present: {}", d.matched_preferred.join(", ")));
            }
            lines
        }
        SignalDetail::Semantic(d) => vec![
            format!("Backend: {}", d.backend.as_deref().unwrap_or("none")),
            format!(
                "Chunks: {} resume / {} job, {} cache hit(s)",
                d.resume_chunks, d.job_chunks, d.cache_hits
            ),
        ],
        SignalDetail::Education(d) => {
            let mut lines = vec![
                format!(
                    "Detected: {}, required: {}",
                    d.detected_degree.label(),
                    d.required_degree.map(|r| r.label()).unwrap_or("none")
                ),
                format!(
                    "Level component: {}%, field component: {}%",
                    percent(d.level_component),
                    percent(d.field_component)
                ),
            ];
            if !d.unmet_fields.is_empty() {
                lines.push(format!("unmet fields: {}", d.unmet_fields.join(", ")));
            }
            lines
        }
        SignalDetail::Experience(d) => {
            let mut lines = vec![format!(
                "Total: {:.1} years, required: {}",
                d.total_years,
                d.required_years
                    .map(|r| format!("{:.1} years", r))
                    .unwrap_or_else(|| "none".to_string())
            )];
            if d.shortfall_years > 0.0 {
                lines.push(format!("shortfall: {:.1} years", d.shortfall_years));
            }
            lines.push(format!(
                "Years component: {}%, title component: {}%",
                percent(d.years_component),
                percent(d.title_component)
            ));
            if let Some(title) = &d.best_title_match {
                lines.push(format!("closest title: {}", title));
            }
            lines
        }
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_verdict(&self, verdict: Verdict) -> String {
        let color = match verdict {
            Verdict::High => Color::Green,
            Verdict::Medium => Color::Yellow,
            Verdict::Low => Color::Red,
        };
        self.colorize(&verdict.to_string(), color)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_evaluation(&self, result: &EvaluationResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 RESUME RELEVANCE EVALUATION", 1));
        output.push_str(&format!("Processing time: {}ms\n", result.processing_time_ms));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Overall Score: {}% {}\n",
            result.overall_score,
            self.format_score_badge(result.overall_score)
        ));
        output.push_str(&format!("Verdict: {}\n", self.format_verdict(result.verdict)));
        if result.is_degraded() {
            output.push_str(&format!(
                "Status: {}\n",
                self.colorize(&status_text(&result.status), Color::Yellow)
            ));
        }

        output.push_str(&self.format_header("Score Breakdown", 3));
        for signal in result.signals() {
            let score_text = signal_score_text(signal);
            let score_text = if signal.is_available() {
                score_text
            } else {
                self.colorize(&score_text, Color::BrightBlack)
            };
            output.push_str(&format!(
                "{:<16} {} (weight: {})\n",
                format!("{}:", signal.kind),
                score_text,
                weight_text(&result.applied_weights, signal)
            ));

            if self.detailed {
                for line in detail_lines(signal) {
                    output.push_str(&format!("    {}\n", line));
                }
            }
        }

        if !result.missing_skills.is_empty() {
            output.push_str(&self.format_header("❌ Missing Required Skills", 3));
            for skill in &result.missing_skills {
                output.push_str(&format!("  • {}\n", self.colorize(skill, Color::Red)));
            }
        }

        if !result.suggestions.is_empty() {
            output.push_str(&self.format_header("📋 Suggestions", 2));
            for (i, suggestion) in result.suggestions.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, suggestion));
            }
        }

        Ok(output)
    }

    fn format_batch(&self, batch: &BatchReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 BATCH EVALUATION", 1));
        output.push_str(&format!("Resume: {}\n", batch.resume));
        output.push_str(&format!(
            "Jobs: {} ({} failed)\n",
            batch.entries.len(),
            batch.failures()
        ));

        output.push_str(&self.format_header("Results", 2));
        for (i, entry) in batch.entries.iter().enumerate() {
            match (&entry.result, &entry.error) {
                (Some(result), _) => {
                    let degraded = if result.is_degraded() {
                        self.colorize(" (degraded)", Color::Yellow)
                    } else {
                        String::new()
                    };
                    output.push_str(&format!(
                        "{}. {} {}% {} {}{}\n",
                        i + 1,
                        entry.job,
                        result.overall_score,
                        self.format_score_badge(result.overall_score),
                        self.format_verdict(result.verdict),
                        degraded
                    ));
                    if self.detailed && !result.missing_skills.is_empty() {
                        output.push_str(&format!("    missing: {}\n", result.missing_skills.join(", ")));
                    }
                }
                (None, error) => {
                    output.push_str(&format!(
                        "{}. {} {}\n",
                        i + 1,
                        entry.job,
                        self.colorize(
                            &format!("failed: {}", error.as_deref().unwrap_or("unknown error")),
                            Color::Red
                        )
                    ));
                }
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_evaluation(&self, result: &EvaluationResult) -> Result<String> {
        self.render(result)
    }

    fn format_batch(&self, batch: &BatchReport) -> Result<String> {
        self.render(batch)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟡 Very Good",
            70..=79 => "🟠 Good",
            60..=69 => "🔴 Fair",
            50..=59 => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }

    /// Pipes would break the table layout
    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_evaluation(&self, result: &EvaluationResult) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📊 Resume Relevance Evaluation\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms\n\n",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                result.processing_time_ms
            ));
        }

        output.push_str("## Summary\n\n");
        output.push_str(&format!(
            "**Overall Score:** {}% {}\n\n",
            result.overall_score,
            Self::markdown_score_badge(result.overall_score)
        ));
        output.push_str(&format!("**Verdict:** {}\n\n", result.verdict));
        if result.is_degraded() {
            output.push_str(&format!("> ⚠️ Evaluation {}\n\n", status_text(&result.status)));
        }

        output.push_str("### Score Breakdown\n\n");
        output.push_str("| Signal | Score | Weight |\n");
        output.push_str("|--------|-------|--------|\n");
        for signal in result.signals() {
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                signal.kind,
                Self::escape_cell(&signal_score_text(signal)),
                weight_text(&result.applied_weights, signal)
            ));
        }
        output.push('\n');

        output.push_str("### Details\n\n");
        for signal in result.signals() {
            output.push_str(&format!("**{}**\n\n", signal.kind));
            for line in detail_lines(signal) {
                output.push_str(&format!("- {}\n", line));
            }
            output.push('\n');
        }

        if !result.missing_skills.is_empty() {
            output.push_str("### ❌ Missing Required Skills\n\n");
            for skill in &result.missing_skills {
                output.push_str(&format!("- {}\n", skill));
            }
            output.push('\n');
        }

        if !result.suggestions.is_empty() {
            output.push_str("## 📋 Suggestions\n\n");
            for (i, suggestion) in result.suggestions.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, suggestion));
            }
            output.push('\n');
        }

        Ok(output)
    }

    fn format_batch(&self, batch: &BatchReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📊 Batch Evaluation\n\n");
        output.push_str(&format!("**Resume:** `{}`\n\n", batch.resume));

        output.push_str("| # | Job | Score | Verdict | Missing Skills |\n");
        output.push_str("|---|-----|-------|---------|----------------|\n");
        for (i, entry) in batch.entries.iter().enumerate() {
            let job = Self::escape_cell(&entry.job);
            match &entry.result {
                Some(result) => {
                    let verdict = if result.is_degraded() {
                        format!("{} (degraded)", result.verdict)
                    } else {
                        result.verdict.to_string()
                    };
                    output.push_str(&format!(
                        "| {} | {} | {}% | {} | {} |\n",
                        i + 1,
                        job,
                        result.overall_score,
                        verdict,
                        Self::escape_cell(&result.missing_skills.join(", "))
                    ));
                }
                None => {
                    output.push_str(&format!(
                        "| {} | {} | - | failed | {} |\n",
                        i + 1,
                        job,
                        Self::escape_cell(entry.error.as_deref().unwrap_or("unknown error"))
                    ));
                }
            }
        }
        output.push('\n');

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    fn formatter(&self, format: &OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        }
    }

    pub fn generate_report(&self, result: &EvaluationResult, format: &OutputFormat) -> Result<String> {
        self.formatter(format).format_evaluation(result)
    }

    pub fn generate_batch_report(&self, batch: &BatchReport, format: &OutputFormat) -> Result<String> {
        self.formatter(format).format_batch(batch)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a user-supplied format name
pub fn parse_output_format(format: &str) -> Result<OutputFormat> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(RelevanceError::OutputFormatting(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        ))),
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_evaluation{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_evaluation{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_evaluation{}.md", base_name, timestamp_suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::signal::{
        EducationDetail, ExperienceDetail, HardMatchDetail, SemanticDetail, SignalKind, SkillMatch,
    };
    use crate::model::DegreeLevel;

    fn sample_result(degraded: bool) -> EvaluationResult {
        let hard = MatchSignal::scored(
            SignalKind::HardMatch,
            0.5,
            SignalDetail::Hard(HardMatchDetail {
                tfidf_score: 0.4,
                skill_score: 0.5,
                matched_required: vec![SkillMatch {
                    required: "python".to_string(),
                    matched: "python".to_string(),
                    similarity: 1.0,
                }],
                missing_required: vec!["java".to_string()],
                matched_preferred: vec![],
            }),
        );
        let semantic = if degraded {
            MatchSignal::unavailable(
                SignalKind::Semantic,
                "backend offline",
                SignalDetail::Semantic(SemanticDetail::default()),
            )
        } else {
            MatchSignal::scored(
                SignalKind::Semantic,
                0.7,
                SignalDetail::Semantic(SemanticDetail {
                    backend: Some("feature-hashing".to_string()),
                    resume_chunks: 1,
                    job_chunks: 1,
                    cache_hits: 0,
                }),
            )
        };
        let education = MatchSignal::scored(
            SignalKind::Education,
            1.0,
            SignalDetail::Education(EducationDetail {
                level_component: 1.0,
                field_component: 1.0,
                detected_degree: DegreeLevel::Bachelor,
                required_degree: Some(DegreeLevel::Bachelor),
                unmet_fields: vec![],
            }),
        );
        let experience = MatchSignal::scored(
            SignalKind::Experience,
            0.75,
            SignalDetail::Experience(ExperienceDetail {
                years_component: 0.5,
                title_component: 1.0,
                total_years: 2.0,
                required_years: Some(4.0),
                shortfall_years: 2.0,
                best_title_match: Some("Data Engineer".to_string()),
            }),
        );

        let status = if degraded {
            EvaluationStatus::Degraded {
                unavailable: vec![SignalKind::Semantic],
            }
        } else {
            EvaluationStatus::Complete
        };

        EvaluationResult {
            overall_score: 63,
            verdict: Verdict::Medium,
            status,
            applied_weights: ScoringWeights::default(),
            hard_match: hard,
            semantic,
            education,
            experience,
            missing_skills: vec!["java".to_string()],
            suggestions: vec!["Add java to your resume.".to_string()],
            processing_time_ms: 3,
        }
    }

    #[test]
    fn test_console_plain_output() {
        let output = ConsoleFormatter::new(false, false)
            .format_evaluation(&sample_result(false))
            .unwrap();

        assert!(output.contains("Overall Score: 63% [FAIR]"));
        assert!(output.contains("Verdict: Medium"));
        assert!(output.contains("Hard match:"));
        assert!(output.contains("• java"));
        assert!(output.contains("1. Add java to your resume."));
        assert!(!output.contains("TF-IDF similarity"));
        assert!(!output.contains("Status:"));
    }

    #[test]
    fn test_console_detailed_and_degraded() {
        let output = ConsoleFormatter::new(false, true)
            .format_evaluation(&sample_result(true))
            .unwrap();

        assert!(output.contains("TF-IDF similarity: 40%"));
        assert!(output.contains("shortfall: 2.0 years"));
        assert!(output.contains("closest title: Data Engineer"));
        assert!(output.contains("unavailable (backend offline)"));
        assert!(output.contains("Status: degraded (Semantic match unavailable"));
    }

    #[test]
    fn test_json_output_parses_back() {
        let result = sample_result(true);
        let json = JsonFormatter::new(true).format_evaluation(&result).unwrap();
        let parsed: EvaluationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"]["state"], "degraded");
        assert_eq!(value["semantic"]["status"]["state"], "unavailable");
    }

    #[test]
    fn test_markdown_output() {
        let output = MarkdownFormatter::new(false)
            .format_evaluation(&sample_result(false))
            .unwrap();

        assert!(output.starts_with("# 📊 Resume Relevance Evaluation"));
        assert!(output.contains("| Hard match | 50% | 40.0% |"));
        assert!(output.contains("- missing: java"));
        assert!(!output.contains("**Generated:**"));
    }

    #[test]
    fn test_batch_reports_keep_order_and_failures() {
        let mut batch = BatchReport::new("resume.json");
        batch.push("backend.json", Ok(sample_result(false)));
        batch.push(
            "broken.json",
            Err(RelevanceError::EvaluationFailed("bad job".to_string())),
        );
        assert_eq!(batch.failures(), 1);

        let console = ConsoleFormatter::new(false, false).format_batch(&batch).unwrap();
        let first = console.find("1. backend.json 63%").unwrap();
        let second = console.find("2. broken.json failed: Evaluation failed: bad job").unwrap();
        assert!(first < second);

        let markdown = MarkdownFormatter::new(false).format_batch(&batch).unwrap();
        assert!(markdown.contains("| 2 | broken.json | - | failed |"));

        let json = JsonFormatter::new(false).format_batch(&batch).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entries"][0]["result"]["overall_score"], 63);
        assert!(value["entries"][1].get("result").is_none());
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD").unwrap(), OutputFormat::Markdown);
        assert_eq!(parse_output_format("json").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(
            suggest_filename(&OutputFormat::Json, "/tmp/jane_doe.json", false),
            "jane_doe_evaluation.json"
        );
        assert!(suggest_filename(&OutputFormat::Markdown, "cv.toml", true).ends_with(".md"));
    }

    #[test]
    fn test_report_generator_dispatch() {
        let generator = ReportGenerator::with_options(false, false, false, false);
        let json = generator
            .generate_report(&sample_result(false), &OutputFormat::Json)
            .unwrap();
        assert!(json.starts_with('{'));
        assert_eq!(generator.formatter(&OutputFormat::Markdown).supports_format(), OutputFormat::Markdown);
    }
}
