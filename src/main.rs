//! resume-relevance: score parsed resumes against parsed job descriptions

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_relevance::cli::{self, BackendChoice, Cli, Commands, ConfigAction, ModelAction};
use resume_relevance::config::OutputFormat;
use resume_relevance::input::InputManager;
use resume_relevance::output::formatter::{parse_output_format, save_report_to_file, suggest_filename};
use resume_relevance::output::{BatchReport, ReportGenerator};
use resume_relevance::processing::embedding_manager::EmbeddingModelManager;
use resume_relevance::processing::embeddings::{EmbeddingBackend, HashingBackend};
use resume_relevance::{Config, RelevanceEngine, RelevanceError, Result};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

const INPUT_EXTENSIONS: [&str; 3] = ["json", "toml", "txt"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        // A broken config file must not block resetting it
        Err(e) if matches!(cli.command, Commands::Config { action: Some(ConfigAction::Reset) }) => {
            warn!("Ignoring unreadable configuration: {}", e);
            Config::default()
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Evaluate {
            resume,
            job,
            output,
            save,
            detailed,
            backend,
            no_embeddings,
        } => {
            validate_input(&resume, "Resume")?;
            validate_input(&job, "Job description")?;

            let format = resolve_format(output.as_deref(), &config)?;
            let detailed = detailed || config.output.detailed;
            let use_colors = config.output.color_output;

            let mut input_manager = InputManager::new();
            let parsed_resume = input_manager.load_resume(&resume).await?;
            let parsed_job = input_manager.load_job(&job).await?;

            let engine = build_engine(config, cli::effective_backend(backend, no_embeddings)).await?;
            info!("Evaluating {} against {}", resume.display(), job.display());
            let result = engine.evaluate(&parsed_resume, &parsed_job)?;

            let generator = ReportGenerator::with_options(use_colors, detailed, true, true);
            println!("{}", generator.generate_report(&result, &format)?);

            if detailed && format == OutputFormat::Console {
                print_engine_stats(&engine);
            }

            if let Some(path) = save {
                let plain = ReportGenerator::with_options(false, detailed, true, true);
                let content = plain.generate_report(&result, &format)?;
                save_output(&content, &path, &format, &resume)?;
            }
        }

        Commands::Batch {
            resume,
            jobs,
            output,
            save,
            detailed,
            backend,
            no_embeddings,
        } => {
            validate_input(&resume, "Resume")?;

            let format = resolve_format(output.as_deref(), &config)?;
            let detailed = detailed || config.output.detailed;
            let use_colors = config.output.color_output;

            let mut input_manager = InputManager::new();
            let parsed_resume = input_manager.load_resume(&resume).await?;

            // Jobs that fail to load keep their slot so the report stays in job order
            let mut load_failures: Vec<Option<RelevanceError>> = Vec::with_capacity(jobs.len());
            let mut loaded = Vec::new();
            for path in &jobs {
                let parsed = match validate_input(path, "Job description") {
                    Ok(()) => input_manager.load_job(path).await,
                    Err(e) => Err(e),
                };
                match parsed {
                    Ok(job) => {
                        loaded.push(job);
                        load_failures.push(None);
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        load_failures.push(Some(e));
                    }
                }
            }

            let engine = Arc::new(build_engine(config, cli::effective_backend(backend, no_embeddings)).await?);

            let progress = spinner(format!("Evaluating {} job description(s)...", loaded.len()));
            let mut evaluated = engine
                .evaluate_batch(Arc::new(parsed_resume), loaded)
                .await
                .into_iter();
            progress.finish_and_clear();

            let mut report = BatchReport::new(resume.display().to_string());
            for (path, failure) in jobs.iter().zip(load_failures) {
                let outcome = match failure {
                    Some(e) => Err(e),
                    None => evaluated.next().unwrap_or_else(|| {
                        Err(RelevanceError::EvaluationFailed("No result returned".to_string()))
                    }),
                };
                report.push(path.display().to_string(), outcome);
            }

            if report.failures() > 0 {
                warn!("{} of {} evaluations failed", report.failures(), report.entries.len());
            }

            let generator = ReportGenerator::with_options(use_colors, detailed, true, true);
            println!("{}", generator.generate_batch_report(&report, &format)?);

            if let Some(path) = save {
                let plain = ReportGenerator::with_options(false, detailed, true, true);
                let content = plain.generate_batch_report(&report, &format)?;
                save_output(&content, &path, &format, &resume)?;
            }
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(&config.models).await?;
            match action {
                ModelAction::List { downloaded } => {
                    println!("📚 Embedding Models\n");
                    for model in manager.list_available_models() {
                        let is_downloaded = manager.is_model_downloaded(&model.name);
                        if downloaded && !is_downloaded {
                            continue;
                        }
                        let marker = if model.name == config.models.default_embedding_model {
                            " (default)"
                        } else {
                            ""
                        };
                        println!(
                            "  • {}{} ({}) - {} MB, {} dims [{}]",
                            model.name,
                            marker,
                            model.repo_id,
                            model.size_mb,
                            model.dimensions,
                            if is_downloaded { "✅ Downloaded" } else { "⬇️  Available" }
                        );
                        println!("    {}", model.description);
                    }

                    let uncatalogued: Vec<String> = manager
                        .list_downloaded_models()
                        .into_iter()
                        .filter(|name| manager.model_info(name).is_none())
                        .collect();
                    if !uncatalogued.is_empty() {
                        println!("\n📁 Other local models:");
                        for name in uncatalogued {
                            println!("  • {}", name);
                        }
                    }
                }

                ModelAction::Download { model } => {
                    let progress = spinner(format!("Downloading {}...", model));
                    let downloaded = manager.ensure_model_available(&model).await;
                    progress.finish_and_clear();

                    let model_path = downloaded?;
                    println!("✅ Model '{}' is available", model);
                    println!("📁 Location: {}", model_path.display());
                }

                ModelAction::Info { model } => {
                    let model_info = manager
                        .model_info(&model)
                        .cloned()
                        .ok_or_else(|| RelevanceError::ModelNotFound(model.clone()))?;

                    println!("📋 Model Information for '{}'\n", model_info.name);
                    println!("Repository: {}", model_info.repo_id);
                    println!("Size: {} MB", model_info.size_mb);
                    println!("Dimensions: {}", model_info.dimensions);
                    println!("Description: {}", model_info.description);

                    match manager.model_path(&model_info.name) {
                        Some(path) => {
                            println!("Status: ✅ Downloaded");
                            println!("Location: {}", path.display());
                        }
                        None => {
                            println!("Status: ⬇️  Available for download");
                            println!("\n💡 To download this model, run:");
                            println!("   resume-relevance models download {}", model_info.name);
                        }
                    }
                }
            }
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration ({})\n", path.display());
                    println!("Models Directory: {}", config.models_dir().display());
                    println!("Default Embedding Model: {}", config.models.default_embedding_model);
                    println!("\nScoring Weights:");
                    println!("  Hard match: {:.1}%", config.scoring.weights.hard_match * 100.0);
                    println!("  Semantic: {:.1}%", config.scoring.weights.semantic * 100.0);
                    println!("  Education: {:.1}%", config.scoring.weights.education * 100.0);
                    println!("  Experience: {:.1}%", config.scoring.weights.experience * 100.0);
                    println!(
                        "\nVerdicts: High >= {}, Medium >= {}",
                        config.scoring.high_threshold, config.scoring.medium_threshold
                    );
                    println!("Fuzzy Threshold: {:.2}", config.scoring.fuzzy_threshold);
                    println!(
                        "Chunking: {} chars, {} overlap",
                        config.processing.chunk_size, config.processing.chunk_overlap
                    );
                    println!(
                        "Skills: {} known, {} synonyms",
                        config.skills.known_skills.len(),
                        config.skills.synonyms.len()
                    );
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(&path)?;
                    println!("✅ Configuration reset: {}", path.display());
                }

                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn validate_input(path: &Path, label: &str) -> Result<()> {
    cli::validate_file_extension(path, &INPUT_EXTENSIONS)
        .map_err(|e| RelevanceError::InvalidInput(format!("{} file: {}", label, e)))
}

fn resolve_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(name) => parse_output_format(name),
        None => Ok(config.output.format),
    }
}

async fn build_engine(config: Config, backend: BackendChoice) -> Result<RelevanceEngine> {
    match backend {
        BackendChoice::Model => {
            let progress = spinner(format!(
                "Loading embedding model {}...",
                config.models.default_embedding_model
            ));
            let engine = RelevanceEngine::from_config(config).await;
            progress.finish_and_clear();
            engine
        }
        BackendChoice::Hashing => {
            let hashing: Arc<dyn EmbeddingBackend> =
                Arc::new(HashingBackend::new(HashingBackend::DEFAULT_DIMENSIONS));
            RelevanceEngine::new(config, Some(hashing))
        }
        BackendChoice::None => RelevanceEngine::new(config, None),
    }
}

fn spinner(message: String) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn print_engine_stats(engine: &RelevanceEngine) {
    let stats = engine.stats();
    println!("⚡ Engine");
    println!("  • Embedding backend: {}", stats.embedding_backend.as_deref().unwrap_or("none"));
    if let Some(cache) = stats.cache {
        println!(
            "  • Embedding cache: {}/{} entries, {} hits, {} misses",
            cache.entries, cache.capacity, cache.hits, cache.misses
        );
    }
    println!("  • Fuzzy threshold: {:.0}%", stats.fuzzy_threshold * 100.0);
    println!(
        "  • Skill vocabulary: {} known skills, {} synonyms",
        stats.known_skill_patterns, stats.synonym_count
    );
}

/// A directory target gets a suggested file name inside it
fn save_output(content: &str, path: &Path, format: &OutputFormat, resume: &Path) -> Result<()> {
    let target = if path.is_dir() {
        path.join(suggest_filename(format, &resume.to_string_lossy(), true))
    } else {
        path.to_path_buf()
    };
    save_report_to_file(content, &target)?;
    eprintln!("💾 Saved report to {}", target.display());
    Ok(())
}
