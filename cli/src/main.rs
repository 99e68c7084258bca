//! docparity CLI - document and page-render comparison tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docparity::escalate::JsonFileStrategy;
use docparity::model::BoundingBox;
use docparity::report::to_json;
use docparity::{
    load_document, Action, AttemptOutcome, ComparisonResult, ConfidenceScorer, DocumentCategory,
    DocumentSource, EquivalenceChecker, EscalationPipeline, ExtractionContext, ExtractionStrategy,
    JsonFormat, Quality, Settings, Severity, ValidationReport,
};

#[derive(Parser)]
#[command(name = "docparity")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Compare extracted documents and page renders", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true, value_name = "FILE", env = "DOCPARITY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a candidate document (JSON) against a reference
    Compare {
        /// Reference document
        #[arg(value_name = "REFERENCE")]
        reference: PathBuf,

        /// Candidate document
        #[arg(value_name = "CANDIDATE")]
        candidate: PathBuf,

        /// Lowest passing grade
        #[arg(long, value_enum, default_value = "acceptable")]
        min_quality: MinQuality,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two page images
    Visual {
        /// Baseline image
        #[arg(value_name = "BASELINE")]
        baseline: PathBuf,

        /// Candidate image
        #[arg(value_name = "CANDIDATE")]
        candidate: PathBuf,

        /// Region to ignore as x,y,width,height (repeatable)
        #[arg(long = "mask", value_name = "X,Y,W,H", value_parser = parse_region)]
        masks: Vec<BoundingBox>,

        /// Minimum SSIM to pass
        #[arg(long)]
        threshold: Option<f64>,

        /// Fail on dimension mismatch instead of resizing
        #[arg(long)]
        no_resize: bool,

        /// Write an image highlighting differing pixels
        #[arg(long, value_name = "FILE")]
        diff: Option<PathBuf>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the confidence of an extracted document
    Score {
        /// Extracted document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Document category (e.g. academic_paper)
        #[arg(long)]
        category: Option<DocumentCategory>,

        /// Confidence reported by the extractor
        #[arg(long)]
        reported_confidence: Option<f64>,

        /// Output the score as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay pre-extracted attempts through the escalation pipeline
    Escalate {
        /// Attempt as name=path[:cost[:confidence]], cheapest first (repeatable)
        #[arg(long = "attempt", value_name = "SPEC", required = true, value_parser = parse_attempt)]
        attempts: Vec<AttemptSpec>,

        /// Accept threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Document category
        #[arg(long)]
        category: Option<DocumentCategory>,

        /// Cost budget over all attempts
        #[arg(long)]
        budget: Option<f64>,

        /// Per-attempt timeout in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare every JSON document in two directories, paired by file name
    Batch {
        /// Directory of reference documents
        #[arg(value_name = "REFERENCE_DIR")]
        reference_dir: PathBuf,

        /// Directory of candidate documents
        #[arg(value_name = "CANDIDATE_DIR")]
        candidate_dir: PathBuf,

        /// Lowest passing grade
        #[arg(long, value_enum, default_value = "acceptable")]
        min_quality: MinQuality,

        /// Report format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        /// Report file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the effective settings as TOML
    Config,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MinQuality {
    Exact,
    Good,
    Acceptable,
    Poor,
    Failed,
}

impl From<MinQuality> for Quality {
    fn from(level: MinQuality) -> Self {
        match level {
            MinQuality::Exact => Quality::Exact,
            MinQuality::Good => Quality::Good,
            MinQuality::Acceptable => Quality::Acceptable,
            MinQuality::Poor => Quality::Poor,
            MinQuality::Failed => Quality::Failed,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Markdown tables
    Markdown,
    /// Pretty-printed JSON
    Json,
    /// Plain text
    Text,
}

/// One `--attempt` argument.
#[derive(Clone, Debug)]
struct AttemptSpec {
    name: String,
    path: PathBuf,
    cost: Option<f64>,
    confidence: Option<f64>,
}

fn parse_attempt(s: &str) -> Result<AttemptSpec, String> {
    let (name, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=path[:cost[:confidence]], got {}", s))?;
    let mut parts = rest.split(':');
    let path = parts.next().filter(|p| !p.is_empty()).ok_or("missing path")?;
    let number = |part: Option<&str>, what: &str| -> Result<Option<f64>, String> {
        part.map(|p| p.parse::<f64>().map_err(|_| format!("invalid {}: {}", what, p)))
            .transpose()
    };
    let cost = number(parts.next(), "cost")?;
    let confidence = number(parts.next(), "confidence")?;
    Ok(AttemptSpec {
        name: name.to_string(),
        path: PathBuf::from(path),
        cost,
        confidence,
    })
}

fn parse_region(s: &str) -> Result<BoundingBox, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid region {}: {}", s, e))?;
    match values.as_slice() {
        [x, y, w, h] => Ok(BoundingBox::region(*x, *y, *w, *h)),
        _ => Err(format!("expected x,y,width,height, got {}", s)),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Compare {
            reference,
            candidate,
            min_quality,
            json,
        } => cmd_compare(&settings, &reference, &candidate, min_quality.into(), json),
        Commands::Visual {
            baseline,
            candidate,
            masks,
            threshold,
            no_resize,
            diff,
            json,
        } => cmd_visual(
            settings,
            &baseline,
            &candidate,
            masks,
            threshold,
            no_resize,
            diff.as_deref(),
            json,
        ),
        Commands::Score {
            document,
            category,
            reported_confidence,
            json,
        } => cmd_score(settings, &document, category, reported_confidence, json),
        Commands::Escalate {
            attempts,
            threshold,
            category,
            budget,
            timeout_ms,
            json,
        } => cmd_escalate(settings, attempts, threshold, category, budget, timeout_ms, json),
        Commands::Batch {
            reference_dir,
            candidate_dir,
            min_quality,
            format,
            output,
        } => cmd_batch(
            settings,
            &reference_dir,
            &candidate_dir,
            min_quality.into(),
            format,
            output.as_deref(),
        ),
        Commands::Config => {
            print!("{}", settings.to_toml_string()?);
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::debug!("Using settings file {}", path.display());
            Ok(Settings::load(path)?)
        }
        None => Ok(Settings::default()),
    }
}

fn cmd_compare(
    settings: &Settings,
    reference: &Path,
    candidate: &Path,
    min_quality: Quality,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference_doc = load_document(reference)?;
    let candidate_doc = load_document(candidate)?;

    let checker = EquivalenceChecker::new(settings.compare.clone())?;
    let result = checker.compare(&reference_doc, &candidate_doc);

    if json {
        println!("{}", to_json(&result, JsonFormat::Pretty)?);
    } else {
        print_comparison(&result);
    }

    if !result.passed(min_quality) {
        return Err(format!("quality {} is below {}", result.quality, min_quality).into());
    }
    Ok(())
}

fn print_comparison(result: &ComparisonResult) {
    println!("{}", "Comparison".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{}: {:.3} ({})",
        "Overall".bold(),
        result.overall_score,
        quality_label(result.quality)
    );
    for (section, score) in &result.section_scores {
        println!("  {:<10} {:.3}", section.as_str(), score);
    }

    if result.issues.is_empty() {
        return;
    }
    println!();
    println!("{}", "Issues".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for issue in &result.issues {
        let severity = match issue.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow(),
            Severity::Info => "info".dimmed(),
        };
        println!("{} {}: {}", severity, issue.path.bold(), issue.message);
    }
}

fn quality_label(quality: Quality) -> colored::ColoredString {
    let label = quality.to_string();
    match quality {
        Quality::Exact | Quality::Good => label.green().bold(),
        Quality::Acceptable => label.yellow(),
        Quality::Poor | Quality::Failed => label.red().bold(),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_visual(
    settings: Settings,
    baseline: &Path,
    candidate: &Path,
    masks: Vec<BoundingBox>,
    threshold: Option<f64>,
    no_resize: bool,
    diff: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = settings.visual.with_masks(masks);
    if let Some(threshold) = threshold {
        options = options.with_threshold(threshold);
    }
    if no_resize {
        options = options.with_auto_resize(false);
    }

    let baseline_img = image::open(baseline)?;
    let candidate_img = image::open(candidate)?;
    let result = docparity::compare_images(&baseline_img, &candidate_img, &options)?;

    if let Some(path) = diff {
        if result.failure.is_none() {
            let overlay = docparity::visual::diff_image(&baseline_img, &candidate_img, &options)?;
            overlay.save(path)?;
            println!("{} {}", "Saved diff to".green(), path.display());
        }
    }

    if json {
        println!("{}", to_json(&result, JsonFormat::Pretty)?);
    } else {
        println!("{}", "Visual comparison".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}x{}", "Size".bold(), result.width, result.height);
        if result.resized {
            println!("{}", "Candidate was resized to the baseline size".yellow());
        }
        println!("{}: {:.4}", "SSIM".bold(), result.ssim_score);
        println!(
            "{}: {:.2}%",
            "Pixels differing".bold(),
            result.pixel_diff_ratio * 100.0
        );
        if result.masked_pixels > 0 {
            println!("{}: {}", "Masked pixels".bold(), result.masked_pixels);
        }
        if let Some(ref reason) = result.failure {
            println!("{}: {}", "Not compared".red().bold(), reason);
        }
    }

    if !result.passed {
        return Err(format!(
            "images differ (ssim {:.4} < {:.4})",
            result.ssim_score, options.threshold
        )
        .into());
    }
    println!("{}", "PASS".green().bold());
    Ok(())
}

fn cmd_score(
    settings: Settings,
    document: &Path,
    category: Option<DocumentCategory>,
    reported_confidence: Option<f64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(document)?;
    let scorer = ConfidenceScorer::new(settings.confidence)?;
    let context = ExtractionContext {
        strategy: None,
        reported_confidence,
        category,
    };
    let score = scorer.score(&doc, &context);

    if json {
        println!("{}", to_json(&score, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{}", "Confidence".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{}: {:.3} ({})",
        "Overall".bold(),
        score.overall,
        score.level()
    );
    for (signal, value) in &score.signals {
        println!("  {:<13} {:.3}", signal.as_str(), value);
    }
    for reason in &score.reasons {
        println!("  {} {}", "note:".dimmed(), reason);
    }
    Ok(())
}

fn cmd_escalate(
    settings: Settings,
    attempts: Vec<AttemptSpec>,
    threshold: Option<f64>,
    category: Option<DocumentCategory>,
    budget: Option<f64>,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = settings.escalation;
    if let Some(threshold) = threshold {
        options = options.with_accept_threshold(threshold);
    }
    if let Some(budget) = budget {
        options = options.with_max_total_cost(budget);
    }
    if let Some(ms) = timeout_ms {
        options = options.with_attempt_timeout(Duration::from_millis(ms));
    }

    let strategies: Vec<Arc<dyn ExtractionStrategy>> = attempts
        .iter()
        .map(|spec| {
            let mut strategy = JsonFileStrategy::new(&spec.name, &spec.path);
            if let Some(cost) = spec.cost {
                strategy = strategy.with_cost(cost);
            }
            if let Some(confidence) = spec.confidence {
                strategy = strategy.with_reported_confidence(confidence);
            }
            Arc::new(strategy) as Arc<dyn ExtractionStrategy>
        })
        .collect();

    let scorer = ConfidenceScorer::new(settings.confidence)?;
    let pipeline = EscalationPipeline::new(strategies, options)?.with_scorer(scorer);

    let mut source = DocumentSource::from_path(&attempts[0].path)?;
    if let Some(category) = category {
        source = source.with_category(category);
    }
    let outcome = pipeline.run(&source)?;

    if json {
        println!("{}", to_json(&outcome, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{}", "Attempts".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for attempt in &outcome.attempts {
        let outcome_label = match &attempt.outcome {
            AttemptOutcome::Succeeded => "ok".green(),
            other => other.to_string().red(),
        };
        println!(
            "  {} {:<12} {:.3}  cost {:<6} {:>6}ms  {}  -> {}",
            attempt.index,
            attempt.strategy,
            attempt.confidence.overall,
            attempt.cost,
            attempt.duration.as_millis(),
            outcome_label,
            attempt.decision
        );
    }
    println!();

    let verdict = match outcome.decision.action {
        Action::Accept => outcome.decision.action.to_string().green().bold(),
        _ => outcome.decision.action.to_string().yellow().bold(),
    };
    match &outcome.decision.chosen_strategy {
        Some(name) => println!(
            "{} with {} ({:.3}, {})",
            verdict,
            name.bold(),
            outcome.confidence.overall,
            outcome.confidence.level()
        ),
        None => println!("{}: every attempt failed", verdict),
    }
    Ok(())
}

fn cmd_batch(
    settings: Settings,
    reference_dir: &Path,
    candidate_dir: &Path,
    min_quality: Quality,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut names: Vec<String> = fs::read_dir(reference_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();

    let checker = EquivalenceChecker::new(settings.compare)?;
    let mut report = ValidationReport::new(format!(
        "{} vs {}",
        reference_dir.display(),
        candidate_dir.display()
    ))
    .with_min_quality(min_quality);

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut missing = 0;
    for name in &names {
        pb.set_message(name.clone());
        let candidate_path = candidate_dir.join(name);
        if !candidate_path.exists() {
            pb.println(format!("{} {} has no candidate", "Skipped".yellow(), name));
            missing += 1;
            pb.inc(1);
            continue;
        }
        let reference = load_document(reference_dir.join(name))?;
        let candidate = load_document(&candidate_path)?;
        report.add_comparison(name.clone(), checker.compare(&reference, &candidate));
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    let rendered = match format {
        ReportFormat::Markdown => report.to_markdown(),
        ReportFormat::Json => report.to_json(JsonFormat::Pretty)?,
        ReportFormat::Text => report.to_text(),
    };
    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", rendered);
    }

    let summary = report.summary();
    println!(
        "\n{} {} passed, {} failed, {} skipped",
        "Summary:".bold(),
        summary.passed.to_string().green(),
        summary.failed.to_string().red(),
        missing
    );
    if summary.failed > 0 {
        return Err(format!("{} comparison(s) below {}", summary.failed, min_quality).into());
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docparity".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document equivalence and escalation tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docparity".dimmed());
    println!("License: MIT");
}
