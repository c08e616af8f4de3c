//! tally - session statistics for CLI assistant transcripts
//!
//! Reads one JSON Lines session transcript and prints its aggregate
//! statistics together with an estimated cost.
//!
//! ## Usage
//!
//! ```bash
//! # Human-readable summary
//! tally ~/.claude/projects/my-repo/3f2a.jsonl
//!
//! # JSON report with feedback attached
//! tally session.jsonl --format json --rating 4 --tag refactor
//!
//! # With verbose logging
//! tally session.jsonl -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tally_core::{LogGuard, OutputFormat, TallyConfig, init_logging};
use tally_stats::{SessionFeedback, SessionReport, TranscriptParser};
use tracing::{error, info};

/// Summarize a CLI assistant session transcript
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the session transcript (JSON Lines)
    transcript: PathBuf,

    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Configuration file (defaults to ~/.tally/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.tally/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Session quality rating
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: Option<u8>,

    /// Free-text note about the session
    #[arg(long)]
    note: Option<String>,

    /// Category tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TallyConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("Hint: {}", hint);
            }
            // 2 for a bad config file, 1 for anything environmental
            return ExitCode::from(if e.is_config_error() { 2 } else { 1 });
        }
    };

    let _guard = match setup_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("tally failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Set up logging based on CLI arguments and configuration.
fn setup_logging(cli: &Cli, config: &TallyConfig) -> tally_core::Result<LogGuard> {
    let log_dir = cli.log_dir.clone().or_else(|| config.log_dir.clone());
    init_logging(log_dir, cli.verbose > 0)
}

/// Parse the transcript and print the report.
fn run(cli: &Cli, config: &TallyConfig) -> anyhow::Result<()> {
    info!(transcript = %cli.transcript.display(), "Summarizing transcript");

    let parser = TranscriptParser::with_max_line_bytes(config.max_line_bytes);
    let stats = parser.parse_file(&cli.transcript).map_err(|e| {
        error!(error = %e, "Transcript could not be read");
        anyhow::anyhow!(e.friendly_message())
    })?;

    let report = SessionReport::new(stats).with_feedback(SessionFeedback {
        rating: cli.rating,
        notes: cli.note.clone(),
        tags: cli.tags.clone(),
    });

    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output);
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("could not encode report")?;
            println!("{json}");
        }
        OutputFormat::Text => print_text(&report),
    }

    info!(cost_usd = report.cost_usd, "Done");
    Ok(())
}

fn print_text(report: &SessionReport) {
    let stats = &report.stats;
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    println!("Summary:    {}", or_dash(&stats.summary));
    println!("Model:      {} (priced as {})", or_dash(&stats.model), report.pricing_model);
    println!("Branch:     {}", or_dash(&stats.git_branch));
    println!("Version:    {}", or_dash(&stats.tool_version));
    println!("Duration:   {:.0}s", report.duration_secs);
    println!(
        "Turns:      {} prompts, {} responses",
        stats.user_prompts, stats.assistant_responses
    );
    println!("Tools:      {} calls, {} errors", stats.tool_calls, stats.errors);

    let mut tools: Vec<_> = stats.tool_counts.iter().collect();
    tools.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (name, count) in tools {
        println!("  {:<14} {}", name, count);
    }

    println!(
        "Files:      {} accessed, {} modified",
        stats.accessed_files.len(),
        stats.modified_files.len()
    );
    println!(
        "Tokens:     {} total ({} in, {} out, {} thinking, {} cache read, {} cache write)",
        stats.total_tokens(),
        stats.input_tokens,
        stats.output_tokens,
        stats.thinking_tokens,
        stats.cache_read_tokens,
        stats.cache_write_tokens
    );
    println!("Cost:       ${:.6}", report.cost_usd);

    if let Some(limit) = &stats.limit_message {
        println!("Limit:      {}", limit);
    }
    if let Some(feedback) = &report.feedback {
        if let Some(rating) = feedback.rating {
            println!("Rating:     {}/5", rating);
        }
        if let Some(notes) = &feedback.notes {
            println!("Notes:      {}", notes);
        }
        if !feedback.tags.is_empty() {
            println!("Tags:       {}", feedback.tags.join(", "));
        }
    }
}
