//! Sumi-Folio main entry point
//!
//! This is the command-line interface for the Sumi-Folio documentation crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sumi_folio::config::{load_config_with_hash, validate, Config};
use sumi_folio::output::{format_progress, print_job, print_jobs, print_sections};
use sumi_folio::storage::JobFilter;
use sumi_folio::{Crawler, JobStatus, SqliteStorage};
use tracing_subscriber::EnvFilter;

/// Sumi-Folio: a section-by-section documentation crawler
///
/// Sumi-Folio crawls one section of a documentation site at a time, stores
/// normalized page content, skips pages that did not change since the last
/// crawl and records page-by-page progress on a job.
#[derive(Parser, Debug)]
#[command(name = "sumi-folio")]
#[command(version = "1.0.0")]
#[command(about = "A section-by-section documentation crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the crawlable sections
    Sections,

    /// Crawl one section and follow its progress
    Crawl {
        /// Slug of the section to crawl
        slug: String,

        /// Milliseconds between progress polls
        #[arg(long, default_value_t = 500)]
        poll_ms: u64,
    },

    /// List crawl jobs, most recent first
    Jobs {
        /// Only jobs with this status (pending, running, completed, failed)
        #[arg(long)]
        status: Option<String>,

        /// Only jobs of this section
        #[arg(long)]
        section: Option<String>,

        /// Maximum number of jobs to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one job
    Job {
        /// Job ID
        id: i64,
    },

    /// Validate the configuration and show the effective settings
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Sections => handle_sections(config),
        Command::Crawl { slug, poll_ms } => handle_crawl(config, &slug, poll_ms).await,
        Command::Jobs {
            status,
            section,
            limit,
        } => handle_jobs(config, status.as_deref(), section, limit),
        Command::Job { id } => handle_job(config, id),
        Command::Check => handle_check(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_folio=info,warn"),
            1 => EnvFilter::new("sumi_folio=debug,info"),
            2 => EnvFilter::new("sumi_folio=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or validated defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("Default configuration is invalid")?;
            Ok(config)
        }
    }
}

fn open_crawler(config: Config) -> anyhow::Result<Crawler<SqliteStorage>> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))?;
    Crawler::new(config, storage).context("Failed to set up crawler")
}

fn handle_sections(config: Config) -> anyhow::Result<()> {
    let crawler = open_crawler(config)?;
    print_sections(crawler.list_sections());
    Ok(())
}

/// Starts a crawl and polls its job until it reaches a terminal state
async fn handle_crawl(config: Config, slug: &str, poll_ms: u64) -> anyhow::Result<()> {
    let crawler = open_crawler(config)?;
    let started = crawler
        .start_crawl(slug)
        .with_context(|| format!("Failed to start crawl of '{}'", slug))?;

    println!("Started job {} for section '{}'", started.job_id, slug);

    let poll = Duration::from_millis(poll_ms.max(50));
    let mut last_line = String::new();
    let job = loop {
        let job = crawler.get_job(started.job_id)?;

        let line = format!("{:<10} {}", job.status.to_string(), format_progress(&job));
        if line != last_line {
            println!("{}", line);
            last_line = line;
        }

        if job.status.is_terminal() {
            break job;
        }
        tokio::time::sleep(poll).await;
    };

    match started.handle.await {
        Ok(Ok(summary)) => println!(
            "\n✓ {} pages scraped ({} written, {} unchanged), {} failed",
            summary.success, summary.written, summary.unchanged, summary.failed
        ),
        Ok(Err(e)) => tracing::debug!("Crawl returned an error: {}", e),
        Err(e) => tracing::error!("Crawl task panicked: {}", e),
    }

    println!();
    print_job(&job);

    if job.status == JobStatus::Failed {
        bail!(
            "Job {} failed: {}",
            job.id,
            job.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

fn handle_jobs(
    config: Config,
    status: Option<&str>,
    section: Option<String>,
    limit: usize,
) -> anyhow::Result<()> {
    let status = match status {
        Some(s) => Some(
            JobStatus::from_db_string(s)
                .with_context(|| format!("Unknown job status '{}'", s))?,
        ),
        None => None,
    };

    let crawler = open_crawler(config)?;
    let jobs = crawler.list_jobs(&JobFilter { status, section }, limit)?;
    print_jobs(&jobs);
    Ok(())
}

fn handle_job(config: Config, id: i64) -> anyhow::Result<()> {
    let crawler = open_crawler(config)?;
    let job = crawler.get_job(id)?;
    print_job(&job);
    Ok(())
}

/// Validates config and shows what would be crawled without crawling
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Sumi-Folio Configuration ===\n");

    println!("Crawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Delay between batches: {}ms", config.crawler.delay_ms);
    println!("  Request timeout: {}ms", config.crawler.timeout_ms);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!(
        "  Rate limits: {}/minute, {}/hour",
        config.crawler.rate_limit_per_minute, config.crawler.rate_limit_per_hour
    );
    println!("  Discovery cap: {}", config.crawler.discovery_cap);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Docs prefix: {}", config.site.docs_path_prefix);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let sections = sumi_folio::catalog::list_sections(config);
    println!();
    print_sections(&sections);

    println!("\n✓ Configuration is valid");
    Ok(())
}
