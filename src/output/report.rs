//! Plain-text rendering of sections and jobs

use crate::catalog::Section;
use crate::state::Job;
use chrono::{DateTime, Utc};

/// Width of the progress bar in characters
const BAR_WIDTH: usize = 30;

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One-line progress view, e.g. `[#####-----]  50.0% (5/10, 1 failed)`
pub fn format_progress(job: &Job) -> String {
    let pct = job.progress_percentage.clamp(0.0, 100.0);
    let filled = ((pct / 100.0) * BAR_WIDTH as f64).round() as usize;

    format!(
        "[{}{}] {:>5.1}% ({}/{}, {} failed)",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        pct,
        job.urls_processed,
        job.total_urls,
        job.urls_failed
    )
}

/// Detailed multi-line view of one job
pub fn format_job(job: &Job) -> String {
    let mut lines = vec![
        format!("Job {}", job.id),
        format!("  Section: {}", job.section),
        format!("  Status: {}", job.status),
        format!("  Progress: {}", format_progress(job)),
        format!("  Items scraped: {}", job.items_scraped),
        format!("  Created: {}", format_time(Some(job.created_at))),
        format!("  Started: {}", format_time(job.started_at)),
        format!("  Completed: {}", format_time(job.completed_at)),
    ];

    if let Some(error) = &job.error_message {
        lines.push(format!("  Error: {}", error));
    }

    lines.join("\n")
}

/// Single table row of a job listing
pub fn format_job_row(job: &Job) -> String {
    format!(
        "{:>6}  {:<12} {:<10} {:>6.1}%  {:>5}/{:<5} {:>5} failed",
        job.id,
        job.section,
        job.status.to_string(),
        job.progress_percentage,
        job.urls_processed,
        job.total_urls,
        job.urls_failed
    )
}

/// Prints the section catalog to stdout
pub fn print_sections(sections: &[Section]) {
    println!("=== Sections ({}) ===\n", sections.len());

    for section in sections {
        println!("  {:<12} {}", section.slug, section.title);
        println!("  {:<12} {}", "", section.url);
    }
}

/// Prints one job to stdout
pub fn print_job(job: &Job) {
    println!("{}", format_job(job));
}

/// Prints a job listing to stdout, most recent first
pub fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No jobs found");
        return;
    }

    println!(
        "{:>6}  {:<12} {:<10} {:>7}  {:>11} {:>12}",
        "ID", "SECTION", "STATUS", "PROGRESS", "PROCESSED", "FAILED"
    );
    for job in jobs {
        println!("{}", format_job_row(job));
    }
}
