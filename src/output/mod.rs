//! Output module for the command-line interface
//!
//! This module renders the section catalog, job records and live job progress
//! as plain text.

mod report;

pub use report::{
    format_job, format_job_row, format_progress, print_job, print_jobs, print_sections,
};
