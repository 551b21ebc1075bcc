//! State module for tracking crawl jobs
//!
//! # Components
//!
//! - `JobStatus`: the job lifecycle `pending -> running -> {completed | failed}`
//! - `Job`: the progress record polled by callers
//! - `JobUpdate`: a field-level partial update of a job record
//! - `JobProgress`: the counters a running crawl advances page by page

mod job;
mod job_status;

// Re-export main types
pub use job::{Job, JobProgress, JobUpdate};
pub use job_status::JobStatus;
