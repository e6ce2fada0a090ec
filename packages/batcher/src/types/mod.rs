//! Data types for batch jobs and submissions.

pub mod job;
pub mod options;

pub use job::{BatchJob, BatchStatus, ItemError, ItemResult, ItemStatus, OutputLocations};
pub use options::{OutputFormat, ScrapeOptions, SubmitMode, SubmitOptions};
