//! Pipeline orchestration for energydocs.
//!
//! Ties harvesting, PDPA screening, artifact persistence, and best-effort
//! distribution into one end-to-end run.

pub mod pipeline;

pub use pipeline::{ProgressReporter, SilentProgress, run_pipeline};
