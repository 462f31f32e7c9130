//! Document harvesting for Thai energy-sector sites.
//!
//! This crate provides:
//! - [`sources`] — the fixed registry of harvest sources
//! - [`classify`] — document type and priority heuristics
//! - [`dedup`] — run-scoped fingerprint admission
//! - [`engine`] — the harvest crawler itself

pub mod classify;
pub mod dedup;
pub mod engine;
pub mod sources;
pub mod text;

pub use classify::{assign_priority, classify_document_type};
pub use dedup::{FingerprintStore, fingerprint};
pub use engine::{Crawler, HarvestResult};
pub use sources::{SourceSite, default_sources};
pub use text::clean_text;
