//! Shared types, error model, and configuration for energydocs.
//!
//! This crate is the foundation depended on by all other energydocs crates.
//! It provides:
//! - [`EnergyDocsError`] — the unified error type
//! - Domain types ([`DocumentRecord`], [`ComplianceNote`], [`RunSummary`], [`RunId`])
//! - Configuration ([`PipelineConfig`], [`CrawlSettings`])

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{CrawlSettings, PipelineConfig, WebhookSettings};
pub use error::{EnergyDocsError, Result};
pub use types::{
    ComplianceNote, DocumentRecord, DocumentStatus, DocumentType, Priority, RunId, RunSummary,
};
