//! Best-effort distribution of run artifacts.
//!
//! Three targets: remote storage (Google Drive) for all three artifacts,
//! the dataset registry (Hugging Face Hub) for the processed JSONL, and an
//! optional training webhook. Each target degrades independently — absent
//! credentials disable a target without error, while partial credentials
//! are surfaced as misconfiguration.

pub mod credentials;
pub mod drive;
pub mod registry;
pub mod webhook;

pub use credentials::{AccessToken, CredentialProvider};
pub use drive::DriveClient;
pub use registry::RegistryClient;
pub use webhook::trigger_training;
