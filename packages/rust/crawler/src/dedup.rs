//! Run-scoped fingerprint admission.
//!
//! The store owns both fingerprint sets (URL and content) behind one lock so
//! that check-and-insert is atomic: two concurrent fetches that surface the
//! same link cannot both admit it.

use std::collections::HashSet;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex fingerprint of a string.
pub fn fingerprint(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lock-guarded dedup state for one harvest run.
#[derive(Debug, Default)]
pub struct FingerprintStore {
    inner: Mutex<Sets>,
}

#[derive(Debug, Default)]
struct Sets {
    urls: HashSet<String>,
    content: HashSet<String>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a candidate if and only if both fingerprints are unseen.
    /// On admission both are inserted before the lock is released.
    pub fn admit(&self, url_fingerprint: &str, content_fingerprint: &str) -> bool {
        let mut sets = self.inner.lock().expect("fingerprint store poisoned");
        if sets.urls.contains(url_fingerprint) || sets.content.contains(content_fingerprint) {
            return false;
        }
        sets.urls.insert(url_fingerprint.to_string());
        sets.content.insert(content_fingerprint.to_string());
        true
    }

    /// Number of distinct URLs admitted this run.
    pub fn urls_seen(&self) -> usize {
        self.inner.lock().expect("fingerprint store poisoned").urls.len()
    }
}
